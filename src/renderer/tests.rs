//! End-to-end frame tests against the recording mock backend.

use bytemuck::Zeroable;
use glam::{Mat4, Vec3, Vec4};

use crate::arena::Handle;
use crate::error::KeelError;
use crate::gpu::backend::{
    PipelineId, RenderBackend, TextureDesc, TextureFormat,
};
use crate::gpu::testing::{MockBackend, MockRecorder, RecordedCommand};
use crate::options::{LimitOptions, RenderOptions};
use crate::renderer::{CoreRecord, RendererCore};
use crate::scene::light::{LightDesc, LightKind, LightRecord};
use crate::scene::material::{Material, MaterialValue};
use crate::scene::model::{ModelSource, ModelSurface};
use crate::scene::renderable::RenderableRecord;
use crate::scene::shader::{Shader, ShaderDesc, ShaderVariableDesc};
use crate::view::frustum::Aabb;
use crate::view::viewport::{Viewport, ViewportDesc};

fn core() -> RendererCore<MockBackend> {
    RendererCore::new(MockBackend::new(), RenderOptions::default()).unwrap()
}

fn add_shader(
    core: &mut RendererCore<MockBackend>,
    name: &str,
    pipeline: u64,
) -> Handle<Shader> {
    core.create_shader(&ShaderDesc {
        name: name.to_owned(),
        pipeline: PipelineId::from_raw(pipeline),
        variables: Vec::new(),
        material_buffer_stride: None,
        wireframe_exempt: false,
    })
    .unwrap()
}

fn add_model(
    core: &mut RendererCore<MockBackend>,
    path: &str,
    material: Handle<Material>,
) -> Handle<crate::scene::model::Model> {
    add_model_with_blend(core, path, material, 0)
}

fn add_model_with_blend(
    core: &mut RendererCore<MockBackend>,
    path: &str,
    material: Handle<Material>,
    blend_shape_count: u32,
) -> Handle<crate::scene::model::Model> {
    let vertex_data = vec![0_u8; 96];
    let index_data = vec![0_u8; 24];
    core.load_model(&ModelSource {
        path,
        vertex_data: &vertex_data,
        index_data: &index_data,
        vertex_count: 8,
        vertex_stride: 12,
        surfaces: &[ModelSurface {
            first_index: 0,
            index_count: 6,
            base_vertex: 0,
            material,
        }],
        aabb: Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0)),
        blend_shape_count,
    })
    .unwrap()
}

fn add_viewport(
    core: &mut RendererCore<MockBackend>,
) -> Handle<Viewport> {
    core.create_viewport(&ViewportDesc {
        width: 640,
        height: 480,
        projection: Mat4::perspective_rh(
            45.0_f32.to_radians(),
            640.0 / 480.0,
            0.1,
            100.0,
        ),
        view: Mat4::look_at_rh(
            Vec3::new(0.0, 0.0, 10.0),
            Vec3::ZERO,
            Vec3::Y,
        ),
        shader_override: None,
    })
    .unwrap()
}

fn record_at(
    core: &RendererCore<MockBackend>,
    position: usize,
) -> RenderableRecord {
    let data = core.backend().buffer_data(core.renderable_pair.target());
    bytemuck::pod_read_unaligned(
        &data[position * 16..position * 16 + 16],
    )
}

fn core_record(core: &RendererCore<MockBackend>) -> CoreRecord {
    let data = core.backend().buffer_data(core.core_pair.target());
    bytemuck::pod_read_unaligned(&data[..16])
}

#[test]
fn model_load_dedupes_by_path() {
    let mut core = core();
    let shader = add_shader(&mut core, "lit", 1);
    let material = core.create_material("stone", shader).unwrap();

    let first = add_model(&mut core, "rock.mdl", material);
    let buffers_after_first = core.backend().create_buffer_calls;

    let second = add_model(&mut core, "rock.mdl", material);
    assert_eq!(first, second);
    assert_eq!(core.model(first).unwrap().ref_count(), 2);
    // The rehit performed zero backend work.
    assert_eq!(core.backend().create_buffer_calls, buffers_after_first);

    core.release_model(first);
    assert!(core.model(first).is_some());
    core.release_model(first);
    assert!(core.model(first).is_none());
    assert!(core.registry().is_empty());
}

#[test]
fn material_creation_dedupes_by_name() {
    let mut core = core();
    let shader = add_shader(&mut core, "lit", 1);
    let first = core.create_material("stone", shader).unwrap();
    let second = core.create_material("stone", shader).unwrap();
    assert_eq!(first, second);
    assert_eq!(core.material(first).unwrap().ref_count(), 2);
    assert_eq!(core.shader(shader).unwrap().materials().len(), 1);

    let missing = Handle::from_raw_parts(42, 7);
    assert!(matches!(
        core.create_material("other", missing),
        Err(KeelError::StaleHandle("shader"))
    ));
}

#[test]
fn draw_lists_bucket_by_shader() {
    let mut core = core();
    let shader_a = add_shader(&mut core, "lit", 1);
    let shader_b = add_shader(&mut core, "unlit", 2);
    let material_a = core.create_material("stone", shader_a).unwrap();
    let material_b = core.create_material("glass", shader_b).unwrap();
    let model_a = add_model(&mut core, "rock.mdl", material_a);
    let model_b = add_model(&mut core, "pane.mdl", material_b);
    let _ra = core.create_renderable(model_a, Mat4::IDENTITY).unwrap();
    let _rb = core.create_renderable(model_b, Mat4::IDENTITY).unwrap();
    let viewport = add_viewport(&mut core);

    core.prepare_draw_data();

    let list = core.viewport(viewport).unwrap().draw_list();
    assert_eq!(list.bucket_count(), 2);
    assert_eq!(list.bucket(shader_a).unwrap().len(), 1);
    assert_eq!(list.bucket(shader_b).unwrap().len(), 1);
}

#[test]
fn frustum_culling_drops_out_of_view_instances() {
    let mut core = core();
    let shader = add_shader(&mut core, "lit", 1);
    let material = core.create_material("stone", shader).unwrap();
    let model = add_model(&mut core, "rock.mdl", material);
    let near = core.create_renderable(model, Mat4::IDENTITY).unwrap();
    // Beyond the far plane along view depth.
    let far_transform =
        Mat4::from_translation(Vec3::new(0.0, 0.0, -1000.0));
    let far = core.create_renderable(model, far_transform).unwrap();
    let viewport = add_viewport(&mut core);

    core.prepare_draw_data();
    let list = core.viewport(viewport).unwrap().draw_list();
    assert_eq!(list.entry_count(), 1);
    assert_eq!(list.bucket(shader).unwrap()[0].renderable, near);
    assert_eq!(core.stats().renderables_culled, 1);

    // Disabling the visibility test makes the far instance draw anyway.
    core.set_renderable_test_visibility(far, false);
    core.prepare_draw_data();
    assert_eq!(
        core.viewport(viewport).unwrap().draw_list().entry_count(),
        2
    );
}

#[test]
fn destroyed_renderable_zeroes_its_record_before_reclamation() {
    let mut core = core();
    let shader = add_shader(&mut core, "lit", 1);
    let material = core.create_material("stone", shader).unwrap();
    let model = add_model(&mut core, "rock.mdl", material);
    let renderable = core.create_renderable(model, Mat4::IDENTITY).unwrap();
    let viewport = add_viewport(&mut core);

    core.prepare_draw_data();
    // vertex at registry position 0, indices at 1.
    assert_eq!(
        record_at(&core, 0),
        RenderableRecord {
            vertex_buffer_index: 0,
            index_buffer_index: 1,
            matrix_index: 0,
            light_count: 0,
        }
    );

    // Hold the fence back so reclamation cannot happen yet.
    core.backend_mut().set_completed_frame(0);
    core.destroy_renderable(renderable);
    core.prepare_draw_data();

    // Still structurally present, excluded from lists, record zeroed.
    assert!(core.renderable(renderable).is_some());
    assert!(core.viewport(viewport).unwrap().draw_list().is_empty());
    assert_eq!(record_at(&core, 0), RenderableRecord::zeroed());

    // Fence completes: refs release and the slot reclaims.
    core.backend_mut().set_completed_frame(100);
    core.prepare_draw_data();
    assert!(core.renderable(renderable).is_none());
    assert_eq!(core.model(model).unwrap().ref_count(), 1);
}

#[test]
fn registry_mutation_recomputes_embedded_positions() {
    let mut core = core();
    let shader = add_shader(&mut core, "lit", 1);
    let material = core.create_material("stone", shader).unwrap();
    let model_a = add_model(&mut core, "a.mdl", material);
    let model_b = add_model(&mut core, "b.mdl", material);
    let _rb = core.create_renderable(model_b, Mat4::IDENTITY).unwrap();

    core.prepare_draw_data();
    // Model A's buffers occupy registry positions 0/1, B's 2/3; the
    // renderable embeds B's.
    assert_eq!(record_at(&core, 0).vertex_buffer_index, 2);
    assert_eq!(record_at(&core, 0).index_buffer_index, 3);

    // Dropping A shifts B's positions down; the next prepare re-derives
    // every embedded index.
    core.release_model(model_a);
    assert!(core.model(model_a).is_none());
    core.prepare_draw_data();
    assert_eq!(record_at(&core, 0).vertex_buffer_index, 0);
    assert_eq!(record_at(&core, 0).index_buffer_index, 1);
}

#[test]
fn dirty_materials_serialize_into_the_shader_set_buffer() {
    let mut core = core();
    let default_texture = core
        .backend_mut()
        .create_texture(
            "default-diffuse",
            &TextureDesc {
                width: 1,
                height: 1,
                format: TextureFormat::Rgba8Srgb,
                render_target: false,
            },
        )
        .unwrap();
    let shader = core
        .create_shader(&ShaderDesc {
            name: "lit".to_owned(),
            pipeline: PipelineId::from_raw(1),
            variables: vec![
                ShaderVariableDesc {
                    name: "Diffuse Texture".to_owned(),
                    default: MaterialValue::Texture(default_texture),
                    offset: 0,
                    size: 4,
                },
                ShaderVariableDesc {
                    name: "Roughness".to_owned(),
                    default: MaterialValue::Float(0.5),
                    offset: 4,
                    size: 4,
                },
                ShaderVariableDesc {
                    name: "Tint".to_owned(),
                    default: MaterialValue::Vec4(Vec4::ONE),
                    offset: 16,
                    size: 16,
                },
            ],
            material_buffer_stride: Some(32),
            wireframe_exempt: false,
        })
        .unwrap();

    let first = core.create_material("stone", shader).unwrap();
    core.set_material_variable(
        first,
        "Roughness",
        MaterialValue::Float(2.0),
    );
    let second = core.create_material("glass", shader).unwrap();

    core.prepare_draw_data();

    // The unset texture variable resolved to the declared default.
    assert_eq!(
        core.material(first).unwrap().resolved().unwrap().value(
            "Diffuse Texture"
        ),
        Some(&MaterialValue::Texture(default_texture))
    );

    let pair = core
        .shader(shader)
        .unwrap()
        .material_pair
        .as_ref()
        .unwrap();
    let data = core.backend().buffer_data(pair.target()).to_vec();
    let roughness =
        f32::from_le_bytes([data[4], data[5], data[6], data[7]]);
    assert_eq!(roughness, 2.0);
    // Slot 1 belongs to the second material: default roughness.
    let second_roughness =
        f32::from_le_bytes([data[36], data[37], data[38], data[39]]);
    assert_eq!(second_roughness, 0.5);

    // Releasing the first material shifts the second down to slot 0 and
    // re-serializes it there.
    core.release_material(first);
    core.prepare_draw_data();
    assert_eq!(
        core.shader(shader).unwrap().material_slot_of(second),
        Some(0)
    );
    let pair = core
        .shader(shader)
        .unwrap()
        .material_pair
        .as_ref()
        .unwrap();
    let data = core.backend().buffer_data(pair.target());
    let slot0_roughness =
        f32::from_le_bytes([data[4], data[5], data[6], data[7]]);
    assert_eq!(slot0_roughness, 0.5);
}

#[test]
fn shader_reassignment_moves_the_material_between_sets() {
    let mut core = core();
    let lit = add_shader(&mut core, "lit", 1);
    let unlit = add_shader(&mut core, "unlit", 2);
    let material = core.create_material("stone", lit).unwrap();
    let model = add_model(&mut core, "rock.mdl", material);
    let _r = core.create_renderable(model, Mat4::IDENTITY).unwrap();
    let viewport = add_viewport(&mut core);

    core.prepare_draw_data();
    assert!(core
        .viewport(viewport)
        .unwrap()
        .draw_list()
        .bucket(lit)
        .is_some());

    core.set_material_shader(material, unlit);
    assert_eq!(core.shader(lit).unwrap().materials().len(), 0);
    assert_eq!(
        core.shader(unlit).unwrap().material_slot_of(material),
        Some(0)
    );

    core.prepare_draw_data();
    let list = core.viewport(viewport).unwrap().draw_list();
    assert!(list.bucket(lit).is_none());
    assert_eq!(list.bucket(unlit).unwrap().len(), 1);
}

#[test]
fn staging_flush_skips_clean_frames() {
    let mut core = core();
    let shader = add_shader(&mut core, "lit", 1);
    let material = core.create_material("stone", shader).unwrap();
    let model = add_model(&mut core, "rock.mdl", material);
    let _r = core.create_renderable(model, Mat4::IDENTITY).unwrap();
    let _viewport = add_viewport(&mut core);

    core.prepare_draw_data();
    let copies = core.backend().queued_copy_count();
    assert!(copies > 0);

    // Nothing changed: the next prepare queues no new copies.
    core.prepare_draw_data();
    assert_eq!(core.backend().queued_copy_count(), copies);
}

#[test]
fn light_arrays_rewrite_in_slot_order() {
    let mut core = core();
    let shader = add_shader(&mut core, "lit", 1);
    let material = core.create_material("stone", shader).unwrap();
    let model = add_model(&mut core, "rock.mdl", material);
    let _r = core.create_renderable(model, Mat4::IDENTITY).unwrap();

    let light = core
        .create_light(&LightDesc {
            kind: LightKind::Point,
            color: Vec3::new(1.0, 0.5, 0.25),
            intensity: 3.0,
            position: Vec3::ZERO,
            radius: 5.0,
            ..LightDesc::default()
        })
        .unwrap();

    core.prepare_draw_data();
    assert_eq!(core_record(&core).point_count, 1);

    let data = core.backend().buffer_data(core.point_pair.target());
    let record: LightRecord = bytemuck::pod_read_unaligned(&data[..64]);
    assert_eq!(record.color, [1.0, 0.5, 0.25]);
    assert_eq!(record.intensity, 3.0);
    assert_eq!(record.enabled, 1);
    assert_eq!(record.shadow_texture, LightRecord::NO_SHADOW);
    // The light reaches the origin renderable.
    assert_eq!(record_at(&core, 0).light_count, 1);

    core.destroy_light(light);
    let _ = core.end_frame();
    core.prepare_draw_data();
    assert!(core.light(light).is_none());
    assert_eq!(core_record(&core).point_count, 0);
    assert_eq!(record_at(&core, 0).light_count, 0);
}

#[test]
fn light_creation_failure_paths_are_recoverable() {
    let options = RenderOptions {
        limits: LimitOptions {
            light_slots_per_type: 1,
            ..LimitOptions::default()
        },
        ..RenderOptions::default()
    };
    let mut core =
        RendererCore::new(MockBackend::new(), options).unwrap();

    assert!(matches!(
        core.create_light(&LightDesc {
            kind: LightKind::Capsule,
            ..LightDesc::default()
        }),
        Err(KeelError::UnsupportedLightKind)
    ));

    let _first = core
        .create_light(&LightDesc::default())
        .unwrap();
    assert!(matches!(
        core.create_light(&LightDesc::default()),
        Err(KeelError::SlotsExhausted("point-lights"))
    ));
    // Conservation held through the failed allocation.
    assert_eq!(core.point_slots.used_len(), 1);
    assert_eq!(core.point_slots.free_len(), 0);
}

#[test]
fn shadow_passes_skip_lights_no_viewport_can_see() {
    let mut core = core();
    let shader = add_shader(&mut core, "lit", 1);
    let material = core.create_material("stone", shader).unwrap();
    let model = add_model(&mut core, "rock.mdl", material);
    let _r = core.create_renderable(model, Mat4::IDENTITY).unwrap();
    let _viewport = add_viewport(&mut core);

    let seen = core
        .create_light(&LightDesc {
            kind: LightKind::Cone,
            position: Vec3::new(0.0, 5.0, 0.0),
            direction: Vec3::NEG_Y,
            radius: 20.0,
            cast_shadow: true,
            ..LightDesc::default()
        })
        .unwrap();
    let unseen = core
        .create_light(&LightDesc {
            kind: LightKind::Cone,
            position: Vec3::new(0.0, 0.0, 5000.0),
            direction: Vec3::Z,
            radius: 20.0,
            cast_shadow: true,
            ..LightDesc::default()
        })
        .unwrap();

    core.prepare_draw_data();

    let seen_viewport = core.light(seen).unwrap().shadow().unwrap().viewport;
    let unseen_viewport =
        core.light(unseen).unwrap().shadow().unwrap().viewport;
    // The visible light's shadow pass drew the caster; the unseen one was
    // scheduled out before building.
    assert_eq!(
        core.viewport(seen_viewport).unwrap().draw_list().entry_count(),
        1
    );
    assert!(core
        .viewport(unseen_viewport)
        .unwrap()
        .draw_list()
        .is_empty());
}

#[test]
fn shadow_pass_excludes_non_casters() {
    let mut core = core();
    let shader = add_shader(&mut core, "lit", 1);
    let material = core.create_material("stone", shader).unwrap();
    let model = add_model(&mut core, "rock.mdl", material);
    let renderable = core.create_renderable(model, Mat4::IDENTITY).unwrap();
    core.set_renderable_cast_shadow(renderable, false);
    let _viewport = add_viewport(&mut core);
    let light = core
        .create_light(&LightDesc {
            kind: LightKind::Cone,
            position: Vec3::new(0.0, 5.0, 0.0),
            direction: Vec3::NEG_Y,
            radius: 20.0,
            cast_shadow: true,
            ..LightDesc::default()
        })
        .unwrap();

    core.prepare_draw_data();
    let shadow_viewport =
        core.light(light).unwrap().shadow().unwrap().viewport;
    assert!(core
        .viewport(shadow_viewport)
        .unwrap()
        .draw_list()
        .is_empty());
}

#[test]
fn lock_visibility_freezes_draw_lists() {
    let mut core = core();
    let shader = add_shader(&mut core, "lit", 1);
    let material = core.create_material("stone", shader).unwrap();
    let model = add_model(&mut core, "rock.mdl", material);
    let renderable = core.create_renderable(model, Mat4::IDENTITY).unwrap();
    let viewport = add_viewport(&mut core);

    core.prepare_draw_data();
    assert_eq!(
        core.viewport(viewport).unwrap().draw_list().entry_count(),
        1
    );

    core.options_mut().visibility.lock_visibility = true;
    core.set_renderable_transform(
        renderable,
        Mat4::from_translation(Vec3::new(0.0, 0.0, -1000.0)),
    );
    core.prepare_draw_data();
    // Locked: the stale list survives even though the instance left view.
    assert_eq!(
        core.viewport(viewport).unwrap().draw_list().entry_count(),
        1
    );

    core.options_mut().visibility.lock_visibility = false;
    core.prepare_draw_data();
    assert_eq!(
        core.viewport(viewport).unwrap().draw_list().entry_count(),
        0
    );
}

#[test]
fn wireframe_override_respects_exemption() {
    let mut core = core();
    let lit = add_shader(&mut core, "lit", 1);
    let exempt = core
        .create_shader(&ShaderDesc {
            name: "sky".to_owned(),
            pipeline: PipelineId::from_raw(2),
            variables: Vec::new(),
            material_buffer_stride: None,
            wireframe_exempt: true,
        })
        .unwrap();
    let wireframe = add_shader(&mut core, "wireframe", 3);
    core.set_wireframe_shader(Some(wireframe));

    let material_lit = core.create_material("stone", lit).unwrap();
    let material_sky = core.create_material("sky", exempt).unwrap();
    let model_lit = add_model(&mut core, "rock.mdl", material_lit);
    let model_sky = add_model(&mut core, "dome.mdl", material_sky);
    let _r1 = core.create_renderable(model_lit, Mat4::IDENTITY).unwrap();
    let _r2 = core.create_renderable(model_sky, Mat4::IDENTITY).unwrap();
    let viewport = add_viewport(&mut core);

    core.options_mut().debug.wireframe = true;
    core.prepare_draw_data();

    let list = core.viewport(viewport).unwrap().draw_list();
    assert_eq!(list.bucket(wireframe).unwrap().len(), 1);
    assert_eq!(list.bucket(exempt).unwrap().len(), 1);
    assert!(list.bucket(lit).is_none());
}

#[test]
fn blend_shape_instances_own_private_buffers() {
    let mut core = core();
    let shader = add_shader(&mut core, "lit", 1);
    let material = core.create_material("stone", shader).unwrap();
    let model = add_model_with_blend(&mut core, "face.mdl", material, 2);
    assert_eq!(core.registry().len(), 2);

    let copies_before = core.backend().queued_copy_count();
    let renderable = core.create_renderable(model, Mat4::IDENTITY).unwrap();
    // Private vertex + weight buffers joined the registry, and the base
    // vertex data was copy-seeded device-side.
    assert_eq!(core.registry().len(), 4);
    assert!(core.backend().queued_copy_count() > copies_before);

    let blend = *core
        .renderable(renderable)
        .unwrap()
        .blend_buffers()
        .unwrap();
    core.set_blend_weights(renderable, &[0.25, 0.75]);
    let weights: [f32; 2] = bytemuck::pod_read_unaligned(
        &core.backend().buffer_data(blend.weight_buffer)[..8],
    );
    assert_eq!(weights, [0.25, 0.75]);

    core.prepare_draw_data();
    // The record embeds the private vertex buffer's position (2), not the
    // model's (0).
    assert_eq!(record_at(&core, 0).vertex_buffer_index, 2);

    core.destroy_renderable(renderable);
    let _ = core.end_frame();
    core.prepare_draw_data();
    assert_eq!(core.registry().len(), 2);
    assert!(!core.backend().buffer_alive(blend.vertex_buffer));
    assert!(!core.backend().buffer_alive(blend.weight_buffer));
}

#[test]
fn render_emits_bucketed_draws() {
    let mut core = core();
    let shader = add_shader(&mut core, "lit", 1);
    let material = core.create_material("stone", shader).unwrap();
    let model = add_model(&mut core, "rock.mdl", material);
    let _r = core.create_renderable(model, Mat4::IDENTITY).unwrap();
    let viewport = add_viewport(&mut core);

    core.prepare_draw_data();
    let mut recorder = MockRecorder::new();
    core.render(&mut recorder, &[viewport]);
    let _ = core.end_frame();

    assert_eq!(recorder.draw_count(), 1);
    assert_eq!(core.stats().draws_emitted, 1);
    let vertex_buffer = core.model(model).unwrap().vertex_buffer();
    assert!(recorder.commands.contains(&RecordedCommand::BindPipeline(
        PipelineId::from_raw(1)
    )));
    assert!(recorder
        .commands
        .contains(&RecordedCommand::BindVertexBuffer(vertex_buffer)));
    assert!(recorder.commands.contains(&RecordedCommand::DrawIndexed {
        index_count: 6,
        first_index: 0,
        base_vertex: 0,
    }));
}

#[test]
fn shutdown_frees_every_device_resource() {
    let mut core = core();
    let texture = core
        .backend_mut()
        .create_texture(
            "albedo",
            &TextureDesc {
                width: 1,
                height: 1,
                format: TextureFormat::Rgba8Srgb,
                render_target: false,
            },
        )
        .unwrap();
    let shader = core
        .create_shader(&ShaderDesc {
            name: "lit".to_owned(),
            pipeline: PipelineId::from_raw(1),
            variables: vec![ShaderVariableDesc {
                name: "Albedo".to_owned(),
                default: MaterialValue::Float(1.0),
                offset: 0,
                size: 4,
            }],
            material_buffer_stride: Some(16),
            wireframe_exempt: false,
        })
        .unwrap();
    let material = core.create_material("stone", shader).unwrap();
    core.set_material_variable(
        material,
        "Custom Map",
        MaterialValue::Texture(texture),
    );
    let model = add_model_with_blend(&mut core, "face.mdl", material, 2);
    let _renderable =
        core.create_renderable(model, Mat4::IDENTITY).unwrap();
    let _viewport = add_viewport(&mut core);
    let light = core
        .create_light(&LightDesc {
            kind: LightKind::Cone,
            cast_shadow: true,
            ..LightDesc::default()
        })
        .unwrap();
    let shadow = *core.light(light).unwrap().shadow().unwrap();

    core.prepare_draw_data();

    let mut backend = core.shutdown();
    assert_eq!(backend.live_buffer_count(), 0);
    assert!(!backend.framebuffer_alive(shadow.framebuffer));
    assert!(!backend.texture_alive(shadow.depth));
    // The material's reference released; only the test's own remains.
    assert!(backend.texture_alive(texture));
    backend.release_texture(texture);
    assert!(!backend.texture_alive(texture));
}
