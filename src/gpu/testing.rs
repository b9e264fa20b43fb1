//! Mock backend and recorder for unit tests.
//!
//! Records every call so tests can assert on copy counts, buffer
//! lifetimes, texture references, and draw streams.

use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use crate::gpu::backend::{
    BackendError, BufferId, BufferUsage, CommandRecorder, CopyRegion,
    FramebufferId, MemoryClass, PipelineId, RenderBackend, TextureDesc,
    TextureId,
};

struct MockBuffer {
    data: Vec<u8>,
}

struct MockTexture {
    refs: u32,
    shader_index: u32,
}

/// In-memory [`RenderBackend`] with full call recording.
pub(crate) struct MockBackend {
    next_id: u64,
    next_texture_index: u32,
    buffers: FxHashMap<u64, MockBuffer>,
    textures: FxHashMap<u64, MockTexture>,
    framebuffers: FxHashMap<u64, ()>,
    queued: Vec<(BufferId, BufferId, Vec<CopyRegion>)>,
    frame: u64,
    completed: u64,
    auto_complete: bool,
    /// Cumulative `queue_copy` invocations.
    pub queue_copy_calls: usize,
    /// Cumulative `create_buffer` invocations.
    pub create_buffer_calls: usize,
    /// Cumulative `wait_idle` invocations.
    pub wait_idle_calls: usize,
    /// Paths handed to `load_texture`, in call order.
    pub loaded_textures: Vec<PathBuf>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            next_texture_index: 0,
            buffers: FxHashMap::default(),
            textures: FxHashMap::default(),
            framebuffers: FxHashMap::default(),
            queued: Vec::new(),
            frame: 0,
            completed: 0,
            auto_complete: true,
            queue_copy_calls: 0,
            create_buffer_calls: 0,
            wait_idle_calls: 0,
            loaded_textures: Vec::new(),
        }
    }

    fn next(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Pin the completed-frame value (disables auto-completion).
    pub fn set_completed_frame(&mut self, completed: u64) {
        self.auto_complete = false;
        self.completed = completed;
    }

    pub fn buffer_alive(&self, buffer: BufferId) -> bool {
        self.buffers.contains_key(&buffer.raw())
    }

    pub fn buffer_data(&self, buffer: BufferId) -> &[u8] {
        &self.buffers[&buffer.raw()].data
    }

    pub fn texture_alive(&self, texture: TextureId) -> bool {
        self.textures.contains_key(&texture.raw())
    }

    pub fn framebuffer_alive(&self, framebuffer: FramebufferId) -> bool {
        self.framebuffers.contains_key(&framebuffer.raw())
    }

    pub fn queued_copy_count(&self) -> usize {
        self.queue_copy_calls
    }

    pub fn live_buffer_count(&self) -> usize {
        self.buffers.len()
    }
}

impl RenderBackend for MockBackend {
    fn create_buffer(
        &mut self,
        _label: &str,
        size: u64,
        _usage: BufferUsage,
        _memory: MemoryClass,
    ) -> Result<BufferId, BackendError> {
        self.create_buffer_calls += 1;
        let id = self.next();
        let _ = self.buffers.insert(
            id,
            MockBuffer {
                data: vec![0; size as usize],
            },
        );
        Ok(BufferId::from_raw(id))
    }

    fn destroy_buffer(&mut self, buffer: BufferId) {
        assert!(
            self.buffers.remove(&buffer.raw()).is_some(),
            "destroy of unknown buffer {buffer:?}"
        );
    }

    fn write_buffer(&mut self, buffer: BufferId, offset: u64, data: &[u8]) {
        let entry = self
            .buffers
            .get_mut(&buffer.raw())
            .unwrap_or_else(|| panic!("write to unknown buffer {buffer:?}"));
        let offset = offset as usize;
        assert!(offset + data.len() <= entry.data.len(), "write past end");
        entry.data[offset..offset + data.len()].copy_from_slice(data);
    }

    fn queue_copy(
        &mut self,
        src: BufferId,
        dst: BufferId,
        regions: &[CopyRegion],
    ) {
        self.queue_copy_calls += 1;
        self.queued.push((src, dst, regions.to_vec()));
    }

    fn submit_queued_copies(&mut self) {
        for (src, dst, regions) in std::mem::take(&mut self.queued) {
            for region in regions {
                let bytes: Vec<u8> = {
                    let src_data = &self.buffers[&src.raw()].data;
                    let start = region.src_offset as usize;
                    src_data[start..start + region.size as usize].to_vec()
                };
                let dst_data = &mut self
                    .buffers
                    .get_mut(&dst.raw())
                    .expect("copy to unknown buffer")
                    .data;
                let start = region.dst_offset as usize;
                dst_data[start..start + bytes.len()].copy_from_slice(&bytes);
            }
        }
    }

    fn create_texture(
        &mut self,
        _label: &str,
        _desc: &TextureDesc,
    ) -> Result<TextureId, BackendError> {
        let id = self.next();
        let shader_index = self.next_texture_index;
        self.next_texture_index += 1;
        let _ = self.textures.insert(
            id,
            MockTexture {
                refs: 1,
                shader_index,
            },
        );
        Ok(TextureId::from_raw(id))
    }

    fn load_texture(
        &mut self,
        path: &Path,
    ) -> Result<TextureId, BackendError> {
        self.loaded_textures.push(path.to_path_buf());
        self.create_texture(
            "loaded",
            &TextureDesc {
                width: 1,
                height: 1,
                format: crate::gpu::TextureFormat::Rgba8Srgb,
                render_target: false,
            },
        )
    }

    fn retain_texture(&mut self, texture: TextureId) {
        self.textures
            .get_mut(&texture.raw())
            .expect("retain of unknown texture")
            .refs += 1;
    }

    fn release_texture(&mut self, texture: TextureId) {
        let entry = self
            .textures
            .get_mut(&texture.raw())
            .expect("release of unknown texture");
        entry.refs -= 1;
        if entry.refs == 0 {
            let _ = self.textures.remove(&texture.raw());
        }
    }

    fn texture_shader_index(&self, texture: TextureId) -> Option<u32> {
        self.textures.get(&texture.raw()).map(|t| t.shader_index)
    }

    fn create_framebuffer(
        &mut self,
        _label: &str,
        color: Option<TextureId>,
        depth: Option<TextureId>,
    ) -> Result<FramebufferId, BackendError> {
        if color.is_none() && depth.is_none() {
            return Err(BackendError::FramebufferCreation(
                "no attachments".to_owned(),
            ));
        }
        let id = self.next();
        let _ = self.framebuffers.insert(id, ());
        Ok(FramebufferId::from_raw(id))
    }

    fn destroy_framebuffer(&mut self, framebuffer: FramebufferId) {
        assert!(
            self.framebuffers.remove(&framebuffer.raw()).is_some(),
            "destroy of unknown framebuffer {framebuffer:?}"
        );
    }

    fn wait_idle(&mut self) {
        self.wait_idle_calls += 1;
        self.completed = self.frame;
    }

    fn end_frame(&mut self) -> u64 {
        self.frame += 1;
        if self.auto_complete {
            self.completed = self.frame;
        }
        self.frame
    }

    fn completed_frame(&self) -> u64 {
        self.completed
    }
}

/// One command recorded by [`MockRecorder`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RecordedCommand {
    SetViewport { x: f32, y: f32, width: f32, height: f32 },
    SetScissor { x: u32, y: u32, width: u32, height: u32 },
    BindPipeline(PipelineId),
    BindVertexBuffer(BufferId),
    BindIndexBuffer(BufferId),
    PushConstants(Vec<u8>),
    Draw { vertex_count: u32, first_vertex: u32 },
    DrawIndexed { index_count: u32, first_index: u32, base_vertex: i32 },
}

/// [`CommandRecorder`] that logs every call.
pub(crate) struct MockRecorder {
    pub commands: Vec<RecordedCommand>,
}

impl MockRecorder {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| {
                matches!(
                    c,
                    RecordedCommand::Draw { .. }
                        | RecordedCommand::DrawIndexed { .. }
                )
            })
            .count()
    }
}

impl CommandRecorder for MockRecorder {
    fn set_viewport(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.commands.push(RecordedCommand::SetViewport {
            x,
            y,
            width,
            height,
        });
    }

    fn set_scissor(&mut self, x: u32, y: u32, width: u32, height: u32) {
        self.commands.push(RecordedCommand::SetScissor {
            x,
            y,
            width,
            height,
        });
    }

    fn bind_pipeline(&mut self, pipeline: PipelineId) {
        self.commands.push(RecordedCommand::BindPipeline(pipeline));
    }

    fn bind_vertex_buffer(&mut self, buffer: BufferId) {
        self.commands
            .push(RecordedCommand::BindVertexBuffer(buffer));
    }

    fn bind_index_buffer(&mut self, buffer: BufferId) {
        self.commands.push(RecordedCommand::BindIndexBuffer(buffer));
    }

    fn push_constants(&mut self, data: &[u8]) {
        self.commands
            .push(RecordedCommand::PushConstants(data.to_vec()));
    }

    fn draw(&mut self, vertex_count: u32, first_vertex: u32) {
        self.commands.push(RecordedCommand::Draw {
            vertex_count,
            first_vertex,
        });
    }

    fn draw_indexed(
        &mut self,
        index_count: u32,
        first_index: u32,
        base_vertex: i32,
    ) {
        self.commands.push(RecordedCommand::DrawIndexed {
            index_count,
            first_index,
            base_vertex,
        });
    }
}
