//! Shader descriptors, material sets, and material-buffer layouts.
//!
//! A shader here is a registered description of an externally-created
//! pipeline: its declared material variables (with defaults and buffer
//! layout offsets), the ordered set of materials currently using it, and —
//! when it declares a material-data buffer — the staged byte array those
//! materials serialize into. The count and ordinal position of set members
//! feed descriptor bindings, so set mutations flag a bindings rebuild.

use crate::arena::Handle;
use crate::gpu::backend::PipelineId;
use crate::gpu::staging::StagingBufferPair;
use crate::scene::material::{Material, MaterialValue};

/// One declared shader variable: name, default (which fixes the kind),
/// and its byte placement in the material-buffer layout.
#[derive(Debug, Clone)]
pub struct ShaderVariableDesc {
    /// Variable name materials set values under.
    pub name: String,
    /// Default value, used when a material leaves the variable unset.
    pub default: MaterialValue,
    /// Byte offset within the material-buffer layout.
    pub offset: u32,
    /// Byte size within the layout.
    pub size: u32,
}

/// Parameters for shader registration.
#[derive(Debug, Clone)]
pub struct ShaderDesc {
    /// Lookup name.
    pub name: String,
    /// The externally-created pipeline this shader draws with.
    pub pipeline: PipelineId,
    /// Declared material variables.
    pub variables: Vec<ShaderVariableDesc>,
    /// Per-material byte stride of the material-data buffer, or `None`
    /// when the shader takes per-draw data only.
    pub material_buffer_stride: Option<u32>,
    /// Exempt from the global wireframe override.
    pub wireframe_exempt: bool,
}

/// A registered shader and its material set.
pub struct Shader {
    pub(crate) name: String,
    pub(crate) pipeline: PipelineId,
    pub(crate) variables: Vec<ShaderVariableDesc>,
    pub(crate) material_buffer_stride: Option<u32>,
    pub(crate) wireframe_exempt: bool,
    /// Materials using this shader; ordinal position is the material's
    /// slot in the material-data buffer.
    pub(crate) materials: Vec<Handle<Material>>,
    /// Staged material-data buffer, present iff a stride is declared.
    pub(crate) material_pair: Option<StagingBufferPair>,
    /// Host-side material-data bytes (stride × set size).
    pub(crate) material_bytes: Vec<u8>,
    pub(crate) material_data_dirty: bool,
    pub(crate) bindings_dirty: bool,
}

impl Shader {
    pub(crate) fn new(
        desc: &ShaderDesc,
        material_pair: Option<StagingBufferPair>,
    ) -> Self {
        Self {
            name: desc.name.clone(),
            pipeline: desc.pipeline,
            variables: desc.variables.clone(),
            material_buffer_stride: desc.material_buffer_stride,
            wireframe_exempt: desc.wireframe_exempt,
            materials: Vec::new(),
            material_pair,
            material_bytes: Vec::new(),
            material_data_dirty: false,
            bindings_dirty: false,
        }
    }

    /// Lookup name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The pipeline bound for this shader's buckets.
    #[must_use]
    pub const fn pipeline(&self) -> PipelineId {
        self.pipeline
    }

    /// Declared material variables.
    #[must_use]
    pub fn variables(&self) -> &[ShaderVariableDesc] {
        &self.variables
    }

    /// Whether the global wireframe override skips this shader.
    #[must_use]
    pub const fn wireframe_exempt(&self) -> bool {
        self.wireframe_exempt
    }

    /// Whether the shader declares a material-data buffer.
    #[must_use]
    pub const fn has_material_buffer(&self) -> bool {
        self.material_buffer_stride.is_some()
    }

    /// Materials using this shader, in slot order.
    #[must_use]
    pub fn materials(&self) -> &[Handle<Material>] {
        &self.materials
    }

    /// Ordinal slot of a material in the set.
    #[must_use]
    pub fn material_slot_of(
        &self,
        material: Handle<Material>,
    ) -> Option<usize> {
        self.materials.iter().position(|&m| m == material)
    }

    /// Whether descriptor bindings need a rebuild (set size or ordinals
    /// changed since the last [`Self::take_bindings_dirty`]).
    #[must_use]
    pub const fn bindings_dirty(&self) -> bool {
        self.bindings_dirty
    }

    pub(crate) fn take_bindings_dirty(&mut self) -> bool {
        std::mem::take(&mut self.bindings_dirty)
    }

    /// Add `material` to the set; returns its slot.
    pub(crate) fn attach_material(
        &mut self,
        material: Handle<Material>,
    ) -> usize {
        let slot = self.materials.len();
        self.materials.push(material);
        self.resize_material_bytes();
        slot
    }

    /// Remove `material` from the set, shifting later slots down.
    pub(crate) fn detach_material(
        &mut self,
        material: Handle<Material>,
    ) -> bool {
        let Some(slot) = self.material_slot_of(material) else {
            return false;
        };
        let _ = self.materials.remove(slot);
        self.resize_material_bytes();
        true
    }

    fn resize_material_bytes(&mut self) {
        if let Some(stride) = self.material_buffer_stride {
            self.material_bytes
                .resize(stride as usize * self.materials.len(), 0);
            self.material_data_dirty = true;
            self.bindings_dirty = true;
        }
    }

    /// Copy a material's packed bytes into its slot of the host array.
    pub(crate) fn write_material_slot(&mut self, slot: usize, bytes: &[u8]) {
        let Some(stride) = self.material_buffer_stride else {
            return;
        };
        let start = slot * stride as usize;
        let end = start + (bytes.len().min(stride as usize));
        if end > self.material_bytes.len() {
            log::warn!(
                "shader '{}': material slot {slot} past the set buffer",
                self.name
            );
            return;
        }
        self.material_bytes[start..end]
            .copy_from_slice(&bytes[..end - start]);
        self.material_data_dirty = true;
    }
}
