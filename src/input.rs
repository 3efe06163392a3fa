//! Per-stage I/O description and resource-binding layout.
//!
//! These are the second half of the recompiler's input contract (the first
//! being [`crate::model::ShaderCode`]). Exactly one of [`VertexInputInfo`],
//! [`PixelInputInfo`], [`ComputeInputInfo`] is supplied per call, matching
//! `shader_code.ty`.

/// A single vertex-attribute fetch descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchResource {
    /// First VGPR the fetched attribute is written into.
    pub register_start: u32,
    /// Vector width of the fetch: 1, 2, 3 or 4.
    pub registers_num: u32,
    /// Index of the bound vertex attribute (`attr<attr_index>`).
    pub attr_index: u32,
}

#[derive(Debug, Clone, Default)]
pub struct VertexInputInfo {
    pub resources: Vec<FetchResource>,
    pub export_count: u32,
    pub fetch: bool,
}

/// `target_output_mode[i]` values recognized by the `Exp` rule family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetOutputMode {
    /// Two sources packed as half2x16 pairs (4 components from 2 VGPRs).
    PackedHalf,
    /// Four full-float components.
    FourFloat,
}

#[derive(Debug, Clone, Default)]
pub struct PixelInputInfo {
    pub input_num: u32,
    pub ps_pos_xy: bool,
    pub ps_pixel_kill_enable: bool,
    pub target_output_mode: Vec<Option<TargetOutputMode>>,
}

impl PixelInputInfo {
    pub fn mode_for(&self, mrt: usize) -> Option<TargetOutputMode> {
        self.target_output_mode.get(mrt).copied().flatten()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ComputeInputInfo {
    pub threads_num: [u32; 3],
    pub workgroup_register: u32,
}

/// One contiguous register range bound to a resource-descriptor class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceBinding {
    pub binding_index: u32,
    pub start_register: u32,
    /// Whether this binding is backed by the push-constant extended
    /// mapping table rather than loaded up front (see `SLoadDwordx*`).
    pub extended: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ResourceClass {
    pub bindings: Vec<ResourceBinding>,
}

impl ResourceClass {
    pub fn count(&self) -> usize {
        self.bindings.len()
    }
}

/// Size in SGPRs of one resource-descriptor class, per the ABI in the
/// recompiler specification's external-interfaces section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    StorageBuffer,
    Texture2d,
    Sampler,
    GdsPointer,
}

impl ResourceKind {
    /// Number of consecutive SGPRs (and push-constant 16-byte slots) one
    /// descriptor of this kind occupies.
    pub fn register_width(self) -> u32 {
        match self {
            ResourceKind::StorageBuffer => 4,
            ResourceKind::Texture2d => 8,
            ResourceKind::Sampler => 8,
            ResourceKind::GdsPointer => 4,
        }
    }
}

/// Pipeline-resource binding description, present identically for all three
/// stages.
#[derive(Debug, Clone, Default)]
pub struct ShaderResources {
    pub descriptor_set_slot: u32,
    pub storage_buffers: ResourceClass,
    pub textures2d: ResourceClass,
    pub samplers: ResourceClass,
    pub gds_pointers: ResourceClass,
    pub push_constant_offset: u32,
    pub push_constant_size: u32,
    pub extended_used: bool,
    pub extended_start_register: u32,
}

impl ShaderResources {
    /// All bound resources in push-constant slot order: storage buffers,
    /// then textures, then samplers, then GDS pointers. This order is part
    /// of the ABI with the Vulkan pipeline-layout builder and must not be
    /// reordered.
    pub fn slot_order(&self) -> Vec<(ResourceKind, ResourceBinding)> {
        let mut out = Vec::new();
        for b in &self.storage_buffers.bindings {
            out.push((ResourceKind::StorageBuffer, *b));
        }
        for b in &self.textures2d.bindings {
            out.push((ResourceKind::Texture2d, *b));
        }
        for b in &self.samplers.bindings {
            out.push((ResourceKind::Sampler, *b));
        }
        for b in &self.gds_pointers.bindings {
            out.push((ResourceKind::GdsPointer, *b));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_order_is_storage_then_texture_then_sampler_then_gds() {
        let mut res = ShaderResources::default();
        res.storage_buffers.bindings.push(ResourceBinding { binding_index: 0, start_register: 0, extended: false });
        res.textures2d.bindings.push(ResourceBinding { binding_index: 1, start_register: 16, extended: true });
        res.samplers.bindings.push(ResourceBinding { binding_index: 2, start_register: 24, extended: true });
        let order = res.slot_order();
        assert_eq!(order.len(), 3);
        assert_eq!(order[0].0, ResourceKind::StorageBuffer);
        assert_eq!(order[1].0, ResourceKind::Texture2d);
        assert_eq!(order[2].0, ResourceKind::Sampler);
    }
}
