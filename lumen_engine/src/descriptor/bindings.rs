/// Process-wide binding slots of the global (set 0) descriptor set

use std::sync::Arc;

use crate::config::MAX_FRAMES_IN_FLIGHT;
use crate::error::Result;
use crate::graphics_device::{GraphicsDevice, DescriptorKind, ShaderStageFlags, BindingFlags, PoolFlags};
use crate::descriptor::{DescriptorSetLayout, DescriptorSetLayoutBuilder, DescriptorPool, DescriptorPoolBuilder};

/// Per-frame uniform block (`GlobalUbo`)
pub const GLOBAL_UBO_BINDING: u32 = 0;
/// Bindless combined image sampler array
pub const TEXTURE_ARRAY_BINDING: u32 = 1;
/// Storage image (reserved)
pub const STORAGE_IMAGE_BINDING: u32 = 2;
/// Material storage buffer
pub const MATERIAL_BINDING: u32 = 3;

/// Capacity of the bindless texture array
pub const MAX_BINDLESS_TEXTURES: u32 = 65536;

/// Layout of the global set
///
/// | binding | kind | count | flags |
/// |---------|------|-------|-------|
/// | 0 | uniform buffer | 1 | |
/// | 1 | combined image sampler | 65536 | partially bound, update after bind |
/// | 2 | storage image | 1 | partially bound |
/// | 3 | storage buffer | 1 | |
pub fn build_global_layout(device: Arc<dyn GraphicsDevice>) -> Result<Arc<DescriptorSetLayout>> {
    DescriptorSetLayoutBuilder::new(device)
        .add_binding(GLOBAL_UBO_BINDING, DescriptorKind::UniformBuffer, ShaderStageFlags::ALL_GRAPHICS, 1)?
        .add_binding(TEXTURE_ARRAY_BINDING, DescriptorKind::CombinedImageSampler, ShaderStageFlags::ALL_GRAPHICS, MAX_BINDLESS_TEXTURES)?
        .add_binding(STORAGE_IMAGE_BINDING, DescriptorKind::StorageImage, ShaderStageFlags::ALL_GRAPHICS, 1)?
        .add_binding(MATERIAL_BINDING, DescriptorKind::StorageBuffer, ShaderStageFlags::ALL_GRAPHICS, 1)?
        .binding_flags(TEXTURE_ARRAY_BINDING, BindingFlags::PARTIALLY_BOUND | BindingFlags::UPDATE_AFTER_BIND)?
        .binding_flags(STORAGE_IMAGE_BINDING, BindingFlags::PARTIALLY_BOUND)?
        .update_after_bind_pool()
        .build()
}

/// Pool holding one global set per frame in flight
pub fn build_global_pool(device: Arc<dyn GraphicsDevice>) -> Result<Arc<DescriptorPool>> {
    let frames = MAX_FRAMES_IN_FLIGHT as u32;
    DescriptorPoolBuilder::new(device)
        .max_sets(frames)
        .add_pool_size(DescriptorKind::UniformBuffer, frames)
        .add_pool_size(DescriptorKind::CombinedImageSampler, MAX_BINDLESS_TEXTURES * frames)
        .add_pool_size(DescriptorKind::StorageImage, frames)
        .add_pool_size(DescriptorKind::StorageBuffer, frames)
        .flags(PoolFlags::UPDATE_AFTER_BIND | PoolFlags::FREE_DESCRIPTOR_SET)
        .build()
}
