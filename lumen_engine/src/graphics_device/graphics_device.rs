/// GraphicsDevice trait - factory for every GPU object the engine uses
///
/// Implemented by backends (e.g. `VulkanGraphicsDevice`). Objects that are
/// shared between owners are handed out as `Arc<dyn ..>`; objects with a
/// single owner (frame slots, swapchains) as `Box<dyn ..>`. Descriptor
/// objects are opaque handles whose lifetime the `descriptor` module manages.

use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::{
    Buffer, BufferDesc, Texture, TextureDesc, Pipeline, PipelineDesc,
    Swapchain, FrameSlot, Extent2D,
    DescriptorSetLayoutDesc, DescriptorPoolDesc, DescriptorWrite,
    DescriptorSetLayoutHandle, DescriptorPoolHandle, DescriptorSetHandle,
};

/// Main device trait
///
/// All methods take `&self`: backends use interior mutability where the API
/// requires external synchronization (queue submission, descriptor pools).
pub trait GraphicsDevice: Send + Sync {
    // ===== RESOURCES =====

    /// Create a buffer, optionally initialized with `desc.data`
    fn create_buffer(&self, desc: &BufferDesc) -> Result<Arc<dyn Buffer>>;

    /// Create a sampled texture and upload its pixels
    ///
    /// The upload goes through a one-shot command submission that blocks
    /// until the copy is complete.
    fn create_texture(&self, desc: &TextureDesc) -> Result<Arc<dyn Texture>>;

    /// Create a graphics pipeline compatible with a swapchain render pass
    fn create_pipeline(&self, desc: &PipelineDesc) -> Result<Arc<dyn Pipeline>>;

    // ===== DESCRIPTORS =====

    fn create_descriptor_set_layout(&self, desc: &DescriptorSetLayoutDesc) -> Result<DescriptorSetLayoutHandle>;

    fn destroy_descriptor_set_layout(&self, layout: DescriptorSetLayoutHandle);

    fn create_descriptor_pool(&self, desc: &DescriptorPoolDesc) -> Result<DescriptorPoolHandle>;

    fn destroy_descriptor_pool(&self, pool: DescriptorPoolHandle);

    /// Allocate one set from a pool
    ///
    /// Returns `Ok(None)` when the pool is exhausted or fragmented; other
    /// failures are errors.
    ///
    /// # Arguments
    ///
    /// * `variable_count` - Descriptor count of the layout's variable-sized binding, if any
    fn allocate_descriptor_set(
        &self,
        pool: DescriptorPoolHandle,
        layout: DescriptorSetLayoutHandle,
        variable_count: Option<u32>,
    ) -> Result<Option<DescriptorSetHandle>>;

    /// Return sets to a pool created with `PoolFlags::FREE_DESCRIPTOR_SET`
    fn free_descriptor_sets(&self, pool: DescriptorPoolHandle, sets: &[DescriptorSetHandle]) -> Result<()>;

    /// Return every set allocated from a pool
    fn reset_descriptor_pool(&self, pool: DescriptorPoolHandle) -> Result<()>;

    /// Apply a batch of descriptor writes in one update call
    fn update_descriptor_sets(&self, writes: &[DescriptorWrite]) -> Result<()>;

    // ===== FRAMES =====

    /// Create the command list and synchronization objects of one frame slot
    ///
    /// The slot fence starts signaled so the first wait returns immediately.
    fn create_frame_slot(&self, index: usize) -> Result<Box<dyn FrameSlot>>;

    /// Create a swapchain generation
    ///
    /// # Arguments
    ///
    /// * `extent` - Drawable size of the surface (clamped by the backend)
    /// * `previous` - Generation being replaced, passed as the recreation hint
    ///
    /// Returns `Ok(None)` when the surface currently mandates a zero extent
    /// (minimized); the caller waits and tries again.
    fn create_swapchain(
        &self,
        extent: Extent2D,
        previous: Option<&dyn Swapchain>,
    ) -> Result<Option<Box<dyn Swapchain>>>;

    /// Block until the device has finished all submitted work
    fn wait_idle(&self) -> Result<()>;
}
