/*!
# Lumen Engine - Vulkan Backend

Vulkan implementation of the `lumen_engine` graphics device traits, built on
`ash` and `gpu-allocator`.

The device enables descriptor indexing so the global descriptor set can hold
a partially bound, update-after-bind texture array.

```no_run
use std::sync::Arc;
use lumen_engine::lumen::{Config, GraphicsDevice};
use lumen_engine::lumen::surface::WinitSurface;
use lumen_engine_renderer_vulkan::VulkanGraphicsDevice;

let config = Config::default();
let surface = WinitSurface::new(&config)?;
let device: Arc<dyn GraphicsDevice> = Arc::new(VulkanGraphicsDevice::new(surface.window(), &config)?);
# Ok::<(), lumen_engine::lumen::Error>(())
```
*/

mod vulkan_context;
mod vulkan_format;
mod vulkan_device;
mod vulkan_buffer;
mod vulkan_texture;
mod vulkan_pipeline;
mod vulkan_command_list;
mod vulkan_frame_slot;
mod vulkan_swapchain;

#[cfg(feature = "vulkan-validation")]
mod debug;

pub use vulkan_context::GpuContext;
pub use vulkan_device::VulkanGraphicsDevice;
pub use vulkan_swapchain::VulkanSwapchain;
pub use vulkan_buffer::VulkanBuffer;
pub use vulkan_texture::VulkanTexture;
pub use vulkan_pipeline::VulkanPipeline;
pub use vulkan_command_list::VulkanCommandList;
pub use vulkan_frame_slot::VulkanFrameSlot;

#[cfg(feature = "vulkan-validation")]
pub use debug::{get_validation_stats, print_validation_stats_report, DebugConfig};
