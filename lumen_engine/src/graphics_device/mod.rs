/// Graphics device module - backend-facing traits and types

// Module declarations
pub mod graphics_device;
pub mod texture;
pub mod buffer;
pub mod pipeline;
pub mod command_list;
pub mod swapchain;
pub mod frame_slot;
pub mod descriptor_set;

// Re-export everything from graphics_device.rs
pub use graphics_device::*;

// Re-export from other modules
pub use texture::*;
pub use buffer::*;
pub use pipeline::*;
pub use command_list::*;
pub use swapchain::*;
pub use frame_slot::*;
pub use descriptor_set::*;

// Mock graphics device for tests (no GPU required)
#[cfg(test)]
pub mod mock_graphics_device;
