/// Presentation surface - OS window and resize signaling

pub mod winit_surface;

pub use winit_surface::WinitSurface;

#[cfg(test)]
pub mod mock_surface;

use crate::graphics_device::Extent2D;

/// Window the swapchain presents to
///
/// The frame scheduler polls it once per frame and while waiting out a
/// minimized window; `was_resized` is cleared by the scheduler after it has
/// recreated the swapchain.
pub trait PresentationSurface {
    /// Current drawable size in pixels (zero while minimized)
    fn drawable_size(&self) -> Extent2D;

    /// True when the window was resized since the last `reset_resized`
    fn was_resized(&self) -> bool;

    fn reset_resized(&mut self);

    /// Process pending OS events without blocking
    fn poll_events(&mut self);

    /// True once the user asked to close the window
    fn should_close(&self) -> bool;

    /// Update the window title
    fn set_title(&mut self, _title: &str) {}
}
