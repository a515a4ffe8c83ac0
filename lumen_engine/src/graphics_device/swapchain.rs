/// Swapchain trait - one generation of presentable images
///
/// A generation bundles the presentable images, one depth buffer per image,
/// one framebuffer per image and the render pass they are compatible with.
/// Recreation builds a new generation from the old one and drops the old
/// one; nothing is resized in place.

use crate::error::Result;
use crate::graphics_device::Format;

/// Size of a surface or swapchain in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Extent2D {
    pub width: u32,
    pub height: u32,
}

impl Extent2D {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when either side is zero (minimized window)
    pub fn is_zero(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Width divided by height (1.0 for degenerate extents)
    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

/// Result of acquiring a presentable image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// An image is available; `suboptimal` asks for recreation after present
    Acquired { image_index: u32, suboptimal: bool },
    /// The generation no longer matches the surface and must be recreated
    OutOfDate,
}

/// Result of presenting an image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentOutcome {
    Presented,
    Suboptimal,
    OutOfDate,
}

/// Swapchain generation
///
/// Acquire signals the image-available semaphore of the frame slot. Each
/// presentable image owns its render-finished semaphore, so a present still
/// pending on one image never shares a semaphore with a later submission.
pub trait Swapchain: Send + Sync {
    /// Acquire the next image, signaling `signal_semaphore` when it is ready
    ///
    /// Errors other than out-of-date/suboptimal are returned as `Err`.
    fn acquire_next_image(&mut self, signal_semaphore: u64) -> Result<AcquireOutcome>;

    /// Queue `image_index` for presentation once `wait_semaphore` is signaled
    fn present(&mut self, image_index: u32, wait_semaphore: u64) -> Result<PresentOutcome>;

    /// Color format of the presentable images
    fn image_format(&self) -> Format;

    /// Format of the per-image depth buffers
    fn depth_format(&self) -> Format;

    /// Size of the presentable images
    fn extent(&self) -> Extent2D;

    /// Number of presentable images
    fn image_count(&self) -> usize;

    /// Backend swapchain handle (the recreation hint)
    fn raw_handle(&self) -> u64;

    /// Backend render pass handle (pipelines are created against it)
    fn render_pass_handle(&self) -> u64;

    /// Backend framebuffer handle for one image
    fn framebuffer_handle(&self, image_index: u32) -> Option<u64>;

    /// Semaphore signaled by the submission rendering into `image_index`
    /// and waited on by its present
    fn render_finished_semaphore(&self, image_index: u32) -> Option<u64>;

    /// True when `other` has the same image and depth formats
    fn compare_formats(&self, other: &dyn Swapchain) -> bool {
        self.image_format() == other.image_format() && self.depth_format() == other.depth_format()
    }
}
