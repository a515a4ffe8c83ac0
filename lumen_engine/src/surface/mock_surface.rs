/// Mock PresentationSurface for unit tests
///
/// Drawable sizes are scripted: each `poll_events` pops the next size.

use std::collections::VecDeque;
use crate::graphics_device::Extent2D;
use crate::surface::PresentationSurface;

#[derive(Debug)]
pub struct MockSurface {
    pub size: Extent2D,
    /// Sizes reported after successive polls
    pub pending_sizes: VecDeque<Extent2D>,
    pub resized: bool,
    pub close_requested: bool,
    pub polls: u32,
    pub title: String,
}

impl MockSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: Extent2D::new(width, height),
            pending_sizes: VecDeque::new(),
            resized: false,
            close_requested: false,
            polls: 0,
            title: String::new(),
        }
    }

    /// Queue a size change that becomes visible on the next poll
    pub fn queue_size(&mut self, width: u32, height: u32) {
        self.pending_sizes.push_back(Extent2D::new(width, height));
    }
}

impl PresentationSurface for MockSurface {
    fn drawable_size(&self) -> Extent2D {
        self.size
    }

    fn was_resized(&self) -> bool {
        self.resized
    }

    fn reset_resized(&mut self) {
        self.resized = false;
    }

    fn poll_events(&mut self) {
        self.polls += 1;
        if let Some(size) = self.pending_sizes.pop_front() {
            self.size = size;
        }
    }

    fn should_close(&self) -> bool {
        self.close_requested
    }

    fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }
}
