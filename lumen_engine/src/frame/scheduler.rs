/// FrameScheduler - begin/end frame protocol and swapchain recreation
///
/// One scheduler drives `MAX_FRAMES_IN_FLIGHT` frame slots round-robin
/// against the current swapchain generation:
///
/// ```text
/// Idle --begin_frame--> FrameAcquired --begin_render_pass--> RenderPassActive
///   ^                                                              |
///   +------end_frame------ RenderPassEnded <--end_render_pass------+
/// ```
///
/// A call made in the wrong state returns `Error::InvalidFrameState` and
/// changes nothing. `abort_frame` brings a failed frame back to `Idle`.
/// The protocol is single-threaded and not reentrant.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, MAX_FRAMES_IN_FLIGHT};
use crate::error::{Error, Result};
use crate::graphics_device::{
    GraphicsDevice, FrameSlot, Swapchain, CommandList, Extent2D, Format,
    AcquireOutcome, PresentOutcome, RenderPassBegin, ClearValue, Viewport, Rect2D,
};
use crate::surface::PresentationSurface;
use crate::{engine_debug, engine_error, engine_info, engine_warn, engine_warn_err, engine_err};

/// Position of the scheduler in the frame protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    Idle,
    FrameAcquired,
    RenderPassActive,
    RenderPassEnded,
}

pub struct FrameScheduler {
    device: Arc<dyn GraphicsDevice>,
    slots: Vec<Box<dyn FrameSlot>>,
    swapchain: Box<dyn Swapchain>,
    /// Incremented on every recreation, starts at 0
    generation: u64,
    /// Presentable image -> frame slot whose submission last used it
    images_in_flight: Vec<Option<usize>>,
    frame_index: usize,
    current_image: u32,
    state: FrameState,
    /// Acquire reported suboptimal, recreate after present
    recreate_after_present: bool,
    clear_color: [f32; 4],
    resize_poll_interval: Duration,
}

impl FrameScheduler {
    /// Create the frame slots and the first swapchain generation
    ///
    /// Blocks while the surface reports a zero drawable size.
    pub fn new(
        device: Arc<dyn GraphicsDevice>,
        config: &Config,
        surface: &mut dyn PresentationSurface,
    ) -> Result<Self> {
        let slots = (0..MAX_FRAMES_IN_FLIGHT)
            .map(|index| device.create_frame_slot(index))
            .collect::<Result<Vec<_>>>()?;

        let swapchain = match create_generation(device.as_ref(), surface, config.resize_poll_interval, None)? {
            Some(swapchain) => swapchain,
            None => {
                engine_error!("lumen::frame", "Surface closed before it had a drawable size");
                return Err(Error::InitializationFailed(
                    "surface closed before it had a drawable size".to_string(),
                ));
            }
        };

        engine_info!("lumen::frame", "Swapchain created: {}x{}, {} images, {:?}/{:?}",
            swapchain.extent().width, swapchain.extent().height,
            swapchain.image_count(), swapchain.image_format(), swapchain.depth_format());

        Ok(Self {
            images_in_flight: vec![None; swapchain.image_count()],
            device,
            slots,
            swapchain,
            generation: 0,
            frame_index: 0,
            current_image: 0,
            state: FrameState::Idle,
            recreate_after_present: false,
            clear_color: config.clear_color,
            resize_poll_interval: config.resize_poll_interval,
        })
    }

    // ===== FRAME PROTOCOL =====

    /// Acquire an image and start recording the current slot
    ///
    /// Returns `Ok(None)` when the swapchain was out of date; it has been
    /// recreated and the caller should skip this iteration.
    pub fn begin_frame(&mut self, surface: &mut dyn PresentationSurface) -> Result<Option<usize>> {
        self.expect_state(FrameState::Idle, "begin_frame")?;

        let slot = &self.slots[self.frame_index];
        // The fence is only reset by submit, so this wait never blocks on a skipped frame
        slot.wait()?;
        let image_available = slot.image_available_semaphore();

        let image_index = match self.swapchain.acquire_next_image(image_available)? {
            AcquireOutcome::OutOfDate => {
                engine_debug!("lumen::frame", "Acquire reported out of date, recreating");
                self.recreate(surface)?;
                return Ok(None);
            }
            AcquireOutcome::Acquired { image_index, suboptimal } => {
                if suboptimal {
                    self.recreate_after_present = true;
                }
                image_index
            }
        };

        let owner = match self.images_in_flight.get_mut(image_index as usize) {
            Some(owner) => owner,
            None => {
                return Err(engine_err!("lumen::frame",
                    "Acquired image {} but the swapchain has {} images",
                    image_index, self.swapchain.image_count()));
            }
        };
        let previous_owner = owner.replace(self.frame_index);
        if let Some(other) = previous_owner {
            if other != self.frame_index {
                self.slots[other].wait()?;
            }
        }

        self.slots[self.frame_index].command_list().begin()?;
        self.current_image = image_index;
        self.state = FrameState::FrameAcquired;
        Ok(Some(self.frame_index))
    }

    /// Begin the generation's render pass over the acquired framebuffer
    ///
    /// Also sets a full-extent viewport and scissor.
    pub fn begin_render_pass(&mut self) -> Result<()> {
        self.expect_state(FrameState::FrameAcquired, "begin_render_pass")?;

        let framebuffer = match self.swapchain.framebuffer_handle(self.current_image) {
            Some(framebuffer) => framebuffer,
            None => {
                return Err(engine_err!("lumen::frame",
                    "No framebuffer for swapchain image {}", self.current_image));
            }
        };
        let extent = self.swapchain.extent();
        let begin = RenderPassBegin {
            render_pass: self.swapchain.render_pass_handle(),
            framebuffer,
            extent,
            clear_values: vec![
                ClearValue::Color(self.clear_color),
                ClearValue::DepthStencil { depth: 1.0, stencil: 0 },
            ],
        };

        let command_list = self.slots[self.frame_index].command_list();
        command_list.begin_render_pass(&begin)?;
        command_list.set_viewport(Viewport::full(extent))?;
        command_list.set_scissor(Rect2D::full(extent))?;

        self.state = FrameState::RenderPassActive;
        Ok(())
    }

    pub fn end_render_pass(&mut self) -> Result<()> {
        self.expect_state(FrameState::RenderPassActive, "end_render_pass")?;
        self.slots[self.frame_index].command_list().end_render_pass()?;
        self.state = FrameState::RenderPassEnded;
        Ok(())
    }

    /// Submit the recorded slot and present the acquired image
    ///
    /// The frame index advances even when submission or presentation fails.
    pub fn end_frame(&mut self, surface: &mut dyn PresentationSurface) -> Result<()> {
        self.expect_state(FrameState::RenderPassEnded, "end_frame")?;

        let result = self.submit_and_present(surface);
        self.frame_index = (self.frame_index + 1) % MAX_FRAMES_IN_FLIGHT;
        self.state = FrameState::Idle;
        result
    }

    /// Finish a frame whose recording failed
    ///
    /// Closes or opens-and-closes the render pass as needed, then submits
    /// and presents like `end_frame` so the acquired image and its
    /// semaphore are released and the slot advances. Does nothing when no
    /// frame is in progress.
    pub fn abort_frame(&mut self, surface: &mut dyn PresentationSurface) -> Result<()> {
        if self.state == FrameState::Idle {
            return Ok(());
        }
        engine_warn!("lumen::frame", "Aborting frame {} in state {:?}", self.frame_index, self.state);

        // The image must still reach the present layout through the render pass
        if self.state == FrameState::FrameAcquired {
            self.begin_render_pass()?;
        }
        if self.state == FrameState::RenderPassActive {
            self.end_render_pass()?;
        }
        self.end_frame(surface)
    }

    fn submit_and_present(&mut self, surface: &mut dyn PresentationSurface) -> Result<()> {
        let render_finished = match self.swapchain.render_finished_semaphore(self.current_image) {
            Some(semaphore) => semaphore,
            None => {
                return Err(engine_err!("lumen::frame",
                    "No render-finished semaphore for swapchain image {}", self.current_image));
            }
        };

        let slot = &mut self.slots[self.frame_index];
        slot.command_list().end()?;
        slot.submit(render_finished)?;

        let outcome = self.swapchain.present(self.current_image, render_finished)?;

        let stale = matches!(outcome, PresentOutcome::OutOfDate | PresentOutcome::Suboptimal);
        if stale || self.recreate_after_present || surface.was_resized() {
            surface.reset_resized();
            self.recreate_after_present = false;
            self.recreate(surface)?;
        }
        Ok(())
    }

    /// Command list of the frame being recorded
    pub fn command_list(&mut self) -> Result<&mut dyn CommandList> {
        if self.state == FrameState::Idle {
            return Err(engine_warn_err!("lumen::frame",
                Error::InvalidFrameState("command_list requested outside a frame".to_string()),
                "command_list requested outside a frame"));
        }
        Ok(self.slots[self.frame_index].command_list())
    }

    // ===== SWAPCHAIN RECREATION =====

    /// Recreate the swapchain between frames
    ///
    /// Returns `Ok(false)` when the surface closed while minimized and no
    /// new generation was built.
    pub fn recreate_swapchain(&mut self, surface: &mut dyn PresentationSurface) -> Result<bool> {
        self.expect_state(FrameState::Idle, "recreate_swapchain")?;
        self.recreate(surface)
    }

    fn recreate(&mut self, surface: &mut dyn PresentationSurface) -> Result<bool> {
        if wait_for_drawable(surface, self.resize_poll_interval).is_none() {
            engine_debug!("lumen::frame", "Surface closed while minimized, skipping recreation");
            return Ok(false);
        }

        self.device.wait_idle()?;

        let previous = Some(self.swapchain.as_ref());
        let swapchain = match create_generation(self.device.as_ref(), surface, self.resize_poll_interval, previous)? {
            Some(swapchain) => swapchain,
            None => {
                engine_debug!("lumen::frame", "Surface closed while minimized, skipping recreation");
                return Ok(false);
            }
        };
        let extent = swapchain.extent();
        if !swapchain.compare_formats(self.swapchain.as_ref()) {
            let message = format!(
                "swapchain formats changed from {:?}/{:?} to {:?}/{:?}",
                self.swapchain.image_format(), self.swapchain.depth_format(),
                swapchain.image_format(), swapchain.depth_format()
            );
            engine_error!("lumen::frame", "{}", message);
            return Err(Error::SwapchainFormatMismatch(message));
        }

        self.images_in_flight = vec![None; swapchain.image_count()];
        self.swapchain = swapchain;
        self.generation += 1;

        engine_debug!("lumen::frame", "Swapchain generation {} ({}x{})",
            self.generation, extent.width, extent.height);
        Ok(true)
    }

    fn expect_state(&self, expected: FrameState, call: &str) -> Result<()> {
        if self.state != expected {
            let message = format!("{} called in state {:?}, expected {:?}", call, self.state, expected);
            return Err(engine_warn_err!("lumen::frame",
                Error::InvalidFrameState(message.clone()), "{}", message));
        }
        Ok(())
    }

    // ===== ACCESSORS =====

    pub fn state(&self) -> FrameState {
        self.state
    }

    /// Slot index of the frame being (or about to be) recorded
    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    /// Swapchain image acquired by the last `begin_frame`
    pub fn current_image(&self) -> u32 {
        self.current_image
    }

    /// Swapchain generation number
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn swapchain(&self) -> &dyn Swapchain {
        self.swapchain.as_ref()
    }

    pub fn extent(&self) -> Extent2D {
        self.swapchain.extent()
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.swapchain.extent().aspect_ratio()
    }

    pub fn image_format(&self) -> Format {
        self.swapchain.image_format()
    }

    pub fn depth_format(&self) -> Format {
        self.swapchain.depth_format()
    }

    /// Render pass of the current generation
    pub fn render_pass_handle(&self) -> u64 {
        self.swapchain.render_pass_handle()
    }
}

/// Build a swapchain generation once the surface can be presented to
///
/// Keeps waiting while the device reports a zero surface extent even though
/// the window reported a drawable size. Returns `None` if the surface asks
/// to close first.
fn create_generation(
    device: &dyn GraphicsDevice,
    surface: &mut dyn PresentationSurface,
    interval: Duration,
    previous: Option<&dyn Swapchain>,
) -> Result<Option<Box<dyn Swapchain>>> {
    loop {
        let extent = match wait_for_drawable(surface, interval) {
            Some(extent) => extent,
            None => return Ok(None),
        };
        if let Some(swapchain) = device.create_swapchain(extent, previous)? {
            return Ok(Some(swapchain));
        }
        engine_debug!("lumen::frame", "Surface extent not ready for {}x{}, waiting", extent.width, extent.height);
        if surface.should_close() {
            return Ok(None);
        }
        surface.poll_events();
        std::thread::sleep(interval);
    }
}

/// Block until the surface has a non-zero drawable size
///
/// Returns `None` if the surface asks to close while minimized.
fn wait_for_drawable(surface: &mut dyn PresentationSurface, interval: Duration) -> Option<Extent2D> {
    loop {
        let extent = surface.drawable_size();
        if !extent.is_zero() {
            return Some(extent);
        }
        if surface.should_close() {
            return None;
        }
        surface.poll_events();
        if surface.drawable_size().is_zero() {
            std::thread::sleep(interval);
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
