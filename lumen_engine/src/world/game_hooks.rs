/// GameHooks - game-side extension points of the frame loop

use crate::error::Result;
use crate::frame::{FrameInfo, GlobalUbo};
use crate::pass::DrawPass;
use crate::world::World;

/// Callbacks `World` invokes each frame
///
/// Call order within one frame:
///
/// ```text
/// on_frame_begin -> [begin frame] -> passes.update -> on_update
///     -> [upload UBO, begin render pass] -> passes.render -> on_render
///     -> [end render pass, end frame]
/// ```
///
/// `create_passes` runs once, when `World::run` starts. When the swapchain
/// is out of date at acquire time the frame is skipped after
/// `on_frame_begin`.
pub trait GameHooks {
    /// Build the draw passes, in recording order
    fn create_passes(&mut self, world: &World) -> Result<Vec<Box<dyn DrawPass>>>;

    /// Move objects, the camera or lighting before the frame starts
    fn on_frame_begin(&mut self, _world: &mut World, _delta_time: f32) -> Result<()> {
        Ok(())
    }

    /// Adjust the uniform block after every pass has updated it
    fn on_update(&mut self, _frame: &FrameInfo, _ubo: &mut GlobalUbo) -> Result<()> {
        Ok(())
    }

    /// Record extra commands after the passes, inside the render pass
    fn on_render(&mut self, _frame: &mut FrameInfo) -> Result<()> {
        Ok(())
    }
}
