/// DrawPass trait and the context passes are created against

use std::sync::Arc;

use crate::error::Result;
use crate::frame::{FrameInfo, GlobalUbo};
use crate::graphics_device::{GraphicsDevice, DescriptorSetLayoutHandle};

/// What a pass needs to build its pipeline
#[derive(Clone)]
pub struct PassContext {
    pub device: Arc<dyn GraphicsDevice>,
    /// Layout of the global set, bound at set 0 by every pass
    pub global_layout: DescriptorSetLayoutHandle,
    /// Render pass of the current swapchain generation
    pub render_pass: u64,
}

/// One stage of frame recording
pub trait DrawPass {
    fn name(&self) -> &str;

    /// Contribute to the frame's uniform block before it is uploaded
    fn update(&mut self, _frame: &FrameInfo, _ubo: &mut GlobalUbo) -> Result<()> {
        Ok(())
    }

    /// Record draw commands; called inside the render pass
    fn render(&mut self, frame: &mut FrameInfo) -> Result<()>;
}
