/// VulkanFrameSlot - command list, in-flight fence and image-available semaphore
///
/// Render-finished semaphores belong to the swapchain images; `submit`
/// signals the one it is given.

use ash::vk;
use ash::vk::Handle;
use std::sync::Arc;

use lumen_engine::lumen::Result;
use lumen_engine::lumen::device::{CommandList, FrameSlot};
use lumen_engine::engine_err;

use crate::vulkan_command_list::VulkanCommandList;
use crate::vulkan_context::GpuContext;

pub struct VulkanFrameSlot {
    ctx: Arc<GpuContext>,
    index: usize,
    command_list: VulkanCommandList,
    in_flight: vk::Fence,
    image_available: vk::Semaphore,
}

impl VulkanFrameSlot {
    pub(crate) fn new(ctx: Arc<GpuContext>, index: usize) -> Result<Self> {
        let command_list = VulkanCommandList::new(Arc::clone(&ctx))?;

        let fence_info = vk::FenceCreateInfo::default().flags(vk::FenceCreateFlags::SIGNALED);
        let semaphore_info = vk::SemaphoreCreateInfo::default();

        unsafe {
            let in_flight = ctx.device.create_fence(&fence_info, None)
                .map_err(|e| engine_err!("lumen::vulkan", "Failed to create fence of slot {}: {:?}", index, e))?;
            let image_available = match ctx.device.create_semaphore(&semaphore_info, None) {
                Ok(semaphore) => semaphore,
                Err(e) => {
                    ctx.device.destroy_fence(in_flight, None);
                    return Err(engine_err!("lumen::vulkan", "Failed to create semaphore of slot {}: {:?}", index, e));
                }
            };

            Ok(Self {
                ctx,
                index,
                command_list,
                in_flight,
                image_available,
            })
        }
    }
}

impl FrameSlot for VulkanFrameSlot {
    fn index(&self) -> usize {
        self.index
    }

    fn wait(&self) -> Result<()> {
        unsafe { self.ctx.device.wait_for_fences(&[self.in_flight], true, u64::MAX) }
            .map_err(|e| engine_err!("lumen::vulkan", "Failed to wait for fence of slot {}: {:?}", self.index, e))
    }

    fn command_list(&mut self) -> &mut dyn CommandList {
        &mut self.command_list
    }

    fn submit(&mut self, signal_semaphore: u64) -> Result<()> {
        let wait_semaphores = [self.image_available];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let signal_semaphores = [vk::Semaphore::from_raw(signal_semaphore)];
        let command_buffers = [self.command_list.command_buffer()];

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            self.ctx.device.reset_fences(&[self.in_flight])
                .map_err(|e| engine_err!("lumen::vulkan", "Failed to reset fence of slot {}: {:?}", self.index, e))?;
            self.ctx.device.queue_submit(self.ctx.graphics_queue, &[submit_info], self.in_flight)
                .map_err(|e| engine_err!("lumen::vulkan", "Failed to submit slot {}: {:?}", self.index, e))
        }
    }

    fn image_available_semaphore(&self) -> u64 {
        self.image_available.as_raw()
    }
}

impl Drop for VulkanFrameSlot {
    fn drop(&mut self) {
        unsafe {
            // The slot's last submission may still be executing
            self.ctx.device.wait_for_fences(&[self.in_flight], true, u64::MAX).ok();
            self.ctx.device.destroy_semaphore(self.image_available, None);
            self.ctx.device.destroy_fence(self.in_flight, None);
        }
    }
}
