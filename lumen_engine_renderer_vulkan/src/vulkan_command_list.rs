/// VulkanCommandList - one primary command buffer with its own pool
///
/// Recording order is checked: commands outside `begin`/`end` and draw
/// state outside a render pass fail with `BackendError`.

use ash::vk;
use ash::vk::Handle;
use std::sync::Arc;

use lumen_engine::lumen::{Error, Result};
use lumen_engine::lumen::device::{
    CommandList, Buffer, Pipeline, IndexType, ShaderStageFlags, DescriptorSetHandle,
    RenderPassBegin, ClearValue, Viewport, Rect2D,
};
use lumen_engine::{engine_err, engine_error};

use crate::vulkan_context::GpuContext;
use crate::vulkan_format::{index_type_to_vk, stage_flags_to_vk};

pub struct VulkanCommandList {
    ctx: Arc<GpuContext>,
    command_pool: vk::CommandPool,
    command_buffer: vk::CommandBuffer,
    is_recording: bool,
    in_render_pass: bool,
}

impl VulkanCommandList {
    pub(crate) fn new(ctx: Arc<GpuContext>) -> Result<Self> {
        let pool_info = vk::CommandPoolCreateInfo::default()
            .queue_family_index(ctx.graphics_queue_family)
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);
        let command_pool = unsafe { ctx.device.create_command_pool(&pool_info, None) }
            .map_err(|e| engine_err!("lumen::vulkan", "Failed to create command pool: {:?}", e))?;

        let allocate_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(command_pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);
        let command_buffer = match unsafe { ctx.device.allocate_command_buffers(&allocate_info) } {
            Ok(buffers) => buffers[0],
            Err(e) => {
                unsafe { ctx.device.destroy_command_pool(command_pool, None) };
                return Err(engine_err!("lumen::vulkan", "Failed to allocate command buffer: {:?}", e));
            }
        };

        Ok(Self {
            ctx,
            command_pool,
            command_buffer,
            is_recording: false,
            in_render_pass: false,
        })
    }

    pub(crate) fn command_buffer(&self) -> vk::CommandBuffer {
        self.command_buffer
    }

    fn check_recording(&self, call: &str) -> Result<()> {
        if !self.is_recording {
            engine_error!("lumen::vulkan", "{} called while the command list is not recording", call);
            return Err(Error::BackendError(format!("{}: command list not recording", call)));
        }
        Ok(())
    }

    fn check_in_render_pass(&self, call: &str) -> Result<()> {
        self.check_recording(call)?;
        if !self.in_render_pass {
            engine_error!("lumen::vulkan", "{} called outside a render pass", call);
            return Err(Error::BackendError(format!("{}: no active render pass", call)));
        }
        Ok(())
    }
}

impl CommandList for VulkanCommandList {
    fn begin(&mut self) -> Result<()> {
        if self.is_recording {
            engine_error!("lumen::vulkan", "begin called while already recording");
            return Err(Error::BackendError("command list already recording".to_string()));
        }
        let begin_info = vk::CommandBufferBeginInfo::default()
            .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
        unsafe {
            self.ctx.device
                .reset_command_buffer(self.command_buffer, vk::CommandBufferResetFlags::empty())
                .map_err(|e| engine_err!("lumen::vulkan", "Failed to reset command buffer: {:?}", e))?;
            self.ctx.device
                .begin_command_buffer(self.command_buffer, &begin_info)
                .map_err(|e| engine_err!("lumen::vulkan", "Failed to begin command buffer: {:?}", e))?;
        }
        self.is_recording = true;
        self.in_render_pass = false;
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.check_recording("end")?;
        if self.in_render_pass {
            engine_error!("lumen::vulkan", "end called inside a render pass");
            return Err(Error::BackendError("end called inside a render pass".to_string()));
        }
        unsafe { self.ctx.device.end_command_buffer(self.command_buffer) }
            .map_err(|e| engine_err!("lumen::vulkan", "Failed to end command buffer: {:?}", e))?;
        self.is_recording = false;
        Ok(())
    }

    fn begin_render_pass(&mut self, info: &RenderPassBegin) -> Result<()> {
        self.check_recording("begin_render_pass")?;
        if self.in_render_pass {
            engine_error!("lumen::vulkan", "begin_render_pass called inside a render pass");
            return Err(Error::BackendError("render pass already active".to_string()));
        }

        let clear_values: Vec<vk::ClearValue> = info.clear_values
            .iter()
            .map(|value| match *value {
                ClearValue::Color(float32) => vk::ClearValue {
                    color: vk::ClearColorValue { float32 },
                },
                ClearValue::DepthStencil { depth, stencil } => vk::ClearValue {
                    depth_stencil: vk::ClearDepthStencilValue { depth, stencil },
                },
            })
            .collect();

        let begin_info = vk::RenderPassBeginInfo::default()
            .render_pass(vk::RenderPass::from_raw(info.render_pass))
            .framebuffer(vk::Framebuffer::from_raw(info.framebuffer))
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: vk::Extent2D { width: info.extent.width, height: info.extent.height },
            })
            .clear_values(&clear_values);

        unsafe {
            self.ctx.device.cmd_begin_render_pass(self.command_buffer, &begin_info, vk::SubpassContents::INLINE);
        }
        self.in_render_pass = true;
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        self.check_in_render_pass("end_render_pass")?;
        unsafe { self.ctx.device.cmd_end_render_pass(self.command_buffer) };
        self.in_render_pass = false;
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.check_recording("set_viewport")?;
        let vk_viewport = vk::Viewport {
            x: viewport.x,
            y: viewport.y,
            width: viewport.width,
            height: viewport.height,
            min_depth: viewport.min_depth,
            max_depth: viewport.max_depth,
        };
        unsafe { self.ctx.device.cmd_set_viewport(self.command_buffer, 0, &[vk_viewport]) };
        Ok(())
    }

    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()> {
        self.check_recording("set_scissor")?;
        let vk_scissor = vk::Rect2D {
            offset: vk::Offset2D { x: scissor.x, y: scissor.y },
            extent: vk::Extent2D { width: scissor.width, height: scissor.height },
        };
        unsafe { self.ctx.device.cmd_set_scissor(self.command_buffer, 0, &[vk_scissor]) };
        Ok(())
    }

    fn bind_pipeline(&mut self, pipeline: &dyn Pipeline) -> Result<()> {
        self.check_in_render_pass("bind_pipeline")?;
        unsafe {
            self.ctx.device.cmd_bind_pipeline(
                self.command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                vk::Pipeline::from_raw(pipeline.raw_handle()),
            );
        }
        Ok(())
    }

    fn bind_descriptor_sets(
        &mut self,
        pipeline: &dyn Pipeline,
        first_set: u32,
        sets: &[DescriptorSetHandle],
    ) -> Result<()> {
        self.check_recording("bind_descriptor_sets")?;
        let vk_sets: Vec<vk::DescriptorSet> = sets.iter().map(|s| vk::DescriptorSet::from_raw(s.0)).collect();
        unsafe {
            self.ctx.device.cmd_bind_descriptor_sets(
                self.command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                vk::PipelineLayout::from_raw(pipeline.layout_handle()),
                first_set,
                &vk_sets,
                &[],
            );
        }
        Ok(())
    }

    fn push_constants(
        &mut self,
        pipeline: &dyn Pipeline,
        stages: ShaderStageFlags,
        offset: u32,
        data: &[u8],
    ) -> Result<()> {
        self.check_recording("push_constants")?;
        unsafe {
            self.ctx.device.cmd_push_constants(
                self.command_buffer,
                vk::PipelineLayout::from_raw(pipeline.layout_handle()),
                stage_flags_to_vk(stages),
                offset,
                data,
            );
        }
        Ok(())
    }

    fn bind_vertex_buffer(&mut self, buffer: &dyn Buffer, offset: u64) -> Result<()> {
        self.check_recording("bind_vertex_buffer")?;
        unsafe {
            self.ctx.device.cmd_bind_vertex_buffers(
                self.command_buffer,
                0,
                &[vk::Buffer::from_raw(buffer.raw_handle())],
                &[offset],
            );
        }
        Ok(())
    }

    fn bind_index_buffer(&mut self, buffer: &dyn Buffer, offset: u64, index_type: IndexType) -> Result<()> {
        self.check_recording("bind_index_buffer")?;
        unsafe {
            self.ctx.device.cmd_bind_index_buffer(
                self.command_buffer,
                vk::Buffer::from_raw(buffer.raw_handle()),
                offset,
                index_type_to_vk(index_type),
            );
        }
        Ok(())
    }

    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()> {
        self.check_in_render_pass("draw")?;
        unsafe { self.ctx.device.cmd_draw(self.command_buffer, vertex_count, 1, first_vertex, 0) };
        Ok(())
    }

    fn draw_indexed(&mut self, index_count: u32, first_index: u32, vertex_offset: i32) -> Result<()> {
        self.check_in_render_pass("draw_indexed")?;
        unsafe {
            self.ctx.device.cmd_draw_indexed(self.command_buffer, index_count, 1, first_index, vertex_offset, 0);
        }
        Ok(())
    }
}

impl Drop for VulkanCommandList {
    fn drop(&mut self) {
        unsafe {
            // Destroying the pool frees its command buffer
            self.ctx.device.destroy_command_pool(self.command_pool, None);
        }
    }
}
