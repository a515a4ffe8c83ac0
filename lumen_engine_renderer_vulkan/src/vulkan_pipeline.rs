/// VulkanPipeline - graphics pipeline and its layout

use ash::vk;
use ash::vk::Handle;
use std::io::Cursor;
use std::sync::Arc;

use lumen_engine::lumen::{Error, Result};
use lumen_engine::lumen::device::{Pipeline, PipelineDesc};
use lumen_engine::{engine_err, engine_error};

use crate::vulkan_context::GpuContext;
use crate::vulkan_format::{
    buffer_format_to_vk, compare_op_to_vk, cull_mode_to_vk, stage_flags_to_vk, topology_to_vk,
};

pub struct VulkanPipeline {
    ctx: Arc<GpuContext>,
    pipeline: vk::Pipeline,
    layout: vk::PipelineLayout,
}

/// Wrap SPIR-V bytes in a shader module
fn create_shader_module(ctx: &GpuContext, stage: &str, code: &[u8]) -> Result<vk::ShaderModule> {
    let words = ash::util::read_spv(&mut Cursor::new(code)).map_err(|e| {
        engine_error!("lumen::vulkan", "Invalid SPIR-V for {} shader: {}", stage, e);
        Error::InvalidResource(format!("invalid SPIR-V for {} shader: {}", stage, e))
    })?;
    let create_info = vk::ShaderModuleCreateInfo::default().code(&words);
    unsafe { ctx.device.create_shader_module(&create_info, None) }
        .map_err(|e| engine_err!("lumen::vulkan", "Failed to create {} shader module: {:?}", stage, e))
}

impl VulkanPipeline {
    pub(crate) fn new(ctx: Arc<GpuContext>, desc: &PipelineDesc) -> Result<Self> {
        let set_layouts: Vec<vk::DescriptorSetLayout> = desc.set_layouts
            .iter()
            .map(|h| vk::DescriptorSetLayout::from_raw(h.0))
            .collect();
        let push_ranges: Vec<vk::PushConstantRange> = desc.push_constant_ranges
            .iter()
            .map(|r| vk::PushConstantRange {
                stage_flags: stage_flags_to_vk(r.stages),
                offset: r.offset,
                size: r.size,
            })
            .collect();
        let layout_info = vk::PipelineLayoutCreateInfo::default()
            .set_layouts(&set_layouts)
            .push_constant_ranges(&push_ranges);
        let layout = unsafe { ctx.device.create_pipeline_layout(&layout_info, None) }
            .map_err(|e| engine_err!("lumen::vulkan", "Failed to create pipeline layout: {:?}", e))?;

        match Self::create_pipeline(&ctx, desc, layout) {
            Ok(pipeline) => Ok(Self { ctx, pipeline, layout }),
            Err(e) => {
                unsafe { ctx.device.destroy_pipeline_layout(layout, None) };
                Err(e)
            }
        }
    }

    fn create_pipeline(ctx: &GpuContext, desc: &PipelineDesc, layout: vk::PipelineLayout) -> Result<vk::Pipeline> {
        let vertex_module = create_shader_module(ctx, "vertex", &desc.vertex_shader)?;
        let fragment_module = match create_shader_module(ctx, "fragment", &desc.fragment_shader) {
            Ok(module) => module,
            Err(e) => {
                unsafe { ctx.device.destroy_shader_module(vertex_module, None) };
                return Err(e);
            }
        };

        let result = Self::build(ctx, desc, layout, vertex_module, fragment_module);

        // Modules are not needed once the pipeline exists
        unsafe {
            ctx.device.destroy_shader_module(vertex_module, None);
            ctx.device.destroy_shader_module(fragment_module, None);
        }
        result
    }

    fn build(
        ctx: &GpuContext,
        desc: &PipelineDesc,
        layout: vk::PipelineLayout,
        vertex_module: vk::ShaderModule,
        fragment_module: vk::ShaderModule,
    ) -> Result<vk::Pipeline> {
        let stages = [
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::VERTEX)
                .module(vertex_module)
                .name(c"main"),
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::FRAGMENT)
                .module(fragment_module)
                .name(c"main"),
        ];

        let bindings: Vec<vk::VertexInputBindingDescription> = desc.vertex_layout.bindings
            .iter()
            .map(|b| vk::VertexInputBindingDescription {
                binding: b.binding,
                stride: b.stride,
                input_rate: vk::VertexInputRate::VERTEX,
            })
            .collect();
        let attributes: Vec<vk::VertexInputAttributeDescription> = desc.vertex_layout.attributes
            .iter()
            .map(|a| vk::VertexInputAttributeDescription {
                location: a.location,
                binding: a.binding,
                format: buffer_format_to_vk(a.format),
                offset: a.offset,
            })
            .collect();
        let vertex_input_state = vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_binding_descriptions(&bindings)
            .vertex_attribute_descriptions(&attributes);

        let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(topology_to_vk(desc.topology))
            .primitive_restart_enable(false);

        // Viewport and scissor are dynamic
        let viewports = [vk::Viewport::default()];
        let scissors = [vk::Rect2D::default()];
        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewports(&viewports)
            .scissors(&scissors);

        let rasterization_state = vk::PipelineRasterizationStateCreateInfo::default()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(vk::PolygonMode::FILL)
            .line_width(1.0)
            .cull_mode(cull_mode_to_vk(desc.cull_mode))
            .front_face(vk::FrontFace::CLOCKWISE)
            .depth_bias_enable(false);

        let depth_stencil_state = vk::PipelineDepthStencilStateCreateInfo::default()
            .depth_test_enable(desc.depth.test_enable)
            .depth_write_enable(desc.depth.write_enable)
            .depth_compare_op(compare_op_to_vk(desc.depth.compare_op))
            .depth_bounds_test_enable(false)
            .stencil_test_enable(false);

        let multisample_state = vk::PipelineMultisampleStateCreateInfo::default()
            .sample_shading_enable(false)
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);

        let mut blend_attachment = vk::PipelineColorBlendAttachmentState::default()
            .color_write_mask(vk::ColorComponentFlags::RGBA)
            .blend_enable(desc.alpha_blend);
        if desc.alpha_blend {
            blend_attachment = blend_attachment
                .src_color_blend_factor(vk::BlendFactor::SRC_ALPHA)
                .dst_color_blend_factor(vk::BlendFactor::ONE_MINUS_SRC_ALPHA)
                .color_blend_op(vk::BlendOp::ADD)
                .src_alpha_blend_factor(vk::BlendFactor::ONE)
                .dst_alpha_blend_factor(vk::BlendFactor::ZERO)
                .alpha_blend_op(vk::BlendOp::ADD);
        }
        let blend_attachments = [blend_attachment];
        let color_blend_state = vk::PipelineColorBlendStateCreateInfo::default()
            .logic_op_enable(false)
            .attachments(&blend_attachments);

        let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
        let dynamic_state = vk::PipelineDynamicStateCreateInfo::default()
            .dynamic_states(&dynamic_states);

        let create_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&stages)
            .vertex_input_state(&vertex_input_state)
            .input_assembly_state(&input_assembly_state)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization_state)
            .multisample_state(&multisample_state)
            .depth_stencil_state(&depth_stencil_state)
            .color_blend_state(&color_blend_state)
            .dynamic_state(&dynamic_state)
            .layout(layout)
            .render_pass(vk::RenderPass::from_raw(desc.render_pass))
            .subpass(0);

        let pipelines = unsafe {
            ctx.device.create_graphics_pipelines(vk::PipelineCache::null(), &[create_info], None)
        }
        .map_err(|(_, e)| engine_err!("lumen::vulkan", "Failed to create graphics pipeline: {:?}", e))?;

        pipelines
            .into_iter()
            .next()
            .ok_or_else(|| engine_err!("lumen::vulkan", "Driver returned no pipeline"))
    }
}

impl Pipeline for VulkanPipeline {
    fn raw_handle(&self) -> u64 {
        self.pipeline.as_raw()
    }

    fn layout_handle(&self) -> u64 {
        self.layout.as_raw()
    }
}

impl Drop for VulkanPipeline {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_pipeline(self.pipeline, None);
            self.ctx.device.destroy_pipeline_layout(self.layout, None);
        }
    }
}
