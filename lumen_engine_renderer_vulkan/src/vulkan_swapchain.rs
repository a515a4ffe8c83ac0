/// VulkanSwapchain - one swapchain generation
///
/// Owns the presentable image views, one depth buffer per image, the render
/// pass, one framebuffer per image and one render-finished semaphore per
/// image. The surface belongs to `GpuContext`
/// and outlives every generation.

use ash::vk;
use ash::vk::Handle;
use gpu_allocator::vulkan::Allocation;
use std::sync::Arc;

use lumen_engine::lumen::{Error, Result};
use lumen_engine::lumen::device::{Swapchain, Extent2D, Format, AcquireOutcome, PresentOutcome};
use lumen_engine::{engine_debug, engine_err, engine_error};

use crate::vulkan_context::GpuContext;
use crate::vulkan_format::{depth_aspect, format_to_vk, vk_to_format};
use crate::vulkan_texture::{create_image, create_image_view};

/// Depth formats in order of preference
const DEPTH_CANDIDATES: [Format; 3] = [
    Format::D32_FLOAT,
    Format::D32_FLOAT_S8_UINT,
    Format::D24_UNORM_S8_UINT,
];

struct DepthBuffer {
    image: vk::Image,
    view: vk::ImageView,
    allocation: Option<Allocation>,
}

pub struct VulkanSwapchain {
    ctx: Arc<GpuContext>,
    swapchain: vk::SwapchainKHR,
    image_views: Vec<vk::ImageView>,
    depth_buffers: Vec<DepthBuffer>,
    render_pass: vk::RenderPass,
    framebuffers: Vec<vk::Framebuffer>,
    /// Signaled by the submission for an image, waited on by its present
    render_finished: Vec<vk::Semaphore>,
    image_format: Format,
    depth_format: Format,
    extent: Extent2D,
}

fn init_failed(what: &str, error: vk::Result) -> Error {
    engine_error!("lumen::vulkan", "{}: {:?}", what, error);
    Error::InitializationFailed(format!("{}: {:?}", what, error))
}

/// Pick the surface format, keeping `preferred` when the surface still offers it
pub(crate) fn choose_surface_format(
    available: &[vk::SurfaceFormatKHR],
    preferred: Option<Format>,
) -> Option<(vk::SurfaceFormatKHR, Format)> {
    let usable = |f: &vk::SurfaceFormatKHR| vk_to_format(f.format).map(|format| (*f, format));

    if let Some(preferred) = preferred {
        let wanted = format_to_vk(preferred);
        if let Some(found) = available.iter().find(|f| f.format == wanted).and_then(usable) {
            return Some(found);
        }
    }

    available
        .iter()
        .find(|f| {
            f.format == vk::Format::B8G8R8A8_SRGB && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
        })
        .or_else(|| available.iter().find(|f| f.format == vk::Format::R8G8B8A8_SRGB))
        .and_then(usable)
        .or_else(|| available.iter().find_map(usable))
}

/// FIFO with vsync; otherwise MAILBOX when offered, FIFO as the fallback
pub(crate) fn choose_present_mode(available: &[vk::PresentModeKHR], vsync: bool) -> vk::PresentModeKHR {
    if !vsync && available.contains(&vk::PresentModeKHR::MAILBOX) {
        vk::PresentModeKHR::MAILBOX
    } else {
        vk::PresentModeKHR::FIFO
    }
}

/// Surface-mandated extent, or the requested one clamped to the surface limits
pub(crate) fn choose_extent(capabilities: &vk::SurfaceCapabilitiesKHR, requested: Extent2D) -> Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return Extent2D::new(capabilities.current_extent.width, capabilities.current_extent.height);
    }
    Extent2D::new(
        requested.width.clamp(capabilities.min_image_extent.width, capabilities.max_image_extent.width),
        requested.height.clamp(capabilities.min_image_extent.height, capabilities.max_image_extent.height),
    )
}

/// One more than the minimum, within the maximum (0 means unbounded)
pub(crate) fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let count = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 {
        count.min(capabilities.max_image_count)
    } else {
        count
    }
}

impl VulkanSwapchain {
    /// Build a generation, or `None` while the surface mandates a zero extent
    pub(crate) fn new(
        ctx: Arc<GpuContext>,
        requested: Extent2D,
        previous: Option<&dyn Swapchain>,
        vsync: bool,
    ) -> Result<Option<Self>> {
        let (capabilities, formats, present_modes) = unsafe {
            let loader = &ctx.surface_loader;
            (
                loader.get_physical_device_surface_capabilities(ctx.physical_device, ctx.surface)
                    .map_err(|e| init_failed("Failed to query surface capabilities", e))?,
                loader.get_physical_device_surface_formats(ctx.physical_device, ctx.surface)
                    .map_err(|e| init_failed("Failed to query surface formats", e))?,
                loader.get_physical_device_surface_present_modes(ctx.physical_device, ctx.surface)
                    .map_err(|e| init_failed("Failed to query present modes", e))?,
            )
        };

        let (surface_format, image_format) =
            choose_surface_format(&formats, previous.map(|p| p.image_format())).ok_or_else(|| {
                engine_error!("lumen::vulkan", "No supported surface format among {} offered", formats.len());
                Error::InitializationFailed("no supported surface format".to_string())
            })?;
        let depth_format = Self::choose_depth_format(&ctx)?;
        let present_mode = choose_present_mode(&present_modes, vsync);
        let extent = choose_extent(&capabilities, requested);
        if extent.is_zero() {
            engine_debug!("lumen::vulkan", "Surface extent is {}x{}, deferring swapchain creation",
                extent.width, extent.height);
            return Ok(None);
        }

        let old_swapchain = previous
            .map(|p| vk::SwapchainKHR::from_raw(p.raw_handle()))
            .unwrap_or_else(vk::SwapchainKHR::null);

        let queue_families = [ctx.graphics_queue_family];
        let create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(ctx.surface)
            .min_image_count(choose_image_count(&capabilities))
            .image_format(surface_format.format)
            .image_color_space(surface_format.color_space)
            .image_extent(vk::Extent2D { width: extent.width, height: extent.height })
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .queue_family_indices(&queue_families)
            .pre_transform(capabilities.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode)
            .clipped(true)
            .old_swapchain(old_swapchain);

        let swapchain = unsafe { ctx.swapchain_loader.create_swapchain(&create_info, None) }
            .map_err(|e| init_failed("Failed to create swapchain", e))?;

        // From here on, Drop releases whatever was created
        let mut generation = Self {
            ctx,
            swapchain,
            image_views: Vec::new(),
            depth_buffers: Vec::new(),
            render_pass: vk::RenderPass::null(),
            framebuffers: Vec::new(),
            render_finished: Vec::new(),
            image_format,
            depth_format,
            extent,
        };
        generation.create_attachments(surface_format.format)?;

        engine_debug!("lumen::vulkan", "Swapchain {}x{} {:?} ({:?}), {} images",
            extent.width, extent.height, image_format, present_mode, generation.image_views.len());
        Ok(Some(generation))
    }

    fn choose_depth_format(ctx: &GpuContext) -> Result<Format> {
        DEPTH_CANDIDATES
            .iter()
            .copied()
            .find(|&format| {
                let properties = unsafe {
                    ctx.instance.get_physical_device_format_properties(ctx.physical_device, format_to_vk(format))
                };
                properties
                    .optimal_tiling_features
                    .contains(vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT)
            })
            .ok_or_else(|| {
                engine_error!("lumen::vulkan", "No supported depth format");
                Error::InitializationFailed("no supported depth format".to_string())
            })
    }

    fn create_attachments(&mut self, color_format: vk::Format) -> Result<()> {
        let images = unsafe { self.ctx.swapchain_loader.get_swapchain_images(self.swapchain) }
            .map_err(|e| init_failed("Failed to get swapchain images", e))?;

        for &image in &images {
            let view = create_image_view(&self.ctx, image, color_format, vk::ImageAspectFlags::COLOR)?;
            self.image_views.push(view);
        }

        let depth_vk = format_to_vk(self.depth_format);
        for _ in &images {
            let gpu_image = create_image(
                &self.ctx,
                "swapchain_depth",
                self.extent,
                depth_vk,
                vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT,
            )?;
            let mut depth = DepthBuffer {
                image: gpu_image.image,
                view: vk::ImageView::null(),
                allocation: Some(gpu_image.allocation),
            };
            let view = create_image_view(&self.ctx, depth.image, depth_vk, depth_aspect(self.depth_format));
            match view {
                Ok(view) => depth.view = view,
                Err(e) => {
                    self.depth_buffers.push(depth);
                    return Err(e);
                }
            }
            self.depth_buffers.push(depth);
        }

        self.render_pass = self.create_render_pass(color_format, depth_vk)?;

        for (color_view, depth) in self.image_views.iter().zip(&self.depth_buffers) {
            let attachments = [*color_view, depth.view];
            let create_info = vk::FramebufferCreateInfo::default()
                .render_pass(self.render_pass)
                .attachments(&attachments)
                .width(self.extent.width)
                .height(self.extent.height)
                .layers(1);
            let framebuffer = unsafe { self.ctx.device.create_framebuffer(&create_info, None) }
                .map_err(|e| engine_err!("lumen::vulkan", "Failed to create framebuffer: {:?}", e))?;
            self.framebuffers.push(framebuffer);
        }

        let semaphore_info = vk::SemaphoreCreateInfo::default();
        for index in 0..images.len() {
            let semaphore = unsafe { self.ctx.device.create_semaphore(&semaphore_info, None) }
                .map_err(|e| engine_err!("lumen::vulkan",
                    "Failed to create render-finished semaphore of image {}: {:?}", index, e))?;
            self.render_finished.push(semaphore);
        }
        Ok(())
    }

    fn create_render_pass(&self, color_format: vk::Format, depth_format: vk::Format) -> Result<vk::RenderPass> {
        let attachments = [
            vk::AttachmentDescription::default()
                .format(color_format)
                .samples(vk::SampleCountFlags::TYPE_1)
                .load_op(vk::AttachmentLoadOp::CLEAR)
                .store_op(vk::AttachmentStoreOp::STORE)
                .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                .initial_layout(vk::ImageLayout::UNDEFINED)
                .final_layout(vk::ImageLayout::PRESENT_SRC_KHR),
            vk::AttachmentDescription::default()
                .format(depth_format)
                .samples(vk::SampleCountFlags::TYPE_1)
                .load_op(vk::AttachmentLoadOp::CLEAR)
                .store_op(vk::AttachmentStoreOp::DONT_CARE)
                .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                .initial_layout(vk::ImageLayout::UNDEFINED)
                .final_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL),
        ];

        let color_refs = [vk::AttachmentReference {
            attachment: 0,
            layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        }];
        let depth_ref = vk::AttachmentReference {
            attachment: 1,
            layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        };
        let subpasses = [vk::SubpassDescription::default()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(&color_refs)
            .depth_stencil_attachment(&depth_ref)];

        let stages = vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
            | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS;
        let dependencies = [vk::SubpassDependency::default()
            .src_subpass(vk::SUBPASS_EXTERNAL)
            .dst_subpass(0)
            .src_stage_mask(stages)
            .src_access_mask(vk::AccessFlags::empty())
            .dst_stage_mask(stages)
            .dst_access_mask(
                vk::AccessFlags::COLOR_ATTACHMENT_WRITE | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
            )];

        let create_info = vk::RenderPassCreateInfo::default()
            .attachments(&attachments)
            .subpasses(&subpasses)
            .dependencies(&dependencies);

        unsafe { self.ctx.device.create_render_pass(&create_info, None) }
            .map_err(|e| engine_err!("lumen::vulkan", "Failed to create render pass: {:?}", e))
    }
}

impl Swapchain for VulkanSwapchain {
    fn acquire_next_image(&mut self, signal_semaphore: u64) -> Result<AcquireOutcome> {
        let acquired = unsafe {
            self.ctx.swapchain_loader.acquire_next_image(
                self.swapchain,
                u64::MAX,
                vk::Semaphore::from_raw(signal_semaphore),
                vk::Fence::null(),
            )
        };
        match acquired {
            Ok((image_index, suboptimal)) => Ok(AcquireOutcome::Acquired { image_index, suboptimal }),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(AcquireOutcome::OutOfDate),
            Err(e) => Err(engine_err!("lumen::vulkan", "Failed to acquire swapchain image: {:?}", e)),
        }
    }

    fn present(&mut self, image_index: u32, wait_semaphore: u64) -> Result<PresentOutcome> {
        let wait_semaphores = [vk::Semaphore::from_raw(wait_semaphore)];
        let swapchains = [self.swapchain];
        let image_indices = [image_index];
        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        match unsafe { self.ctx.swapchain_loader.queue_present(self.ctx.present_queue, &present_info) } {
            Ok(false) => Ok(PresentOutcome::Presented),
            Ok(true) => Ok(PresentOutcome::Suboptimal),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(PresentOutcome::OutOfDate),
            Err(e) => Err(engine_err!("lumen::vulkan", "Failed to present swapchain image: {:?}", e)),
        }
    }

    fn image_format(&self) -> Format {
        self.image_format
    }

    fn depth_format(&self) -> Format {
        self.depth_format
    }

    fn extent(&self) -> Extent2D {
        self.extent
    }

    fn image_count(&self) -> usize {
        self.image_views.len()
    }

    fn raw_handle(&self) -> u64 {
        self.swapchain.as_raw()
    }

    fn render_pass_handle(&self) -> u64 {
        self.render_pass.as_raw()
    }

    fn framebuffer_handle(&self, image_index: u32) -> Option<u64> {
        self.framebuffers.get(image_index as usize).map(|fb| fb.as_raw())
    }

    fn render_finished_semaphore(&self, image_index: u32) -> Option<u64> {
        self.render_finished.get(image_index as usize).map(|semaphore| semaphore.as_raw())
    }
}

impl Drop for VulkanSwapchain {
    fn drop(&mut self) {
        unsafe {
            let device = &self.ctx.device;
            for semaphore in self.render_finished.drain(..) {
                device.destroy_semaphore(semaphore, None);
            }
            for framebuffer in self.framebuffers.drain(..) {
                device.destroy_framebuffer(framebuffer, None);
            }
            if self.render_pass != vk::RenderPass::null() {
                device.destroy_render_pass(self.render_pass, None);
            }
            for mut depth in self.depth_buffers.drain(..) {
                if depth.view != vk::ImageView::null() {
                    device.destroy_image_view(depth.view, None);
                }
                device.destroy_image(depth.image, None);
                if let Some(allocation) = depth.allocation.take() {
                    self.ctx.free(allocation);
                }
            }
            for view in self.image_views.drain(..) {
                device.destroy_image_view(view, None);
            }
            self.ctx.swapchain_loader.destroy_swapchain(self.swapchain, None);
        }
    }
}
