/// VulkanTexture - sampled 2D image with its view and a cached sampler
///
/// Also hosts the image helpers shared with the swapchain depth buffers.

use ash::vk;
use ash::vk::Handle;
use gpu_allocator::vulkan::Allocation;
use gpu_allocator::MemoryLocation;
use std::sync::Arc;

use lumen_engine::lumen::{Error, Result};
use lumen_engine::lumen::device::{Texture, TextureDesc, TextureInfo, ImageDescriptor, ImageLayout, Extent2D};
use lumen_engine::{engine_err, engine_error};

use crate::vulkan_buffer::VulkanBuffer;
use crate::vulkan_context::GpuContext;
use crate::vulkan_format::format_to_vk;

/// Image plus the allocation backing it
pub(crate) struct GpuImage {
    pub image: vk::Image,
    pub allocation: Allocation,
}

/// Create a single-mip, single-layer 2D image in GPU-only memory
pub(crate) fn create_image(
    ctx: &GpuContext,
    name: &str,
    extent: Extent2D,
    format: vk::Format,
    usage: vk::ImageUsageFlags,
) -> Result<GpuImage> {
    let create_info = vk::ImageCreateInfo::default()
        .image_type(vk::ImageType::TYPE_2D)
        .format(format)
        .extent(vk::Extent3D { width: extent.width, height: extent.height, depth: 1 })
        .mip_levels(1)
        .array_layers(1)
        .samples(vk::SampleCountFlags::TYPE_1)
        .tiling(vk::ImageTiling::OPTIMAL)
        .usage(usage)
        .sharing_mode(vk::SharingMode::EXCLUSIVE)
        .initial_layout(vk::ImageLayout::UNDEFINED);

    let image = unsafe { ctx.device.create_image(&create_info, None) }
        .map_err(|e| engine_err!("lumen::vulkan", "Failed to create image '{}': {:?}", name, e))?;
    let requirements = unsafe { ctx.device.get_image_memory_requirements(image) };

    let allocation = match ctx.allocate(name, requirements, MemoryLocation::GpuOnly, false) {
        Ok(allocation) => allocation,
        Err(e) => {
            unsafe { ctx.device.destroy_image(image, None) };
            return Err(e);
        }
    };

    if let Err(e) = unsafe { ctx.device.bind_image_memory(image, allocation.memory(), allocation.offset()) } {
        ctx.free(allocation);
        unsafe { ctx.device.destroy_image(image, None) };
        return Err(engine_err!("lumen::vulkan", "Failed to bind memory of image '{}': {:?}", name, e));
    }

    Ok(GpuImage { image, allocation })
}

pub(crate) fn create_image_view(
    ctx: &GpuContext,
    image: vk::Image,
    format: vk::Format,
    aspect: vk::ImageAspectFlags,
) -> Result<vk::ImageView> {
    let create_info = vk::ImageViewCreateInfo::default()
        .image(image)
        .view_type(vk::ImageViewType::TYPE_2D)
        .format(format)
        .subresource_range(subresource_range(aspect));

    unsafe { ctx.device.create_image_view(&create_info, None) }
        .map_err(|e| engine_err!("lumen::vulkan", "Failed to create image view: {:?}", e))
}

fn subresource_range(aspect: vk::ImageAspectFlags) -> vk::ImageSubresourceRange {
    vk::ImageSubresourceRange {
        aspect_mask: aspect,
        base_mip_level: 0,
        level_count: 1,
        base_array_layer: 0,
        layer_count: 1,
    }
}

pub struct VulkanTexture {
    ctx: Arc<GpuContext>,
    image: vk::Image,
    view: vk::ImageView,
    sampler: vk::Sampler,
    allocation: Option<Allocation>,
    info: TextureInfo,
}

impl VulkanTexture {
    pub(crate) fn new(ctx: Arc<GpuContext>, desc: &TextureDesc) -> Result<Self> {
        if desc.width == 0 || desc.height == 0 {
            engine_error!("lumen::vulkan", "Texture creation failed: {}x{} extent", desc.width, desc.height);
            return Err(Error::InvalidResource(format!("texture extent {}x{}", desc.width, desc.height)));
        }
        if desc.format.is_depth() {
            engine_error!("lumen::vulkan", "Texture creation failed: {:?} is not a color format", desc.format);
            return Err(Error::InvalidResource(format!("{:?} cannot be sampled as a texture", desc.format)));
        }
        if desc.data.len() != desc.expected_size() {
            engine_error!("lumen::vulkan", "Texture data is {} bytes, expected {} for {}x{} {:?}",
                desc.data.len(), desc.expected_size(), desc.width, desc.height, desc.format);
            return Err(Error::InvalidResource(format!(
                "texture data is {} bytes, expected {}", desc.data.len(), desc.expected_size()
            )));
        }

        let format = format_to_vk(desc.format);
        let extent = Extent2D::new(desc.width, desc.height);
        let gpu_image = create_image(
            &ctx,
            "texture",
            extent,
            format,
            vk::ImageUsageFlags::SAMPLED | vk::ImageUsageFlags::TRANSFER_DST,
        )?;

        // From here on, Drop releases whatever was created
        let mut texture = Self {
            image: gpu_image.image,
            view: vk::ImageView::null(),
            sampler: vk::Sampler::null(),
            allocation: Some(gpu_image.allocation),
            info: TextureInfo { width: desc.width, height: desc.height, format: desc.format },
            ctx,
        };

        texture.upload(&desc.data, extent)?;
        texture.view = create_image_view(&texture.ctx, texture.image, format, vk::ImageAspectFlags::COLOR)?;
        texture.sampler = texture.ctx.sampler(desc.filter, desc.address_mode)?;
        Ok(texture)
    }

    /// Copy pixels through a staging buffer and leave the image shader-readable
    fn upload(&self, data: &[u8], extent: Extent2D) -> Result<()> {
        let staging = VulkanBuffer::staging(Arc::clone(&self.ctx), data)?;
        let device = &self.ctx.device;
        let image = self.image;
        let range = subresource_range(vk::ImageAspectFlags::COLOR);

        self.ctx.one_shot(|cb| unsafe {
            let to_transfer = vk::ImageMemoryBarrier::default()
                .old_layout(vk::ImageLayout::UNDEFINED)
                .new_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
                .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .image(image)
                .subresource_range(range)
                .src_access_mask(vk::AccessFlags::empty())
                .dst_access_mask(vk::AccessFlags::TRANSFER_WRITE);
            device.cmd_pipeline_barrier(
                cb,
                vk::PipelineStageFlags::TOP_OF_PIPE,
                vk::PipelineStageFlags::TRANSFER,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[to_transfer],
            );

            let region = vk::BufferImageCopy::default()
                .buffer_offset(0)
                .buffer_row_length(0)
                .buffer_image_height(0)
                .image_subresource(vk::ImageSubresourceLayers {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    mip_level: 0,
                    base_array_layer: 0,
                    layer_count: 1,
                })
                .image_offset(vk::Offset3D { x: 0, y: 0, z: 0 })
                .image_extent(vk::Extent3D { width: extent.width, height: extent.height, depth: 1 });
            device.cmd_copy_buffer_to_image(
                cb,
                staging.handle(),
                image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[region],
            );

            let to_shader = vk::ImageMemoryBarrier::default()
                .old_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
                .new_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
                .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .image(image)
                .subresource_range(range)
                .src_access_mask(vk::AccessFlags::TRANSFER_WRITE)
                .dst_access_mask(vk::AccessFlags::SHADER_READ);
            device.cmd_pipeline_barrier(
                cb,
                vk::PipelineStageFlags::TRANSFER,
                vk::PipelineStageFlags::FRAGMENT_SHADER,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[to_shader],
            );
        })
    }
}

impl Texture for VulkanTexture {
    fn info(&self) -> &TextureInfo {
        &self.info
    }

    fn image_descriptor(&self) -> ImageDescriptor {
        ImageDescriptor {
            view: self.view.as_raw(),
            sampler: self.sampler.as_raw(),
            layout: ImageLayout::ShaderReadOnly,
        }
    }
}

impl Drop for VulkanTexture {
    fn drop(&mut self) {
        // The sampler belongs to the context cache
        unsafe {
            if self.view != vk::ImageView::null() {
                self.ctx.device.destroy_image_view(self.view, None);
            }
            if let Some(allocation) = self.allocation.take() {
                self.ctx.free(allocation);
            }
            self.ctx.device.destroy_image(self.image, None);
        }
    }
}
