/// VulkanBuffer - host-visible, persistently mapped buffer

use ash::vk;
use ash::vk::Handle;
use gpu_allocator::vulkan::Allocation;
use gpu_allocator::MemoryLocation;
use std::sync::Arc;

use lumen_engine::lumen::{Error, Result};
use lumen_engine::lumen::device::{Buffer, BufferDesc, BufferUsage, check_buffer_range};
use lumen_engine::{engine_err, engine_error};

use crate::vulkan_context::GpuContext;

pub struct VulkanBuffer {
    ctx: Arc<GpuContext>,
    buffer: vk::Buffer,
    allocation: Option<Allocation>,
    size: u64,
}

fn usage_to_vk(usage: BufferUsage) -> vk::BufferUsageFlags {
    match usage {
        BufferUsage::Vertex => vk::BufferUsageFlags::VERTEX_BUFFER,
        BufferUsage::Index => vk::BufferUsageFlags::INDEX_BUFFER,
        BufferUsage::Uniform => vk::BufferUsageFlags::UNIFORM_BUFFER,
        BufferUsage::Storage => vk::BufferUsageFlags::STORAGE_BUFFER,
    }
}

impl VulkanBuffer {
    pub(crate) fn new(ctx: Arc<GpuContext>, desc: &BufferDesc) -> Result<Self> {
        Self::create(ctx, desc.size, usage_to_vk(desc.usage), desc.data.as_deref(), "buffer")
    }

    /// Transfer source filled with `data`, used for texture uploads
    pub(crate) fn staging(ctx: Arc<GpuContext>, data: &[u8]) -> Result<Self> {
        Self::create(ctx, data.len() as u64, vk::BufferUsageFlags::TRANSFER_SRC, Some(data), "staging_buffer")
    }

    fn create(
        ctx: Arc<GpuContext>,
        size: u64,
        usage: vk::BufferUsageFlags,
        data: Option<&[u8]>,
        name: &str,
    ) -> Result<Self> {
        if size == 0 {
            engine_error!("lumen::vulkan", "Buffer creation failed: size is zero");
            return Err(Error::InvalidResource("buffer size is zero".to_string()));
        }
        if let Some(data) = data {
            check_buffer_range(size, 0, data.len())?;
        }

        let create_info = vk::BufferCreateInfo::default()
            .size(size)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let buffer = unsafe { ctx.device.create_buffer(&create_info, None) }
            .map_err(|e| engine_err!("lumen::vulkan", "Failed to create buffer: {:?}", e))?;
        let requirements = unsafe { ctx.device.get_buffer_memory_requirements(buffer) };

        let allocation = match ctx.allocate(name, requirements, MemoryLocation::CpuToGpu, true) {
            Ok(allocation) => allocation,
            Err(e) => {
                unsafe { ctx.device.destroy_buffer(buffer, None) };
                return Err(e);
            }
        };

        if let Err(e) = unsafe { ctx.device.bind_buffer_memory(buffer, allocation.memory(), allocation.offset()) } {
            ctx.free(allocation);
            unsafe { ctx.device.destroy_buffer(buffer, None) };
            return Err(engine_err!("lumen::vulkan", "Failed to bind buffer memory: {:?}", e));
        }

        let vulkan_buffer = Self {
            ctx,
            buffer,
            allocation: Some(allocation),
            size,
        };

        if let Some(data) = data {
            vulkan_buffer.update(0, data)?;
        }
        Ok(vulkan_buffer)
    }

    pub(crate) fn handle(&self) -> vk::Buffer {
        self.buffer
    }
}

impl Buffer for VulkanBuffer {
    fn update(&self, offset: u64, data: &[u8]) -> Result<()> {
        check_buffer_range(self.size, offset, data.len())?;

        let allocation = self.allocation.as_ref()
            .ok_or_else(|| engine_err!("lumen::vulkan", "Buffer update failed: no GPU allocation"))?;
        let mapped = allocation.mapped_ptr()
            .ok_or_else(|| engine_err!("lumen::vulkan", "Buffer update failed: memory is not host visible"))?;

        unsafe {
            let dst = (mapped.as_ptr() as *mut u8).add(offset as usize);
            std::ptr::copy_nonoverlapping(data.as_ptr(), dst, data.len());
        }
        Ok(())
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn raw_handle(&self) -> u64 {
        self.buffer.as_raw()
    }
}

impl Drop for VulkanBuffer {
    fn drop(&mut self) {
        if let Some(allocation) = self.allocation.take() {
            self.ctx.free(allocation);
        }
        unsafe {
            self.ctx.device.destroy_buffer(self.buffer, None);
        }
    }
}
