/// GpuContext - Shared GPU state for all Vulkan objects
///
/// Contains everything GPU objects need after creation:
/// - Device for Vulkan API calls
/// - Allocator for memory management
/// - Graphics/present queues
/// - Command pool for one-shot upload operations
/// - Sampler cache
/// - The window surface shared by every swapchain generation
///
/// Every buffer, texture, pipeline, frame slot and swapchain holds an
/// `Arc<GpuContext>`, so the device is destroyed after the last of them.

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme, Allocator};
use gpu_allocator::MemoryLocation;
use rustc_hash::FxHashMap;
use std::mem::ManuallyDrop;
use std::sync::{Mutex, MutexGuard};

use lumen_engine::lumen::{Error, Result};
use lumen_engine::lumen::device::{AddressMode, Filter};
use lumen_engine::{engine_err, engine_error};

/// Sampler cache key
pub(crate) type SamplerKey = (Filter, AddressMode);

/// Validation messenger and the loader that created it
pub(crate) struct DebugMessenger {
    pub(crate) loader: ash::ext::debug_utils::Instance,
    pub(crate) messenger: vk::DebugUtilsMessengerEXT,
}

/// Shared GPU context for all Vulkan resources.
pub struct GpuContext {
    /// Vulkan entry (kept alive for the instance)
    _entry: ash::Entry,
    pub(crate) instance: ash::Instance,
    pub(crate) physical_device: vk::PhysicalDevice,

    /// Vulkan logical device
    pub device: ash::Device,

    /// GPU memory allocator
    /// Wrapped in ManuallyDrop so it is dropped BEFORE the device is destroyed
    allocator: ManuallyDrop<Mutex<Allocator>>,

    pub graphics_queue: vk::Queue,
    pub graphics_queue_family: u32,
    pub present_queue: vk::Queue,

    /// Reusable command pool for one-shot upload operations
    /// (created with TRANSIENT + RESET_COMMAND_BUFFER flags)
    upload_command_pool: Mutex<vk::CommandPool>,

    samplers: Mutex<FxHashMap<SamplerKey, vk::Sampler>>,
    max_anisotropy: f32,

    pub(crate) surface: vk::SurfaceKHR,
    pub(crate) surface_loader: ash::khr::surface::Instance,
    pub(crate) swapchain_loader: ash::khr::swapchain::Device,

    debug_messenger: Option<DebugMessenger>,
}

/// Everything `GpuContext::new` takes ownership of
pub(crate) struct GpuContextParts {
    pub entry: ash::Entry,
    pub instance: ash::Instance,
    pub physical_device: vk::PhysicalDevice,
    pub device: ash::Device,
    pub allocator: Allocator,
    pub graphics_queue: vk::Queue,
    pub graphics_queue_family: u32,
    pub present_queue: vk::Queue,
    pub upload_command_pool: vk::CommandPool,
    pub max_anisotropy: f32,
    pub surface: vk::SurfaceKHR,
    pub surface_loader: ash::khr::surface::Instance,
    pub debug_messenger: Option<DebugMessenger>,
}

impl GpuContext {
    pub(crate) fn new(parts: GpuContextParts) -> Self {
        let swapchain_loader = ash::khr::swapchain::Device::new(&parts.instance, &parts.device);
        Self {
            _entry: parts.entry,
            instance: parts.instance,
            physical_device: parts.physical_device,
            device: parts.device,
            allocator: ManuallyDrop::new(Mutex::new(parts.allocator)),
            graphics_queue: parts.graphics_queue,
            graphics_queue_family: parts.graphics_queue_family,
            present_queue: parts.present_queue,
            upload_command_pool: Mutex::new(parts.upload_command_pool),
            samplers: Mutex::new(FxHashMap::default()),
            max_anisotropy: parts.max_anisotropy,
            surface: parts.surface,
            surface_loader: parts.surface_loader,
            swapchain_loader,
            debug_messenger: parts.debug_messenger,
        }
    }

    fn lock_allocator(&self) -> Result<MutexGuard<'_, Allocator>> {
        self.allocator
            .lock()
            .map_err(|_| engine_err!("lumen::vulkan", "GPU allocator lock poisoned"))
    }

    /// Allocate memory for `requirements`; failures map to `Error::OutOfMemory`
    pub(crate) fn allocate(
        &self,
        name: &str,
        requirements: vk::MemoryRequirements,
        location: MemoryLocation,
        linear: bool,
    ) -> Result<Allocation> {
        self.lock_allocator()?
            .allocate(&AllocationCreateDesc {
                name,
                requirements,
                location,
                linear,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            })
            .map_err(|e| {
                let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                engine_error!("lumen::vulkan", "Out of GPU memory for {} ({:.2} MB): {:?}", name, size_mb, e);
                Error::OutOfMemory
            })
    }

    /// Return an allocation to the allocator (errors are ignored on teardown paths)
    pub(crate) fn free(&self, allocation: Allocation) {
        if let Ok(mut allocator) = self.allocator.lock() {
            allocator.free(allocation).ok();
        }
    }

    /// Record and submit a one-shot command buffer, blocking until it completes
    pub(crate) fn one_shot<F>(&self, record: F) -> Result<()>
    where
        F: FnOnce(vk::CommandBuffer),
    {
        let pool = self
            .upload_command_pool
            .lock()
            .map_err(|_| engine_err!("lumen::vulkan", "Upload command pool lock poisoned"))?;

        unsafe {
            let allocate_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(*pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);
            let command_buffers = self.device.allocate_command_buffers(&allocate_info)
                .map_err(|e| engine_err!("lumen::vulkan", "Failed to allocate upload command buffer: {:?}", e))?;
            let command_buffer = command_buffers[0];

            let result = self.record_and_wait(command_buffer, record);
            self.device.free_command_buffers(*pool, &command_buffers);
            result
        }
    }

    unsafe fn record_and_wait<F>(&self, command_buffer: vk::CommandBuffer, record: F) -> Result<()>
    where
        F: FnOnce(vk::CommandBuffer),
    {
        let begin_info = vk::CommandBufferBeginInfo::default()
            .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
        self.device.begin_command_buffer(command_buffer, &begin_info)
            .map_err(|e| engine_err!("lumen::vulkan", "Failed to begin upload command buffer: {:?}", e))?;

        record(command_buffer);

        self.device.end_command_buffer(command_buffer)
            .map_err(|e| engine_err!("lumen::vulkan", "Failed to end upload command buffer: {:?}", e))?;

        let fence = self.device.create_fence(&vk::FenceCreateInfo::default(), None)
            .map_err(|e| engine_err!("lumen::vulkan", "Failed to create upload fence: {:?}", e))?;

        let command_buffers = [command_buffer];
        let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);
        let submitted = self.device
            .queue_submit(self.graphics_queue, &[submit_info], fence)
            .and_then(|_| self.device.wait_for_fences(&[fence], true, u64::MAX));
        self.device.destroy_fence(fence, None);

        submitted.map_err(|e| engine_err!("lumen::vulkan", "Upload submission failed: {:?}", e))
    }

    /// Get or create the sampler for a filter/address combination
    pub(crate) fn sampler(&self, filter: Filter, address_mode: AddressMode) -> Result<vk::Sampler> {
        let mut samplers = self
            .samplers
            .lock()
            .map_err(|_| engine_err!("lumen::vulkan", "Sampler cache lock poisoned"))?;

        if let Some(&sampler) = samplers.get(&(filter, address_mode)) {
            return Ok(sampler);
        }

        let (vk_filter, mipmap_mode) = match filter {
            Filter::Linear => (vk::Filter::LINEAR, vk::SamplerMipmapMode::LINEAR),
            Filter::Nearest => (vk::Filter::NEAREST, vk::SamplerMipmapMode::NEAREST),
        };
        let address = match address_mode {
            AddressMode::Repeat => vk::SamplerAddressMode::REPEAT,
            AddressMode::ClampToEdge => vk::SamplerAddressMode::CLAMP_TO_EDGE,
        };
        let anisotropy = filter == Filter::Linear && self.max_anisotropy > 1.0;

        let create_info = vk::SamplerCreateInfo::default()
            .mag_filter(vk_filter)
            .min_filter(vk_filter)
            .mipmap_mode(mipmap_mode)
            .address_mode_u(address)
            .address_mode_v(address)
            .address_mode_w(address)
            .anisotropy_enable(anisotropy)
            .max_anisotropy(if anisotropy { self.max_anisotropy } else { 1.0 })
            .border_color(vk::BorderColor::INT_OPAQUE_BLACK)
            .unnormalized_coordinates(false)
            .compare_enable(false)
            .compare_op(vk::CompareOp::ALWAYS)
            .min_lod(0.0)
            .max_lod(vk::LOD_CLAMP_NONE);

        let sampler = unsafe { self.device.create_sampler(&create_info, None) }
            .map_err(|e| engine_err!("lumen::vulkan", "Failed to create sampler: {:?}", e))?;
        samplers.insert((filter, address_mode), sampler);
        Ok(sampler)
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        unsafe {
            self.device.device_wait_idle().ok();

            // 1. Context-owned Vulkan objects
            if let Ok(samplers) = self.samplers.get_mut() {
                for (_, sampler) in samplers.drain() {
                    self.device.destroy_sampler(sampler, None);
                }
            }
            if let Ok(pool) = self.upload_command_pool.get_mut() {
                self.device.destroy_command_pool(*pool, None);
            }

            // 2. Allocator frees its VkDeviceMemory blocks while the device is alive
            ManuallyDrop::drop(&mut self.allocator);

            // 3. Device, surface, messenger, instance
            self.device.destroy_device(None);
            self.surface_loader.destroy_surface(self.surface, None);

            if let Some(debug) = self.debug_messenger.take() {
                #[cfg(feature = "vulkan-validation")]
                crate::debug::cleanup_debug_config();
                debug.loader.destroy_debug_utils_messenger(debug.messenger, None);
            }

            self.instance.destroy_instance(None);
        }
    }
}
