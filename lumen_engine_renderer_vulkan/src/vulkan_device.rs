/// VulkanGraphicsDevice - Vulkan implementation of the GraphicsDevice trait
///
/// Creates the instance, surface, logical device (with descriptor indexing
/// enabled) and allocator, then hands out GPU objects that each keep the
/// shared `GpuContext` alive.

use ash::vk;
use ash::vk::Handle;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::ffi::CString;
use std::sync::{Arc, Mutex, MutexGuard};

use lumen_engine::lumen::{Config, Error, GraphicsDevice, Result};
use lumen_engine::lumen::descriptor::MAX_BINDLESS_TEXTURES;
use lumen_engine::lumen::device::{
    Buffer, BufferDesc, Texture, TextureDesc, Pipeline, PipelineDesc,
    Swapchain, FrameSlot, Extent2D,
    DescriptorSetLayoutDesc, DescriptorPoolDesc, DescriptorWrite, DescriptorResources,
    DescriptorSetLayoutHandle, DescriptorPoolHandle, DescriptorSetHandle,
};
use lumen_engine::{engine_debug, engine_err, engine_error, engine_info, engine_warn};

use crate::vulkan_buffer::VulkanBuffer;
use crate::vulkan_context::{GpuContext, GpuContextParts, DebugMessenger};
use crate::vulkan_format::{
    descriptor_kind_to_vk, stage_flags_to_vk, binding_flags_to_vk, pool_flags_to_vk, image_layout_to_vk,
};
use crate::vulkan_frame_slot::VulkanFrameSlot;
use crate::vulkan_pipeline::VulkanPipeline;
use crate::vulkan_swapchain::VulkanSwapchain;
use crate::vulkan_texture::VulkanTexture;

/// Physical device chosen for rendering
struct DeviceCandidate {
    physical_device: vk::PhysicalDevice,
    name: String,
    discrete: bool,
    graphics_family: u32,
    present_family: u32,
    anisotropy: bool,
    max_anisotropy: f32,
}

/// Vulkan graphics device
pub struct VulkanGraphicsDevice {
    ctx: Arc<GpuContext>,
    device_name: String,
    vsync: bool,
    /// Descriptor pools and the sets allocated from them need external synchronization
    descriptor_lock: Mutex<()>,
}

fn init_failed(what: &str, error: impl std::fmt::Debug) -> Error {
    engine_error!("lumen::vulkan", "{}: {:?}", what, error);
    Error::InitializationFailed(format!("{}: {:?}", what, error))
}

impl VulkanGraphicsDevice {
    /// Create a device presenting to `window`
    ///
    /// Fails with `InitializationFailed` when no GPU supports graphics,
    /// presentation to the window and bindless descriptor indexing.
    pub fn new<W: HasDisplayHandle + HasWindowHandle>(window: &W, config: &Config) -> Result<Self> {
        unsafe {
            let entry = ash::Entry::load()
                .map_err(|e| init_failed("Failed to load Vulkan library", e))?;

            let app_name = CString::new(config.app_name.as_str())
                .unwrap_or_else(|_| c"Lumen Application".to_owned());
            let app_info = vk::ApplicationInfo::default()
                .application_name(&app_name)
                .application_version(config.app_version)
                .engine_name(c"Lumen")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_3);

            let display_handle = window.display_handle()
                .map_err(|e| init_failed("Failed to get display handle", e))?;
            let window_handle = window.window_handle()
                .map_err(|e| init_failed("Failed to get window handle", e))?;

            let mut extension_names = ash_window::enumerate_required_extensions(display_handle.as_raw())
                .map_err(|e| init_failed("Failed to get required instance extensions", e))?
                .to_vec();

            let validation = cfg!(feature = "vulkan-validation") && config.enable_validation;
            if config.enable_validation && !validation {
                engine_warn!("lumen::vulkan",
                    "Validation requested but the vulkan-validation feature is disabled");
            }
            let layer_names = if validation {
                extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
                vec![c"VK_LAYER_KHRONOS_validation".as_ptr()]
            } else {
                vec![]
            };

            let instance_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);
            let instance = entry.create_instance(&instance_info, None)
                .map_err(|e| init_failed("Failed to create Vulkan instance", e))?;

            let debug_messenger = Self::create_debug_messenger(&entry, &instance, config, validation)?;

            let surface = ash_window::create_surface(
                &entry,
                &instance,
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            )
            .map_err(|e| init_failed("Failed to create surface", e))?;
            let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);

            let candidate = Self::pick_physical_device(&instance, &surface_loader, surface)?;
            engine_info!("lumen::vulkan", "Using GPU '{}' ({})",
                candidate.name, if candidate.discrete { "discrete" } else { "integrated/other" });

            let device = Self::create_logical_device(&instance, &candidate)?;
            let graphics_queue = device.get_device_queue(candidate.graphics_family, 0);
            let present_queue = device.get_device_queue(candidate.present_family, 0);

            let allocator = Allocator::new(&AllocatorCreateDesc {
                instance: instance.clone(),
                device: device.clone(),
                physical_device: candidate.physical_device,
                debug_settings: Default::default(),
                buffer_device_address: false,
                allocation_sizes: Default::default(),
            })
            .map_err(|e| init_failed("Failed to create GPU allocator", e))?;

            let upload_pool_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(candidate.graphics_family)
                .flags(vk::CommandPoolCreateFlags::TRANSIENT | vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);
            let upload_command_pool = device.create_command_pool(&upload_pool_info, None)
                .map_err(|e| init_failed("Failed to create upload command pool", e))?;

            let ctx = Arc::new(GpuContext::new(GpuContextParts {
                entry,
                instance,
                physical_device: candidate.physical_device,
                device,
                allocator,
                graphics_queue,
                graphics_queue_family: candidate.graphics_family,
                present_queue,
                upload_command_pool,
                max_anisotropy: if candidate.anisotropy { candidate.max_anisotropy } else { 1.0 },
                surface,
                surface_loader,
                debug_messenger,
            }));

            Ok(Self {
                ctx,
                device_name: candidate.name,
                vsync: config.vsync,
                descriptor_lock: Mutex::new(()),
            })
        }
    }

    #[cfg(feature = "vulkan-validation")]
    fn create_debug_messenger(
        entry: &ash::Entry,
        instance: &ash::Instance,
        config: &Config,
        validation: bool,
    ) -> Result<Option<DebugMessenger>> {
        if !validation {
            return Ok(None);
        }
        crate::debug::create_debug_messenger(entry, instance, config).map(Some)
    }

    #[cfg(not(feature = "vulkan-validation"))]
    fn create_debug_messenger(
        _entry: &ash::Entry,
        _instance: &ash::Instance,
        _config: &Config,
        _validation: bool,
    ) -> Result<Option<DebugMessenger>> {
        Ok(None)
    }

    /// First discrete GPU that qualifies, otherwise the first that qualifies
    unsafe fn pick_physical_device(
        instance: &ash::Instance,
        surface_loader: &ash::khr::surface::Instance,
        surface: vk::SurfaceKHR,
    ) -> Result<DeviceCandidate> {
        let physical_devices = instance.enumerate_physical_devices()
            .map_err(|e| init_failed("Failed to enumerate physical devices", e))?;

        let mut candidates: Vec<DeviceCandidate> = physical_devices
            .into_iter()
            .filter_map(|pd| Self::check_physical_device(instance, surface_loader, surface, pd))
            .collect();
        candidates.sort_by_key(|c| !c.discrete);

        if candidates.is_empty() {
            return Err(init_failed("No suitable GPU",
                "graphics, presentation and descriptor indexing are required"));
        }
        Ok(candidates.remove(0))
    }

    unsafe fn check_physical_device(
        instance: &ash::Instance,
        surface_loader: &ash::khr::surface::Instance,
        surface: vk::SurfaceKHR,
        physical_device: vk::PhysicalDevice,
    ) -> Option<DeviceCandidate> {
        let properties = instance.get_physical_device_properties(physical_device);
        let name = properties
            .device_name_as_c_str()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let queue_families = instance.get_physical_device_queue_family_properties(physical_device);
        let graphics_family = queue_families
            .iter()
            .position(|qf| qf.queue_flags.contains(vk::QueueFlags::GRAPHICS))? as u32;
        let supports_present = |family: u32| {
            surface_loader
                .get_physical_device_surface_support(physical_device, family, surface)
                .unwrap_or(false)
        };
        let present_family = if supports_present(graphics_family) {
            graphics_family
        } else {
            (0..queue_families.len() as u32).find(|&i| supports_present(i))?
        };

        let extensions = instance.enumerate_device_extension_properties(physical_device).ok()?;
        let has_swapchain = extensions.iter().any(|ext| {
            ext.extension_name_as_c_str().map(|n| n == ash::khr::swapchain::NAME).unwrap_or(false)
        });
        if !has_swapchain {
            engine_debug!("lumen::vulkan", "Skipping '{}': no swapchain extension", name);
            return None;
        }

        let mut features12 = vk::PhysicalDeviceVulkan12Features::default();
        let mut features2 = vk::PhysicalDeviceFeatures2::default().push_next(&mut features12);
        instance.get_physical_device_features2(physical_device, &mut features2);
        let anisotropy = features2.features.sampler_anisotropy == vk::TRUE;

        let bindless = features12.descriptor_indexing == vk::TRUE
            && features12.runtime_descriptor_array == vk::TRUE
            && features12.descriptor_binding_partially_bound == vk::TRUE
            && features12.descriptor_binding_sampled_image_update_after_bind == vk::TRUE
            && features12.descriptor_binding_update_unused_while_pending == vk::TRUE
            && features12.descriptor_binding_variable_descriptor_count == vk::TRUE
            && features12.shader_sampled_image_array_non_uniform_indexing == vk::TRUE;
        if !bindless {
            engine_debug!("lumen::vulkan", "Skipping '{}': descriptor indexing unsupported", name);
            return None;
        }

        let mut properties12 = vk::PhysicalDeviceVulkan12Properties::default();
        let mut properties2 = vk::PhysicalDeviceProperties2::default().push_next(&mut properties12);
        instance.get_physical_device_properties2(physical_device, &mut properties2);
        if properties12.max_per_stage_descriptor_update_after_bind_sampled_images < MAX_BINDLESS_TEXTURES {
            engine_debug!("lumen::vulkan", "Skipping '{}': only {} update-after-bind sampled images",
                name, properties12.max_per_stage_descriptor_update_after_bind_sampled_images);
            return None;
        }

        Some(DeviceCandidate {
            physical_device,
            name,
            discrete: properties.device_type == vk::PhysicalDeviceType::DISCRETE_GPU,
            graphics_family,
            present_family,
            anisotropy,
            max_anisotropy: properties.limits.max_sampler_anisotropy.min(16.0),
        })
    }

    unsafe fn create_logical_device(instance: &ash::Instance, candidate: &DeviceCandidate) -> Result<ash::Device> {
        let priorities = [1.0];
        let mut queue_infos = vec![
            vk::DeviceQueueCreateInfo::default()
                .queue_family_index(candidate.graphics_family)
                .queue_priorities(&priorities),
        ];
        if candidate.present_family != candidate.graphics_family {
            queue_infos.push(
                vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(candidate.present_family)
                    .queue_priorities(&priorities),
            );
        }

        let extension_names = [ash::khr::swapchain::NAME.as_ptr()];
        let features = vk::PhysicalDeviceFeatures::default().sampler_anisotropy(candidate.anisotropy);
        let mut features12 = vk::PhysicalDeviceVulkan12Features::default()
            .descriptor_indexing(true)
            .runtime_descriptor_array(true)
            .descriptor_binding_partially_bound(true)
            .descriptor_binding_sampled_image_update_after_bind(true)
            .descriptor_binding_update_unused_while_pending(true)
            .descriptor_binding_variable_descriptor_count(true)
            .shader_sampled_image_array_non_uniform_indexing(true);

        let create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_infos)
            .enabled_extension_names(&extension_names)
            .enabled_features(&features)
            .push_next(&mut features12);

        instance.create_device(candidate.physical_device, &create_info, None)
            .map_err(|e| init_failed("Failed to create logical device", e))
    }

    /// Name reported by the driver for the selected GPU
    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn context(&self) -> &Arc<GpuContext> {
        &self.ctx
    }

    fn lock_descriptors(&self) -> Result<MutexGuard<'_, ()>> {
        self.descriptor_lock
            .lock()
            .map_err(|_| engine_err!("lumen::vulkan", "Descriptor lock poisoned"))
    }
}

impl GraphicsDevice for VulkanGraphicsDevice {
    fn create_buffer(&self, desc: &BufferDesc) -> Result<Arc<dyn Buffer>> {
        Ok(Arc::new(VulkanBuffer::new(Arc::clone(&self.ctx), desc)?))
    }

    fn create_texture(&self, desc: &TextureDesc) -> Result<Arc<dyn Texture>> {
        Ok(Arc::new(VulkanTexture::new(Arc::clone(&self.ctx), desc)?))
    }

    fn create_pipeline(&self, desc: &PipelineDesc) -> Result<Arc<dyn Pipeline>> {
        Ok(Arc::new(VulkanPipeline::new(Arc::clone(&self.ctx), desc)?))
    }

    fn create_descriptor_set_layout(&self, desc: &DescriptorSetLayoutDesc) -> Result<DescriptorSetLayoutHandle> {
        let bindings: Vec<vk::DescriptorSetLayoutBinding> = desc.bindings
            .iter()
            .map(|b| {
                vk::DescriptorSetLayoutBinding::default()
                    .binding(b.binding)
                    .descriptor_type(descriptor_kind_to_vk(b.kind))
                    .descriptor_count(b.count)
                    .stage_flags(stage_flags_to_vk(b.stages))
            })
            .collect();
        let binding_flags: Vec<vk::DescriptorBindingFlags> = desc.bindings
            .iter()
            .map(|b| binding_flags_to_vk(b.flags))
            .collect();

        let mut flags_info = vk::DescriptorSetLayoutBindingFlagsCreateInfo::default()
            .binding_flags(&binding_flags);
        let layout_flags = if desc.update_after_bind_pool {
            vk::DescriptorSetLayoutCreateFlags::UPDATE_AFTER_BIND_POOL
        } else {
            vk::DescriptorSetLayoutCreateFlags::empty()
        };
        let create_info = vk::DescriptorSetLayoutCreateInfo::default()
            .flags(layout_flags)
            .bindings(&bindings)
            .push_next(&mut flags_info);

        let layout = unsafe { self.ctx.device.create_descriptor_set_layout(&create_info, None) }
            .map_err(|e| engine_err!("lumen::vulkan", "Failed to create descriptor set layout: {:?}", e))?;
        Ok(DescriptorSetLayoutHandle(layout.as_raw()))
    }

    fn destroy_descriptor_set_layout(&self, layout: DescriptorSetLayoutHandle) {
        unsafe {
            self.ctx.device.destroy_descriptor_set_layout(vk::DescriptorSetLayout::from_raw(layout.0), None);
        }
    }

    fn create_descriptor_pool(&self, desc: &DescriptorPoolDesc) -> Result<DescriptorPoolHandle> {
        let pool_sizes: Vec<vk::DescriptorPoolSize> = desc.pool_sizes
            .iter()
            .map(|&(kind, count)| vk::DescriptorPoolSize {
                ty: descriptor_kind_to_vk(kind),
                descriptor_count: count,
            })
            .collect();
        let create_info = vk::DescriptorPoolCreateInfo::default()
            .flags(pool_flags_to_vk(desc.flags))
            .max_sets(desc.max_sets)
            .pool_sizes(&pool_sizes);

        let pool = unsafe { self.ctx.device.create_descriptor_pool(&create_info, None) }
            .map_err(|e| engine_err!("lumen::vulkan", "Failed to create descriptor pool: {:?}", e))?;
        Ok(DescriptorPoolHandle(pool.as_raw()))
    }

    fn destroy_descriptor_pool(&self, pool: DescriptorPoolHandle) {
        let _guard = self.descriptor_lock.lock();
        unsafe {
            self.ctx.device.destroy_descriptor_pool(vk::DescriptorPool::from_raw(pool.0), None);
        }
    }

    fn allocate_descriptor_set(
        &self,
        pool: DescriptorPoolHandle,
        layout: DescriptorSetLayoutHandle,
        variable_count: Option<u32>,
    ) -> Result<Option<DescriptorSetHandle>> {
        let _guard = self.lock_descriptors()?;

        let layouts = [vk::DescriptorSetLayout::from_raw(layout.0)];
        let counts = [variable_count.unwrap_or(0)];
        let mut variable_info = vk::DescriptorSetVariableDescriptorCountAllocateInfo::default()
            .descriptor_counts(&counts);
        let mut allocate_info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(vk::DescriptorPool::from_raw(pool.0))
            .set_layouts(&layouts);
        if variable_count.is_some() {
            allocate_info = allocate_info.push_next(&mut variable_info);
        }

        match unsafe { self.ctx.device.allocate_descriptor_sets(&allocate_info) } {
            Ok(sets) => Ok(sets.first().map(|set| DescriptorSetHandle(set.as_raw()))),
            Err(vk::Result::ERROR_OUT_OF_POOL_MEMORY) | Err(vk::Result::ERROR_FRAGMENTED_POOL) => {
                engine_debug!("lumen::vulkan", "Descriptor pool {:#x} exhausted", pool.0);
                Ok(None)
            }
            Err(e) => Err(engine_err!("lumen::vulkan", "Failed to allocate descriptor set: {:?}", e)),
        }
    }

    fn free_descriptor_sets(&self, pool: DescriptorPoolHandle, sets: &[DescriptorSetHandle]) -> Result<()> {
        if sets.is_empty() {
            return Ok(());
        }
        let _guard = self.lock_descriptors()?;
        let vk_sets: Vec<vk::DescriptorSet> = sets.iter().map(|s| vk::DescriptorSet::from_raw(s.0)).collect();
        unsafe { self.ctx.device.free_descriptor_sets(vk::DescriptorPool::from_raw(pool.0), &vk_sets) }
            .map_err(|e| engine_err!("lumen::vulkan", "Failed to free descriptor sets: {:?}", e))
    }

    fn reset_descriptor_pool(&self, pool: DescriptorPoolHandle) -> Result<()> {
        let _guard = self.lock_descriptors()?;
        unsafe {
            self.ctx.device.reset_descriptor_pool(
                vk::DescriptorPool::from_raw(pool.0),
                vk::DescriptorPoolResetFlags::empty(),
            )
        }
        .map_err(|e| engine_err!("lumen::vulkan", "Failed to reset descriptor pool: {:?}", e))
    }

    fn update_descriptor_sets(&self, writes: &[DescriptorWrite]) -> Result<()> {
        enum WriteInfos {
            Buffers(Vec<vk::DescriptorBufferInfo>),
            Images(Vec<vk::DescriptorImageInfo>),
        }

        // Info arrays must outlive the write structs that point into them
        let infos: Vec<WriteInfos> = writes
            .iter()
            .map(|write| match &write.resources {
                DescriptorResources::Buffers(buffers) => WriteInfos::Buffers(
                    buffers.iter().map(|b| vk::DescriptorBufferInfo {
                        buffer: vk::Buffer::from_raw(b.buffer),
                        offset: b.offset,
                        range: b.range,
                    }).collect(),
                ),
                DescriptorResources::Images(images) => WriteInfos::Images(
                    images.iter().map(|i| vk::DescriptorImageInfo {
                        sampler: vk::Sampler::from_raw(i.sampler),
                        image_view: vk::ImageView::from_raw(i.view),
                        image_layout: image_layout_to_vk(i.layout),
                    }).collect(),
                ),
            })
            .collect();

        let vk_writes: Vec<vk::WriteDescriptorSet> = writes
            .iter()
            .zip(infos.iter())
            .filter(|(write, _)| !write.resources.is_empty())
            .map(|(write, info)| {
                let base = vk::WriteDescriptorSet::default()
                    .dst_set(vk::DescriptorSet::from_raw(write.set.0))
                    .dst_binding(write.binding)
                    .dst_array_element(write.array_element)
                    .descriptor_type(descriptor_kind_to_vk(write.kind));
                match info {
                    WriteInfos::Buffers(buffers) => base.buffer_info(buffers),
                    WriteInfos::Images(images) => base.image_info(images),
                }
            })
            .collect();

        if vk_writes.is_empty() {
            return Ok(());
        }

        let _guard = self.lock_descriptors()?;
        unsafe { self.ctx.device.update_descriptor_sets(&vk_writes, &[]) };
        Ok(())
    }

    fn create_frame_slot(&self, index: usize) -> Result<Box<dyn FrameSlot>> {
        Ok(Box::new(VulkanFrameSlot::new(Arc::clone(&self.ctx), index)?))
    }

    fn create_swapchain(
        &self,
        extent: Extent2D,
        previous: Option<&dyn Swapchain>,
    ) -> Result<Option<Box<dyn Swapchain>>> {
        let generation = VulkanSwapchain::new(Arc::clone(&self.ctx), extent, previous, self.vsync)?;
        Ok(generation.map(|swapchain| Box::new(swapchain) as Box<dyn Swapchain>))
    }

    fn wait_idle(&self) -> Result<()> {
        unsafe { self.ctx.device.device_wait_idle() }
            .map_err(|e| engine_err!("lumen::vulkan", "Failed to wait for device idle: {:?}", e))
    }
}

impl Drop for VulkanGraphicsDevice {
    fn drop(&mut self) {
        // GpuContext destroys the device once the last GPU object is gone
        unsafe {
            self.ctx.device.device_wait_idle().ok();
        }
    }
}
