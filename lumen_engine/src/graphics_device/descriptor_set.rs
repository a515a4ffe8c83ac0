/// Descriptor-level types shared between the core and backends
///
/// Handles are opaque `u64` values minted by the backend (for Vulkan, the raw
/// handle of the corresponding object).

use bitflags::bitflags;

/// Opaque descriptor set layout handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorSetLayoutHandle(pub u64);

/// Opaque descriptor pool handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorPoolHandle(pub u64);

/// Opaque descriptor set handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorSetHandle(pub u64);

/// Kind of resource a binding holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorKind {
    UniformBuffer,
    StorageBuffer,
    CombinedImageSampler,
    StorageImage,
}

impl DescriptorKind {
    /// True for kinds written with buffer descriptors
    pub fn is_buffer(&self) -> bool {
        matches!(self, DescriptorKind::UniformBuffer | DescriptorKind::StorageBuffer)
    }

    /// True for kinds written with image descriptors
    pub fn is_image(&self) -> bool {
        !self.is_buffer()
    }
}

bitflags! {
    /// Shader stages that can access a binding or push constant range
    ///
    /// Bit values match Vulkan's `VkShaderStageFlagBits`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShaderStageFlags: u32 {
        const VERTEX = 0x0000_0001;
        const FRAGMENT = 0x0000_0010;
        const COMPUTE = 0x0000_0020;
        const ALL_GRAPHICS = 0x0000_001F;
        const ALL = 0x7FFF_FFFF;
    }
}

bitflags! {
    /// Per-binding flags (descriptor indexing)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BindingFlags: u32 {
        /// The set may be updated after being bound in a command buffer
        const UPDATE_AFTER_BIND = 0x1;
        /// Array elements not used by a draw may stay unwritten
        const PARTIALLY_BOUND = 0x4;
        /// Actual array size is chosen at allocation time
        const VARIABLE_DESCRIPTOR_COUNT = 0x8;
    }
}

bitflags! {
    /// Descriptor pool creation flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PoolFlags: u32 {
        /// Individual sets may be returned with `free`
        const FREE_DESCRIPTOR_SET = 0x1;
        /// Required to allocate sets from update-after-bind layouts
        const UPDATE_AFTER_BIND = 0x2;
    }
}

/// One binding of a layout, as handed to the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorLayoutBinding {
    pub binding: u32,
    pub kind: DescriptorKind,
    pub count: u32,
    pub stages: ShaderStageFlags,
    pub flags: BindingFlags,
}

/// Descriptor for creating a descriptor set layout
#[derive(Debug, Clone, Default)]
pub struct DescriptorSetLayoutDesc {
    /// Bindings sorted by binding index
    pub bindings: Vec<DescriptorLayoutBinding>,
    /// Layout is created with the update-after-bind-pool flag
    pub update_after_bind_pool: bool,
}

/// Descriptor for creating a descriptor pool
#[derive(Debug, Clone)]
pub struct DescriptorPoolDesc {
    pub max_sets: u32,
    pub pool_sizes: Vec<(DescriptorKind, u32)>,
    pub flags: PoolFlags,
}

/// Buffer region bound to a uniform or storage binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferDescriptor {
    /// Backend buffer handle
    pub buffer: u64,
    pub offset: u64,
    pub range: u64,
}

/// Image layout expected at sampling time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageLayout {
    ShaderReadOnly,
    General,
}

/// Image view and sampler bound to an image binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDescriptor {
    /// Backend image view handle
    pub view: u64,
    /// Backend sampler handle (0 for storage images)
    pub sampler: u64,
    pub layout: ImageLayout,
}

/// Resources written into consecutive array elements of one binding
#[derive(Debug, Clone, PartialEq)]
pub enum DescriptorResources {
    Buffers(Vec<BufferDescriptor>),
    Images(Vec<ImageDescriptor>),
}

impl DescriptorResources {
    pub fn len(&self) -> usize {
        match self {
            DescriptorResources::Buffers(buffers) => buffers.len(),
            DescriptorResources::Images(images) => images.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One entry of a batched descriptor update
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptorWrite {
    pub set: DescriptorSetHandle,
    pub binding: u32,
    pub array_element: u32,
    pub kind: DescriptorKind,
    pub resources: DescriptorResources,
}
