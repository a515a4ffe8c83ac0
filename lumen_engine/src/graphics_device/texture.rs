/// Texture trait, pixel formats, texture descriptor and texture info

use crate::graphics_device::ImageDescriptor;

/// Pixel format of textures and swapchain attachments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum Format {
    // Color formats
    R8G8B8A8_SRGB,
    R8G8B8A8_UNORM,
    B8G8R8A8_SRGB,
    B8G8R8A8_UNORM,
    R32G32B32A32_SFLOAT,

    // Depth formats
    D32_FLOAT,
    D32_FLOAT_S8_UINT,
    D24_UNORM_S8_UINT,
}

impl Format {
    /// Returns true for depth (and depth/stencil) formats
    pub fn is_depth(&self) -> bool {
        matches!(self, Format::D32_FLOAT | Format::D32_FLOAT_S8_UINT | Format::D24_UNORM_S8_UINT)
    }

    /// Bytes per pixel of tightly packed texel data
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            Format::R32G32B32A32_SFLOAT => 16,
            Format::D32_FLOAT_S8_UINT => 8,
            _ => 4,
        }
    }
}

/// Texel filtering for the texture sampler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Filter {
    Nearest,
    Linear,
}

/// Addressing outside [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressMode {
    Repeat,
    ClampToEdge,
}

// ===== TEXTURE DESC =====

/// Descriptor for creating a sampled 2D texture
#[derive(Debug, Clone)]
pub struct TextureDesc {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Pixel format
    pub format: Format,
    /// Tightly packed pixel bytes (`width * height * bytes_per_pixel`)
    pub data: Vec<u8>,
    /// Sampler filtering
    pub filter: Filter,
    /// Sampler addressing
    pub address_mode: AddressMode,
}

impl TextureDesc {
    /// Linear/repeat texture from raw pixels
    pub fn new(width: u32, height: u32, format: Format, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            format,
            data,
            filter: Filter::Linear,
            address_mode: AddressMode::Repeat,
        }
    }

    /// Expected byte length of `data`
    pub fn expected_size(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel() as usize
    }
}

// ===== TEXTURE INFO =====

/// Read-only properties of a created texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureInfo {
    pub width: u32,
    pub height: u32,
    pub format: Format,
}

// ===== TEXTURE TRAIT =====

/// Texture resource trait
///
/// A texture owns its image, view and sampler. It is destroyed when the
/// last `Arc` is dropped.
pub trait Texture: Send + Sync {
    /// Get the read-only properties of this texture
    fn info(&self) -> &TextureInfo;

    /// View, sampler and layout for a combined image sampler binding
    fn image_descriptor(&self) -> ImageDescriptor;
}
