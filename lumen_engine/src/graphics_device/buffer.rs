/// Buffer trait and buffer descriptor

use crate::error::Result;
use crate::graphics_device::BufferDescriptor;

/// Buffer usage flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    /// Vertex buffer
    Vertex,
    /// Index buffer
    Index,
    /// Uniform/constant buffer
    Uniform,
    /// Storage buffer
    Storage,
}

/// Descriptor for creating a buffer
///
/// Buffers are host-visible and persistently mapped; `update` writes
/// through the mapping.
#[derive(Debug, Clone)]
pub struct BufferDesc {
    /// Size in bytes
    pub size: u64,
    /// Buffer usage
    pub usage: BufferUsage,
    /// Optional initial contents (must not exceed `size`)
    pub data: Option<Vec<u8>>,
}

impl BufferDesc {
    /// Zero-initialized buffer of `size` bytes
    pub fn new(size: u64, usage: BufferUsage) -> Self {
        Self { size, usage, data: None }
    }

    /// Buffer sized and initialized from `data`
    pub fn with_data(usage: BufferUsage, data: &[u8]) -> Self {
        Self {
            size: data.len() as u64,
            usage,
            data: Some(data.to_vec()),
        }
    }
}

/// Buffer data format for vertex attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum BufferFormat {
    R32_SFLOAT,          // float (4 bytes)
    R32G32_SFLOAT,       // vec2 (8 bytes)
    R32G32B32_SFLOAT,    // vec3 (12 bytes)
    R32G32B32A32_SFLOAT, // vec4 (16 bytes)
    R32_UINT,
}

impl BufferFormat {
    /// Returns size in bytes for this format
    pub fn size_bytes(&self) -> u32 {
        match self {
            BufferFormat::R32_SFLOAT | BufferFormat::R32_UINT => 4,
            BufferFormat::R32G32_SFLOAT => 8,
            BufferFormat::R32G32B32_SFLOAT => 12,
            BufferFormat::R32G32B32A32_SFLOAT => 16,
        }
    }
}

/// Buffer resource trait
///
/// Implemented by backend-specific buffer types (e.g., VulkanBuffer).
/// The buffer is automatically destroyed when dropped.
pub trait Buffer: Send + Sync {
    /// Update buffer data
    ///
    /// # Arguments
    ///
    /// * `offset` - Offset into the buffer in bytes
    /// * `data` - Data to write
    ///
    /// Writes past the end of the buffer fail with `InvalidResource`.
    fn update(&self, offset: u64, data: &[u8]) -> Result<()>;

    /// Size in bytes
    fn size(&self) -> u64;

    /// Backend handle (e.g. `vk::Buffer` as raw u64)
    fn raw_handle(&self) -> u64;

    /// Descriptor covering the whole buffer
    fn descriptor_info(&self) -> BufferDescriptor {
        BufferDescriptor {
            buffer: self.raw_handle(),
            offset: 0,
            range: self.size(),
        }
    }
}

/// Bounds check shared by backends before writing through a mapping
pub fn check_buffer_range(buffer_size: u64, offset: u64, len: usize) -> Result<()> {
    let end = offset.checked_add(len as u64);
    match end {
        Some(end) if end <= buffer_size => Ok(()),
        _ => Err(crate::error::Error::InvalidResource(format!(
            "buffer write of {} bytes at offset {} exceeds size {}",
            len, offset, buffer_size
        ))),
    }
}

#[cfg(test)]
#[path = "buffer_tests.rs"]
mod tests;
