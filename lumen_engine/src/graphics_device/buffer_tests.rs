//! Unit tests for buffer.rs

use crate::graphics_device::*;
use crate::error::Error;

#[test]
fn test_buffer_desc_new_has_no_data() {
    let desc = BufferDesc::new(544, BufferUsage::Uniform);
    assert_eq!(desc.size, 544);
    assert_eq!(desc.usage, BufferUsage::Uniform);
    assert!(desc.data.is_none());
}

#[test]
fn test_buffer_desc_with_data_sizes_from_slice() {
    let bytes = [1u8, 2, 3, 4, 5, 6, 7, 8];
    let desc = BufferDesc::with_data(BufferUsage::Storage, &bytes);
    assert_eq!(desc.size, 8);
    assert_eq!(desc.data.as_deref(), Some(&bytes[..]));
}

#[test]
fn test_buffer_format_sizes() {
    assert_eq!(BufferFormat::R32_SFLOAT.size_bytes(), 4);
    assert_eq!(BufferFormat::R32G32_SFLOAT.size_bytes(), 8);
    assert_eq!(BufferFormat::R32G32B32_SFLOAT.size_bytes(), 12);
    assert_eq!(BufferFormat::R32G32B32A32_SFLOAT.size_bytes(), 16);
}

#[test]
fn test_check_buffer_range_accepts_exact_fit() {
    assert!(check_buffer_range(800, 0, 800).is_ok());
    assert!(check_buffer_range(800, 792, 8).is_ok());
}

#[test]
fn test_check_buffer_range_rejects_overflow() {
    assert!(matches!(check_buffer_range(800, 796, 8), Err(Error::InvalidResource(_))));
    assert!(matches!(check_buffer_range(16, u64::MAX, 1), Err(Error::InvalidResource(_))));
}
