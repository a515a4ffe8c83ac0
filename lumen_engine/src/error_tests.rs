//! Unit tests for error.rs
//!
//! Tests the Error variants and their Display/Debug/Clone implementations.

use crate::error::{Error, Result};

// ============================================================================
// ERROR DISPLAY TESTS
// ============================================================================

#[test]
fn test_backend_error_display() {
    let err = Error::BackendError("vkQueuePresentKHR returned ERROR_DEVICE_LOST".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Backend error"));
    assert!(display.contains("ERROR_DEVICE_LOST"));
}

#[test]
fn test_out_of_memory_display() {
    assert_eq!(format!("{}", Error::OutOfMemory), "Out of GPU memory");
}

#[test]
fn test_invalid_frame_state_display() {
    let err = Error::InvalidFrameState("begin_frame called while FrameAcquired".to_string());
    let display = format!("{}", err);
    assert!(display.starts_with("Invalid frame state"));
    assert!(display.contains("FrameAcquired"));
}

#[test]
fn test_invalid_binding_display() {
    let err = Error::InvalidBinding("binding 7 not declared in layout".to_string());
    assert!(format!("{}", err).contains("binding 7"));
}

#[test]
fn test_swapchain_format_mismatch_display() {
    let err = Error::SwapchainFormatMismatch("image B8G8R8A8_SRGB -> R8G8B8A8_UNORM".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Swapchain format changed"));
    assert!(display.contains("R8G8B8A8_UNORM"));
}

#[test]
fn test_unsupported_asset_display() {
    let err = Error::UnsupportedAsset("models/vase.fbx".to_string());
    assert!(format!("{}", err).contains("vase.fbx"));
}

// ============================================================================
// ERROR TRAIT IMPLEMENTATIONS
// ============================================================================

#[test]
fn test_error_is_std_error() {
    let err = Error::OutOfMemory;
    let _: &dyn std::error::Error = &err;
}

#[test]
fn test_error_debug_names_variant() {
    assert!(format!("{:?}", Error::InvalidBinding("x".into())).contains("InvalidBinding"));
    assert!(format!("{:?}", Error::InitializationFailed("x".into())).contains("InitializationFailed"));
}

#[test]
fn test_error_clone_and_eq() {
    let err = Error::InvalidResource("material table full".to_string());
    assert_eq!(err.clone(), err);
    assert_ne!(err, Error::OutOfMemory);
}

// ============================================================================
// ERROR PROPAGATION TESTS
// ============================================================================

#[test]
fn test_error_propagation_with_question_mark() {
    fn inner() -> Result<i32> {
        Err(Error::InvalidFrameState("not idle".to_string()))
    }

    fn outer() -> Result<i32> {
        inner()?;
        Ok(42)
    }

    assert_eq!(outer(), Err(Error::InvalidFrameState("not idle".to_string())));
}
