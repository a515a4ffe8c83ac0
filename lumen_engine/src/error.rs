//! Error types for the Lumen engine
//!
//! Every fallible engine operation returns [`Result`]. Variants separate
//! fatal backend failures from the programming-error class raised by the
//! frame protocol and the descriptor writer.

use std::fmt;

/// Result type for Lumen engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Lumen engine errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Backend-specific error (Vulkan result codes, lock poisoning, ...)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (texture, buffer, material, mesh, ...)
    InvalidResource(String),

    /// Initialization failed (instance, device, surface, ...)
    InitializationFailed(String),

    /// A frame protocol method was called out of order
    InvalidFrameState(String),

    /// A descriptor operation referenced an undeclared binding or violated
    /// the binding's declared kind/count
    InvalidBinding(String),

    /// A recreated swapchain reported different image/depth formats
    SwapchainFormatMismatch(String),

    /// Asset file that cannot be decoded (extension, index type, ...)
    UnsupportedAsset(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::InvalidFrameState(msg) => write!(f, "Invalid frame state: {}", msg),
            Error::InvalidBinding(msg) => write!(f, "Invalid descriptor binding: {}", msg),
            Error::SwapchainFormatMismatch(msg) => write!(f, "Swapchain format changed: {}", msg),
            Error::UnsupportedAsset(msg) => write!(f, "Unsupported asset: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
