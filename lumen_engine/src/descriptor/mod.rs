/// Descriptor module - bindless-capable descriptor binding protocol
///
/// - `DescriptorSetLayoutBuilder` -> immutable `DescriptorSetLayout`
/// - `DescriptorPoolBuilder` -> `DescriptorPool` (allocate / free / reset)
/// - `DescriptorWriter` validates writes against a layout and applies them
///   in a single batched update

pub mod bindings;
pub mod layout;
pub mod pool;
pub mod writer;

pub use bindings::*;
pub use layout::*;
pub use pool::*;
pub use writer::*;

use crate::error::Error;
use crate::engine_error;

/// Log a binding mistake and build the matching error
pub(crate) fn binding_error(message: String) -> Error {
    engine_error!("lumen::descriptor", "{}", message);
    Error::InvalidBinding(message)
}
