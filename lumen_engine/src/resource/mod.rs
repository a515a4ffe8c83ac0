//! Resource management module
//!
//! Bindless textures, materials and meshes. Texture and material indices
//! are stable for the lifetime of the registries and are read by shaders
//! directly.

pub mod image_loader;
mod texture_registry;
mod material_registry;
mod mesh;
mod model_loader;
mod resource_manager;

/// Index returned by lookups of unknown names
pub const INVALID_INDEX: i32 = -1;

pub use texture_registry::{TextureRegistry, DEFAULT_TEXTURE_NAME};
pub use material_registry::{Material, MaterialRegistry, MATERIAL_CAPACITY};
pub use mesh::{Vertex, MeshData, Mesh};
pub use model_loader::{parse_obj, parse_gltf};
pub use resource_manager::{ResourceManager, FLAT_NORMAL_TEXTURE_NAME, DEFAULT_MATERIAL_NAME};
