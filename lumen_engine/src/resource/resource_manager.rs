/// Central resource manager for the engine.
///
/// Owns the bindless texture table and the material table. Both hand out
/// stable integer indices that shaders use directly:
///
/// ```text
/// textures   0: default_white   1: flat_normal   2..: user textures
/// materials  0: default {albedo 0, normal 1}     1..: user materials
/// ```
///
/// Texture and material tables are only mutated between frames.

use std::path::Path;
use std::sync::Arc;

use crate::error::Result;
use crate::graphics_device::{GraphicsDevice, Texture, TextureDesc, BufferDescriptor, ImageDescriptor};
use crate::resource::{TextureRegistry, MaterialRegistry, Material, image_loader};
use crate::engine_info;

/// Name of the built-in flat normal map (index 1)
pub const FLAT_NORMAL_TEXTURE_NAME: &str = "flat_normal";

/// Name of the built-in material (index 0)
pub const DEFAULT_MATERIAL_NAME: &str = "default";

pub struct ResourceManager {
    textures: TextureRegistry,
    materials: MaterialRegistry,
}

impl ResourceManager {
    /// Create the registries with the built-in textures and material
    ///
    /// The default material is committed before returning.
    pub fn new(device: Arc<dyn GraphicsDevice>) -> Result<Self> {
        let materials = MaterialRegistry::new(device.as_ref())?;
        let mut textures = TextureRegistry::with_default(device)?;
        let flat_normal = textures.create_texture(
            FLAT_NORMAL_TEXTURE_NAME,
            &image_loader::flat_normal_texture_desc(),
        )?;

        let mut manager = Self { textures, materials };
        manager.materials.add_material(DEFAULT_MATERIAL_NAME, Material::new(0, flat_normal))?;
        manager.materials.commit()?;

        engine_info!("lumen::resource", "Resource manager ready ({} textures, {} materials)",
            manager.textures.len(), manager.materials.len());
        Ok(manager)
    }

    // ===== TEXTURES =====

    pub fn add_texture(&mut self, name: &str, texture: Arc<dyn Texture>) -> Result<u32> {
        self.textures.add_texture(name, texture)
    }

    pub fn create_texture(&mut self, name: &str, desc: &TextureDesc) -> Result<u32> {
        self.textures.create_texture(name, desc)
    }

    pub fn load_texture(&mut self, name: &str, path: impl AsRef<Path>) -> Result<u32> {
        self.textures.load_texture(name, path)
    }

    pub fn texture_id(&self, name: &str) -> i32 {
        self.textures.texture_id(name)
    }

    pub fn resolve_texture(&self, name: &str) -> u32 {
        self.textures.resolve_texture(name)
    }

    /// Bindless sampler array contents, in index order
    pub fn image_descriptors(&self) -> Vec<ImageDescriptor> {
        self.textures.image_descriptors()
    }

    pub fn textures(&self) -> &TextureRegistry {
        &self.textures
    }

    // ===== MATERIALS =====

    pub fn add_material(&mut self, name: &str, material: Material) -> Result<u32> {
        self.materials.add_material(name, material)
    }

    /// Register a material from texture names
    ///
    /// Unknown names resolve to the built-in white texture and flat normal.
    pub fn add_material_from_textures(&mut self, name: &str, albedo: &str, normal: &str) -> Result<u32> {
        let albedo_index = self.textures.resolve_texture(albedo);
        let normal_index = match self.textures.texture_id(normal) {
            index if index >= 0 => index as u32,
            _ => self.textures.resolve_texture(FLAT_NORMAL_TEXTURE_NAME),
        };
        self.materials.add_material(name, Material::new(albedo_index, normal_index))
    }

    pub fn material_id(&self, name: &str) -> i32 {
        self.materials.material_id(name)
    }

    pub fn resolve_material(&self, name: &str) -> u32 {
        self.materials.resolve_material(name)
    }

    /// Copy the material table into its GPU buffer
    pub fn commit(&mut self) -> Result<()> {
        self.materials.commit()
    }

    /// Storage buffer descriptor of the material table
    pub fn descriptor_info(&self) -> BufferDescriptor {
        self.materials.descriptor_info()
    }

    pub fn materials(&self) -> &MaterialRegistry {
        &self.materials
    }

    pub fn materials_mut(&mut self) -> &mut MaterialRegistry {
        &mut self.materials
    }
}

#[cfg(test)]
#[path = "resource_manager_tests.rs"]
mod tests;
