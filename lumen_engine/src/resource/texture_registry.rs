/// TextureRegistry - named textures with stable bindless indices
///
/// Indices are handed out in first-seen order and never reused; the index
/// of a texture is its element in the bindless sampler array. Registering
/// a name twice returns the first index and creates nothing.

use std::path::Path;
use std::sync::Arc;
use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::graphics_device::{GraphicsDevice, Texture, TextureDesc, ImageDescriptor};
use crate::descriptor::MAX_BINDLESS_TEXTURES;
use crate::resource::image_loader;
use crate::resource::INVALID_INDEX;
use crate::{engine_debug, engine_error};

/// Name of the texture installed at index 0 by `with_default`
pub const DEFAULT_TEXTURE_NAME: &str = "default_white";

struct TextureEntry {
    name: String,
    texture: Arc<dyn Texture>,
}

pub struct TextureRegistry {
    device: Arc<dyn GraphicsDevice>,
    entries: Vec<TextureEntry>,
    indices: FxHashMap<String, u32>,
}

impl TextureRegistry {
    /// Empty registry; the first texture added gets index 0
    pub fn new(device: Arc<dyn GraphicsDevice>) -> Self {
        Self {
            device,
            entries: Vec::new(),
            indices: FxHashMap::default(),
        }
    }

    /// Registry with a 1x1 opaque white texture at index 0
    pub fn with_default(device: Arc<dyn GraphicsDevice>) -> Result<Self> {
        let mut registry = Self::new(device);
        registry.create_texture(DEFAULT_TEXTURE_NAME, &image_loader::white_texture_desc())?;
        Ok(registry)
    }

    // ===== REGISTRATION =====

    /// Register an existing texture under `name`
    ///
    /// If the name is taken, the existing index is returned and `texture`
    /// is dropped.
    pub fn add_texture(&mut self, name: &str, texture: Arc<dyn Texture>) -> Result<u32> {
        if let Some(&index) = self.indices.get(name) {
            return Ok(index);
        }
        if self.entries.len() >= MAX_BINDLESS_TEXTURES as usize {
            let message = format!("texture '{}' exceeds the bindless capacity of {}", name, MAX_BINDLESS_TEXTURES);
            engine_error!("lumen::resource", "{}", message);
            return Err(Error::InvalidResource(message));
        }
        let index = self.entries.len() as u32;
        self.entries.push(TextureEntry { name: name.to_string(), texture });
        self.indices.insert(name.to_string(), index);
        engine_debug!("lumen::resource", "Texture '{}' registered at index {}", name, index);
        Ok(index)
    }

    /// Create a texture from pixels, unless `name` is already registered
    pub fn create_texture(&mut self, name: &str, desc: &TextureDesc) -> Result<u32> {
        if let Some(&index) = self.indices.get(name) {
            return Ok(index);
        }
        let texture = self.device.create_texture(desc)?;
        self.add_texture(name, texture)
    }

    /// Decode and create a texture from a file, unless `name` is already registered
    pub fn load_texture(&mut self, name: &str, path: impl AsRef<Path>) -> Result<u32> {
        if let Some(&index) = self.indices.get(name) {
            return Ok(index);
        }
        let desc = image_loader::load_texture_desc(path)?;
        self.create_texture(name, &desc)
    }

    // ===== LOOKUP =====

    /// Index of `name`, or `INVALID_INDEX` (-1)
    pub fn texture_id(&self, name: &str) -> i32 {
        self.indices.get(name).map_or(INVALID_INDEX, |&index| index as i32)
    }

    /// Index of `name`, falling back to 0 (the default texture)
    pub fn resolve_texture(&self, name: &str) -> u32 {
        self.indices.get(name).copied().unwrap_or(0)
    }

    pub fn get(&self, index: u32) -> Option<&Arc<dyn Texture>> {
        self.entries.get(index as usize).map(|entry| &entry.texture)
    }

    pub fn name(&self, index: u32) -> Option<&str> {
        self.entries.get(index as usize).map(|entry| entry.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Contents of the bindless sampler array, in index order
    pub fn image_descriptors(&self) -> Vec<ImageDescriptor> {
        self.entries.iter().map(|entry| entry.texture.image_descriptor()).collect()
    }
}

#[cfg(test)]
#[path = "texture_registry_tests.rs"]
mod tests;
