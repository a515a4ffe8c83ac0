/// MaterialRegistry - named materials mirrored into a storage buffer
///
/// Materials live in a CPU table indexed in first-seen order. The GPU
/// buffer (set 0, binding 3) is sized for `MATERIAL_CAPACITY` records up
/// front and only changes on an explicit `commit`.

use std::sync::Arc;
use bytemuck::{Pod, Zeroable};
use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::graphics_device::{GraphicsDevice, Buffer, BufferDesc, BufferUsage, BufferDescriptor};
use crate::resource::INVALID_INDEX;
use crate::{engine_debug, engine_warn, engine_error};

/// Number of materials the GPU buffer holds
pub const MATERIAL_CAPACITY: usize = 100;

/// GPU material record: indices into the bindless texture array
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct Material {
    pub albedo_index: u32,
    pub normal_index: u32,
}

impl Material {
    pub fn new(albedo_index: u32, normal_index: u32) -> Self {
        Self { albedo_index, normal_index }
    }
}

pub struct MaterialRegistry {
    buffer: Arc<dyn Buffer>,
    materials: Vec<Material>,
    indices: FxHashMap<String, u32>,
    /// Table changed since the last commit
    dirty: bool,
    /// A staleness warning was issued for the current dirty period
    stale_warned: bool,
}

impl MaterialRegistry {
    pub fn new(device: &dyn GraphicsDevice) -> Result<Self> {
        let size = (MATERIAL_CAPACITY * std::mem::size_of::<Material>()) as u64;
        let buffer = device.create_buffer(&BufferDesc::new(size, BufferUsage::Storage))?;
        Ok(Self {
            buffer,
            materials: Vec::new(),
            indices: FxHashMap::default(),
            dirty: false,
            stale_warned: false,
        })
    }

    /// Register a material under `name`
    ///
    /// Re-adding a known name returns its index and keeps the first values.
    pub fn add_material(&mut self, name: &str, material: Material) -> Result<u32> {
        if let Some(&index) = self.indices.get(name) {
            return Ok(index);
        }
        if self.materials.len() >= MATERIAL_CAPACITY {
            let message = format!("material '{}' exceeds the capacity of {}", name, MATERIAL_CAPACITY);
            engine_error!("lumen::resource", "{}", message);
            return Err(Error::InvalidResource(message));
        }
        let index = self.materials.len() as u32;
        self.materials.push(material);
        self.indices.insert(name.to_string(), index);
        self.mark_dirty();
        engine_debug!("lumen::resource", "Material '{}' registered at index {}", name, index);
        Ok(index)
    }

    /// Replace the values of a registered material
    pub fn set_material(&mut self, index: u32, material: Material) -> Result<()> {
        match self.materials.get_mut(index as usize) {
            Some(slot) => {
                *slot = material;
                self.mark_dirty();
                Ok(())
            }
            None => Err(Error::InvalidResource(format!("no material at index {}", index))),
        }
    }

    fn mark_dirty(&mut self) {
        if !self.dirty {
            self.dirty = true;
            self.stale_warned = false;
        }
    }

    /// Index of `name`, or `INVALID_INDEX` (-1)
    pub fn material_id(&self, name: &str) -> i32 {
        self.indices.get(name).map_or(INVALID_INDEX, |&index| index as i32)
    }

    /// Index of `name`, falling back to 0
    pub fn resolve_material(&self, name: &str) -> u32 {
        self.indices.get(name).copied().unwrap_or(0)
    }

    pub fn get(&self, index: u32) -> Option<&Material> {
        self.materials.get(index as usize)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    // ===== GPU MIRROR =====

    /// Write every material, in index order, to the start of the buffer
    pub fn commit(&mut self) -> Result<()> {
        self.buffer.update(0, bytemuck::cast_slice(&self.materials))?;
        self.dirty = false;
        self.stale_warned = false;
        Ok(())
    }

    /// True when the table changed since the last commit
    pub fn is_stale(&self) -> bool {
        self.dirty
    }

    /// Warn once per stale period in debug builds
    ///
    /// Returns true when the buffer is stale.
    pub fn check_committed(&mut self) -> bool {
        if self.dirty && cfg!(debug_assertions) && !self.stale_warned {
            engine_warn!("lumen::resource",
                "Material table changed but commit() was not called; GPU sees stale materials");
            self.stale_warned = true;
        }
        self.dirty
    }

    /// Storage buffer descriptor covering the whole buffer
    pub fn descriptor_info(&self) -> BufferDescriptor {
        self.buffer.descriptor_info()
    }

    pub fn buffer(&self) -> &Arc<dyn Buffer> {
        &self.buffer
    }
}

#[cfg(test)]
#[path = "material_registry_tests.rs"]
mod tests;
