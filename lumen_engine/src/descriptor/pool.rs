/// Descriptor pool and its builder

use std::sync::Arc;

use crate::error::Result;
use crate::graphics_device::{
    GraphicsDevice, DescriptorKind, PoolFlags, DescriptorPoolDesc,
    DescriptorPoolHandle, DescriptorSetHandle,
};
use crate::descriptor::DescriptorSetLayout;
use crate::{engine_debug, engine_warn};

/// Default `max_sets` of a pool
pub const DEFAULT_MAX_SETS: u32 = 1000;

// ===== BUILDER =====

/// Builder for [`DescriptorPool`]
pub struct DescriptorPoolBuilder {
    device: Arc<dyn GraphicsDevice>,
    pool_sizes: Vec<(DescriptorKind, u32)>,
    max_sets: u32,
    flags: PoolFlags,
}

impl DescriptorPoolBuilder {
    pub fn new(device: Arc<dyn GraphicsDevice>) -> Self {
        Self {
            device,
            pool_sizes: Vec::new(),
            max_sets: DEFAULT_MAX_SETS,
            flags: PoolFlags::empty(),
        }
    }

    /// Reserve `count` descriptors of `kind` across all sets of the pool
    pub fn add_pool_size(mut self, kind: DescriptorKind, count: u32) -> Self {
        self.pool_sizes.push((kind, count));
        self
    }

    pub fn max_sets(mut self, max_sets: u32) -> Self {
        self.max_sets = max_sets;
        self
    }

    pub fn flags(mut self, flags: PoolFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn build(self) -> Result<Arc<DescriptorPool>> {
        let desc = DescriptorPoolDesc {
            max_sets: self.max_sets,
            pool_sizes: self.pool_sizes,
            flags: self.flags,
        };
        let handle = self.device.create_descriptor_pool(&desc)?;
        engine_debug!("lumen::descriptor", "Created descriptor pool {} (max_sets = {})",
            handle.0, desc.max_sets);

        Ok(Arc::new(DescriptorPool {
            device: self.device,
            handle,
            max_sets: desc.max_sets,
            flags: desc.flags,
        }))
    }
}

// ===== POOL =====

/// Fixed-capacity descriptor set arena
///
/// Exhaustion is not an error: `allocate` returns `Ok(None)` and the caller
/// decides whether to grow, reset or give up. Sets already allocated are
/// never affected by a failed allocation.
pub struct DescriptorPool {
    device: Arc<dyn GraphicsDevice>,
    handle: DescriptorPoolHandle,
    max_sets: u32,
    flags: PoolFlags,
}

impl DescriptorPool {
    /// Allocate one set for `layout`
    pub fn allocate(&self, layout: &DescriptorSetLayout) -> Result<Option<DescriptorSetHandle>> {
        let set = self.device.allocate_descriptor_set(self.handle, layout.handle(), layout.variable_count())?;
        if set.is_none() {
            engine_warn!("lumen::descriptor", "Descriptor pool {} exhausted (max_sets = {})",
                self.handle.0, self.max_sets);
        }
        Ok(set)
    }

    /// Return sets to the pool (requires `PoolFlags::FREE_DESCRIPTOR_SET`)
    pub fn free(&self, sets: &[DescriptorSetHandle]) -> Result<()> {
        if sets.is_empty() {
            return Ok(());
        }
        self.device.free_descriptor_sets(self.handle, sets)
    }

    /// Return every set allocated from the pool
    pub fn reset(&self) -> Result<()> {
        self.device.reset_descriptor_pool(self.handle)
    }

    pub fn handle(&self) -> DescriptorPoolHandle {
        self.handle
    }

    pub fn max_sets(&self) -> u32 {
        self.max_sets
    }

    pub fn flags(&self) -> PoolFlags {
        self.flags
    }

    pub(crate) fn device(&self) -> &Arc<dyn GraphicsDevice> {
        &self.device
    }
}

impl Drop for DescriptorPool {
    fn drop(&mut self) {
        self.device.destroy_descriptor_pool(self.handle);
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
