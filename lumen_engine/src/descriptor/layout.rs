/// Descriptor set layout and its builder

use std::sync::Arc;
use rustc_hash::FxHashMap;

use crate::error::Result;
use crate::graphics_device::{
    GraphicsDevice, DescriptorKind, ShaderStageFlags, BindingFlags,
    DescriptorLayoutBinding, DescriptorSetLayoutDesc, DescriptorSetLayoutHandle,
};
use crate::descriptor::binding_error;
use crate::engine_debug;

// ===== BUILDER =====

/// Builder for [`DescriptorSetLayout`]
///
/// ```ignore
/// let layout = DescriptorSetLayoutBuilder::new(device)
///     .add_binding(0, DescriptorKind::UniformBuffer, ShaderStageFlags::ALL_GRAPHICS, 1)?
///     .add_binding(1, DescriptorKind::CombinedImageSampler, ShaderStageFlags::ALL_GRAPHICS, 65536)?
///     .binding_flags(1, BindingFlags::PARTIALLY_BOUND | BindingFlags::UPDATE_AFTER_BIND)?
///     .update_after_bind_pool()
///     .build()?;
/// ```
pub struct DescriptorSetLayoutBuilder {
    device: Arc<dyn GraphicsDevice>,
    bindings: FxHashMap<u32, DescriptorLayoutBinding>,
    update_after_bind_pool: bool,
}

impl DescriptorSetLayoutBuilder {
    pub fn new(device: Arc<dyn GraphicsDevice>) -> Self {
        Self {
            device,
            bindings: FxHashMap::default(),
            update_after_bind_pool: false,
        }
    }

    /// Declare a binding
    ///
    /// Fails with `InvalidBinding` when the binding is already declared or
    /// `count` is zero.
    pub fn add_binding(
        mut self,
        binding: u32,
        kind: DescriptorKind,
        stages: ShaderStageFlags,
        count: u32,
    ) -> Result<Self> {
        if self.bindings.contains_key(&binding) {
            return Err(binding_error(format!("binding {} already in use", binding)));
        }
        if count == 0 {
            return Err(binding_error(format!("binding {} declared with zero descriptors", binding)));
        }
        self.bindings.insert(binding, DescriptorLayoutBinding {
            binding,
            kind,
            count,
            stages,
            flags: BindingFlags::empty(),
        });
        Ok(self)
    }

    /// Set the descriptor-indexing flags of a declared binding
    pub fn binding_flags(mut self, binding: u32, flags: BindingFlags) -> Result<Self> {
        match self.bindings.get_mut(&binding) {
            Some(entry) => entry.flags = flags,
            None => {
                return Err(binding_error(format!("flags for undeclared binding {}", binding)));
            }
        }
        Ok(self)
    }

    /// Create the layout with the update-after-bind-pool flag
    pub fn update_after_bind_pool(mut self) -> Self {
        self.update_after_bind_pool = true;
        self
    }

    /// Create the layout on the device
    ///
    /// Rejects update-after-bind bindings without the pool flag and a
    /// variable-count binding that is not the highest binding.
    pub fn build(self) -> Result<Arc<DescriptorSetLayout>> {
        let mut sorted: Vec<DescriptorLayoutBinding> = self.bindings.values().copied().collect();
        sorted.sort_by_key(|b| b.binding);

        if !self.update_after_bind_pool {
            if let Some(b) = sorted.iter().find(|b| b.flags.contains(BindingFlags::UPDATE_AFTER_BIND)) {
                return Err(binding_error(format!(
                    "binding {} is update-after-bind but the layout lacks update_after_bind_pool",
                    b.binding
                )));
            }
        }
        let highest = sorted.last().map(|b| b.binding);
        if let Some(b) = sorted.iter().find(|b| b.flags.contains(BindingFlags::VARIABLE_DESCRIPTOR_COUNT)) {
            if Some(b.binding) != highest {
                return Err(binding_error(format!(
                    "variable descriptor count on binding {} which is not the highest binding",
                    b.binding
                )));
            }
        }

        let desc = DescriptorSetLayoutDesc {
            bindings: sorted,
            update_after_bind_pool: self.update_after_bind_pool,
        };
        let handle = self.device.create_descriptor_set_layout(&desc)?;
        engine_debug!("lumen::descriptor", "Created set layout {} with {} binding(s)",
            handle.0, desc.bindings.len());

        Ok(Arc::new(DescriptorSetLayout {
            device: self.device,
            handle,
            bindings: self.bindings,
            update_after_bind_pool: self.update_after_bind_pool,
        }))
    }
}

// ===== LAYOUT =====

/// Immutable descriptor set layout
///
/// Owns its device handle and destroys it on drop.
pub struct DescriptorSetLayout {
    device: Arc<dyn GraphicsDevice>,
    handle: DescriptorSetLayoutHandle,
    bindings: FxHashMap<u32, DescriptorLayoutBinding>,
    update_after_bind_pool: bool,
}

impl DescriptorSetLayout {
    pub fn handle(&self) -> DescriptorSetLayoutHandle {
        self.handle
    }

    /// Declaration of one binding
    pub fn binding(&self, binding: u32) -> Option<&DescriptorLayoutBinding> {
        self.bindings.get(&binding)
    }

    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_update_after_bind(&self) -> bool {
        self.update_after_bind_pool
    }

    /// Count of the variable-sized binding, allocated at its declared maximum
    pub fn variable_count(&self) -> Option<u32> {
        self.bindings
            .values()
            .find(|b| b.flags.contains(BindingFlags::VARIABLE_DESCRIPTOR_COUNT))
            .map(|b| b.count)
    }
}

impl Drop for DescriptorSetLayout {
    fn drop(&mut self) {
        self.device.destroy_descriptor_set_layout(self.handle);
    }
}

#[cfg(test)]
#[path = "layout_tests.rs"]
mod tests;
