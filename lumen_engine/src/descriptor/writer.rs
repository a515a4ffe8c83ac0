/// DescriptorWriter - validated, batched descriptor writes

use crate::error::Result;
use crate::graphics_device::{
    DescriptorKind, DescriptorLayoutBinding, DescriptorResources, DescriptorWrite,
    DescriptorSetHandle, BufferDescriptor, ImageDescriptor,
};
use crate::descriptor::{DescriptorSetLayout, DescriptorPool, binding_error};

/// Write queued by the writer, not yet bound to a set
#[derive(Debug, Clone)]
struct PendingWrite {
    binding: u32,
    kind: DescriptorKind,
    resources: DescriptorResources,
}

/// Collects descriptor writes for one (layout, pool) pair
///
/// Every `write_*` call is checked against the layout immediately; a
/// rejected call queues nothing. `build` allocates a set and applies the
/// batch, `overwrite` applies the batch to an existing set. Both issue a
/// single update call.
///
/// Only one writer may target a given set at a time.
///
/// ```ignore
/// let set = DescriptorWriter::new(&layout, &pool)
///     .write_buffer(GLOBAL_UBO_BINDING, ubo.descriptor_info())?
///     .write_image_array(TEXTURE_ARRAY_BINDING, &textures)?
///     .build()?;
/// ```
pub struct DescriptorWriter<'a> {
    layout: &'a DescriptorSetLayout,
    pool: &'a DescriptorPool,
    writes: Vec<PendingWrite>,
}

impl<'a> DescriptorWriter<'a> {
    pub fn new(layout: &'a DescriptorSetLayout, pool: &'a DescriptorPool) -> Self {
        Self {
            layout,
            pool,
            writes: Vec::new(),
        }
    }

    fn declared(&self, binding: u32) -> Result<&'a DescriptorLayoutBinding> {
        self.layout
            .binding(binding)
            .ok_or_else(|| binding_error(format!("layout does not contain binding {}", binding)))
    }

    /// Write one buffer into a single-descriptor buffer binding
    pub fn write_buffer(&mut self, binding: u32, info: BufferDescriptor) -> Result<&mut Self> {
        let decl = self.declared(binding)?;
        if !decl.kind.is_buffer() {
            return Err(binding_error(format!("binding {} is {:?}, not a buffer binding", binding, decl.kind)));
        }
        if decl.count != 1 {
            return Err(binding_error(format!(
                "binding {} holds {} descriptors, use write_buffers", binding, decl.count
            )));
        }
        self.queue(decl, DescriptorResources::Buffers(vec![info]));
        Ok(self)
    }

    /// Write consecutive buffers starting at array element 0
    pub fn write_buffers(&mut self, binding: u32, infos: &[BufferDescriptor]) -> Result<&mut Self> {
        let decl = self.declared(binding)?;
        if !decl.kind.is_buffer() {
            return Err(binding_error(format!("binding {} is {:?}, not a buffer binding", binding, decl.kind)));
        }
        if infos.len() > decl.count as usize {
            return Err(binding_error(format!(
                "{} buffers written to binding {} which holds {}", infos.len(), binding, decl.count
            )));
        }
        self.queue(decl, DescriptorResources::Buffers(infos.to_vec()));
        Ok(self)
    }

    /// Write one image into a single-descriptor image binding
    pub fn write_image(&mut self, binding: u32, info: ImageDescriptor) -> Result<&mut Self> {
        let decl = self.declared(binding)?;
        if !decl.kind.is_image() {
            return Err(binding_error(format!("binding {} is {:?}, not an image binding", binding, decl.kind)));
        }
        if decl.count != 1 {
            return Err(binding_error(format!(
                "binding {} holds {} descriptors, use write_image_array", binding, decl.count
            )));
        }
        self.queue(decl, DescriptorResources::Images(vec![info]));
        Ok(self)
    }

    /// Write the elements of a combined image sampler array starting at 0
    ///
    /// Elements past `infos.len()` are left untouched, which is only valid
    /// for partially-bound bindings.
    pub fn write_image_array(&mut self, binding: u32, infos: &[ImageDescriptor]) -> Result<&mut Self> {
        let decl = self.declared(binding)?;
        if decl.kind != DescriptorKind::CombinedImageSampler {
            return Err(binding_error(format!(
                "binding {} is {:?}, image arrays need CombinedImageSampler", binding, decl.kind
            )));
        }
        if infos.len() > decl.count as usize {
            return Err(binding_error(format!(
                "{} images written to binding {} which holds {}", infos.len(), binding, decl.count
            )));
        }
        self.queue(decl, DescriptorResources::Images(infos.to_vec()));
        Ok(self)
    }

    fn queue(&mut self, decl: &DescriptorLayoutBinding, resources: DescriptorResources) {
        // Zero-length writes are not representable on the device
        if resources.is_empty() {
            return;
        }
        // A later write to the same binding replaces the earlier one
        self.writes.retain(|w| w.binding != decl.binding);
        self.writes.push(PendingWrite {
            binding: decl.binding,
            kind: decl.kind,
            resources,
        });
    }

    /// Number of queued writes
    pub fn pending(&self) -> usize {
        self.writes.len()
    }

    /// Allocate a set from the pool and apply the queued writes
    ///
    /// Returns `Ok(None)` when the pool is exhausted.
    pub fn build(&self) -> Result<Option<DescriptorSetHandle>> {
        let set = match self.pool.allocate(self.layout)? {
            Some(set) => set,
            None => return Ok(None),
        };
        self.overwrite(set)?;
        Ok(Some(set))
    }

    /// Apply the queued writes to an existing set in one update call
    pub fn overwrite(&self, set: DescriptorSetHandle) -> Result<()> {
        if self.writes.is_empty() {
            return Ok(());
        }
        let writes: Vec<DescriptorWrite> = self
            .writes
            .iter()
            .map(|w| DescriptorWrite {
                set,
                binding: w.binding,
                array_element: 0,
                kind: w.kind,
                resources: w.resources.clone(),
            })
            .collect();
        self.pool.device().update_descriptor_sets(&writes)
    }
}

#[cfg(test)]
#[path = "writer_tests.rs"]
mod tests;
