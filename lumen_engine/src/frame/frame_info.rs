/// FrameInfo - what a draw pass sees of the frame being recorded

use crate::graphics_device::{CommandList, DescriptorSetHandle};
use crate::scene::{Camera, ObjectTable, SceneLighting};

/// Borrowed view of one frame
///
/// Built by `World` twice per frame: once for the update phase (before the
/// render pass begins) and once for the render phase.
pub struct FrameInfo<'a> {
    /// Frame slot index, selects the per-frame uniform buffer and global set
    pub frame_index: usize,
    /// Seconds since the previous frame
    pub delta_time: f32,
    pub command_list: &'a mut dyn CommandList,
    pub camera: &'a Camera,
    /// Global descriptor set of this frame slot
    pub global_set: DescriptorSetHandle,
    pub objects: &'a ObjectTable,
    pub lighting: &'a SceneLighting,
}
