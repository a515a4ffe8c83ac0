/// FrameSlot trait - per-frame command list and synchronization
///
/// One slot per frame in flight. A slot's fence is signaled when the GPU
/// work of its last submission has retired; the slot must be waited on
/// before its command list is re-recorded.

use crate::error::Result;
use crate::graphics_device::CommandList;

pub trait FrameSlot: Send {
    /// Slot index in `0..MAX_FRAMES_IN_FLIGHT`
    fn index(&self) -> usize;

    /// Block until the slot's last submission has completed
    fn wait(&self) -> Result<()>;

    /// Command list recorded for this slot
    fn command_list(&mut self) -> &mut dyn CommandList;

    /// Submit the recorded command list
    ///
    /// Waits on the image-available semaphore and signals `signal_semaphore`
    /// and the slot fence. The signal semaphore belongs to the acquired
    /// swapchain image, not to the slot. The fence is reset just before
    /// submission so a skipped frame never leaves it unsignaled.
    fn submit(&mut self, signal_semaphore: u64) -> Result<()>;

    /// Semaphore signaled by image acquisition
    fn image_available_semaphore(&self) -> u64;
}
