//! Frame lifecycle module
//!
//! `FrameScheduler` runs the begin/end frame protocol over a set of frame
//! slots and one swapchain generation at a time. `GlobalUbo` is the
//! per-frame uniform block and `FrameInfo` the view of one frame handed to
//! draw passes.

mod scheduler;
mod global_ubo;
mod frame_info;

pub use scheduler::{FrameScheduler, FrameState};
pub use global_ubo::{GlobalUbo, PointLightData, MAX_POINT_LIGHTS};
pub use frame_info::FrameInfo;
