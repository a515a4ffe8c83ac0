//! World module
//!
//! `World` owns everything one running scene needs (frame scheduler,
//! resources, global descriptor sets, scene objects, camera, lighting and
//! draw passes) and drives them once per frame. Games plug in through
//! `GameHooks`.

mod game_hooks;
mod world;

pub use game_hooks::GameHooks;
pub use world::{World, DEFAULT_FOV_Y, DEFAULT_NEAR, DEFAULT_FAR};
