/// Draw passes - per-frame recording of one kind of geometry
///
/// `World` runs every pass's `update` before the render pass begins, then
/// every pass's `render` inside it, in creation order.

mod draw_pass;
mod push_constants;
mod shader;
mod opaque_pass;
mod point_light_pass;
pub(crate) mod skybox_pass;

pub use draw_pass::{DrawPass, PassContext};
pub use push_constants::{OpaquePush, PointLightPush, SkyboxPush};
pub use shader::{load_shader, check_spirv, ShaderPair};
pub use opaque_pass::OpaquePass;
pub use point_light_pass::PointLightPass;
pub use skybox_pass::{SkyboxPass, SKYBOX_VERTEX_COUNT};
pub use point_light_pass::BILLBOARD_VERTEX_COUNT;

#[cfg(test)]
#[path = "pass_tests.rs"]
mod tests;
