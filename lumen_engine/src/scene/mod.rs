//! Scene module
//!
//! Scene objects and their id-keyed table, object transforms, the camera
//! and the scene lighting value owned by `World`.

mod transform;
mod object;
mod object_table;
mod camera;
mod lighting;

pub use transform::Transform;
pub use object::{SceneObject, ObjectId, PointLight, DEFAULT_LIGHT_INTENSITY, DEFAULT_LIGHT_RADIUS};
pub use object_table::{ObjectTable, ObjectKey};
pub use camera::Camera;
pub use lighting::SceneLighting;
