/// SceneObject - a renderable or light-emitting entity of the world

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use glam::Vec3;
use crate::resource::Mesh;
use crate::scene::Transform;

/// Process-wide object identifier, never reused
pub type ObjectId = u64;

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(0);

pub const DEFAULT_LIGHT_INTENSITY: f32 = 10.0;
pub const DEFAULT_LIGHT_RADIUS: f32 = 0.1;

/// Point light payload of an object
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub intensity: f32,
}

#[derive(Clone)]
pub struct SceneObject {
    id: ObjectId,
    pub transform: Transform,
    pub mesh: Option<Arc<Mesh>>,
    /// Index into the material table
    pub material_index: u32,
    pub color: Vec3,
    pub point_light: Option<PointLight>,
}

impl SceneObject {
    /// Create an empty object with the next id
    pub fn new() -> Self {
        Self {
            id: NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed),
            transform: Transform::default(),
            mesh: None,
            material_index: 0,
            color: Vec3::ZERO,
            point_light: None,
        }
    }

    /// Object drawing a mesh
    pub fn with_mesh(mesh: Arc<Mesh>) -> Self {
        let mut object = Self::new();
        object.mesh = Some(mesh);
        object
    }

    /// Point light object
    ///
    /// The light radius is stored in `transform.scale.x`.
    pub fn point_light(intensity: f32, radius: f32, color: Vec3) -> Self {
        let mut object = Self::new();
        object.color = color;
        object.transform.scale.x = radius;
        object.point_light = Some(PointLight { intensity });
        object
    }

    /// White point light with the default intensity and radius
    pub fn default_point_light() -> Self {
        Self::point_light(DEFAULT_LIGHT_INTENSITY, DEFAULT_LIGHT_RADIUS, Vec3::ONE)
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Radius of a point light object
    pub fn light_radius(&self) -> f32 {
        self.transform.scale.x
    }
}

impl Default for SceneObject {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SceneObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneObject")
            .field("id", &self.id)
            .field("transform", &self.transform)
            .field("has_mesh", &self.mesh.is_some())
            .field("material_index", &self.material_index)
            .field("color", &self.color)
            .field("point_light", &self.point_light)
            .finish()
    }
}

#[cfg(test)]
#[path = "object_tests.rs"]
mod tests;
