/// SceneLighting - directional sun parameters owned by the world

use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneLighting {
    /// Direction the sunlight travels, normalized
    pub sun_direction: Vec3,
    /// Angular size of the sun disc in radians
    pub sun_size: f32,
    pub sun_intensity: f32,
}

impl Default for SceneLighting {
    fn default() -> Self {
        Self {
            sun_direction: Vec3::new(-1.0, -1.0, 0.0).normalize(),
            sun_size: 2.5f32.to_radians(),
            sun_intensity: 10.0,
        }
    }
}

impl SceneLighting {
    /// Point the sun along `direction` (normalized here)
    pub fn set_sun_direction(&mut self, direction: Vec3) {
        self.sun_direction = direction.normalize_or_zero();
    }
}
