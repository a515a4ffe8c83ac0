/// GlobalUbo - per-frame uniform block bound at set 0, binding 0
///
/// Layout follows std140: every member is a vec4 or mat4, and the light
/// count is padded out to a full vec4.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};

/// Capacity of the point light array
pub const MAX_POINT_LIGHTS: usize = 10;

/// One point light as seen by shaders
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct PointLightData {
    /// xyz = world position, w = 1
    pub position: Vec4,
    /// rgb = color, w = intensity
    pub color: Vec4,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GlobalUbo {
    pub projection: Mat4,
    pub view: Mat4,
    pub inverse_view: Mat4,
    /// rgb = color, w = intensity
    pub ambient_light_color: Vec4,
    pub point_lights: [PointLightData; MAX_POINT_LIGHTS],
    pub light_count: u32,
    _padding: [u32; 3],
}

impl Default for GlobalUbo {
    fn default() -> Self {
        Self {
            projection: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            inverse_view: Mat4::IDENTITY,
            ambient_light_color: Vec4::new(1.0, 1.0, 1.0, 0.02),
            point_lights: [PointLightData::default(); MAX_POINT_LIGHTS],
            light_count: 0,
            _padding: [0; 3],
        }
    }
}

impl GlobalUbo {
    /// Size of the block in bytes
    pub const SIZE: u64 = std::mem::size_of::<GlobalUbo>() as u64;

    /// Block with the given camera matrices and no lights
    pub fn with_camera(projection: Mat4, view: Mat4, inverse_view: Mat4) -> Self {
        Self {
            projection,
            view,
            inverse_view,
            ..Default::default()
        }
    }

    /// Append a point light, returning false when the array is full
    pub fn push_light(&mut self, position: Vec3, color: Vec3, intensity: f32) -> bool {
        let slot = self.light_count as usize;
        if slot >= MAX_POINT_LIGHTS {
            return false;
        }
        self.point_lights[slot] = PointLightData {
            position: position.extend(1.0),
            color: color.extend(intensity),
        };
        self.light_count += 1;
        true
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

#[cfg(test)]
#[path = "global_ubo_tests.rs"]
mod tests;
