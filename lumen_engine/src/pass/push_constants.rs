/// Push constant blocks of the built-in passes
///
/// All blocks are `#[repr(C)]`, padded to a multiple of 16 bytes and match
/// the std430 layout the shaders declare.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};

use crate::graphics_device::ShaderStageFlags;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct OpaquePush {
    pub model: Mat4,
    pub normal: Mat4,
    pub frame_index: u32,
    pub material_index: u32,
    _padding: [u32; 2],
}

impl OpaquePush {
    pub const STAGES: ShaderStageFlags = ShaderStageFlags::ALL;
    pub const SIZE: u32 = std::mem::size_of::<Self>() as u32;

    pub fn new(model: Mat4, normal: Mat4, frame_index: u32, material_index: u32) -> Self {
        Self {
            model,
            normal,
            frame_index,
            material_index,
            _padding: [0; 2],
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PointLightPush {
    /// xyz = world position, w = 1
    pub position: Vec4,
    /// rgb = color, w = intensity
    pub color: Vec4,
    pub radius: f32,
    _padding: [f32; 3],
}

impl PointLightPush {
    pub const STAGES: ShaderStageFlags = ShaderStageFlags::VERTEX.union(ShaderStageFlags::FRAGMENT);
    pub const SIZE: u32 = std::mem::size_of::<Self>() as u32;

    pub fn new(position: Vec3, color: Vec3, intensity: f32, radius: f32) -> Self {
        Self {
            position: position.extend(1.0),
            color: color.extend(intensity),
            radius,
            _padding: [0.0; 3],
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SkyboxPush {
    pub projection: Mat4,
    /// Camera view with the translation removed
    pub view: Mat4,
    pub sun_direction: Vec3,
    /// Angular size of the sun disc in radians
    pub sun_size: f32,
}

impl SkyboxPush {
    pub const STAGES: ShaderStageFlags = ShaderStageFlags::VERTEX.union(ShaderStageFlags::FRAGMENT);
    pub const SIZE: u32 = std::mem::size_of::<Self>() as u32;
}

#[cfg(test)]
#[path = "push_constants_tests.rs"]
mod tests;
