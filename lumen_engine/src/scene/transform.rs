/// Transform - translation, scale and Tait-Bryan rotation of a scene object

use glam::{EulerRot, Mat4, Quat, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub scale: Vec3,
    /// Euler angles in radians, applied Y, then X, then Z
    pub rotation: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            scale: Vec3::ONE,
            rotation: Vec3::ZERO,
        }
    }
}

impl Transform {
    fn orientation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.rotation.y, self.rotation.x, self.rotation.z)
    }

    /// Model matrix: translate * Ry * Rx * Rz * scale
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.orientation(), self.translation)
    }

    /// Inverse transpose of the model matrix's upper 3x3, widened to a mat4
    ///
    /// For rotation * scale this is rotation * scale^-1.
    pub fn normal_matrix(&self) -> Mat4 {
        Mat4::from_quat(self.orientation()) * Mat4::from_scale(self.scale.recip())
    }
}

#[cfg(test)]
#[path = "transform_tests.rs"]
mod tests;
