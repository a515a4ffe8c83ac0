//! Unit tests for camera.rs

use glam::{Mat4, Vec3};
use crate::scene::Camera;

#[test]
fn test_zero_rotation_at_origin_is_identity() {
    let mut camera = Camera::new();
    camera.set_view_yxz(Vec3::ZERO, Vec3::ZERO);
    assert!(camera.view().abs_diff_eq(Mat4::IDENTITY, 1e-6));
}

#[test]
fn test_view_times_inverse_is_identity() {
    let mut camera = Camera::new();
    camera.set_view_yxz(Vec3::new(1.0, -2.0, 3.0), Vec3::new(0.4, -0.9, 0.2));
    assert!((camera.view() * camera.inverse_view()).abs_diff_eq(Mat4::IDENTITY, 1e-5));
    assert!(camera.position().abs_diff_eq(Vec3::new(1.0, -2.0, 3.0), 1e-5));
}

#[test]
fn test_view_target_puts_target_on_forward_axis() {
    let mut camera = Camera::new();
    let target = Vec3::new(0.0, 0.0, 2.5);
    camera.set_view_target(Vec3::new(-1.0, -2.0, -2.0), target, Vec3::NEG_Y);

    let in_view = camera.view().transform_point3(target);

    assert!(in_view.x.abs() < 1e-5);
    assert!(in_view.y.abs() < 1e-5);
    assert!(in_view.z > 0.0);
}

#[test]
fn test_perspective_depth_range_is_zero_to_one() {
    let mut camera = Camera::new();
    camera.set_perspective_projection(50f32.to_radians(), 16.0 / 9.0, 0.1, 100.0);

    let near = camera.projection().project_point3(Vec3::new(0.0, 0.0, 0.1));
    let far = camera.projection().project_point3(Vec3::new(0.0, 0.0, 100.0));

    assert!(near.z.abs() < 1e-5);
    assert!((far.z - 1.0).abs() < 1e-5);
}

#[test]
fn test_orthographic_maps_box_to_clip() {
    let mut camera = Camera::new();
    camera.set_orthographic_projection(-1.0, 1.0, -1.0, 1.0, 0.0, 10.0);

    let corner = camera.projection().project_point3(Vec3::new(1.0, 1.0, 10.0));

    assert!(corner.abs_diff_eq(Vec3::new(1.0, 1.0, 1.0), 1e-5));
}
