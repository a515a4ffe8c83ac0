//! Unit tests for object.rs

use glam::Vec3;
use crate::scene::{ObjectId, SceneObject, DEFAULT_LIGHT_INTENSITY, DEFAULT_LIGHT_RADIUS};

#[test]
fn test_ids_are_monotonic() {
    let a = SceneObject::new();
    let b = SceneObject::new();
    let c = SceneObject::default_point_light();
    assert!(b.id() > a.id());
    assert!(c.id() > b.id());
}

#[test]
fn test_id_space_outlasts_u32() {
    // A 32-bit counter would wrap and hand out ids again
    assert_eq!(ObjectId::MAX, u64::MAX);
}

#[test]
fn test_clone_keeps_id() {
    let a = SceneObject::new();
    assert_eq!(a.clone().id(), a.id());
}

#[test]
fn test_default_point_light() {
    let light = SceneObject::default_point_light();
    assert_eq!(light.point_light.unwrap().intensity, DEFAULT_LIGHT_INTENSITY);
    assert_eq!(light.light_radius(), DEFAULT_LIGHT_RADIUS);
    assert_eq!(light.color, Vec3::ONE);
    assert!(light.mesh.is_none());
}

#[test]
fn test_point_light_radius_in_scale_x() {
    let light = SceneObject::point_light(2.0, 0.2, Vec3::new(1.0, 0.1, 0.1));
    assert_eq!(light.transform.scale, Vec3::new(0.2, 1.0, 1.0));
    assert_eq!(light.point_light.unwrap().intensity, 2.0);
}

#[test]
fn test_plain_object_has_no_light() {
    let object = SceneObject::new();
    assert!(object.point_light.is_none());
    assert_eq!(object.material_index, 0);
}
