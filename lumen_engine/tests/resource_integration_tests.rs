//! Integration tests for the resource registries and meshes on a real device
//!
//! All tests require a GPU and are marked with #[ignore].
//!
//! Run with: cargo test --test resource_integration_tests -- --ignored


use std::io::BufReader;

use gpu_test_utils::get_test_device;
use serial_test::serial;

use lumen_engine::lumen::device::{Format, TextureDesc};
use lumen_engine::lumen::resource::{
    parse_obj, Material, Mesh, ResourceManager, DEFAULT_MATERIAL_NAME, DEFAULT_TEXTURE_NAME,
    FLAT_NORMAL_TEXTURE_NAME, INVALID_INDEX,
};

fn checker(size: u32) -> TextureDesc {
    let data = (0..size * size)
        .flat_map(|i| if i % 2 == 0 { [0u8, 0, 0, 255] } else { [255u8, 255, 255, 255] })
        .collect();
    TextureDesc::new(size, size, Format::R8G8B8A8_SRGB, data)
}

// ============================================================================
// TEXTURES
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_resource_manager_builtins() {
    let device = get_test_device();
    let resources = ResourceManager::new(device).unwrap();

    assert_eq!(resources.texture_id(DEFAULT_TEXTURE_NAME), 0);
    assert_eq!(resources.texture_id(FLAT_NORMAL_TEXTURE_NAME), 1);
    assert_eq!(resources.material_id(DEFAULT_MATERIAL_NAME), 0);
    assert!(!resources.materials().is_stale());

    let white = resources.textures().get(0).unwrap();
    assert_eq!(white.info().width, 1);
    let normal = resources.textures().get(1).unwrap();
    assert_eq!(normal.info().width, 256);
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_texture_indices_are_stable() {
    let device = get_test_device();
    let mut resources = ResourceManager::new(device).unwrap();

    let t1 = resources.create_texture("t1", &checker(4)).unwrap();
    let t2 = resources.create_texture("t2", &checker(8)).unwrap();
    let t3 = resources.create_texture("t3", &checker(2)).unwrap();
    assert_eq!((t1, t2, t3), (2, 3, 4));

    let count = resources.textures().len();
    let again = resources.create_texture("t1", &checker(16)).unwrap();
    assert_eq!(again, t1);
    assert_eq!(resources.textures().len(), count);
    assert_eq!(resources.textures().get(t1).unwrap().info().width, 4);

    assert_eq!(resources.texture_id("missing"), INVALID_INDEX);
    assert_eq!(resources.resolve_texture("missing"), 0);

    let descriptors = resources.image_descriptors();
    assert_eq!(descriptors.len(), count);
    assert_eq!(descriptors[t2 as usize], resources.textures().get(t2).unwrap().image_descriptor());
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_hdr_texture_upload() {
    let device = get_test_device();
    let mut resources = ResourceManager::new(device).unwrap();

    let pixels: Vec<f32> = vec![0.5; 2 * 2 * 4];
    let desc = TextureDesc::new(2, 2, Format::R32G32B32A32_SFLOAT, bytemuck::cast_slice(&pixels).to_vec());
    let index = resources.create_texture("sky", &desc).unwrap();

    let texture = resources.textures().get(index).unwrap();
    assert_eq!(texture.info().format, Format::R32G32B32A32_SFLOAT);
}

// ============================================================================
// MATERIALS
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_material_commit_cycle() {
    let device = get_test_device();
    let mut resources = ResourceManager::new(device).unwrap();

    let albedo = resources.create_texture("albedo", &checker(4)).unwrap();
    let index = resources.add_material_from_textures("stone", "albedo", "no_such_normal").unwrap();
    assert_eq!(index, 1);
    assert_eq!(resources.materials().get(index), Some(&Material::new(albedo, 1)));
    assert!(resources.materials().is_stale());

    resources.commit().unwrap();
    assert!(!resources.materials().is_stale());

    let info = resources.descriptor_info();
    assert_eq!(info.offset, 0);
    assert_eq!(info.range, resources.materials().buffer().size());
}

// ============================================================================
// MESHES
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_mesh_upload_from_obj() {
    let device = get_test_device();
    let source = "\
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
f 1/1/1 2/2/1 3/3/1
f 1/1/1 3/3/1 4/4/1
";
    let mut data = parse_obj(&mut BufReader::new(source.as_bytes())).unwrap();
    data.compute_tangents();

    let mesh = Mesh::new(device.as_ref(), &data).unwrap();
    assert_eq!(mesh.vertex_count(), 4);
    assert_eq!(mesh.index_count(), 6);
    assert!(mesh.has_index_buffer());
}
