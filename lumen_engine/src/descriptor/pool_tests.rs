//! Unit tests for pool.rs

use std::sync::Arc;
use crate::descriptor::*;
use crate::graphics_device::mock_graphics_device::{MockGraphicsDevice, MockDescriptor};
use crate::graphics_device::*;

fn setup(max_sets: u32, flags: PoolFlags) -> (MockGraphicsDevice, Arc<DescriptorSetLayout>, Arc<DescriptorPool>) {
    let mock = MockGraphicsDevice::new();
    let device: Arc<dyn GraphicsDevice> = Arc::new(mock.clone());
    let layout = DescriptorSetLayoutBuilder::new(Arc::clone(&device))
        .add_binding(0, DescriptorKind::UniformBuffer, ShaderStageFlags::ALL_GRAPHICS, 1).unwrap()
        .build()
        .unwrap();
    let pool = DescriptorPoolBuilder::new(device)
        .max_sets(max_sets)
        .add_pool_size(DescriptorKind::UniformBuffer, max_sets)
        .flags(flags)
        .build()
        .unwrap();
    (mock, layout, pool)
}

#[test]
fn test_pool_builder_defaults() {
    let mock = MockGraphicsDevice::new();
    let pool = DescriptorPoolBuilder::new(Arc::new(mock.clone())).build().unwrap();
    assert_eq!(pool.max_sets(), DEFAULT_MAX_SETS);
    assert_eq!(pool.flags(), PoolFlags::empty());
    assert_eq!(mock.state().pools.get(&pool.handle().0).unwrap().max_sets, 1000);
}

#[test]
fn test_allocate_past_max_sets_returns_none() {
    let (mock, layout, pool) = setup(2, PoolFlags::empty());

    let a = pool.allocate(&layout).unwrap();
    let b = pool.allocate(&layout).unwrap();
    let c = pool.allocate(&layout).unwrap();

    assert!(a.is_some());
    assert!(b.is_some());
    assert!(c.is_none());
    assert_eq!(mock.live_sets(pool.handle()), 2);
}

#[test]
fn test_exhaustion_leaves_existing_sets_intact() {
    let (mock, layout, pool) = setup(2, PoolFlags::empty());
    let a = pool.allocate(&layout).unwrap().unwrap();
    let b = pool.allocate(&layout).unwrap().unwrap();
    let buffer_a = BufferDescriptor { buffer: 41, offset: 0, range: 544 };
    let buffer_b = BufferDescriptor { buffer: 42, offset: 0, range: 544 };
    DescriptorWriter::new(&layout, &pool).write_buffer(0, buffer_b).unwrap().overwrite(b).unwrap();

    assert!(pool.allocate(&layout).unwrap().is_none());
    DescriptorWriter::new(&layout, &pool).write_buffer(0, buffer_a).unwrap().overwrite(a).unwrap();

    assert_eq!(mock.descriptor(a, 0, 0), Some(MockDescriptor::Buffer(buffer_a)));
    assert_eq!(mock.descriptor(b, 0, 0), Some(MockDescriptor::Buffer(buffer_b)));
}

#[test]
fn test_free_returns_capacity() {
    let (_mock, layout, pool) = setup(1, PoolFlags::FREE_DESCRIPTOR_SET);
    let a = pool.allocate(&layout).unwrap().unwrap();
    assert!(pool.allocate(&layout).unwrap().is_none());

    pool.free(&[a]).unwrap();

    assert!(pool.allocate(&layout).unwrap().is_some());
}

#[test]
fn test_free_empty_slice_is_noop() {
    let (_mock, _layout, pool) = setup(1, PoolFlags::empty());
    assert!(pool.free(&[]).is_ok());
}

#[test]
fn test_reset_returns_all_sets() {
    let (mock, layout, pool) = setup(2, PoolFlags::empty());
    pool.allocate(&layout).unwrap();
    pool.allocate(&layout).unwrap();

    pool.reset().unwrap();

    assert_eq!(mock.live_sets(pool.handle()), 0);
    assert!(pool.allocate(&layout).unwrap().is_some());
}

#[test]
fn test_pool_drop_destroys_handle() {
    let (mock, _layout, pool) = setup(1, PoolFlags::empty());
    let handle = pool.handle();
    drop(pool);
    assert!(!mock.state().pools.contains_key(&handle.0));
}

#[test]
fn test_global_pool_holds_one_set_per_frame() {
    let mock = MockGraphicsDevice::new();
    let device: Arc<dyn GraphicsDevice> = Arc::new(mock.clone());
    let layout = build_global_layout(Arc::clone(&device)).unwrap();
    let pool = build_global_pool(device).unwrap();

    assert!(pool.allocate(&layout).unwrap().is_some());
    assert!(pool.allocate(&layout).unwrap().is_some());
    assert!(pool.allocate(&layout).unwrap().is_none());
    assert!(pool.flags().contains(PoolFlags::UPDATE_AFTER_BIND));
}

#[test]
fn test_allocate_past_pool_size_returns_none() {
    let mock = MockGraphicsDevice::new();
    let device: Arc<dyn GraphicsDevice> = Arc::new(mock.clone());
    let layout = DescriptorSetLayoutBuilder::new(Arc::clone(&device))
        .add_binding(0, DescriptorKind::UniformBuffer, ShaderStageFlags::ALL_GRAPHICS, 1).unwrap()
        .build()
        .unwrap();
    let pool = DescriptorPoolBuilder::new(device)
        .max_sets(10)
        .add_pool_size(DescriptorKind::UniformBuffer, 1)
        .flags(PoolFlags::FREE_DESCRIPTOR_SET)
        .build()
        .unwrap();

    let a = pool.allocate(&layout).unwrap().unwrap();
    assert!(pool.allocate(&layout).unwrap().is_none());
    assert_eq!(mock.live_sets(pool.handle()), 1);

    pool.free(&[a]).unwrap();
    assert!(pool.allocate(&layout).unwrap().is_some());
}

#[test]
fn test_kind_missing_from_pool_returns_none() {
    let (_mock, _layout, pool) = setup(4, PoolFlags::empty());
    let device = Arc::clone(pool.device());
    let images = DescriptorSetLayoutBuilder::new(device)
        .add_binding(0, DescriptorKind::CombinedImageSampler, ShaderStageFlags::FRAGMENT, 1).unwrap()
        .build()
        .unwrap();

    assert!(pool.allocate(&images).unwrap().is_none());
}

#[test]
fn test_global_pool_sized_for_bindless_array() {
    let mock = MockGraphicsDevice::new();
    let device: Arc<dyn GraphicsDevice> = Arc::new(mock.clone());
    let layout = build_global_layout(Arc::clone(&device)).unwrap();
    let pool = build_global_pool(device).unwrap();

    pool.allocate(&layout).unwrap().unwrap();
    pool.allocate(&layout).unwrap().unwrap();

    let state = mock.state();
    let remaining = &state.pools[&pool.handle().0].remaining;
    assert_eq!(remaining[&DescriptorKind::CombinedImageSampler], 0);
    assert_eq!(remaining[&DescriptorKind::UniformBuffer], 0);
    assert_eq!(remaining[&DescriptorKind::StorageBuffer], 0);
}
