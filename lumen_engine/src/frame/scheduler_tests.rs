//! Unit tests for scheduler.rs
//!
//! The scheduler runs against MockGraphicsDevice and MockSurface; the mock
//! records every slot, swapchain and command list call in order.

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error::Error;
use crate::frame::{FrameScheduler, FrameState};
use crate::graphics_device::mock_graphics_device::{MockGraphicsDevice, ScriptedAcquire, ScriptedPresent};
use crate::graphics_device::*;
use crate::surface::mock_surface::MockSurface;
use crate::surface::PresentationSurface;

// ============================================================================
// Helpers
// ============================================================================

fn test_config() -> Config {
    Config {
        resize_poll_interval: Duration::from_millis(1),
        ..Config::default()
    }
}

fn setup() -> (MockGraphicsDevice, MockSurface, FrameScheduler) {
    let mock = MockGraphicsDevice::new();
    let device: Arc<dyn GraphicsDevice> = Arc::new(mock.clone());
    let mut surface = MockSurface::new(800, 600);
    let scheduler = FrameScheduler::new(device, &test_config(), &mut surface).unwrap();
    mock.clear_events();
    (mock, surface, scheduler)
}

/// Run one complete frame, returning the slot index or None when skipped
fn run_frame(scheduler: &mut FrameScheduler, surface: &mut MockSurface) -> Option<usize> {
    let index = scheduler.begin_frame(surface).unwrap()?;
    scheduler.begin_render_pass().unwrap();
    scheduler.end_render_pass().unwrap();
    scheduler.end_frame(surface).unwrap();
    Some(index)
}

// ============================================================================
// CREATION
// ============================================================================

#[test]
fn test_new_creates_first_generation() {
    let mock = MockGraphicsDevice::new();
    let device: Arc<dyn GraphicsDevice> = Arc::new(mock.clone());
    let mut surface = MockSurface::new(800, 600);

    let scheduler = FrameScheduler::new(device, &test_config(), &mut surface).unwrap();

    assert_eq!(scheduler.generation(), 0);
    assert_eq!(scheduler.state(), FrameState::Idle);
    assert_eq!(scheduler.extent(), Extent2D::new(800, 600));
    assert_eq!(scheduler.image_format(), Format::B8G8R8A8_SRGB);
    assert_eq!(mock.state().swapchain_hints, vec![None]);
}

#[test]
fn test_new_waits_for_minimized_surface() {
    let mock = MockGraphicsDevice::new();
    let device: Arc<dyn GraphicsDevice> = Arc::new(mock.clone());
    let mut surface = MockSurface::new(0, 0);
    surface.queue_size(640, 480);

    let scheduler = FrameScheduler::new(device, &test_config(), &mut surface).unwrap();

    assert_eq!(scheduler.extent(), Extent2D::new(640, 480));
    assert_eq!(surface.polls, 1);
}

#[test]
fn test_new_fails_when_closed_while_minimized() {
    let mock = MockGraphicsDevice::new();
    let device: Arc<dyn GraphicsDevice> = Arc::new(mock.clone());
    let mut surface = MockSurface::new(0, 0);
    surface.close_requested = true;

    let result = FrameScheduler::new(device, &test_config(), &mut surface);

    assert!(matches!(result, Err(Error::InitializationFailed(_))));
}

// ============================================================================
// FRAME PROTOCOL
// ============================================================================

#[test]
fn test_frame_records_in_protocol_order() {
    let (mock, mut surface, mut scheduler) = setup();
    let framebuffer = scheduler.swapchain().framebuffer_handle(0).unwrap();

    assert_eq!(run_frame(&mut scheduler, &mut surface), Some(0));

    assert_eq!(mock.events(), vec![
        "wait slot0".to_string(),
        "acquire image0".to_string(),
        "begin".to_string(),
        format!("begin_render_pass fb{} 800x600", framebuffer),
        "set_viewport 800x600".to_string(),
        "set_scissor 800x600".to_string(),
        "end_render_pass".to_string(),
        "end".to_string(),
        "submit slot0".to_string(),
        "present image0".to_string(),
    ]);
    assert_eq!(scheduler.state(), FrameState::Idle);
}

#[test]
fn test_frame_slots_cycle_round_robin() {
    let (mock, mut surface, mut scheduler) = setup();

    let indices: Vec<usize> = (0..5)
        .map(|_| run_frame(&mut scheduler, &mut surface).unwrap())
        .collect();

    assert_eq!(indices, vec![0, 1, 0, 1, 0]);
    let waits: Vec<String> = mock.events().into_iter().filter(|e| e.starts_with("wait slot")).collect();
    assert_eq!(waits, vec!["wait slot0", "wait slot1", "wait slot0", "wait slot1", "wait slot0"]);
}

#[test]
fn test_slot_waited_before_recording() {
    let (mock, mut surface, mut scheduler) = setup();
    run_frame(&mut scheduler, &mut surface);
    run_frame(&mut scheduler, &mut surface);
    mock.clear_events();

    run_frame(&mut scheduler, &mut surface);

    let events = mock.events();
    let wait = events.iter().position(|e| e == "wait slot0").unwrap();
    let begin = events.iter().position(|e| e == "begin").unwrap();
    assert!(wait < begin);
}

#[test]
fn test_image_in_flight_on_other_slot_is_waited() {
    let (mock, mut surface, mut scheduler) = setup();
    mock.push_acquire(ScriptedAcquire::Outcome(AcquireOutcome::Acquired { image_index: 2, suboptimal: false }));
    mock.push_acquire(ScriptedAcquire::Outcome(AcquireOutcome::Acquired { image_index: 2, suboptimal: false }));
    run_frame(&mut scheduler, &mut surface);
    mock.clear_events();

    assert_eq!(scheduler.begin_frame(&mut surface).unwrap(), Some(1));

    assert_eq!(mock.events(), vec!["wait slot1", "acquire image2", "wait slot0", "begin"]);
}

#[test]
fn test_present_waits_on_semaphore_of_its_image() {
    let (mock, mut surface, mut scheduler) = setup();
    let swapchain_semaphore = |scheduler: &FrameScheduler, image| {
        scheduler.swapchain().render_finished_semaphore(image).unwrap()
    };
    let expected: Vec<u64> = (0..3).map(|image| swapchain_semaphore(&scheduler, image)).collect();

    // Three images across two slots: slot 0 renders images 0 and 2
    for _ in 0..3 {
        run_frame(&mut scheduler, &mut surface);
    }

    let state = mock.state();
    assert_eq!(state.submit_signals, vec![(0, expected[0]), (1, expected[1]), (0, expected[2])]);
    assert_eq!(state.present_waits, vec![(0, expected[0]), (1, expected[1]), (2, expected[2])]);
    assert_ne!(state.submit_signals[0].1, state.submit_signals[2].1);
}

#[test]
fn test_out_of_order_calls_rejected() {
    let (_mock, mut surface, mut scheduler) = setup();

    assert!(matches!(scheduler.begin_render_pass(), Err(Error::InvalidFrameState(_))));
    assert!(matches!(scheduler.end_render_pass(), Err(Error::InvalidFrameState(_))));
    assert!(matches!(scheduler.end_frame(&mut surface), Err(Error::InvalidFrameState(_))));
    assert_eq!(scheduler.state(), FrameState::Idle);

    scheduler.begin_frame(&mut surface).unwrap();
    assert!(matches!(scheduler.begin_frame(&mut surface), Err(Error::InvalidFrameState(_))));
    assert!(matches!(scheduler.end_frame(&mut surface), Err(Error::InvalidFrameState(_))));
    assert_eq!(scheduler.state(), FrameState::FrameAcquired);
    assert_eq!(scheduler.frame_index(), 0);

    scheduler.begin_render_pass().unwrap();
    assert!(matches!(scheduler.begin_render_pass(), Err(Error::InvalidFrameState(_))));
    assert!(matches!(scheduler.recreate_swapchain(&mut surface), Err(Error::InvalidFrameState(_))));
    assert_eq!(scheduler.state(), FrameState::RenderPassActive);
}

#[test]
fn test_command_list_only_inside_frame() {
    let (_mock, mut surface, mut scheduler) = setup();
    assert!(matches!(scheduler.command_list(), Err(Error::InvalidFrameState(_))));

    scheduler.begin_frame(&mut surface).unwrap();
    scheduler.begin_render_pass().unwrap();
    assert!(scheduler.command_list().unwrap().draw(3, 0).is_ok());
}

// ============================================================================
// ABORT
// ============================================================================

#[test]
fn test_abort_after_acquire_presents_empty_pass() {
    let (mock, mut surface, mut scheduler) = setup();
    scheduler.begin_frame(&mut surface).unwrap();
    mock.clear_events();

    scheduler.abort_frame(&mut surface).unwrap();

    let framebuffer = scheduler.swapchain().framebuffer_handle(0).unwrap();
    assert_eq!(mock.events(), vec![
        format!("begin_render_pass fb{} 800x600", framebuffer),
        "set_viewport 800x600".to_string(),
        "set_scissor 800x600".to_string(),
        "end_render_pass".to_string(),
        "end".to_string(),
        "submit slot0".to_string(),
        "present image0".to_string(),
    ]);
    assert_eq!(scheduler.state(), FrameState::Idle);
    assert_eq!(scheduler.frame_index(), 1);
}

#[test]
fn test_abort_inside_render_pass_closes_it() {
    let (mock, mut surface, mut scheduler) = setup();
    scheduler.begin_frame(&mut surface).unwrap();
    scheduler.begin_render_pass().unwrap();
    scheduler.command_list().unwrap().draw(3, 0).unwrap();
    mock.clear_events();

    scheduler.abort_frame(&mut surface).unwrap();

    assert_eq!(mock.events(), vec!["end_render_pass", "end", "submit slot0", "present image0"]);
    assert_eq!(scheduler.state(), FrameState::Idle);
    assert_eq!(run_frame(&mut scheduler, &mut surface), Some(1));
}

#[test]
fn test_abort_when_idle_does_nothing() {
    let (mock, mut surface, mut scheduler) = setup();

    scheduler.abort_frame(&mut surface).unwrap();

    assert!(mock.events().is_empty());
    assert_eq!(scheduler.frame_index(), 0);
}

// ============================================================================
// STALENESS AND RECREATION
// ============================================================================

#[test]
fn test_acquire_out_of_date_recreates_and_skips() {
    let (mock, mut surface, mut scheduler) = setup();
    let old_handle = scheduler.swapchain().raw_handle();
    mock.push_acquire(ScriptedAcquire::Outcome(AcquireOutcome::OutOfDate));

    assert_eq!(scheduler.begin_frame(&mut surface).unwrap(), None);

    assert_eq!(scheduler.state(), FrameState::Idle);
    assert_eq!(scheduler.generation(), 1);
    assert_eq!(scheduler.frame_index(), 0);
    assert_eq!(mock.state().swapchain_hints, vec![None, Some(old_handle)]);
    assert_eq!(mock.state().wait_idle_calls, 1);

    assert_eq!(run_frame(&mut scheduler, &mut surface), Some(0));
}

#[test]
fn test_acquire_suboptimal_recreates_after_present() {
    let (mock, mut surface, mut scheduler) = setup();
    mock.push_acquire(ScriptedAcquire::Outcome(AcquireOutcome::Acquired { image_index: 0, suboptimal: true }));

    scheduler.begin_frame(&mut surface).unwrap();
    assert_eq!(scheduler.generation(), 0);
    scheduler.begin_render_pass().unwrap();
    scheduler.end_render_pass().unwrap();
    scheduler.end_frame(&mut surface).unwrap();

    assert_eq!(scheduler.generation(), 1);
    let events = mock.events();
    let present = events.iter().position(|e| e == "present image0").unwrap();
    let wait_idle = events.iter().position(|e| e == "wait_idle").unwrap();
    assert!(present < wait_idle);

    run_frame(&mut scheduler, &mut surface);
    assert_eq!(scheduler.generation(), 1);
}

#[test]
fn test_present_out_of_date_or_suboptimal_recreates() {
    let (mock, mut surface, mut scheduler) = setup();
    mock.push_present(ScriptedPresent::Outcome(PresentOutcome::OutOfDate));
    mock.push_present(ScriptedPresent::Outcome(PresentOutcome::Suboptimal));

    run_frame(&mut scheduler, &mut surface);
    assert_eq!(scheduler.generation(), 1);
    run_frame(&mut scheduler, &mut surface);
    assert_eq!(scheduler.generation(), 2);
    run_frame(&mut scheduler, &mut surface);
    assert_eq!(scheduler.generation(), 2);
}

#[test]
fn test_surface_resize_recreates_and_clears_flag() {
    let (mock, mut surface, mut scheduler) = setup();
    surface.size = Extent2D::new(1024, 768);
    surface.resized = true;

    run_frame(&mut scheduler, &mut surface);

    assert!(!surface.was_resized());
    assert_eq!(scheduler.generation(), 1);
    assert_eq!(scheduler.extent(), Extent2D::new(1024, 768));
    assert!(mock.events().contains(&"create_swapchain 1024x768".to_string()));
}

#[test]
fn test_present_failure_still_advances_frame() {
    let (mock, mut surface, mut scheduler) = setup();
    mock.push_present(ScriptedPresent::DeviceLost);

    scheduler.begin_frame(&mut surface).unwrap();
    scheduler.begin_render_pass().unwrap();
    scheduler.end_render_pass().unwrap();
    let result = scheduler.end_frame(&mut surface);

    assert!(matches!(result, Err(Error::BackendError(_))));
    assert_eq!(scheduler.frame_index(), 1);
    assert_eq!(scheduler.state(), FrameState::Idle);
}

#[test]
fn test_acquire_failure_is_error() {
    let (mock, mut surface, mut scheduler) = setup();
    mock.push_acquire(ScriptedAcquire::DeviceLost);

    let result = scheduler.begin_frame(&mut surface);

    assert!(matches!(result, Err(Error::BackendError(_))));
    assert_eq!(scheduler.state(), FrameState::Idle);
    assert_eq!(scheduler.generation(), 0);
}

// ============================================================================
// FORMAT STABILITY
// ============================================================================

#[test]
fn test_resize_keeps_formats() {
    let (_mock, mut surface, mut scheduler) = setup();
    let color = scheduler.image_format();
    let depth = scheduler.depth_format();
    surface.size = Extent2D::new(1920, 1080);

    assert!(scheduler.recreate_swapchain(&mut surface).unwrap());

    assert_eq!(scheduler.extent(), Extent2D::new(1920, 1080));
    assert_eq!(scheduler.image_format(), color);
    assert_eq!(scheduler.depth_format(), depth);
}

#[test]
fn test_format_change_rejected() {
    let (mock, mut surface, mut scheduler) = setup();
    let handle = scheduler.swapchain().raw_handle();
    mock.set_swapchain_formats(Format::R8G8B8A8_UNORM, Format::D32_FLOAT);

    let result = scheduler.recreate_swapchain(&mut surface);

    assert!(matches!(result, Err(Error::SwapchainFormatMismatch(_))));
    assert_eq!(scheduler.generation(), 0);
    assert_eq!(scheduler.swapchain().raw_handle(), handle);
}

#[test]
fn test_depth_format_change_rejected() {
    let (mock, mut surface, mut scheduler) = setup();
    mock.set_swapchain_formats(Format::B8G8R8A8_SRGB, Format::D24_UNORM_S8_UINT);

    let result = scheduler.recreate_swapchain(&mut surface);

    assert!(matches!(result, Err(Error::SwapchainFormatMismatch(_))));
}

#[test]
fn test_minimize_restore_blocks_then_recreates() {
    let (mock, mut surface, mut scheduler) = setup();
    let color = scheduler.image_format();
    surface.size = Extent2D::new(0, 0);
    surface.queue_size(0, 0);
    surface.queue_size(1280, 720);

    assert!(scheduler.recreate_swapchain(&mut surface).unwrap());

    assert_eq!(surface.polls, 2);
    assert_eq!(scheduler.generation(), 1);
    assert_eq!(scheduler.extent(), Extent2D::new(1280, 720));
    assert_eq!(scheduler.image_format(), color);
    assert_eq!(mock.state().swapchains_created, 2);
}

#[test]
fn test_zero_surface_extent_keeps_waiting() {
    let (mock, mut surface, mut scheduler) = setup();
    mock.state().deferred_swapchains = 2;
    surface.queue_size(1280, 720);

    assert!(scheduler.recreate_swapchain(&mut surface).unwrap());

    assert_eq!(scheduler.generation(), 1);
    assert_eq!(surface.polls, 2);
    assert_eq!(scheduler.extent(), Extent2D::new(1280, 720));
    let deferred = mock.events().iter().filter(|e| *e == "create_swapchain deferred").count();
    assert_eq!(deferred, 2);
    assert_eq!(mock.state().wait_idle_calls, 1);
}

#[test]
fn test_new_waits_for_zero_surface_extent() {
    let mock = MockGraphicsDevice::new();
    mock.state().deferred_swapchains = 1;
    let device: Arc<dyn GraphicsDevice> = Arc::new(mock.clone());
    let mut surface = MockSurface::new(800, 600);

    let scheduler = FrameScheduler::new(device, &test_config(), &mut surface).unwrap();

    assert_eq!(scheduler.generation(), 0);
    assert_eq!(mock.state().swapchains_created, 1);
}

#[test]
fn test_close_during_zero_surface_extent_skips_recreation() {
    let (mock, mut surface, mut scheduler) = setup();
    mock.state().deferred_swapchains = 1;
    surface.close_requested = true;

    assert!(!scheduler.recreate_swapchain(&mut surface).unwrap());
    assert_eq!(scheduler.generation(), 0);
}

#[test]
fn test_close_while_minimized_skips_recreation() {
    let (mock, mut surface, mut scheduler) = setup();
    surface.size = Extent2D::new(0, 0);
    surface.close_requested = true;

    assert!(!scheduler.recreate_swapchain(&mut surface).unwrap());

    assert_eq!(scheduler.generation(), 0);
    assert_eq!(mock.state().wait_idle_calls, 0);
}

#[test]
fn test_recreation_resets_images_in_flight() {
    let (mock, mut surface, mut scheduler) = setup();
    mock.push_acquire(ScriptedAcquire::Outcome(AcquireOutcome::Acquired { image_index: 1, suboptimal: false }));
    run_frame(&mut scheduler, &mut surface);
    scheduler.recreate_swapchain(&mut surface).unwrap();
    mock.push_acquire(ScriptedAcquire::Outcome(AcquireOutcome::Acquired { image_index: 1, suboptimal: false }));
    mock.clear_events();

    scheduler.begin_frame(&mut surface).unwrap();

    assert_eq!(mock.events(), vec!["wait slot1", "acquire image1", "begin"]);
}
