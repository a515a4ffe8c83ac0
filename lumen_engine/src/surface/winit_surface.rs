/// WinitSurface - winit window driven by `pump_app_events`
///
/// The engine owns the frame loop, so events are pumped once per frame
/// instead of handing control to `EventLoop::run_app`.

use std::time::Duration;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowId};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::graphics_device::Extent2D;
use crate::surface::PresentationSurface;
use crate::{engine_error, engine_info};

/// Flags updated by window events
#[derive(Debug, Default)]
struct WindowFlags {
    resized: bool,
    close_requested: bool,
}

impl ApplicationHandler for WindowFlags {
    fn resumed(&mut self, _event_loop: &ActiveEventLoop) {}

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.close_requested = true,
            WindowEvent::Resized(_) => self.resized = true,
            WindowEvent::KeyboardInput {
                event: KeyEvent {
                    logical_key: Key::Named(NamedKey::Escape),
                    state: ElementState::Pressed,
                    ..
                },
                ..
            } => self.close_requested = true,
            _ => {}
        }
    }
}

/// Resizable application window
pub struct WinitSurface {
    event_loop: EventLoop<()>,
    window: Window,
    flags: WindowFlags,
}

impl WinitSurface {
    /// Create the event loop and the window described by `config`
    #[allow(deprecated)]
    pub fn new(config: &Config) -> Result<Self> {
        let event_loop = EventLoop::new().map_err(|e| {
            engine_error!("lumen::surface", "Failed to create event loop: {}", e);
            Error::InitializationFailed(format!("event loop: {}", e))
        })?;

        let attributes = Window::default_attributes()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(config.window_width, config.window_height))
            .with_resizable(true);

        let window = event_loop.create_window(attributes).map_err(|e| {
            engine_error!("lumen::surface", "Failed to create window: {}", e);
            Error::InitializationFailed(format!("window: {}", e))
        })?;

        engine_info!("lumen::surface", "Window '{}' created ({}x{})",
            config.window_title, config.window_width, config.window_height);

        Ok(Self {
            event_loop,
            window,
            flags: WindowFlags::default(),
        })
    }

    /// Underlying winit window (used by backends to create a Vulkan surface)
    pub fn window(&self) -> &Window {
        &self.window
    }
}

impl PresentationSurface for WinitSurface {
    fn drawable_size(&self) -> Extent2D {
        let size = self.window.inner_size();
        Extent2D::new(size.width, size.height)
    }

    fn was_resized(&self) -> bool {
        self.flags.resized
    }

    fn reset_resized(&mut self) {
        self.flags.resized = false;
    }

    fn poll_events(&mut self) {
        let status = self.event_loop.pump_app_events(Some(Duration::ZERO), &mut self.flags);
        if let PumpStatus::Exit(_) = status {
            self.flags.close_requested = true;
        }
    }

    fn should_close(&self) -> bool {
        self.flags.close_requested
    }

    fn set_title(&mut self, title: &str) {
        self.window.set_title(title);
    }
}
