/*!
# Lumen Engine

Core traits and types for the Lumen rendering engine.

This crate holds everything that does not talk to a GPU API directly: the
frame lifecycle state machine, the bindless descriptor protocol, the texture
and material registries, scene objects, draw passes and the `World` that
drives them. Backends (see `lumen_engine_renderer_vulkan`) implement the
`graphics_device` traits.

## Architecture

- **GraphicsDevice**: factory trait for buffers, textures, pipelines, descriptor objects and frame slots
- **Swapchain**: presentable images of one swapchain generation
- **PresentationSurface**: OS window and resize signaling
- **FrameScheduler**: begin/end frame protocol and swapchain recreation
- **DescriptorSetLayoutBuilder / DescriptorPoolBuilder / DescriptorWriter**: bindless-capable descriptor binding
- **ResourceManager**: texture and material registries with stable indices
- **DrawPass**: opaque, point light and skybox passes
- **World / GameHooks**: per-frame orchestration and game extension points
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod config;
pub mod graphics_device;
pub mod surface;
pub mod descriptor;
pub mod frame;
pub mod resource;
pub mod scene;
pub mod pass;
pub mod world;

// Main lumen namespace module
pub mod lumen {
    // Error types
    pub use crate::error::{Error, Result};

    // Logger host
    pub use crate::engine::Engine;

    // Configuration
    pub use crate::config::Config;

    // Device abstraction
    pub use crate::graphics_device::GraphicsDevice;

    // Logging sub-module (types only, macros live at the crate root)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Device sub-module with all backend-facing types
    pub mod device {
        pub use crate::graphics_device::*;
    }

    // Descriptor sub-module
    pub mod descriptor {
        pub use crate::descriptor::*;
    }

    // Frame lifecycle sub-module
    pub mod frame {
        pub use crate::frame::*;
    }

    // Resource sub-module
    pub mod resource {
        pub use crate::resource::*;
    }

    // Scene sub-module
    pub mod scene {
        pub use crate::scene::*;
    }

    // Pass sub-module
    pub mod pass {
        pub use crate::pass::*;
    }

    // World sub-module
    pub mod world {
        pub use crate::world::*;
    }

    // Window sub-module
    pub mod surface {
        pub use crate::surface::*;
    }
}

// Re-export math library at crate root
pub use glam;
