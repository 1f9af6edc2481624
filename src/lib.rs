//! Umbra
//!
//! A real-time shadow-mapped Phong renderer built on wgpu.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! 1. **context** - Core wgpu wrapper (Device, Queue)
//! 2. **core** - GPU primitives (vertices, uniform layouts, buffers, textures, pipelines)
//! 3. **gpu** - The device seams the renderer is written against
//! 4. **renderer** - Geometry, drawables, lights, camera, shadow targets and passes
//! 5. **backend** - wgpu and headless recording implementations of the seams
//! 6. **assets** - Image decoding and texture loading
//! 7. **app** - The frame loop
//! 8. **window** - Window management with winit (feature = "window")

pub mod app;
pub mod assets;
pub mod backend;
pub mod config;
pub mod context;
pub mod core;
pub mod demo;
pub mod error;
pub mod gpu;
pub mod input;
pub mod renderer;

#[cfg(feature = "window")]
pub mod window;

// Re-export commonly used types
pub use app::{Application, FrameClock};
pub use backend::{RecordingDevice, WgpuDevice};
pub use config::RendererConfig;
pub use context::WgpuContext;
pub use error::{RenderError, Result};

pub use renderer::{
    Drawable, FlyCamera, GeometryBuilder, LightSource, MeshData, RenderMode, Scene, SceneRenderer,
    TextureMap, TextureRole, Transform,
};

#[cfg(feature = "window")]
pub use window::{WindowSettings, WinitSurface};

// Re-export glam for convenience
pub use glam;
