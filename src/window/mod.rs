//! Window management module
//!
//! A winit window driven by `pump_app_events`, so the application owns its
//! loop and polls the window once per frame through [`crate::gpu::Surface`].

pub mod event;
pub mod settings;

pub use event::{key_from_winit, scroll_lines};
pub use settings::WindowSettings;

use crate::backend::WgpuDevice;
use crate::context::WgpuContext;
use crate::gpu::Surface;
use crate::input::{CursorTracker, InputEvents, Key};
use anyhow::Context as _;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{CursorGrabMode, Window, WindowId};

/// Window state fed by winit callbacks during a pump.
struct WindowState {
    settings: WindowSettings,
    window: Option<Arc<Window>>,
    create_error: Option<winit::error::OsError>,
    keys: HashSet<Key>,
    cursor: CursorTracker,
    pending: InputEvents,
    size: (u32, u32),
}

impl WindowState {
    fn new(settings: WindowSettings) -> Self {
        let size = settings.size;
        Self {
            settings,
            window: None,
            create_error: None,
            keys: HashSet::new(),
            cursor: CursorTracker::new(),
            pending: InputEvents::default(),
            size,
        }
    }
}

impl ApplicationHandler for WindowState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title(&self.settings.title)
            .with_inner_size(winit::dpi::PhysicalSize::new(
                self.settings.size.0,
                self.settings.size.1,
            ))
            .with_resizable(self.settings.resizable);

        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                self.create_error = Some(err);
                return;
            }
        };

        if self.settings.grab_cursor {
            let grabbed = window
                .set_cursor_grab(CursorGrabMode::Confined)
                .or_else(|_| window.set_cursor_grab(CursorGrabMode::Locked));
            if let Err(err) = grabbed {
                tracing::warn!(error = %err, "cursor grab unavailable");
            }
            window.set_cursor_visible(false);
        }

        let size = window.inner_size();
        self.size = (size.width, size.height);
        tracing::info!(width = size.width, height = size.height, "window created");
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                self.pending.close_requested = true;
            }
            WindowEvent::Resized(size) => {
                self.size = (size.width, size.height);
                self.pending.resized = Some(self.size);
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let Some((dx, dy)) = self.cursor.moved_to(position.x, position.y) {
                    self.pending.cursor_delta.0 += dx;
                    self.pending.cursor_delta.1 += dy;
                }
            }
            WindowEvent::CursorLeft { .. } => self.cursor.reset(),
            WindowEvent::MouseWheel { delta, .. } => {
                self.pending.scroll_delta += scroll_lines(&delta);
            }
            WindowEvent::KeyboardInput { event, .. } => {
                let Some(key) = key_from_winit(&event.logical_key) else {
                    return;
                };
                match event.state {
                    ElementState::Pressed => {
                        self.keys.insert(key);
                    }
                    ElementState::Released => {
                        self.keys.remove(&key);
                    }
                }
            }
            WindowEvent::Focused(false) => {
                self.keys.clear();
                self.cursor.reset();
            }
            _ => {}
        }
    }
}

/// A desktop window implementing [`Surface`].
pub struct WinitSurface {
    event_loop: EventLoop<()>,
    state: WindowState,
    start: Instant,
    close: bool,
}

impl WinitSurface {
    /// Create the event loop and pump it until the window exists.
    pub fn open(settings: WindowSettings) -> anyhow::Result<Self> {
        let event_loop = EventLoop::new().context("failed to create event loop")?;
        let mut surface = Self {
            event_loop,
            state: WindowState::new(settings),
            start: Instant::now(),
            close: false,
        };

        while surface.state.window.is_none() {
            if let Some(err) = surface.state.create_error.take() {
                return Err(err).context("failed to create window");
            }
            if let PumpStatus::Exit(code) = surface
                .event_loop
                .pump_app_events(Some(Duration::from_millis(10)), &mut surface.state)
            {
                anyhow::bail!("event loop exited with code {code} before the window opened");
            }
        }
        surface.start = Instant::now();
        Ok(surface)
    }

    /// The window, once created.
    pub fn window(&self) -> Option<&Arc<Window>> {
        self.state.window.as_ref()
    }

    /// Create a GPU device presenting to this window.
    pub fn create_device(&self) -> anyhow::Result<WgpuDevice> {
        let window = self.window().context("window not created")?.clone();
        let instance = WgpuContext::instance();
        let gpu_surface = instance
            .create_surface(window)
            .context("failed to create GPU surface")?;
        let (ctx, adapter) =
            pollster::block_on(WgpuContext::request(&instance, Some(&gpu_surface)))?;
        let vsync = self.state.settings.vsync;
        let device = WgpuDevice::for_surface(ctx, gpu_surface, &adapter, self.state.size, vsync)
            .context("failed to configure GPU surface")?;
        Ok(device)
    }
}

impl Surface for WinitSurface {
    fn should_close(&self) -> bool {
        self.close
    }

    fn poll_events(&mut self) -> InputEvents {
        if let PumpStatus::Exit(code) = self
            .event_loop
            .pump_app_events(Some(Duration::ZERO), &mut self.state)
        {
            tracing::info!(code, "event loop exited");
            self.close = true;
        }
        let events = std::mem::take(&mut self.state.pending);
        self.close |= events.close_requested;
        events
    }

    fn time(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    fn key_pressed(&self, key: Key) -> bool {
        self.state.keys.contains(&key)
    }

    fn request_close(&mut self) {
        self.close = true;
    }

    fn framebuffer_size(&self) -> (u32, u32) {
        self.state.size
    }
}
