//! Application loop
//!
//! Owns the scene, its programs and the camera, and drives one frame per
//! iteration: clock, input, the configured passes, present.

use crate::error::Result;
use crate::gpu::{RenderDevice, Surface, Viewport};
use crate::input::{InputEvents, Key};
use crate::renderer::camera::{FlyCamera, Movement};
use crate::renderer::passes::{FrameState, RenderMode, ScenePrograms, SceneRenderer};
use crate::renderer::scene::Scene;

const MOVEMENT_KEYS: [(Key, Movement); 4] = [
    (Key::W, Movement::Forward),
    (Key::S, Movement::Backward),
    (Key::A, Movement::Left),
    (Key::D, Movement::Right),
];

/// Turns absolute surface time into per-frame deltas.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameClock {
    last: Option<f64>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds since the previous tick. The first tick returns zero.
    pub fn tick(&mut self, now: f64) -> f32 {
        let delta = self.last.map_or(0.0, |last| (now - last).max(0.0));
        self.last = Some(now);
        delta as f32
    }
}

/// A scene with everything needed to render it frame after frame.
pub struct Application<D: RenderDevice> {
    scene: Scene,
    programs: ScenePrograms<D::Program>,
    renderer: SceneRenderer,
    camera: FlyCamera,
    modes: Vec<RenderMode>,
    clock: FrameClock,
    viewport: Viewport,
    frames: u64,
}

impl<D: RenderDevice> Application<D> {
    pub fn new(
        scene: Scene,
        programs: ScenePrograms<D::Program>,
        renderer: SceneRenderer,
        camera: FlyCamera,
        modes: Vec<RenderMode>,
        viewport: Viewport,
    ) -> Self {
        Self {
            scene,
            programs,
            renderer,
            camera,
            modes,
            clock: FrameClock::new(),
            viewport,
            frames: 0,
        }
    }

    /// Render until the surface closes, then release the scene.
    pub fn run<S: Surface>(&mut self, surface: &mut S, device: &mut D) -> Result<()> {
        tracing::info!(modes = ?self.modes, "entering render loop");
        let result = loop {
            if surface.should_close() {
                break Ok(());
            }
            if let Err(err) = self.frame(surface, device) {
                tracing::error!(tag = err.tag(), frame = self.frames, "{err}");
                break Err(err);
            }
        };
        self.scene.release_all(device);
        tracing::info!(frames = self.frames, "render loop finished");
        result
    }

    /// One iteration of the loop.
    pub fn frame<S: Surface>(&mut self, surface: &mut S, device: &mut D) -> Result<()> {
        let dt = self.clock.tick(surface.time());
        let events = surface.poll_events();
        self.apply_input(surface, device, &events, dt);
        if surface.should_close() {
            return Ok(());
        }

        let mut frame = FrameState::new(self.viewport);
        for &mode in &self.modes {
            self.renderer
                .run(mode, &mut frame, device, &self.scene, &mut self.programs, &self.camera)?;
        }
        device.present()?;
        self.frames += 1;
        Ok(())
    }

    fn apply_input<S: Surface>(
        &mut self,
        surface: &mut S,
        device: &mut D,
        events: &InputEvents,
        dt: f32,
    ) {
        if let Some((width, height)) = events.resized {
            if width > 0 && height > 0 {
                device.resize(width, height);
                self.viewport = Viewport::sized(width, height);
            }
        }
        if events.close_requested || surface.key_pressed(Key::Escape) {
            surface.request_close();
        }

        for (key, movement) in MOVEMENT_KEYS {
            if surface.key_pressed(key) {
                self.camera.process_move(movement, dt);
            }
        }

        let (dx, dy) = events.cursor_delta;
        if dx != 0.0 || dy != 0.0 {
            self.camera.process_orientation_delta(dx, dy);
        }
        if events.scroll_delta != 0.0 {
            self.camera.process_zoom_delta(events.scroll_delta);
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn camera(&self) -> &FlyCamera {
        &self.camera
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Frames presented so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_first_tick_is_zero() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.tick(3.0), 0.0);
        assert!((clock.tick(3.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_clock_never_negative() {
        let mut clock = FrameClock::new();
        clock.tick(2.0);
        assert_eq!(clock.tick(1.0), 0.0);
    }
}
