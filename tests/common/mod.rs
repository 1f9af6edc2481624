#![allow(dead_code)]

use std::path::Path;
use umbra::backend::{RecordingDevice, RecordingProgram};
use umbra::config::RendererConfig;
use umbra::gpu::{DecodedImage, ImageDecoder, Surface};
use umbra::input::{InputEvents, Key};
use umbra::renderer::passes::ScenePrograms;
use umbra::renderer::Scene;

/// Decodes every path into the same 2x2 grey image.
pub struct SolidDecoder;

impl ImageDecoder for SolidDecoder {
    fn decode(&self, _path: &Path) -> umbra::Result<DecodedImage> {
        Ok(DecodedImage {
            width: 2,
            height: 2,
            pixels: vec![128; 16],
        })
    }
}

/// The demo scene built on a recording device.
pub fn demo_scene(device: &mut RecordingDevice) -> (Scene, ScenePrograms<RecordingProgram>) {
    let mut compiler = device.compiler();
    umbra::demo::build(device, &mut compiler, &SolidDecoder, &RendererConfig::default()).unwrap()
}

/// A surface that replays a fixed script of input, one entry per poll.
pub struct ScriptedSurface {
    script: Vec<InputEvents>,
    held: Vec<(Key, usize)>,
    polls: usize,
    closed: bool,
    size: (u32, u32),
}

impl ScriptedSurface {
    pub fn new(size: (u32, u32)) -> Self {
        Self {
            script: Vec::new(),
            held: Vec::new(),
            polls: 0,
            closed: false,
            size,
        }
    }

    /// Events returned by the `poll`-th call, counted from one.
    pub fn on_poll(mut self, poll: usize, events: InputEvents) -> Self {
        if self.script.len() < poll {
            self.script.resize(poll, InputEvents::default());
        }
        self.script[poll - 1] = events;
        self
    }

    /// Report `key` as held from the `poll`-th call onward.
    pub fn hold_from(mut self, poll: usize, key: Key) -> Self {
        self.held.push((key, poll));
        self
    }

    pub fn polls(&self) -> usize {
        self.polls
    }
}

impl Surface for ScriptedSurface {
    fn should_close(&self) -> bool {
        self.closed
    }

    fn poll_events(&mut self) -> InputEvents {
        self.polls += 1;
        self.script.get(self.polls - 1).copied().unwrap_or_default()
    }

    fn time(&self) -> f64 {
        self.polls as f64 / 60.0
    }

    fn key_pressed(&self, key: Key) -> bool {
        self.held.iter().any(|&(k, from)| k == key && self.polls >= from)
    }

    fn request_close(&mut self) {
        self.closed = true;
    }

    fn framebuffer_size(&self) -> (u32, u32) {
        self.size
    }
}
