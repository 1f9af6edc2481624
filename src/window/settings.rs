//! Window settings
//!
//! Configuration for window creation.

use crate::config::WindowConfig;

/// Settings for creating a window.
#[derive(Debug, Clone)]
pub struct WindowSettings {
    pub title: String,
    /// Initial size (width, height) in physical pixels.
    pub size: (u32, u32),
    pub resizable: bool,
    pub vsync: bool,
    /// Hide the cursor and keep it inside the window for mouse look.
    pub grab_cursor: bool,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "umbra".to_string(),
            size: (1200, 800),
            resizable: true,
            vsync: true,
            grab_cursor: true,
        }
    }
}

impl WindowSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    pub fn resizable(mut self, resizable: bool) -> Self {
        self.resizable = resizable;
        self
    }

    pub fn vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    pub fn grab_cursor(mut self, grab: bool) -> Self {
        self.grab_cursor = grab;
        self
    }
}

impl From<&WindowConfig> for WindowSettings {
    fn from(config: &WindowConfig) -> Self {
        Self::new()
            .title(config.title.clone())
            .size(config.width, config.height)
            .vsync(config.vsync)
    }
}
