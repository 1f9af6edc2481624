//! Renderer configuration
//!
//! Loaded from JSON. Missing fields take their defaults, a missing or broken
//! file yields the full default configuration, and degenerate values are
//! clamped back to defaults by [`RendererConfig::validate`].

use crate::core::render_states::ClearState;
use crate::renderer::passes::{PassConfig, RenderMode};
use crate::renderer::shadow::{CubeShadowRange, DirectionalShadowVolume};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    pub window: WindowConfig,
    pub shadow: ShadowConfig,
    pub scene: SceneConfig,
    pub camera: CameraConfig,
    /// Pass names run each frame, in order.
    pub passes: Vec<String>,
    pub asset_root: PathBuf,
    pub shader_root: PathBuf,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            shadow: ShadowConfig::default(),
            scene: SceneConfig::default(),
            camera: CameraConfig::default(),
            passes: RenderMode::FRAME.iter().map(|m| m.as_str().to_string()).collect(),
            asset_root: PathBuf::from("textures"),
            shader_root: PathBuf::from("shaders"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "umbra".to_string(),
            width: 1200,
            height: 800,
            vsync: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowConfig {
    /// Directional shadow map `[width, height]`.
    pub map_size: [u32; 2],
    /// Cube shadow face `[width, height]`.
    pub cube_size: [u32; 2],
    pub half_extent: f32,
    pub directional_near: f32,
    pub directional_far: f32,
    pub cube_near: f32,
    pub cube_far: f32,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        let directional = DirectionalShadowVolume::default();
        let cube = CubeShadowRange::default();
        Self {
            map_size: [4096, 4096],
            cube_size: [2048, 2048],
            half_extent: directional.half_extent,
            directional_near: directional.near,
            directional_far: directional.far,
            cube_near: cube.near,
            cube_far: cube.far,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub near: f32,
    pub far: f32,
    pub clear_color: [f32; 4],
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            near: 0.1,
            far: 100.0,
            clear_color: [0.1, 0.1, 0.1, 1.0],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub speed: f32,
    pub sensitivity: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            speed: 2.5,
            sensitivity: 0.1,
        }
    }
}

impl RendererConfig {
    /// Read a config file, falling back to defaults when it is absent or invalid.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents, path),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "config file not found, using defaults");
                Self::default()
            }
            Err(err) => {
                tracing::warn!(
                    tag = "config::load::io",
                    path = %path.display(),
                    error = %err,
                    "failed to read config, using defaults"
                );
                Self::default()
            }
        }
    }

    fn from_json(contents: &str, path: &Path) -> Self {
        match serde_json::from_str::<RendererConfig>(contents) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config");
                config.validate()
            }
            Err(err) => {
                tracing::warn!(
                    tag = "config::load::parse",
                    path = %path.display(),
                    error = %err,
                    "failed to parse config, using defaults"
                );
                Self::default()
            }
        }
    }

    /// Replace degenerate values with their defaults.
    pub fn validate(mut self) -> Self {
        let defaults = Self::default();

        if self.window.width == 0 || self.window.height == 0 {
            tracing::warn!("window size must be non-zero, using default");
            self.window.width = defaults.window.width;
            self.window.height = defaults.window.height;
        }
        if self.shadow.map_size.contains(&0) {
            tracing::warn!("shadow map size must be non-zero, using default");
            self.shadow.map_size = defaults.shadow.map_size;
        }
        if self.shadow.cube_size.contains(&0) {
            tracing::warn!("cube shadow size must be non-zero, using default");
            self.shadow.cube_size = defaults.shadow.cube_size;
        }
        if self.shadow.half_extent.is_nan() || self.shadow.half_extent <= 0.0 {
            tracing::warn!("shadow half extent must be positive, using default");
            self.shadow.half_extent = defaults.shadow.half_extent;
        }
        if !planes_valid(self.shadow.directional_near, self.shadow.directional_far) {
            tracing::warn!("directional shadow planes invalid, using defaults");
            self.shadow.directional_near = defaults.shadow.directional_near;
            self.shadow.directional_far = defaults.shadow.directional_far;
        }
        if !planes_valid(self.shadow.cube_near, self.shadow.cube_far) {
            tracing::warn!("cube shadow planes invalid, using defaults");
            self.shadow.cube_near = defaults.shadow.cube_near;
            self.shadow.cube_far = defaults.shadow.cube_far;
        }
        if !planes_valid(self.scene.near, self.scene.far) {
            tracing::warn!("scene planes invalid, using defaults");
            self.scene.near = defaults.scene.near;
            self.scene.far = defaults.scene.far;
        }
        self
    }

    /// Parsed pass list. Unknown names are logged and skipped.
    pub fn render_modes(&self) -> Vec<RenderMode> {
        self.passes
            .iter()
            .filter_map(|name| match name.parse::<RenderMode>() {
                Ok(mode) => Some(mode),
                Err(err) => {
                    tracing::error!(tag = err.tag(), "{err}");
                    None
                }
            })
            .collect()
    }

    pub fn pass_config(&self) -> PassConfig {
        PassConfig {
            directional: DirectionalShadowVolume {
                half_extent: self.shadow.half_extent,
                near: self.shadow.directional_near,
                far: self.shadow.directional_far,
            },
            cube: CubeShadowRange {
                near: self.shadow.cube_near,
                far: self.shadow.cube_far,
            },
            scene_near: self.scene.near,
            scene_far: self.scene.far,
            clear: ClearState::color_and_depth(self.scene.clear_color, 1.0),
        }
    }
}

fn planes_valid(near: f32, far: f32) -> bool {
    near > 0.0 && far > near && far.is_finite()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("umbra-{}-{name}", std::process::id()))
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = RendererConfig::load_from_path(temp_path("missing.json"));
        assert_eq!(config, RendererConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let path = temp_path("partial.json");
        let json =
            r#"{ "window": { "title": "columns" }, "shadow": { "map_size": [1024, 1024] } }"#;
        std::fs::write(&path, json).unwrap();
        let config = RendererConfig::load_from_path(&path);
        std::fs::remove_file(&path).ok();

        assert_eq!(config.window.title, "columns");
        assert_eq!(config.window.width, 1200);
        assert_eq!(config.shadow.map_size, [1024, 1024]);
        assert_eq!(config.shadow.cube_size, [2048, 2048]);
    }

    #[test]
    fn test_malformed_file_gives_defaults() {
        let path = temp_path("malformed.json");
        std::fs::write(&path, "{ not json").unwrap();
        let config = RendererConfig::load_from_path(&path);
        std::fs::remove_file(&path).ok();
        assert_eq!(config, RendererConfig::default());
    }

    #[test]
    fn test_validate_clamps_degenerate_values() {
        let mut config = RendererConfig::default();
        config.shadow.map_size = [0, 4096];
        config.scene.near = 10.0;
        config.scene.far = 1.0;
        config.window.height = 0;

        let config = config.validate();
        assert_eq!(config.shadow.map_size, [4096, 4096]);
        assert_eq!((config.scene.near, config.scene.far), (0.1, 100.0));
        assert_eq!(config.window.height, 800);
    }

    #[test]
    fn test_unknown_passes_are_skipped() {
        let config = RendererConfig {
            passes: vec!["directional_shadow".into(), "wireframe".into(), "scene".into()],
            ..Default::default()
        };
        assert_eq!(
            config.render_modes(),
            vec![RenderMode::DirectionalShadow, RenderMode::Scene]
        );
    }

    #[test]
    fn test_pass_config_carries_planes() {
        let pass = RendererConfig::default().pass_config();
        assert_eq!(pass, PassConfig::default());
    }
}
