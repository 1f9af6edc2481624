//! Texture maps and their roles
//!
//! A [`TextureMap`] is a tagged value: dimensionality, role, an optional GPU
//! handle and optional shading parameters. Binding dispatches on the tag in
//! free functions instead of per-type methods.

use crate::error::{RenderError, Result};
use crate::gpu::{RenderDevice, ShaderProgram, TextureHandle, TextureKind};

/// What a texture map feeds in the shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureRole {
    Diffuse,
    Specular,
    Normal,
    Depth,
    Shadow2D,
    ShadowCube,
}

impl TextureRole {
    /// Uniform array name for material roles.
    pub fn uniform_name(self) -> &'static str {
        match self {
            TextureRole::Diffuse => "diffuse_map",
            TextureRole::Specular => "specular_map",
            TextureRole::Normal => "normal_map",
            TextureRole::Depth => "depth_map",
            TextureRole::Shadow2D => "shadow_map",
            TextureRole::ShadowCube => "shadow_cube_map",
        }
    }

    pub fn is_shadow(self) -> bool {
        matches!(self, TextureRole::Shadow2D | TextureRole::ShadowCube)
    }

    fn label(self) -> &'static str {
        if self.is_shadow() {
            "shadow"
        } else {
            "material"
        }
    }
}

/// Optional shading parameters of a material map.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TextureParams {
    /// Specular exponent.
    pub flare: Option<f32>,
    /// Diffuse coefficient.
    pub diff_coef: Option<f32>,
    /// Parallax displacement scale.
    pub height_coef: Option<f32>,
}

impl TextureParams {
    pub fn flare(mut self, flare: f32) -> Self {
        self.flare = Some(flare);
        self
    }

    pub fn diff_coef(mut self, diff_coef: f32) -> Self {
        self.diff_coef = Some(diff_coef);
        self
    }

    pub fn height_coef(mut self, height_coef: f32) -> Self {
        self.height_coef = Some(height_coef);
        self
    }

    /// Publish the set parameters under `{name}.{param}`.
    pub fn publish(&self, program: &mut dyn ShaderProgram, name: &str) {
        let params = [
            ("flare", self.flare),
            ("diff_coef", self.diff_coef),
            ("height_coef", self.height_coef),
        ];
        for (param, value) in params {
            if let Some(value) = value {
                program.set_float(&format!("{name}.{param}"), value);
            }
        }
    }
}

/// A texture with its role and parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureMap {
    kind: TextureKind,
    role: TextureRole,
    handle: Option<TextureHandle>,
    params: TextureParams,
}

impl TextureMap {
    /// A 2D material map. `handle` is `None` when loading failed.
    pub fn material(
        role: TextureRole,
        handle: Option<TextureHandle>,
        params: TextureParams,
    ) -> Result<Self> {
        if role.is_shadow() {
            return Err(RenderError::RoleMismatch {
                expected: "material",
                found: "shadow",
            });
        }
        Ok(Self {
            kind: TextureKind::Texture2D,
            role,
            handle,
            params,
        })
    }

    pub fn shadow_2d(handle: TextureHandle) -> Self {
        Self {
            kind: TextureKind::Texture2D,
            role: TextureRole::Shadow2D,
            handle: Some(handle),
            params: TextureParams::default(),
        }
    }

    pub fn shadow_cube(handle: TextureHandle) -> Self {
        Self {
            kind: TextureKind::TextureCube,
            role: TextureRole::ShadowCube,
            handle: Some(handle),
            params: TextureParams::default(),
        }
    }

    pub fn kind(&self) -> TextureKind {
        self.kind
    }

    pub fn role(&self) -> TextureRole {
        self.role
    }

    pub fn handle(&self) -> Option<TextureHandle> {
        self.handle
    }

    pub fn params(&self) -> &TextureParams {
        &self.params
    }
}

/// Bind a map's texture to `unit`. Maps without a texture bind nothing.
pub fn bind_texture_map<D: RenderDevice>(device: &mut D, map: &TextureMap, unit: u32) {
    if let Some(handle) = map.handle {
        device.bind_texture(unit, handle, map.kind);
    }
}

/// Bind a shadow map to a reserved unit and publish the unit under `uniform`.
///
/// A map whose role is not a shadow role is logged and skipped.
pub fn bind_shadow_map<D: RenderDevice>(
    device: &mut D,
    program: &mut D::Program,
    map: &TextureMap,
    unit: u32,
    uniform: &str,
) -> Result<()> {
    if !map.role.is_shadow() {
        let err = RenderError::RoleMismatch {
            expected: "shadow",
            found: map.role.label(),
        };
        tracing::error!(tag = err.tag(), uniform, "{err}");
        return Err(err);
    }
    bind_texture_map(device, map, unit);
    program.set_int(uniform, unit as i32);
    Ok(())
}
