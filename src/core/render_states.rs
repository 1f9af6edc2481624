//! Render state configurations

/// Clear state for a pass target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearState {
    /// Color to clear to (RGBA), or None to keep the previous contents.
    pub color: Option<[f32; 4]>,
    /// Depth value to clear to (0.0-1.0), or None to keep the previous contents.
    pub depth: Option<f32>,
}

impl ClearState {
    /// Clear depth only, as every shadow pass does.
    pub fn depth(depth: f32) -> Self {
        Self {
            color: None,
            depth: Some(depth),
        }
    }

    pub fn color_and_depth(color: [f32; 4], depth: f32) -> Self {
        Self {
            color: Some(color),
            depth: Some(depth),
        }
    }

    pub fn none() -> Self {
        Self {
            color: None,
            depth: None,
        }
    }

    /// Get the wgpu load operation for color.
    pub fn color_load_op(&self) -> wgpu::LoadOp<wgpu::Color> {
        match self.color {
            Some([r, g, b, a]) => wgpu::LoadOp::Clear(wgpu::Color {
                r: r as f64,
                g: g as f64,
                b: b as f64,
                a: a as f64,
            }),
            None => wgpu::LoadOp::Load,
        }
    }

    /// Get the wgpu load operation for depth.
    pub fn depth_load_op(&self) -> wgpu::LoadOp<f32> {
        match self.depth {
            Some(d) => wgpu::LoadOp::Clear(d),
            None => wgpu::LoadOp::Load,
        }
    }
}

impl Default for ClearState {
    fn default() -> Self {
        Self::color_and_depth([0.1, 0.1, 0.1, 1.0], 1.0)
    }
}

/// Blend state configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendState {
    /// No blending (opaque).
    Opaque,
    /// Standard alpha blending.
    #[default]
    Alpha,
}

impl BlendState {
    /// Convert to wgpu blend state.
    pub fn to_wgpu(&self) -> Option<wgpu::BlendState> {
        match self {
            BlendState::Opaque => None,
            BlendState::Alpha => Some(wgpu::BlendState::ALPHA_BLENDING),
        }
    }
}

/// Depth test configuration.
#[derive(Debug, Clone, Copy)]
pub struct DepthState {
    /// Whether to write to the depth buffer.
    pub write: bool,
    /// Comparison function for depth test.
    pub compare: wgpu::CompareFunction,
}

impl DepthState {
    /// Depth testing enabled with writes.
    pub fn read_write() -> Self {
        Self {
            write: true,
            compare: wgpu::CompareFunction::Less,
        }
    }

    /// Convert to wgpu depth stencil state.
    pub fn to_wgpu(&self, format: wgpu::TextureFormat) -> wgpu::DepthStencilState {
        wgpu::DepthStencilState {
            format,
            depth_write_enabled: self.write,
            depth_compare: self.compare,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }
    }
}

impl Default for DepthState {
    fn default() -> Self {
        Self::read_write()
    }
}

/// Which faces are culled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullFace {
    /// Cull front faces; used for closed volumes in the directional shadow pass.
    Front,
    /// Cull back faces.
    #[default]
    Back,
}

impl CullFace {
    /// Convert to wgpu cull mode.
    pub fn to_wgpu(&self) -> Option<wgpu::Face> {
        match self {
            CullFace::Front => Some(wgpu::Face::Front),
            CullFace::Back => Some(wgpu::Face::Back),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shadow_clear_keeps_color() {
        let clear = ClearState::depth(1.0);
        assert!(matches!(clear.color_load_op(), wgpu::LoadOp::Load));
        assert!(matches!(clear.depth_load_op(), wgpu::LoadOp::Clear(d) if d == 1.0));
    }

    #[test]
    fn test_default_clear_is_scene_grey() {
        let clear = ClearState::default();
        assert_eq!(clear.color, Some([0.1, 0.1, 0.1, 1.0]));
    }

    #[test]
    fn test_cull_face_mapping() {
        assert_eq!(CullFace::Front.to_wgpu(), Some(wgpu::Face::Front));
        assert_eq!(CullFace::default(), CullFace::Back);
    }
}
