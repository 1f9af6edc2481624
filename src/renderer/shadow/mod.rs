//! Shadow mapping
//!
//! Depth-only render targets for the two shadow passes: a 2D map for the
//! directional light and one cube map per point light. Each target owns a
//! framebuffer with the depth texture attached and nothing else, and hands
//! out the same texture as a [`TextureMap`] for the scene pass to sample.

mod cube;
mod directional;

pub use cube::{cube_face_views, ShadowCubeTarget, CUBE_FACES};
pub use directional::{LightSpace, ShadowMapTarget};

use crate::error::Result;
use crate::gpu::{FramebufferHandle, RenderDevice, TextureHandle, TextureKind};
use crate::renderer::texture_map::TextureMap;

/// Orthographic volume of the directional shadow caster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalShadowVolume {
    /// Half-width and half-height of the box.
    pub half_extent: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for DirectionalShadowVolume {
    fn default() -> Self {
        Self {
            half_extent: 10.0,
            near: 1.0,
            far: 7.5,
        }
    }
}

/// Perspective range of point light cube shadows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubeShadowRange {
    pub near: f32,
    pub far: f32,
}

impl Default for CubeShadowRange {
    fn default() -> Self {
        Self { near: 1.0, far: 25.0 }
    }
}

/// Framebuffer plus attached depth texture, shared by both target kinds.
#[derive(Debug, Clone, Copy, PartialEq)]
struct DepthTarget {
    framebuffer: FramebufferHandle,
    texture: TextureHandle,
    width: u32,
    height: u32,
}

impl DepthTarget {
    fn allocate<D: RenderDevice>(
        device: &mut D,
        framebuffer: FramebufferHandle,
        kind: TextureKind,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let texture = device.create_depth_texture(kind, width, height)?;
        device.attach_depth(framebuffer, texture)?;
        tracing::debug!(?kind, width, height, "shadow target allocated");
        Ok(Self {
            framebuffer,
            texture,
            width,
            height,
        })
    }

    fn release<D: RenderDevice>(&self, device: &mut D) {
        device.release_texture(self.texture);
        device.release_framebuffer(self.framebuffer);
    }
}

/// Shared accessors of the two target kinds.
pub trait ShadowTarget {
    fn framebuffer(&self) -> FramebufferHandle;

    fn size(&self) -> (u32, u32);

    /// The depth texture tagged with its shadow role.
    fn texture_map(&self) -> TextureMap;
}
