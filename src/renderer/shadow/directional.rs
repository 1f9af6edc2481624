//! Directional light shadow map

use super::{DepthTarget, DirectionalShadowVolume, ShadowTarget};
use crate::error::Result;
use crate::gpu::{FramebufferHandle, RenderDevice, TextureKind};
use crate::renderer::light::DirectionalLight;
use crate::renderer::texture_map::TextureMap;
use glam::Mat4;

/// World to light clip space of the directional shadow caster.
///
/// Produced by the directional shadow pass and consumed by the scene pass
/// of the same frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSpace {
    pub view: Mat4,
    pub projection: Mat4,
}

impl LightSpace {
    /// Orthographic projection over the light's shadow view.
    pub fn for_light(light: &DirectionalLight, volume: &DirectionalShadowVolume) -> Self {
        let e = volume.half_extent;
        Self {
            view: light.shadow_view(),
            projection: Mat4::orthographic_rh(-e, e, -e, e, volume.near, volume.far),
        }
    }

    /// `projection * view`.
    pub fn matrix(&self) -> Mat4 {
        self.projection * self.view
    }
}

/// 2D depth texture attached to its own framebuffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowMapTarget {
    target: DepthTarget,
}

impl ShadowMapTarget {
    /// Create the depth texture and attach it to `framebuffer`.
    pub fn allocate<D: RenderDevice>(
        device: &mut D,
        framebuffer: FramebufferHandle,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let target =
            DepthTarget::allocate(device, framebuffer, TextureKind::Texture2D, width, height)?;
        Ok(Self { target })
    }

    pub fn release<D: RenderDevice>(&self, device: &mut D) {
        self.target.release(device);
    }
}

impl ShadowTarget for ShadowMapTarget {
    fn framebuffer(&self) -> FramebufferHandle {
        self.target.framebuffer
    }

    fn size(&self) -> (u32, u32) {
        (self.target.width, self.target.height)
    }

    fn texture_map(&self) -> TextureMap {
        TextureMap::shadow_2d(self.target.texture)
    }
}
