//! Point light cube shadow map

use super::{CubeShadowRange, DepthTarget, ShadowTarget};
use crate::error::Result;
use crate::gpu::{FramebufferHandle, RenderDevice, TextureKind};
use crate::renderer::texture_map::TextureMap;
use glam::{Mat4, Vec3};

/// `(forward, up)` of each cube face in layer order +X, -X, +Y, -Y, +Z, -Z.
pub const CUBE_FACES: [(Vec3, Vec3); 6] = [
    (Vec3::X, Vec3::NEG_Y),
    (Vec3::NEG_X, Vec3::NEG_Y),
    (Vec3::Y, Vec3::Z),
    (Vec3::NEG_Y, Vec3::NEG_Z),
    (Vec3::Z, Vec3::NEG_Y),
    (Vec3::NEG_Z, Vec3::NEG_Y),
];

/// Projection times view for each face, 90 degree field of view.
pub fn cube_face_views(position: Vec3, aspect: f32, range: &CubeShadowRange) -> [Mat4; 6] {
    let projection = Mat4::perspective_rh(90f32.to_radians(), aspect, range.near, range.far);
    CUBE_FACES.map(|(forward, up)| projection * Mat4::look_at_rh(position, position + forward, up))
}

/// Cube depth texture attached to its own framebuffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowCubeTarget {
    target: DepthTarget,
}

impl ShadowCubeTarget {
    /// Create the six-face depth texture and attach it to `framebuffer`.
    pub fn allocate<D: RenderDevice>(
        device: &mut D,
        framebuffer: FramebufferHandle,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let target =
            DepthTarget::allocate(device, framebuffer, TextureKind::TextureCube, width, height)?;
        Ok(Self { target })
    }

    pub fn release<D: RenderDevice>(&self, device: &mut D) {
        self.target.release(device);
    }

    pub fn aspect(&self) -> f32 {
        self.target.width as f32 / self.target.height.max(1) as f32
    }
}

impl ShadowTarget for ShadowCubeTarget {
    fn framebuffer(&self) -> FramebufferHandle {
        self.target.framebuffer
    }

    fn size(&self) -> (u32, u32) {
        (self.target.width, self.target.height)
    }

    fn texture_map(&self) -> TextureMap {
        TextureMap::shadow_cube(self.target.texture)
    }
}
