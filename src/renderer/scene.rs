//! Scene aggregate
//!
//! Owns the drawables with their transforms, the lights and the shadow
//! targets the passes render into. Construction checks that the parallel
//! lists line up so passes can zip them without bounds surprises.

use crate::error::{RenderError, Result};
use crate::gpu::{GpuBufferUploader, RenderDevice, TextureHandle};
use crate::renderer::drawable::Drawable;
use crate::renderer::light::{DirectionalLight, PointLight};
use crate::renderer::shadow::{ShadowCubeTarget, ShadowMapTarget};
use crate::renderer::transform::Transform;

/// Objects, lights and shadow targets of one frame.
#[derive(Debug)]
pub struct Scene {
    objects: Vec<Drawable>,
    transforms: Vec<Transform>,
    point_lights: Vec<PointLight>,
    directional_light: DirectionalLight,
    shadow_map: ShadowMapTarget,
    shadow_cubes: Vec<ShadowCubeTarget>,
}

impl Scene {
    /// Assemble a scene.
    ///
    /// `transforms[i]` places `objects[i]` and `shadow_cubes[j]` receives the
    /// depth of `point_lights[j]`; mismatched lengths are rejected.
    pub fn new(
        objects: Vec<Drawable>,
        transforms: Vec<Transform>,
        point_lights: Vec<PointLight>,
        directional_light: DirectionalLight,
        shadow_map: ShadowMapTarget,
        shadow_cubes: Vec<ShadowCubeTarget>,
    ) -> Result<Self> {
        check_len("transforms", objects.len(), transforms.len())?;
        check_len("shadow_cubes", point_lights.len(), shadow_cubes.len())?;
        Ok(Self {
            objects,
            transforms,
            point_lights,
            directional_light,
            shadow_map,
            shadow_cubes,
        })
    }

    /// Upload every drawable that is not yet on the GPU.
    pub fn initialize<U: GpuBufferUploader + ?Sized>(&mut self, uploader: &mut U) -> Result<()> {
        for object in self.objects.iter_mut().filter(|o| !o.is_initialized()) {
            object.initialize(uploader)?;
        }
        tracing::info!(
            objects = self.objects.len(),
            point_lights = self.point_lights.len(),
            "scene initialized"
        );
        Ok(())
    }

    /// Release every GPU handle the scene owns.
    ///
    /// Material textures shared between drawables are released once.
    pub fn release_all<D: RenderDevice>(&mut self, device: &mut D) {
        let mut textures: Vec<TextureHandle> = self
            .objects
            .iter()
            .flat_map(|o| o.texture_maps().iter().filter_map(|m| m.handle()))
            .collect();
        textures.sort_by_key(|t| t.0);
        textures.dedup();

        for object in &mut self.objects {
            object.release(device);
        }
        for texture in textures {
            device.release_texture(texture);
        }
        self.shadow_map.release(device);
        for cube in &self.shadow_cubes {
            cube.release(device);
        }
        tracing::debug!("scene released");
    }

    pub fn objects(&self) -> &[Drawable] {
        &self.objects
    }

    pub fn transforms(&self) -> &[Transform] {
        &self.transforms
    }

    /// Transforms can be edited in place; the count stays fixed.
    pub fn transforms_mut(&mut self) -> &mut [Transform] {
        &mut self.transforms
    }

    pub fn point_lights(&self) -> &[PointLight] {
        &self.point_lights
    }

    pub fn point_lights_mut(&mut self) -> &mut [PointLight] {
        &mut self.point_lights
    }

    pub fn directional_light(&self) -> &DirectionalLight {
        &self.directional_light
    }

    pub fn directional_light_mut(&mut self) -> &mut DirectionalLight {
        &mut self.directional_light
    }

    pub fn shadow_map(&self) -> &ShadowMapTarget {
        &self.shadow_map
    }

    pub fn shadow_cubes(&self) -> &[ShadowCubeTarget] {
        &self.shadow_cubes
    }

    /// `(drawable, transform)` pairs in draw order.
    pub fn placed_objects(&self) -> impl Iterator<Item = (&Drawable, &Transform)> {
        self.objects.iter().zip(&self.transforms)
    }
}

pub(crate) fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        return Ok(());
    }
    let err = RenderError::LengthMismatch {
        what,
        expected,
        actual,
    };
    tracing::error!(tag = err.tag(), "{err}");
    Err(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_len() {
        assert!(check_len("transforms", 3, 3).is_ok());
        assert!(matches!(
            check_len("transforms", 3, 2),
            Err(RenderError::LengthMismatch {
                what: "transforms",
                expected: 3,
                actual: 2
            })
        ));
    }
}
