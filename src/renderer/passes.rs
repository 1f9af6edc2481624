//! The three per-frame render passes
//!
//! A frame runs the directional shadow pass, the point shadow pass and the
//! lit scene pass, in that order. Nothing is cached between passes inside
//! the renderer: the directional pass returns its [`LightSpace`], the caller
//! stores it in the frame's [`FrameState`] and the scene pass receives it
//! as an argument.

use crate::core::render_states::{ClearState, CullFace};
use crate::error::{RenderError, Result};
use crate::gpu::{PassTarget, RenderDevice, ShaderProgram, Viewport};
use crate::renderer::camera::FlyCamera;
use crate::renderer::light::LightSource;
use crate::renderer::scene::{check_len, Scene};
use crate::renderer::shadow::{
    cube_face_views, CubeShadowRange, DirectionalShadowVolume, LightSpace, ShadowTarget,
};
use crate::renderer::texture_map::bind_shadow_map;
use crate::renderer::transform::FigurePosition;
use glam::Mat4;
use std::fmt;
use std::str::FromStr;

/// Sampler unit of the directional shadow map.
pub const SHADOW_MAP_UNIT: u32 = 5;
/// Sampler unit of the first cube shadow map; cube `j` uses `6 + j`.
pub const SHADOW_CUBE_UNIT_BASE: u32 = 6;

/// Selects one of the passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderMode {
    DirectionalShadow,
    PointShadow,
    Scene,
}

impl RenderMode {
    /// Default frame order.
    pub const FRAME: [RenderMode; 3] = [
        RenderMode::DirectionalShadow,
        RenderMode::PointShadow,
        RenderMode::Scene,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RenderMode::DirectionalShadow => "directional_shadow",
            RenderMode::PointShadow => "point_shadow",
            RenderMode::Scene => "scene",
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RenderMode {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "directional_shadow" => Ok(RenderMode::DirectionalShadow),
            "point_shadow" => Ok(RenderMode::PointShadow),
            "scene" => Ok(RenderMode::Scene),
            other => Err(RenderError::UnknownRenderMode(other.to_string())),
        }
    }
}

/// Projection parameters of the three passes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassConfig {
    pub directional: DirectionalShadowVolume,
    pub cube: CubeShadowRange,
    /// Near plane of the camera projection.
    pub scene_near: f32,
    /// Far plane of the camera projection.
    pub scene_far: f32,
    pub clear: ClearState,
}

impl Default for PassConfig {
    fn default() -> Self {
        Self {
            directional: DirectionalShadowVolume::default(),
            cube: CubeShadowRange::default(),
            scene_near: 0.1,
            scene_far: 100.0,
            clear: ClearState::default(),
        }
    }
}

/// One program per object plus the two depth programs.
#[derive(Debug)]
pub struct ScenePrograms<P> {
    pub shadow: P,
    pub shadow_cube: P,
    /// `objects[i]` shades `scene.objects()[i]`.
    pub objects: Vec<P>,
}

/// Values produced by earlier passes of the current frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameState {
    pub viewport: Viewport,
    light_space: Option<LightSpace>,
}

impl FrameState {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            light_space: None,
        }
    }

    pub fn light_space(&self) -> Option<&LightSpace> {
        self.light_space.as_ref()
    }
}

/// Runs the passes against a [`RenderDevice`].
#[derive(Debug, Clone, Default)]
pub struct SceneRenderer {
    config: PassConfig,
}

impl SceneRenderer {
    pub fn new(config: PassConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PassConfig {
        &self.config
    }

    /// Run one pass, threading results through `frame`.
    pub fn run<D: RenderDevice>(
        &self,
        mode: RenderMode,
        frame: &mut FrameState,
        device: &mut D,
        scene: &Scene,
        programs: &mut ScenePrograms<D::Program>,
        camera: &FlyCamera,
    ) -> Result<()> {
        tracing::trace!(%mode, "render pass");
        match mode {
            RenderMode::DirectionalShadow => {
                let light_space =
                    self.directional_shadow_pass(device, scene, &mut programs.shadow)?;
                frame.light_space = Some(light_space);
            }
            RenderMode::PointShadow => {
                self.point_shadow_pass(device, scene, &mut programs.shadow_cube)?;
            }
            RenderMode::Scene => {
                let Some(light_space) = frame.light_space else {
                    let err = RenderError::MissingLightSpace;
                    tracing::error!(tag = err.tag(), "{err}");
                    return Err(err);
                };
                self.scene_pass(
                    device,
                    scene,
                    &mut programs.objects,
                    camera,
                    frame.viewport,
                    &light_space,
                )?;
            }
        }
        Ok(())
    }

    /// Run a pass selected by name. Unknown names are logged and draw nothing.
    pub fn run_named<D: RenderDevice>(
        &self,
        name: &str,
        frame: &mut FrameState,
        device: &mut D,
        scene: &Scene,
        programs: &mut ScenePrograms<D::Program>,
        camera: &FlyCamera,
    ) -> Result<()> {
        match name.parse::<RenderMode>() {
            Ok(mode) => self.run(mode, frame, device, scene, programs, camera),
            Err(err) => {
                tracing::error!(tag = err.tag(), "{err}");
                Ok(())
            }
        }
    }

    /// Render scene depth from the directional light into the shadow map.
    ///
    /// Volumes cull front faces while they are drawn.
    pub fn directional_shadow_pass<D: RenderDevice>(
        &self,
        device: &mut D,
        scene: &Scene,
        program: &mut D::Program,
    ) -> Result<LightSpace> {
        let target = scene.shadow_map();
        let (width, height) = target.size();
        let light_space =
            LightSpace::for_light(scene.directional_light(), &self.config.directional);

        in_pass(
            device,
            PassTarget::Framebuffer(target.framebuffer()),
            Viewport::sized(width, height),
            ClearState::depth(1.0),
            |device| {
                program.use_program();
                program.set_mat4("light_space", light_space.matrix());

                for (object, transform) in scene.placed_objects() {
                    if object.is_volume() {
                        device.set_cull_face(CullFace::Front);
                    }
                    FigurePosition::new(
                        transform.model_matrix(),
                        light_space.view,
                        light_space.projection,
                    )
                    .publish(program);
                    let drawn = object.draw(device, program);
                    if object.is_volume() {
                        device.set_cull_face(CullFace::Back);
                    }
                    drawn?;
                }
                Ok(())
            },
        )?;
        Ok(light_space)
    }

    /// Render linear depth around every point light into its cube target.
    pub fn point_shadow_pass<D: RenderDevice>(
        &self,
        device: &mut D,
        scene: &Scene,
        program: &mut D::Program,
    ) -> Result<()> {
        check_len("shadow_cubes", scene.point_lights().len(), scene.shadow_cubes().len())?;
        let range = self.config.cube;

        for (light, target) in scene.point_lights().iter().zip(scene.shadow_cubes()) {
            let (width, height) = target.size();
            let views = cube_face_views(light.position, target.aspect(), &range);

            in_pass(
                device,
                PassTarget::Framebuffer(target.framebuffer()),
                Viewport::sized(width, height),
                ClearState::depth(1.0),
                |device| {
                    program.use_program();
                    for (face, view) in views.iter().enumerate() {
                        program.set_mat4(&format!("shadow_view[{face}]"), *view);
                    }
                    program.set_float("far_plane", range.far);
                    program.set_vec3("light_position", light.position);

                    for (object, transform) in scene.placed_objects() {
                        let model = transform.model_matrix();
                        FigurePosition::new(model, Mat4::IDENTITY, Mat4::IDENTITY).publish(program);
                        object.draw(device, program)?;
                    }
                    Ok(())
                },
            )?;
        }
        Ok(())
    }

    /// Render the lit scene to the surface, each object with its own program.
    pub fn scene_pass<D: RenderDevice>(
        &self,
        device: &mut D,
        scene: &Scene,
        programs: &mut [D::Program],
        camera: &FlyCamera,
        viewport: Viewport,
        light_space: &LightSpace,
    ) -> Result<()> {
        check_len("programs", scene.objects().len(), programs.len())?;

        let projection = Mat4::perspective_rh(
            camera.zoom().to_radians(),
            viewport.aspect(),
            self.config.scene_near,
            self.config.scene_far,
        );
        let view = camera.view_matrix();
        let shadow_map = scene.shadow_map().texture_map();
        let cube_maps: Vec<_> = scene.shadow_cubes().iter().map(|c| c.texture_map()).collect();

        in_pass(device, PassTarget::Surface, viewport, self.config.clear, |device| {
            for ((object, transform), program) in scene.placed_objects().zip(programs.iter_mut()) {
                program.use_program();
                program.set_mat4("light_space", light_space.matrix());

                bind_shadow_map(device, program, &shadow_map, SHADOW_MAP_UNIT, "shadow_map")?;
                for (j, cube_map) in cube_maps.iter().enumerate() {
                    let unit = SHADOW_CUBE_UNIT_BASE + j as u32;
                    let uniform = format!("shadow_cube_map[{j}]");
                    bind_shadow_map(device, program, cube_map, unit, &uniform)?;
                }

                FigurePosition::new(transform.model_matrix(), view, projection).publish(program);
                program.set_vec3("view_position", camera.position);

                program.set_int("light_point_count", scene.point_lights().len() as i32);
                for (slot, light) in scene.point_lights().iter().enumerate() {
                    light.publish(program, slot);
                }
                program.set_float("far_plane", self.config.cube.far);
                scene.directional_light().publish(program, 0);

                object.draw(device, program)?;
            }
            Ok(())
        })
    }
}

/// Open a pass, run `body`, and close the pass even when `body` fails.
fn in_pass<D, T, F>(
    device: &mut D,
    target: PassTarget,
    viewport: Viewport,
    clear: ClearState,
    body: F,
) -> Result<T>
where
    D: RenderDevice,
    F: FnOnce(&mut D) -> Result<T>,
{
    device.begin_pass(target, viewport, clear)?;
    let result = body(device);
    device.end_pass();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_mode_parse() {
        for mode in RenderMode::FRAME {
            assert_eq!(mode.as_str().parse::<RenderMode>().unwrap(), mode);
        }
        assert!(matches!(
            "wireframe".parse::<RenderMode>(),
            Err(RenderError::UnknownRenderMode(name)) if name == "wireframe"
        ));
    }

    #[test]
    fn test_frame_state_starts_without_light_space() {
        let frame = FrameState::new(Viewport::sized(1200, 800));
        assert!(frame.light_space().is_none());
    }

    #[test]
    fn test_default_planes() {
        let config = PassConfig::default();
        assert_eq!(config.scene_near, 0.1);
        assert_eq!(config.scene_far, 100.0);
        assert_eq!(config.cube.far, 25.0);
        assert_eq!(config.directional.far, 7.5);
    }
}
