//! Object placement

use crate::gpu::ShaderProgram;
use glam::{Mat4, Vec3};

/// Translation, non-uniform scale and a turn about the fixed diagonal axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translate: Vec3,
    pub scale: Vec3,
    /// Degrees about [`Transform::ROTATION_AXIS`].
    pub turn: f32,
}

impl Transform {
    /// Every object turns about (1, 1, 1).
    pub const ROTATION_AXIS: Vec3 = Vec3::ONE;

    pub fn new(translate: Vec3, scale: Vec3, turn: f32) -> Self {
        Self {
            translate,
            scale,
            turn,
        }
    }

    pub fn from_translation(translate: Vec3) -> Self {
        Self::new(translate, Vec3::ONE, 0.0)
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_turn(mut self, turn: f32) -> Self {
        self.turn = turn;
        self
    }

    /// `T * R * S`: scale first, then rotate, then translate.
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.translate)
            * Mat4::from_axis_angle(Self::ROTATION_AXIS.normalize(), self.turn.to_radians())
            * Mat4::from_scale(self.scale)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::from_translation(Vec3::ZERO)
    }
}

/// The `figure_position` uniform struct.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FigurePosition {
    pub model: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
}

impl FigurePosition {
    pub const NAME: &'static str = "figure_position";

    pub fn new(model: Mat4, view: Mat4, projection: Mat4) -> Self {
        Self {
            model,
            view,
            projection,
        }
    }

    pub fn publish(&self, program: &mut dyn ShaderProgram) {
        program.set_mat4("figure_position.model", self.model);
        program.set_mat4("figure_position.view", self.view);
        program.set_mat4("figure_position.projection", self.projection);
    }
}
