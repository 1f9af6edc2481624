//! Fly camera
//!
//! Yaw/pitch first-person camera. Orientation comes from cursor deltas,
//! field of view from scroll, and translation from movement keys scaled by
//! frame time.

use crate::error::RenderError;
use glam::{Mat4, Vec3};
use std::str::FromStr;

/// Direction of a movement step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    Forward,
    Backward,
    Left,
    Right,
}

impl FromStr for Movement {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "forward" => Ok(Movement::Forward),
            "backward" => Ok(Movement::Backward),
            "left" => Ok(Movement::Left),
            "right" => Ok(Movement::Right),
            _ => Err(RenderError::UnknownDirection(s.to_string())),
        }
    }
}

/// First-person camera with a fixed world up.
#[derive(Debug, Clone, PartialEq)]
pub struct FlyCamera {
    pub position: Vec3,
    front: Vec3,
    up: Vec3,
    right: Vec3,
    world_up: Vec3,
    /// Degrees.
    yaw: f32,
    /// Degrees.
    pitch: f32,
    /// Vertical field of view in degrees.
    zoom: f32,
    /// World units per second.
    pub speed: f32,
    /// Degrees per cursor unit.
    pub sensitivity: f32,
}

impl FlyCamera {
    pub const YAW: f32 = -90.0;
    pub const PITCH: f32 = 0.0;
    pub const PITCH_LIMIT: f32 = 89.0;
    pub const SPEED: f32 = 2.5;
    pub const SENSITIVITY: f32 = 0.1;
    pub const ZOOM: f32 = 45.0;
    pub const ZOOM_MIN: f32 = 1.0;
    pub const ZOOM_MAX: f32 = 45.0;

    pub fn new(position: Vec3) -> Self {
        let mut camera = Self {
            position,
            front: Vec3::NEG_Z,
            up: Vec3::Y,
            right: Vec3::X,
            world_up: Vec3::Y,
            yaw: Self::YAW,
            pitch: Self::PITCH,
            zoom: Self::ZOOM,
            speed: Self::SPEED,
            sensitivity: Self::SENSITIVITY,
        };
        camera.update_vectors();
        camera
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_sensitivity(mut self, sensitivity: f32) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    /// Rotate by a cursor delta (x right, y up).
    pub fn process_orientation_delta(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * self.sensitivity;
        self.pitch =
            (self.pitch + dy * self.sensitivity).clamp(-Self::PITCH_LIMIT, Self::PITCH_LIMIT);
        self.update_vectors();
    }

    /// Narrow the field of view by a scroll delta.
    pub fn process_zoom_delta(&mut self, dy: f32) {
        self.zoom = (self.zoom - dy).clamp(Self::ZOOM_MIN, Self::ZOOM_MAX);
    }

    pub fn process_move(&mut self, direction: Movement, dt: f32) {
        let step = self.speed * dt;
        match direction {
            Movement::Forward => self.position += self.front * step,
            Movement::Backward => self.position -= self.front * step,
            Movement::Left => self.position -= self.right * step,
            Movement::Right => self.position += self.right * step,
        }
    }

    /// Move by a direction name; unknown names are logged and ignored.
    pub fn process_named_move(&mut self, direction: &str, dt: f32) {
        match direction.parse::<Movement>() {
            Ok(movement) => self.process_move(movement, dt),
            Err(err) => tracing::error!(tag = err.tag(), "{err}"),
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front, self.up)
    }

    pub fn front(&self) -> Vec3 {
        self.front
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    fn update_vectors(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.front =
            Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalize();
        self.right = self.front.cross(self.world_up).normalize();
        self.up = self.right.cross(self.front).normalize();
    }
}

impl Default for FlyCamera {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 0.0, 3.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_default_looks_down_negative_z() {
        let camera = FlyCamera::default();
        assert!(camera.front().abs_diff_eq(Vec3::NEG_Z, EPSILON));
        assert!(camera.right().abs_diff_eq(Vec3::X, EPSILON));
        assert!(camera.up().abs_diff_eq(Vec3::Y, EPSILON));
    }

    #[test]
    fn test_zoom_clamps_at_one() {
        let mut camera = FlyCamera::default();
        for _ in 0..10 {
            camera.process_zoom_delta(1000.0);
        }
        assert_eq!(camera.zoom(), 1.0);

        camera.process_zoom_delta(-1000.0);
        assert_eq!(camera.zoom(), 45.0);
    }

    #[test]
    fn test_pitch_clamps_at_limit() {
        let mut camera = FlyCamera::default();
        for _ in 0..10 {
            camera.process_orientation_delta(0.0, 1000.0);
        }
        assert_eq!(camera.pitch(), 89.0);

        for _ in 0..10 {
            camera.process_orientation_delta(0.0, -1000.0);
        }
        assert_eq!(camera.pitch(), -89.0);
        assert!(camera.front().is_finite());
    }

    #[test]
    fn test_forward_move_scales_with_time() {
        let mut camera = FlyCamera::default().with_speed(2.0);
        camera.process_move(Movement::Forward, 0.5);
        assert!(camera.position.abs_diff_eq(Vec3::new(0.0, 0.0, 2.0), EPSILON));

        camera.process_move(Movement::Right, 1.0);
        assert!(camera.position.abs_diff_eq(Vec3::new(2.0, 0.0, 2.0), EPSILON));
    }

    #[test]
    fn test_unknown_direction_is_ignored() {
        let mut camera = FlyCamera::default();
        let before = camera.clone();
        camera.process_named_move("upward", 1.0);
        assert_eq!(camera, before);

        camera.process_named_move("Backward", 1.0);
        assert!(camera.position.z > before.position.z);
    }

    #[test]
    fn test_view_matrix_maps_target_to_negative_z() {
        let camera = FlyCamera::default();
        let target = camera.position + camera.front();
        let view_space = camera.view_matrix().transform_point3(target);
        assert!(view_space.abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), EPSILON));
    }
}
