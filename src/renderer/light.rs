//! Light sources
//!
//! Each light publishes itself into a program under `{kind}{slot}.{field}`,
//! where `slot` is its index among lights of the same kind.

use crate::gpu::ShaderProgram;
use glam::{Mat4, Vec3};

/// Phong colour channels shared by every light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightColor {
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
}

impl LightColor {
    pub fn new(ambient: Vec3, diffuse: Vec3, specular: Vec3) -> Self {
        Self {
            ambient,
            diffuse,
            specular,
        }
    }

    /// Grey channels from scalar intensities.
    pub fn grey(ambient: f32, diffuse: f32, specular: f32) -> Self {
        Self::new(Vec3::splat(ambient), Vec3::splat(diffuse), Vec3::splat(specular))
    }

    fn publish(&self, program: &mut dyn ShaderProgram, prefix: &str) {
        program.set_vec3(&format!("{prefix}.ambient"), self.ambient);
        program.set_vec3(&format!("{prefix}.diffuse"), self.diffuse);
        program.set_vec3(&format!("{prefix}.specular"), self.specular);
    }
}

/// Attenuation factors for point lights.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attenuation {
    /// Constant attenuation factor.
    pub constant: f32,
    /// Linear attenuation factor.
    pub linear: f32,
    /// Quadratic attenuation factor.
    pub quadratic: f32,
}

impl Attenuation {
    pub fn new(constant: f32, linear: f32, quadratic: f32) -> Self {
        Self {
            constant,
            linear,
            quadratic,
        }
    }

    /// Attenuation at `distance`: `1 / (c + l*d + q*d^2)`.
    pub fn factor(&self, distance: f32) -> f32 {
        1.0 / (self.constant + self.linear * distance + self.quadratic * distance * distance)
    }
}

impl Default for Attenuation {
    fn default() -> Self {
        Self::new(1.0, 0.09, 0.032)
    }
}

/// Something that can publish itself into a program's uniform namespace.
pub trait LightSource {
    /// Uniform prefix literal, e.g. `light_point`.
    fn kind(&self) -> &'static str;

    fn publish(&self, program: &mut dyn ShaderProgram, slot: usize);
}

/// An omnidirectional light that casts cube shadows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub color: LightColor,
    pub attenuation: Attenuation,
}

impl PointLight {
    pub const KIND: &'static str = "light_point";

    pub fn new(position: Vec3, color: LightColor, attenuation: Attenuation) -> Self {
        Self {
            position,
            color,
            attenuation,
        }
    }
}

impl LightSource for PointLight {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn publish(&self, program: &mut dyn ShaderProgram, slot: usize) {
        let prefix = format!("{}{slot}", Self::KIND);
        program.set_vec3(&format!("{prefix}.position"), self.position);
        self.color.publish(program, &prefix);
        program.set_float(&format!("{prefix}.attenuation_const"), self.attenuation.constant);
        program.set_float(&format!("{prefix}.attenuation_lin"), self.attenuation.linear);
        program.set_float(&format!("{prefix}.attenuation_quad"), self.attenuation.quadratic);
    }
}

/// A parallel light. `position` only anchors the shadow-casting view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub position: Vec3,
    pub direction: Vec3,
    pub color: LightColor,
}

impl DirectionalLight {
    pub const KIND: &'static str = "light_directed";

    pub fn new(position: Vec3, direction: Vec3, color: LightColor) -> Self {
        Self {
            position,
            direction,
            color,
        }
    }

    /// View matrix of the shadow caster.
    ///
    /// Looks from `position` at the point `direction`, matching how the
    /// scene's lights are authored. Falls back to +Z as up when the view is
    /// vertical.
    pub fn shadow_view(&self) -> Mat4 {
        let forward = (self.direction - self.position).normalize_or_zero();
        let up = if forward.dot(Vec3::Y).abs() > 0.99 {
            Vec3::Z
        } else {
            Vec3::Y
        };
        Mat4::look_at_rh(self.position, self.direction, up)
    }
}

impl LightSource for DirectionalLight {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn publish(&self, program: &mut dyn ShaderProgram, slot: usize) {
        let prefix = format!("{}{slot}", Self::KIND);
        program.set_vec3(&format!("{prefix}.direction"), self.direction);
        self.color.publish(program, &prefix);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::uniform::UniformValue;

    #[derive(Default)]
    struct Capture(Vec<(String, UniformValue)>);

    impl ShaderProgram for Capture {
        fn use_program(&mut self) {}

        fn set_uniform(&mut self, name: &str, value: UniformValue) {
            self.0.push((name.to_string(), value));
        }
    }

    #[test]
    fn test_point_light_publishes_indexed_block() {
        let light = PointLight::new(
            Vec3::new(2.0, 3.0, -1.0),
            LightColor::grey(0.05, 0.4, 0.5),
            Attenuation::new(0.1, 0.09, 0.032),
        );
        let mut program = Capture::default();
        light.publish(&mut program, 1);

        let names: Vec<&str> = program.0.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "light_point1.position",
                "light_point1.ambient",
                "light_point1.diffuse",
                "light_point1.specular",
                "light_point1.attenuation_const",
                "light_point1.attenuation_lin",
                "light_point1.attenuation_quad",
            ]
        );
        assert_eq!(program.0[4].1, UniformValue::Float(0.1));
    }

    #[test]
    fn test_directional_light_uses_slot_zero() {
        let light = DirectionalLight::new(
            Vec3::new(1.0, 3.0, 1.5),
            Vec3::new(-0.2, -1.0, -0.3),
            LightColor::grey(0.05, 0.9, 0.5),
        );
        let mut program = Capture::default();
        light.publish(&mut program, 0);

        assert_eq!(program.0[0].0, "light_directed0.direction");
        assert_eq!(program.0.len(), 4);
        assert_eq!(light.kind(), "light_directed");
    }

    #[test]
    fn test_shadow_view_survives_vertical_direction() {
        let light = DirectionalLight::new(
            Vec3::new(0.0, 5.0, 0.0),
            Vec3::ZERO,
            LightColor::grey(0.0, 1.0, 0.0),
        );
        assert!(light.shadow_view().is_finite());
    }

    #[test]
    fn test_attenuation_factor() {
        let att = Attenuation::new(1.0, 0.0, 0.0);
        assert_eq!(att.factor(10.0), 1.0);
        assert!(Attenuation::default().factor(5.0) < 1.0);
    }
}
