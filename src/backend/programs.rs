//! Built-in programs
//!
//! Descriptors for the four shader programs the renderer ships with. Each
//! uniform layout lists its members in the order of the WGSL struct it
//! mirrors.

use crate::core::uniform::{UniformKind, UniformLayout};
use crate::core::vertex::VertexLayout;
use crate::gpu::{
    FallbackTexture, ProgramDescriptor, SamplerSlot, ShaderSource, ShaderStage, TargetKind,
    TextureKind,
};
use std::path::Path;

pub const SCENE_WGSL: &str = include_str!("../../shaders/scene.wgsl");
pub const LIGHT_WGSL: &str = include_str!("../../shaders/light.wgsl");
pub const SHADOW_WGSL: &str = include_str!("../../shaders/shadow.wgsl");
pub const SHADOW_CUBE_WGSL: &str = include_str!("../../shaders/shadow_cube.wgsl");

/// Point lights the scene program can shade.
pub const MAX_POINT_LIGHTS: usize = 2;

fn figure_position(layout: UniformLayout) -> UniformLayout {
    layout
        .field("figure_position.model", UniformKind::Mat4)
        .field("figure_position.view", UniformKind::Mat4)
        .field("figure_position.projection", UniformKind::Mat4)
}

fn sources(root: &Path, file: &str) -> Vec<ShaderSource> {
    let path = root.join(file);
    vec![
        ShaderSource {
            path: path.clone(),
            stage: ShaderStage::Vertex,
        },
        ShaderSource {
            path,
            stage: ShaderStage::Fragment,
        },
    ]
}

pub fn scene_uniforms() -> UniformLayout {
    figure_position(UniformLayout::new())
        .field("light_space", UniformKind::Mat4)
        .field("view_position", UniformKind::Vec3)
        .field("far_plane", UniformKind::Float)
        .field("light_point_count", UniformKind::Int)
        .field("diffuse_map[0].diff_coef", UniformKind::Float)
        .field("specular_map[0].flare", UniformKind::Float)
        .field("specular_map[0].diff_coef", UniformKind::Float)
        .field("depth_map[0].height_coef", UniformKind::Float)
        .struct_array(
            "light_directed",
            &[
                ("direction", UniformKind::Vec3),
                ("ambient", UniformKind::Vec3),
                ("diffuse", UniformKind::Vec3),
                ("specular", UniformKind::Vec3),
            ],
            1,
        )
        .struct_array(
            "light_point",
            &[
                ("position", UniformKind::Vec3),
                ("attenuation_const", UniformKind::Float),
                ("ambient", UniformKind::Vec3),
                ("attenuation_lin", UniformKind::Float),
                ("diffuse", UniformKind::Vec3),
                ("attenuation_quad", UniformKind::Float),
                ("specular", UniformKind::Vec3),
            ],
            MAX_POINT_LIGHTS,
        )
}

pub fn light_uniforms() -> UniformLayout {
    figure_position(UniformLayout::new())
}

pub fn shadow_uniforms() -> UniformLayout {
    UniformLayout::new()
        .field("light_space", UniformKind::Mat4)
        .field("figure_position.model", UniformKind::Mat4)
}

pub fn shadow_cube_uniforms() -> UniformLayout {
    UniformLayout::new()
        .array("shadow_view", UniformKind::Mat4, 6)
        .field("figure_position.model", UniformKind::Mat4)
        .field("light_position", UniformKind::Vec3)
        .field("far_plane", UniformKind::Float)
        .field("cube_face", UniformKind::Int)
}

/// Phong program with material, shadow and cube shadow samplers.
pub fn scene_program(shader_root: &Path) -> ProgramDescriptor {
    let mut samplers = vec![
        SamplerSlot::color("diffuse_map[0].texture_data", FallbackTexture::White),
        SamplerSlot::color("specular_map[0].texture_data", FallbackTexture::White),
        SamplerSlot::color("normal_map[0].texture_data", FallbackTexture::FlatNormal),
        SamplerSlot::color("depth_map[0].texture_data", FallbackTexture::Black),
        SamplerSlot::depth("shadow_map", TextureKind::Texture2D),
    ];
    samplers.extend((0..MAX_POINT_LIGHTS).map(|j| {
        SamplerSlot::depth(format!("shadow_cube_map[{j}]"), TextureKind::TextureCube)
    }));

    ProgramDescriptor {
        label: "scene".to_string(),
        stages: sources(shader_root, "scene.wgsl"),
        uniforms: scene_uniforms(),
        samplers,
        vertex_layout: VertexLayout::NormalMapped,
        target: TargetKind::Color,
        embedded: Some(SCENE_WGSL),
    }
}

/// Unlit white program for light markers.
pub fn light_program(shader_root: &Path) -> ProgramDescriptor {
    ProgramDescriptor {
        label: "light".to_string(),
        stages: sources(shader_root, "light.wgsl"),
        uniforms: light_uniforms(),
        samplers: Vec::new(),
        vertex_layout: VertexLayout::Basic,
        target: TargetKind::Color,
        embedded: Some(LIGHT_WGSL),
    }
}

/// Depth-only program of the directional shadow pass.
pub fn shadow_program(shader_root: &Path) -> ProgramDescriptor {
    ProgramDescriptor {
        label: "shadow".to_string(),
        stages: sources(shader_root, "shadow.wgsl"),
        uniforms: shadow_uniforms(),
        samplers: Vec::new(),
        vertex_layout: VertexLayout::Basic,
        target: TargetKind::Depth,
        embedded: Some(SHADOW_WGSL),
    }
}

/// Depth-only program of the point light cube pass.
pub fn shadow_cube_program(shader_root: &Path) -> ProgramDescriptor {
    ProgramDescriptor {
        label: "shadow_cube".to_string(),
        stages: sources(shader_root, "shadow_cube.wgsl"),
        uniforms: shadow_cube_uniforms(),
        samplers: Vec::new(),
        vertex_layout: VertexLayout::Basic,
        target: TargetKind::Depth,
        embedded: Some(SHADOW_CUBE_WGSL),
    }
}
