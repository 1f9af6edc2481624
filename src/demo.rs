//! Demo scene
//!
//! Four brick columns on a stone floor, lit by one shadow-casting point
//! light (drawn as a small white cube) and a directional light.

use crate::assets::load_texture_map;
use crate::backend::programs;
use crate::config::RendererConfig;
use crate::core::vertex::VertexLayout;
use crate::error::Result;
use crate::gpu::{ImageDecoder, RenderDevice, ShaderCompiler};
use crate::renderer::drawable::Drawable;
use crate::renderer::geometry::{GeometryBuilder, MeshData};
use crate::renderer::light::{Attenuation, DirectionalLight, LightColor, PointLight};
use crate::renderer::passes::ScenePrograms;
use crate::renderer::scene::Scene;
use crate::renderer::shadow::{ShadowCubeTarget, ShadowMapTarget};
use crate::renderer::texture_map::{TextureMap, TextureParams, TextureRole};
use crate::renderer::transform::Transform;
use glam::{Vec2, Vec3};

/// Corners of each cube face, counter-clockwise seen from outside:
/// bottom-left, bottom-right, top-right, top-left.
const CUBE_POSITIONS: [[f32; 3]; 24] = [
    // -Z
    [0.5, -0.5, -0.5],
    [-0.5, -0.5, -0.5],
    [-0.5, 0.5, -0.5],
    [0.5, 0.5, -0.5],
    // +Z
    [-0.5, -0.5, 0.5],
    [0.5, -0.5, 0.5],
    [0.5, 0.5, 0.5],
    [-0.5, 0.5, 0.5],
    // -X
    [-0.5, -0.5, -0.5],
    [-0.5, -0.5, 0.5],
    [-0.5, 0.5, 0.5],
    [-0.5, 0.5, -0.5],
    // +X
    [0.5, -0.5, 0.5],
    [0.5, -0.5, -0.5],
    [0.5, 0.5, -0.5],
    [0.5, 0.5, 0.5],
    // -Y
    [-0.5, -0.5, -0.5],
    [0.5, -0.5, -0.5],
    [0.5, -0.5, 0.5],
    [-0.5, -0.5, 0.5],
    // +Y
    [-0.5, 0.5, 0.5],
    [0.5, 0.5, 0.5],
    [0.5, 0.5, -0.5],
    [-0.5, 0.5, -0.5],
];

const CUBE_NORMALS: [[f32; 3]; 6] = [
    [0.0, 0.0, -1.0],
    [0.0, 0.0, 1.0],
    [-1.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [0.0, -1.0, 0.0],
    [0.0, 1.0, 0.0],
];

/// Two triangles per face.
const FACE_TEMPLATE: [u32; 6] = [0, 1, 2, 2, 3, 0];
const FACE_NORMAL: [u32; 6] = [0; 6];
const CUBE_FACES: usize = 6;

const FLOOR_EXTENT: f32 = 7.0;
const FLOOR_TILES: f32 = 28.0;

const COLUMN_SCALE: Vec3 = Vec3::new(1.0, 3.0, 1.0);
const COLUMN_POSITIONS: [Vec3; 4] = [
    Vec3::new(-1.5, -0.498, -1.5),
    Vec3::new(1.5, -0.498, -1.5),
    Vec3::new(-1.5, -0.498, 1.5),
    Vec3::new(1.5, -0.498, 1.5),
];
const FLOOR_POSITION: Vec3 = Vec3::new(0.0, -2.0, 0.0);
const LIGHT_POSITION: Vec3 = Vec3::new(2.0, 3.0, -1.0);
const LIGHT_CUBE_SCALE: f32 = 0.2;

fn vec3s(values: &[[f32; 3]]) -> Vec<Vec3> {
    values.iter().copied().map(Vec3::from).collect()
}

/// Per-face UVs, image top at v = 0. `wall_repeat` tiles the side faces vertically.
fn cube_uvs(wall_repeat: f32) -> Vec<Vec2> {
    (0..CUBE_FACES)
        .flat_map(|face| {
            let v = if face < 4 { wall_repeat } else { 1.0 };
            [
                Vec2::new(0.0, v),
                Vec2::new(1.0, v),
                Vec2::new(1.0, 0.0),
                Vec2::new(0.0, 0.0),
            ]
        })
        .collect()
}

fn box_builder(wall_repeat: f32, tangents: bool) -> GeometryBuilder {
    GeometryBuilder::new()
        .positions(vec3s(&CUBE_POSITIONS), FACE_TEMPLATE)
        .normals(vec3s(&CUBE_NORMALS), FACE_NORMAL)
        .uvs(cube_uvs(wall_repeat), FACE_TEMPLATE)
        .cycle(CUBE_FACES)
        .with_tangents(tangents)
}

fn box_mesh(wall_repeat: f32, tangents: bool) -> Result<MeshData> {
    box_builder(wall_repeat, tangents).build()
}

/// Unit cube with one texture per face.
pub fn cube_mesh() -> Result<MeshData> {
    box_mesh(1.0, true)
}

/// Unit cube whose side faces repeat the texture three times vertically.
pub fn column_mesh() -> Result<MeshData> {
    box_mesh(3.0, true)
}

/// Square floor at y = 0 facing up.
pub fn floor_mesh() -> Result<MeshData> {
    let e = FLOOR_EXTENT;
    GeometryBuilder::new()
        .positions(
            vec![
                Vec3::new(-e, 0.0, e),
                Vec3::new(e, 0.0, e),
                Vec3::new(e, 0.0, -e),
                Vec3::new(-e, 0.0, -e),
            ],
            FACE_TEMPLATE,
        )
        .normals(vec![Vec3::Y], FACE_NORMAL)
        .uvs(
            vec![
                Vec2::new(0.0, FLOOR_TILES),
                Vec2::new(FLOOR_TILES, FLOOR_TILES),
                Vec2::new(FLOOR_TILES, 0.0),
                Vec2::new(0.0, 0.0),
            ],
            FACE_TEMPLATE,
        )
        .with_tangents(true)
        .build()
}

/// The point light of the demo.
pub fn point_light() -> PointLight {
    PointLight::new(
        LIGHT_POSITION,
        LightColor::grey(0.05, 0.4, 0.5),
        Attenuation::new(0.1, 0.09, 0.032),
    )
}

/// The directional light of the demo.
pub fn directional_light() -> DirectionalLight {
    DirectionalLight::new(
        Vec3::new(1.0, 3.0, 1.5),
        Vec3::new(-0.2, -1.0, -0.3),
        LightColor::grey(0.05, 0.9, 0.5),
    )
}

fn brick_maps<D: RenderDevice, I: ImageDecoder + ?Sized>(
    device: &mut D,
    decoder: &I,
    config: &RendererConfig,
) -> Result<Vec<TextureMap>> {
    let root = &config.asset_root;
    let bricks = root.join("bricks2.jpg");
    Ok(vec![
        load_texture_map(
            device,
            decoder,
            &bricks,
            TextureRole::Diffuse,
            TextureParams::default().flare(1.0).diff_coef(0.5),
        )?,
        load_texture_map(
            device,
            decoder,
            &bricks,
            TextureRole::Specular,
            TextureParams::default().flare(10.0).diff_coef(0.5),
        )?,
        load_texture_map(
            device,
            decoder,
            &root.join("bricks2_normal.jpg"),
            TextureRole::Normal,
            TextureParams::default(),
        )?,
        load_texture_map(
            device,
            decoder,
            &root.join("bricks2_disp.jpg"),
            TextureRole::Depth,
            TextureParams::default().height_coef(0.1),
        )?,
    ])
}

fn stone_maps<D: RenderDevice, I: ImageDecoder + ?Sized>(
    device: &mut D,
    decoder: &I,
    config: &RendererConfig,
) -> Result<Vec<TextureMap>> {
    let root = &config.asset_root;
    Ok(vec![
        load_texture_map(
            device,
            decoder,
            &root.join("Stone_Wall_007_COLOR.jpg"),
            TextureRole::Diffuse,
            TextureParams::default(),
        )?,
        load_texture_map(
            device,
            decoder,
            &root.join("Stone_Wall_007_NORM.jpg"),
            TextureRole::Normal,
            TextureParams::default(),
        )?,
        load_texture_map(
            device,
            decoder,
            &root.join("Stone_Wall_007_DEPTH.png"),
            TextureRole::Depth,
            TextureParams::default().height_coef(0.1),
        )?,
    ])
}

/// Build, upload and wire up the demo scene and its programs.
pub fn build<D, C, I>(
    device: &mut D,
    compiler: &mut C,
    decoder: &I,
    config: &RendererConfig,
) -> Result<(Scene, ScenePrograms<D::Program>)>
where
    D: RenderDevice,
    D::Program: Clone,
    C: ShaderCompiler<Program = D::Program>,
    I: ImageDecoder + ?Sized,
{
    let shader_root = &config.shader_root;
    let scene_program = compiler.compile(&programs::scene_program(shader_root))?;
    let light_program = compiler.compile(&programs::light_program(shader_root))?;
    let shadow = compiler.compile(&programs::shadow_program(shader_root))?;
    let shadow_cube = compiler.compile(&programs::shadow_cube_program(shader_root))?;

    let bricks = brick_maps(device, decoder, config)?;
    let stone = stone_maps(device, decoder, config)?;

    let column = column_mesh()?;
    let mut objects = Vec::new();
    let mut transforms = Vec::new();
    let mut object_programs = Vec::new();

    for (i, position) in COLUMN_POSITIONS.into_iter().enumerate() {
        objects.push(
            Drawable::new(format!("column {i}"), column.clone(), VertexLayout::NormalMapped, true)
                .with_texture_maps(bricks.clone())?,
        );
        transforms.push(Transform::from_translation(position).with_scale(COLUMN_SCALE));
        object_programs.push(scene_program.clone());
    }

    objects.push(
        Drawable::new("floor", floor_mesh()?, VertexLayout::NormalMapped, false)
            .with_texture_maps(stone)?,
    );
    transforms.push(Transform::from_translation(FLOOR_POSITION));
    object_programs.push(scene_program);

    let light = point_light();
    objects.push(Drawable::new("light cube", cube_mesh()?, VertexLayout::Basic, true));
    transforms.push(
        Transform::from_translation(light.position).with_scale(Vec3::splat(LIGHT_CUBE_SCALE)),
    );
    object_programs.push(light_program);

    let [map_w, map_h] = config.shadow.map_size;
    let shadow_fb = device.create_framebuffer();
    let shadow_map = ShadowMapTarget::allocate(device, shadow_fb, map_w, map_h)?;

    let point_lights = vec![light];
    let [cube_w, cube_h] = config.shadow.cube_size;
    let shadow_cubes = point_lights
        .iter()
        .map(|_| {
            let fb = device.create_framebuffer();
            ShadowCubeTarget::allocate(device, fb, cube_w, cube_h)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut scene = Scene::new(
        objects,
        transforms,
        point_lights,
        directional_light(),
        shadow_map,
        shadow_cubes,
    )?;
    scene.initialize(device)?;

    Ok((
        scene,
        ScenePrograms {
            shadow,
            shadow_cube,
            objects: object_programs,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_faces_wind_outward() {
        let mesh = cube_mesh().unwrap();
        assert_eq!(mesh.triangle_count(), 12);
        for triangle in mesh.indices.chunks_exact(3) {
            let [a, b, c] =
                [0, 1, 2].map(|i| Vec3::from(mesh.vertices[triangle[i] as usize].position));
            let normal = Vec3::from(mesh.vertices[triangle[0] as usize].normal);
            let winding = (b - a).cross(c - a);
            assert!(winding.dot(normal) > 0.0, "triangle {triangle:?} winds inward");
        }
    }

    #[test]
    fn test_cube_expands_to_36_face_vertices() {
        let vertices = box_builder(1.0, false).expand().unwrap();
        assert_eq!(vertices.len(), 36);

        let quad = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];
        for (face, corners) in vertices.chunks_exact(6).enumerate() {
            for (i, vertex) in corners.iter().enumerate() {
                let corner = FACE_TEMPLATE[i] as usize;
                assert_eq!(vertex.normal, CUBE_NORMALS[face], "face {face}");
                assert_eq!(vertex.uv, quad[corner], "face {face} corner {corner}");
                assert_eq!(vertex.position, CUBE_POSITIONS[face * 4 + corner]);
            }
        }
    }

    #[test]
    fn test_column_walls_repeat_three_times() {
        let mesh = column_mesh().unwrap();
        let max_v = mesh.vertices.iter().map(|v| v.uv[1]).fold(0.0f32, f32::max);
        assert_eq!(max_v, 3.0);
    }

    #[test]
    fn test_floor_faces_up() {
        let mesh = floor_mesh().unwrap();
        assert_eq!(mesh.triangle_count(), 2);
        assert!(mesh.vertices.iter().all(|v| v.normal == [0.0, 1.0, 0.0]));
        assert!(mesh.vertices.iter().all(|v| v.position[1] == 0.0));
    }
}
