mod common;

use common::{demo_scene, SolidDecoder};
use glam::Vec3;
use umbra::backend::{Command, RecordingDevice};
use umbra::core::render_states::CullFace;
use umbra::core::uniform::UniformValue;
use umbra::core::vertex::VertexLayout;
use umbra::gpu::{ImageDecoder, PassTarget, RenderDevice, ShaderCompiler, TextureKind, Viewport};
use umbra::renderer::passes::{FrameState, RenderMode, SceneRenderer};
use umbra::renderer::shadow::{LightSpace, ShadowMapTarget, ShadowTarget};
use umbra::renderer::{
    Drawable, FlyCamera, Scene, TextureMap, TextureParams, TextureRole, Transform,
};
use umbra::RenderError;

fn uniforms_of(commands: &[Command], program: &str) -> Vec<(String, UniformValue)> {
    commands
        .iter()
        .filter_map(|c| match c {
            Command::Uniform { program: p, name, value } if p == program => {
                Some((name.clone(), *value))
            }
            _ => None,
        })
        .collect()
}

fn draws(commands: &[Command]) -> Vec<(String, CullFace)> {
    commands
        .iter()
        .filter_map(|c| match c {
            Command::Draw { program, cull, .. } => Some((program.clone(), *cull)),
            _ => None,
        })
        .collect()
}

#[test]
fn test_material_maps_named_per_role_on_sequential_units() {
    let mut device = RecordingDevice::new(64, 64);
    let image = SolidDecoder.decode("x.png".as_ref()).unwrap();
    let mut map = |role| {
        let handle = device.create_texture_rgba8(&image).unwrap();
        TextureMap::material(role, Some(handle), TextureParams::default()).unwrap()
    };
    let maps = vec![
        map(TextureRole::Diffuse),
        map(TextureRole::Diffuse),
        map(TextureRole::Specular),
        map(TextureRole::Normal),
    ];

    let mesh = umbra::demo::cube_mesh().unwrap();
    let mut drawable = Drawable::new("cube", mesh, VertexLayout::Basic, true)
        .with_texture_maps(maps)
        .unwrap();
    drawable.initialize(&mut device).unwrap();
    device.take_commands();

    let mut compiler = device.compiler();
    let mut program = compiler
        .compile(&umbra::backend::programs::scene_program("shaders".as_ref()))
        .unwrap();
    drawable.draw(&mut device, &mut program).unwrap();

    let commands = device.commands();
    let samplers: Vec<_> = uniforms_of(&commands, "scene")
        .into_iter()
        .filter(|(name, _)| name.ends_with(".texture_data"))
        .collect();
    assert_eq!(
        samplers,
        vec![
            ("diffuse_map[0].texture_data".to_string(), UniformValue::Int(0)),
            ("diffuse_map[1].texture_data".to_string(), UniformValue::Int(1)),
            ("specular_map[0].texture_data".to_string(), UniformValue::Int(2)),
            ("normal_map[0].texture_data".to_string(), UniformValue::Int(3)),
        ]
    );
    let units: Vec<_> = commands
        .iter()
        .filter_map(|c| match c {
            Command::BindTexture { unit, .. } => Some(*unit),
            _ => None,
        })
        .collect();
    assert_eq!(units, vec![0, 1, 2, 3]);
    assert_eq!(commands.last(), Some(&Command::ActiveUnit(0)));
}

#[test]
fn test_directional_pass_culls_front_faces_of_volumes() {
    let mut device = RecordingDevice::new(1200, 800);
    let (scene, mut programs) = demo_scene(&mut device);
    device.take_commands();

    SceneRenderer::default()
        .directional_shadow_pass(&mut device, &scene, &mut programs.shadow)
        .unwrap();
    let commands = device.commands();

    let culls: Vec<_> = draws(&commands).into_iter().map(|(_, cull)| cull).collect();
    let expected: Vec<_> = scene
        .objects()
        .iter()
        .map(|o| if o.is_volume() { CullFace::Front } else { CullFace::Back })
        .collect();
    assert_eq!(culls, expected);
    let last_cull = commands.iter().rev().find(|c| matches!(c, Command::CullFace(_)));
    assert_eq!(last_cull, Some(&Command::CullFace(CullFace::Back)));

    assert!(matches!(
        commands.first(),
        Some(Command::BeginPass { target: PassTarget::Framebuffer(fb), viewport, .. })
            if *fb == scene.shadow_map().framebuffer() && *viewport == Viewport::sized(4096, 4096)
    ));
    assert_eq!(commands.last(), Some(&Command::EndPass));
}

#[test]
fn test_light_space_follows_moving_light() {
    let mut device = RecordingDevice::new(1200, 800);
    let (mut scene, mut programs) = demo_scene(&mut device);
    let renderer = SceneRenderer::default();
    let camera = FlyCamera::default();

    for step in 0..3 {
        scene.directional_light_mut().position = Vec3::new(1.0 + step as f32, 3.0, 1.5);
        device.take_commands();

        let mut frame = FrameState::new(Viewport::sized(1200, 800));
        for mode in RenderMode::FRAME {
            renderer
                .run(mode, &mut frame, &mut device, &scene, &mut programs, &camera)
                .unwrap();
        }

        let expected =
            LightSpace::for_light(scene.directional_light(), &renderer.config().directional);
        assert_eq!(frame.light_space(), Some(&expected));

        let commands = device.commands();
        let published: Vec<_> = uniforms_of(&commands, "scene")
            .into_iter()
            .filter(|(name, _)| name == "light_space")
            .map(|(_, value)| value)
            .collect();
        assert_eq!(published.len(), 5);
        assert!(published.iter().all(|v| *v == UniformValue::Mat4(expected.matrix())));
    }
}

#[test]
fn test_scene_pass_without_light_space_fails() {
    let mut device = RecordingDevice::new(1200, 800);
    let (scene, mut programs) = demo_scene(&mut device);
    device.take_commands();

    let mut frame = FrameState::new(Viewport::sized(1200, 800));
    let result = SceneRenderer::default().run(
        RenderMode::Scene,
        &mut frame,
        &mut device,
        &scene,
        &mut programs,
        &FlyCamera::default(),
    );

    assert!(matches!(result, Err(RenderError::MissingLightSpace)));
    assert!(draws(&device.commands()).is_empty());
}

#[test]
fn test_unknown_pass_name_draws_nothing() {
    let mut device = RecordingDevice::new(1200, 800);
    let (scene, mut programs) = demo_scene(&mut device);
    device.take_commands();

    let mut frame = FrameState::new(Viewport::sized(1200, 800));
    SceneRenderer::default()
        .run_named("bloom", &mut frame, &mut device, &scene, &mut programs, &FlyCamera::default())
        .unwrap();

    assert!(device.commands().is_empty());
    assert!(frame.light_space().is_none());
}

#[test]
fn test_point_shadow_pass_renders_every_object_into_the_cube() {
    let mut device = RecordingDevice::new(1200, 800);
    let (scene, mut programs) = demo_scene(&mut device);
    device.take_commands();

    SceneRenderer::default()
        .point_shadow_pass(&mut device, &scene, &mut programs.shadow_cube)
        .unwrap();
    let commands = device.commands();

    let cube = &scene.shadow_cubes()[0];
    assert!(matches!(
        commands.first(),
        Some(Command::BeginPass { target: PassTarget::Framebuffer(fb), .. })
            if *fb == cube.framebuffer()
    ));

    let uniforms = uniforms_of(&commands, "shadow_cube");
    for face in 0..6 {
        let name = format!("shadow_view[{face}]");
        assert!(uniforms.iter().any(|(n, _)| *n == name), "{name} not published");
    }
    assert!(uniforms.contains(&("far_plane".to_string(), UniformValue::Float(25.0))));
    assert!(uniforms.contains(&(
        "light_position".to_string(),
        UniformValue::Vec3(scene.point_lights()[0].position)
    )));
    assert_eq!(draws(&commands).len(), scene.objects().len());
}

#[test]
fn test_scene_pass_binds_shadow_maps_to_reserved_units() {
    let mut device = RecordingDevice::new(1200, 800);
    let (scene, mut programs) = demo_scene(&mut device);
    let renderer = SceneRenderer::default();
    let mut frame = FrameState::new(Viewport::sized(1200, 800));
    let camera = FlyCamera::default();
    renderer
        .run(RenderMode::DirectionalShadow, &mut frame, &mut device, &scene, &mut programs, &camera)
        .unwrap();
    device.take_commands();

    renderer
        .run(RenderMode::Scene, &mut frame, &mut device, &scene, &mut programs, &camera)
        .unwrap();
    let commands = device.commands();

    let shadow_texture = scene.shadow_map().texture_map().handle().unwrap();
    let cube_texture = scene.shadow_cubes()[0].texture_map().handle().unwrap();
    assert!(commands.contains(&Command::BindTexture {
        unit: 5,
        texture: shadow_texture,
        kind: TextureKind::Texture2D,
    }));
    assert!(commands.contains(&Command::BindTexture {
        unit: 6,
        texture: cube_texture,
        kind: TextureKind::TextureCube,
    }));

    let uniforms = uniforms_of(&commands, "scene");
    assert!(uniforms.contains(&("shadow_map".to_string(), UniformValue::Int(5))));
    assert!(uniforms.contains(&("shadow_cube_map[0]".to_string(), UniformValue::Int(6))));
    assert!(uniforms.contains(&("light_point_count".to_string(), UniformValue::Int(1))));

    let programs_drawn: Vec<_> = draws(&commands).into_iter().map(|(p, _)| p).collect();
    assert_eq!(programs_drawn, vec!["scene", "scene", "scene", "scene", "scene", "light"]);
    assert!(matches!(
        commands.first(),
        Some(Command::BeginPass { target: PassTarget::Surface, .. })
    ));
}

#[test]
fn test_scene_rejects_mismatched_transforms() {
    let mut device = RecordingDevice::new(16, 16);
    let fb = device.create_framebuffer();
    let shadow_map = ShadowMapTarget::allocate(&mut device, fb, 16, 16).unwrap();
    let cube = umbra::demo::cube_mesh().unwrap();
    let objects = vec![
        Drawable::new("a", cube.clone(), VertexLayout::Basic, true),
        Drawable::new("b", cube, VertexLayout::Basic, true),
    ];

    let result = Scene::new(
        objects,
        vec![Transform::default()],
        Vec::new(),
        umbra::demo::directional_light(),
        shadow_map,
        Vec::new(),
    );
    assert!(matches!(
        result,
        Err(RenderError::LengthMismatch { expected: 2, actual: 1, .. })
    ));
}

#[test]
fn test_release_frees_shared_material_textures_once() {
    let mut device = RecordingDevice::new(1200, 800);
    let (mut scene, _programs) = demo_scene(&mut device);
    assert!(device.live_resources() > 0);
    device.take_commands();

    scene.release_all(&mut device);

    assert_eq!(device.live_resources(), 0);
    let mut released: Vec<_> = device
        .commands()
        .iter()
        .filter_map(|c| match c {
            Command::ReleaseTexture(t) => Some(t.0),
            _ => None,
        })
        .collect();
    let total = released.len();
    released.sort_unstable();
    released.dedup();
    assert_eq!(released.len(), total);
}
