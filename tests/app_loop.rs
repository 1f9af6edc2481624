mod common;

use common::{demo_scene, ScriptedSurface};
use umbra::backend::{Command, RecordingDevice};
use umbra::gpu::{PassTarget, Viewport};
use umbra::input::{InputEvents, Key};
use umbra::renderer::passes::{RenderMode, SceneRenderer};
use umbra::renderer::{FlyCamera, ShadowTarget};
use umbra::{Application, RenderError};

fn demo_app(device: &mut RecordingDevice, modes: Vec<RenderMode>) -> Application<RecordingDevice> {
    let (scene, programs) = demo_scene(device);
    Application::new(
        scene,
        programs,
        SceneRenderer::default(),
        FlyCamera::default(),
        modes,
        Viewport::sized(1200, 800),
    )
}

fn count(commands: &[Command], wanted: &Command) -> usize {
    commands.iter().filter(|c| *c == wanted).count()
}

#[test]
fn test_escape_ends_loop_and_releases_everything() {
    let mut device = RecordingDevice::new(1200, 800);
    let mut app = demo_app(&mut device, RenderMode::FRAME.to_vec());
    let mut surface = ScriptedSurface::new((1200, 800)).hold_from(4, Key::Escape);

    app.run(&mut surface, &mut device).unwrap();

    assert_eq!(app.frames(), 3);
    assert_eq!(count(&device.commands(), &Command::Present), 3);
    assert_eq!(surface.polls(), 4);
    assert_eq!(device.live_resources(), 0);
}

#[test]
fn test_close_request_ends_loop() {
    let mut device = RecordingDevice::new(1200, 800);
    let mut app = demo_app(&mut device, RenderMode::FRAME.to_vec());
    let close = InputEvents {
        close_requested: true,
        ..InputEvents::default()
    };
    let mut surface = ScriptedSurface::new((1200, 800)).on_poll(2, close);

    app.run(&mut surface, &mut device).unwrap();

    assert_eq!(app.frames(), 1);
    assert_eq!(device.live_resources(), 0);
}

#[test]
fn test_each_frame_runs_passes_in_order() {
    let mut device = RecordingDevice::new(1200, 800);
    let mut app = demo_app(&mut device, RenderMode::FRAME.to_vec());
    let mut surface = ScriptedSurface::new((1200, 800)).hold_from(2, Key::Escape);
    device.take_commands();

    app.run(&mut surface, &mut device).unwrap();

    let targets: Vec<_> = device
        .commands()
        .iter()
        .filter_map(|c| match c {
            Command::BeginPass { target, .. } => Some(*target),
            _ => None,
        })
        .collect();
    let scene = app.scene();
    assert_eq!(
        targets,
        vec![
            PassTarget::Framebuffer(ShadowTarget::framebuffer(scene.shadow_map())),
            PassTarget::Framebuffer(ShadowTarget::framebuffer(&scene.shadow_cubes()[0])),
            PassTarget::Surface,
        ]
    );
}

#[test]
fn test_resize_updates_device_and_viewport() {
    let mut device = RecordingDevice::new(1200, 800);
    let mut app = demo_app(&mut device, RenderMode::FRAME.to_vec());
    let resized = InputEvents {
        resized: Some((640, 480)),
        ..InputEvents::default()
    };
    let mut surface = ScriptedSurface::new((1200, 800))
        .on_poll(1, resized)
        .hold_from(2, Key::Escape);

    app.run(&mut surface, &mut device).unwrap();

    assert_eq!(device.size(), (640, 480));
    assert_eq!(app.viewport(), Viewport::sized(640, 480));
    assert!(device.commands().iter().any(|c| matches!(
        c,
        Command::BeginPass { target: PassTarget::Surface, viewport, .. }
            if *viewport == Viewport::sized(640, 480)
    )));
}

#[test]
fn test_minimized_resize_is_ignored() {
    let mut device = RecordingDevice::new(1200, 800);
    let mut app = demo_app(&mut device, RenderMode::FRAME.to_vec());
    let minimized = InputEvents {
        resized: Some((0, 0)),
        ..InputEvents::default()
    };
    let mut surface = ScriptedSurface::new((1200, 800))
        .on_poll(1, minimized)
        .hold_from(2, Key::Escape);

    app.run(&mut surface, &mut device).unwrap();

    assert_eq!(device.size(), (1200, 800));
    assert_eq!(app.viewport(), Viewport::sized(1200, 800));
}

#[test]
fn test_input_moves_camera() {
    let mut device = RecordingDevice::new(1200, 800);
    let mut app = demo_app(&mut device, RenderMode::FRAME.to_vec());
    let start = app.camera().position;
    let start_yaw = app.camera().yaw();
    let start_zoom = app.camera().zoom();

    let input = InputEvents {
        cursor_delta: (40.0, 0.0),
        scroll_delta: 2.0,
        ..InputEvents::default()
    };
    let mut surface = ScriptedSurface::new((1200, 800))
        .on_poll(2, input)
        .hold_from(1, Key::W)
        .hold_from(5, Key::Escape);

    app.run(&mut surface, &mut device).unwrap();

    let camera = app.camera();
    assert!(camera.position.distance(start) > 0.0);
    assert!(camera.yaw() > start_yaw);
    assert!(camera.zoom() < start_zoom);
}

#[test]
fn test_scene_without_shadow_pass_stops_loop() {
    let mut device = RecordingDevice::new(1200, 800);
    let mut app = demo_app(&mut device, vec![RenderMode::Scene]);
    let mut surface = ScriptedSurface::new((1200, 800));

    let result = app.run(&mut surface, &mut device);

    assert!(matches!(result, Err(RenderError::MissingLightSpace)));
    assert_eq!(app.frames(), 0);
    assert_eq!(device.live_resources(), 0);
}
