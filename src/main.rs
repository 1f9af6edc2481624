use anyhow::Context as _;
use umbra::app::Application;
use umbra::assets::ImageCrateDecoder;
use umbra::config::RendererConfig;
use umbra::gpu::{Surface, Viewport};
use umbra::renderer::{FlyCamera, SceneRenderer};
use umbra::window::{WindowSettings, WinitSurface};

const DEFAULT_CONFIG: &str = "umbra.json";
const DEFAULT_FILTER: &str = "info,wgpu_core=warn,wgpu_hal=warn,naga=warn";

fn main() -> std::process::ExitCode {
    init_tracing();
    match run() {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(tag = "app::setup::failed", "{err:#}");
            std::process::ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();
}

fn run() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let config = RendererConfig::load_from_path(&config_path);

    let mut surface = WinitSurface::open(WindowSettings::from(&config.window))?;
    let mut device = surface.create_device()?;
    let mut compiler = device.compiler();

    let (scene, programs) =
        umbra::demo::build(&mut device, &mut compiler, &ImageCrateDecoder, &config)
            .context("failed to build the demo scene")?;

    let camera = FlyCamera::default()
        .with_speed(config.camera.speed)
        .with_sensitivity(config.camera.sensitivity);
    let (width, height) = surface.framebuffer_size();

    let mut app = Application::new(
        scene,
        programs,
        SceneRenderer::new(config.pass_config()),
        camera,
        config.render_modes(),
        Viewport::sized(width, height),
    );
    app.run(&mut surface, &mut device).context("render loop failed")?;
    Ok(())
}
