//! Headless globe fly-by that streams tile imagery from an atlas directory.
//!
//! Configuration is loaded from `config.ron` and can be overridden via CLI flags.
//! Run with `cargo run -p tessera-demo -- --atlas-dir textures/daymaps`.
//! Add `--gpu` to upload textures to a wgpu device instead of the recording backend.

use std::f64::consts::TAU;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tessera_config::{CliArgs, Config, EllipsoidKind};
use tessera_geo::{Ellipsoid, Resolution};
use tessera_render::{
    Camera, HeadlessTextureBackend, LoggingSubscriber, Renderer, RenderingOptions,
    SUN_DISTANCE_RADII, SolarSimulator, TileEarthRenderer, WgpuTextureBackend, request_device,
};
use tessera_resources::{FileImageDecoder, ResourceError, TextureBackend};
use tessera_tiling::{AtlasError, ContainerSources, TileContainer, TilingError, UnitGridTesselator};
use tracing::{error, info, warn};

const FRAME_TIME: Duration = Duration::from_millis(16);

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error("failed to load atlases: {0}")]
    Atlas(#[from] AtlasError),
    #[error("failed to build tiles: {0}")]
    Tiling(#[from] TilingError),
    #[error("failed to start streaming: {0}")]
    Resource(#[from] ResourceError),
}

fn surface(kind: EllipsoidKind) -> Ellipsoid {
    match kind {
        EllipsoidKind::Wgs84 => Ellipsoid::wgs84(),
        EllipsoidKind::UnitSphere => Ellipsoid::unit_sphere(),
    }
}

/// Orbit once around the globe while descending from three radii to a
/// fifth of a radius above the surface.
fn run<B: TextureBackend>(config: &Config, backend: B, frames: u32) -> Result<(), DemoError> {
    let ellipsoid = surface(config.globe.ellipsoid);
    let sources = ContainerSources::load(&config.globe)?;
    let container = TileContainer::build(sources, &UnitGridTesselator, &ellipsoid, &config.lod)?;

    let mut renderer = TileEarthRenderer::new(
        container,
        Box::new(ellipsoid),
        backend,
        Box::new(FileImageDecoder),
        &config.lod,
        &config.streaming,
    )?;
    if config.debug.show_statistics {
        renderer.subscribe(Box::new(LoggingSubscriber));
    }
    let radius = ellipsoid.maximum_radius();
    renderer.set_light_source(Box::new(SolarSimulator::new(
        radius * SUN_DISTANCE_RADII,
        &config.simulation,
    )));
    renderer.initialize()?;

    let mut camera = Camera::orbiting(radius, radius * 2.0, config.render.fov_degrees.to_radians());
    let window = Resolution::new(config.window.width, config.window.height);
    let options = RenderingOptions::from(&config.render);
    let total = f64::from(frames.max(1));

    let mut last = None;
    for frame in 0..frames {
        let progress = f64::from(frame) / total;
        let altitude = radius * (2.0 - 1.8 * progress);
        camera.position = camera.position.normalize() * (radius + altitude);
        camera.orbit(TAU / total);

        renderer.advance_light(FRAME_TIME.as_secs_f64());
        let plan = renderer.render(&camera, window, &options);
        last = Some((plan.statistics, plan.light_direction));
        std::thread::sleep(FRAME_TIME);
    }
    if let Some((statistics, light)) = last {
        info!("{statistics}");
        if let Some(light) = light {
            info!(x = light.x, y = light.y, z = light.z, "sun direction");
        }
    }

    renderer.destroy();
    Ok(())
}

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let config_dir = args.config.clone().unwrap_or_else(|| {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tessera")
    });

    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    tessera_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    if let Err(e) = config.validate() {
        error!("{e}");
        return ExitCode::FAILURE;
    }
    info!(
        atlas = %config.globe.day_atlas_dir.display(),
        frames = args.frames,
        "starting globe fly-by"
    );

    let result = if args.gpu {
        match request_device() {
            Some((device, queue)) => run(&config, WgpuTextureBackend::new(device, queue), args.frames),
            None => {
                warn!("no GPU adapter available, using the headless backend");
                run(&config, HeadlessTextureBackend::new(), args.frames)
            }
        }
    } else {
        run(&config, HeadlessTextureBackend::new(), args.frames)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
