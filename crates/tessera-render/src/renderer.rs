//! The per-frame tile renderer.
//!
//! Each [`TileEarthRenderer::render`] call admits textures the loader has
//! finished, culls tiles against the camera, picks a level of detail per tile
//! and binds the best resident texture of every enabled layer. Textures that
//! are not resident are requested and a coarser or finer substitute is bound
//! meanwhile. Nothing here blocks on I/O.

use std::sync::Arc;

use glam::DVec3;
use tessera_config::{LodConfig, StreamingConfig};
use tessera_geo::{GeoRect, GeodeticSurface, Resolution};
use tessera_resources::{
    ImageDecoder, LoaderHandle, ResourceChannel, ResourceError, ResourceFetcher, ResourceLoader,
    ResourceManager, TextureBackend, TextureId, TextureType,
};
use tessera_tiling::{TextureResolution, TileContainer, TileMesh};

use crate::camera::Camera;
use crate::in_flight::InFlightRequests;
use crate::light::LightSource;
use crate::options::RenderingOptions;
use crate::stats::{RendererSubscriber, RenderingStatistics};

/// Frame-driven renderer lifecycle.
pub trait Renderer {
    type Error;

    /// Prepare for the first frame.
    fn initialize(&mut self) -> Result<(), Self::Error>;

    /// Plan one frame for a `window`-sized framebuffer.
    fn render(&mut self, camera: &Camera, window: Resolution, options: &RenderingOptions)
    -> FramePlan;

    /// Release every GPU resource and stop background work.
    fn destroy(&mut self);
}

/// Which level a bound texture came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingSource {
    Exact,
    Coarser,
    Finer,
}

/// A resident texture bound to a tile, with the window it covers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureBinding {
    pub id: TextureId,
    pub footprint: GeoRect,
    pub source: BindingSource,
}

impl TextureBinding {
    pub fn from_resolution(resolution: TextureResolution) -> Option<Self> {
        let (texture, source) = match resolution {
            TextureResolution::Exact(t) => (t, BindingSource::Exact),
            TextureResolution::Coarser(t) => (t, BindingSource::Coarser),
            TextureResolution::Finer(t) => (t, BindingSource::Finer),
            TextureResolution::Missing => return None,
        };
        Some(Self {
            id: texture.id,
            footprint: texture.footprint,
            source,
        })
    }

    pub fn is_fallback(&self) -> bool {
        self.source != BindingSource::Exact
    }
}

/// Everything needed to draw one tile.
#[derive(Debug, Clone)]
pub struct TileDrawCommand {
    pub tile_index: usize,
    /// Atlas level of the selected LOD.
    pub level: usize,
    pub mesh: Arc<TileMesh>,
    pub tile_rect: GeoRect,
    pub day: Option<TextureBinding>,
    pub night: Option<TextureBinding>,
    pub height: Option<TextureBinding>,
}

impl TileDrawCommand {
    pub fn binding(&self, texture_type: TextureType) -> Option<TextureBinding> {
        match texture_type {
            TextureType::Day => self.day,
            TextureType::Night => self.night,
            TextureType::HeightMap => self.height,
        }
    }
}

/// Output of one [`Renderer::render`] call.
#[derive(Debug, Clone, Default)]
pub struct FramePlan {
    pub commands: Vec<TileDrawCommand>,
    pub statistics: RenderingStatistics,
    pub wireframe: bool,
    /// Towards the light, if one is set. Without it the night layer stays off.
    pub light_direction: Option<DVec3>,
}

/// Streams atlas textures into a [`TextureBackend`] and plans tile draws.
pub struct TileEarthRenderer<B: TextureBackend> {
    container: TileContainer,
    surface: Box<dyn GeodeticSurface>,
    backend: B,
    manager: ResourceManager,
    fetcher: ResourceFetcher,
    decoder: Option<Box<dyn ImageDecoder>>,
    loader: Option<LoaderHandle>,
    in_flight: InFlightRequests,
    subscribers: Vec<Box<dyn RendererSubscriber>>,
    light: Option<Box<dyn LightSource>>,
    error_threshold: f64,
    frame: u64,
}

impl<B: TextureBackend> TileEarthRenderer<B> {
    /// The loader thread is only started by [`Renderer::initialize`].
    pub fn new(
        container: TileContainer,
        surface: Box<dyn GeodeticSurface>,
        backend: B,
        decoder: Box<dyn ImageDecoder>,
        lod: &LodConfig,
        streaming: &StreamingConfig,
    ) -> Result<Self, ResourceError> {
        let manager = ResourceManager::new(streaming.texture_cache_capacity)?;
        let channel = Arc::new(ResourceChannel::new());
        Ok(Self {
            container,
            surface,
            backend,
            manager,
            fetcher: ResourceFetcher::new(channel),
            decoder: Some(decoder),
            loader: None,
            in_flight: InFlightRequests::new(streaming.retry_after_frames),
            subscribers: Vec::new(),
            light: None,
            error_threshold: lod.screen_space_error_threshold,
            frame: 0,
        })
    }

    pub fn subscribe(&mut self, subscriber: Box<dyn RendererSubscriber>) {
        self.subscribers.push(subscriber);
    }

    pub fn set_light_source(&mut self, light: Box<dyn LightSource>) {
        self.light = Some(light);
    }

    /// Move the light's simulated clock by `elapsed` real seconds.
    pub fn advance_light(&mut self, elapsed: f64) {
        if let Some(light) = &mut self.light {
            light.advance(elapsed);
        }
    }

    pub fn container(&self) -> &TileContainer {
        &self.container
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn manager(&self) -> &ResourceManager {
        &self.manager
    }

    pub fn in_flight(&self) -> &InFlightRequests {
        &self.in_flight
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn is_loader_running(&self) -> bool {
        self.loader.as_ref().is_some_and(LoaderHandle::is_running)
    }

    /// Hand every decoded result to its texture and admit it to the cache.
    fn admit_loaded_textures(&mut self) {
        for result in self.fetcher.retrieve_loaded_resources() {
            let Some(request) = self.in_flight.complete(&result.path) else {
                tracing::debug!(path = %result.path.display(), "ignoring result that is not in flight");
                continue;
            };
            let textures = self.container.textures_mut();
            if !textures.get_mut(request.texture).set_data(result.image) {
                continue;
            }
            self.manager
                .add_texture_into_context(textures, request.texture, &mut self.backend);
        }
    }

    fn publish(&mut self, statistics: &RenderingStatistics) {
        for subscriber in &mut self.subscribers {
            subscriber.notify(statistics);
        }
    }
}

impl<B: TextureBackend> Renderer for TileEarthRenderer<B> {
    type Error = ResourceError;

    /// Place the tiles on the surface and start the loader thread.
    fn initialize(&mut self) -> Result<(), ResourceError> {
        self.container.update_geocentric_positions(self.surface.as_ref());
        if let Some(decoder) = self.decoder.take() {
            let channel = Arc::clone(self.fetcher.channel());
            self.loader = Some(ResourceLoader::spawn(channel, decoder)?);
        }
        tracing::info!(
            tiles = self.container.tiles().len(),
            levels = self.container.num_levels(),
            capacity = self.manager.capacity(),
            "tile renderer initialized"
        );
        Ok(())
    }

    fn render(
        &mut self,
        camera: &Camera,
        window: Resolution,
        options: &RenderingOptions,
    ) -> FramePlan {
        self.frame += 1;
        let frame = self.frame;
        self.admit_loaded_textures();

        let aspect = f64::from(window.width) / f64::from(window.height.max(1));
        let frustum = camera.frustum(aspect);
        let screen_width = f64::from(window.width);
        let light_direction = self.light.as_ref().map(|light| light.light_direction());

        let Self {
            container,
            manager,
            fetcher,
            in_flight,
            error_threshold,
            ..
        } = self;
        let mut statistics = RenderingStatistics {
            frame,
            num_tiles: container.tiles().len(),
            camera_position: camera.position,
            ..Default::default()
        };
        let mut commands = Vec::new();
        let resources = container.resources();
        let textures = container.textures();

        for (tile_index, tile) in container.tiles().iter().enumerate() {
            if !tile.is_in_view_frustum(&frustum) {
                statistics.frustum_culled_tiles += 1;
                continue;
            }
            if !tile.is_facing_camera(camera.position) {
                statistics.backface_culled_tiles += 1;
                continue;
            }

            let distance = camera.distance_to(tile.center());
            let lod = tile.get_resources(screen_width, distance, camera.fov_y, *error_threshold);
            let rect = *tile.rect();

            let mut bindings = [None; 3];
            for texture_type in options.texture_types() {
                let resolved = resources.resolve_texture(lod.resources, &rect, texture_type, textures);
                if !resolved.is_exact() {
                    if let Some(exact) = resources.texture(lod.resources, texture_type) {
                        let path = textures.get(exact.id).path();
                        if in_flight.should_request(path, frame) && fetcher.request(path) {
                            tracing::trace!(path = %path.display(), level = lod.level, "texture requested");
                            in_flight.insert(path.to_path_buf(), exact.id, frame);
                            statistics.requested_textures += 1;
                        }
                    }
                }
                if let Some(binding) = TextureBinding::from_resolution(resolved) {
                    manager.note_usage(binding.id);
                    if binding.is_fallback() {
                        statistics.fallback_bindings += 1;
                    }
                    bindings[texture_type.index()] = Some(binding);
                }
            }

            let [day, night, height] = bindings;
            if options.texture_enabled && day.is_none() && !options.draw_untextured {
                statistics.pending_tiles += 1;
                continue;
            }
            statistics.drawn_tiles += 1;
            commands.push(TileDrawCommand {
                tile_index,
                level: lod.level,
                mesh: Arc::clone(resources.get(lod.resources).mesh()),
                tile_rect: rect,
                day,
                night,
                height,
            });
        }

        statistics.loaded_textures = manager.resident_count();
        statistics.in_flight_requests = in_flight.len();
        self.publish(&statistics);

        FramePlan {
            commands,
            statistics,
            wireframe: options.wireframe,
            light_direction,
        }
    }

    fn destroy(&mut self) {
        if let Some(mut loader) = self.loader.take() {
            loader.shutdown();
        }
        self.manager
            .release_all(self.container.textures_mut(), &mut self.backend);
        self.in_flight.clear();
        tracing::info!(frames = self.frame, "tile renderer destroyed");
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    use crossbeam_channel::{Receiver, Sender};
    use tessera_geo::{Ellipsoid, GridSize};
    use tessera_resources::{DecodeError, DecodedImage, TextureArena, TextureDescriptor};
    use tessera_tiling::{ContainerSources, TextureAtlas, UnitGridTesselator};

    use super::*;
    use crate::headless::HeadlessTextureBackend;
    use crate::light::{SUN_DISTANCE_RADII, SolarSimulator};

    const WINDOW: Resolution = Resolution {
        width: 800,
        height: 600,
    };

    /// Decodes any path once a token arrives on `gate`.
    struct GatedDecoder {
        gate: Receiver<()>,
    }

    impl ImageDecoder for GatedDecoder {
        fn decode(&self, path: &Path) -> Result<DecodedImage, DecodeError> {
            if self.gate.recv().is_err() {
                return Err(DecodeError::Empty {
                    path: path.to_path_buf(),
                });
            }
            Ok(DecodedImage {
                width: 2,
                height: 2,
                channels: 4,
                pixels: vec![255; 16],
            })
        }
    }

    fn grid_level(x_tiles: u32, y_tiles: u32) -> Vec<TextureDescriptor> {
        let grid = GridSize::new(x_tiles, y_tiles);
        let mut level = Vec::new();
        for x in 0..x_tiles {
            for y in 0..y_tiles {
                level.push(TextureDescriptor {
                    path: PathBuf::from(format!("day/{x_tiles}x{y_tiles}/{x}_{y}.png")),
                    texture_type: TextureType::Day,
                    resolution: Resolution::new(16, 16),
                    footprint: GeoRect::new(
                        -180.0 + f64::from(x) * grid.cell_longitude_width(),
                        90.0 - f64::from(y + 1) * grid.cell_latitude_width(),
                        grid.cell_longitude_width(),
                        grid.cell_latitude_width(),
                    ),
                    grid,
                });
            }
        }
        level
    }

    /// Unit sphere tiled 4×2 with a 2×1 coarse level.
    fn container() -> TileContainer {
        let mut textures = TextureArena::new();
        let day = TextureAtlas::from_entries(
            TextureType::Day,
            vec![grid_level(2, 1), grid_level(4, 2)],
            &mut textures,
        )
        .unwrap();
        let sources = ContainerSources {
            textures,
            day,
            night: None,
            height: None,
        };
        TileContainer::build(
            sources,
            &UnitGridTesselator,
            &Ellipsoid::unit_sphere(),
            &LodConfig::default(),
        )
        .unwrap()
    }

    /// Low enough that the 4×2 level wins from three radii away.
    fn lod() -> LodConfig {
        LodConfig {
            screen_space_error_threshold: 2.0,
            ..LodConfig::default()
        }
    }

    fn renderer(
        capacity: usize,
        retry_after_frames: u64,
    ) -> (TileEarthRenderer<HeadlessTextureBackend>, Sender<()>) {
        let (gate_tx, gate_rx) = crossbeam_channel::unbounded();
        let streaming = StreamingConfig {
            texture_cache_capacity: capacity,
            retry_after_frames,
        };
        let mut renderer = TileEarthRenderer::new(
            container(),
            Box::new(Ellipsoid::unit_sphere()),
            HeadlessTextureBackend::new(),
            Box::new(GatedDecoder { gate: gate_rx }),
            &lod(),
            &streaming,
        )
        .unwrap();
        renderer.initialize().unwrap();
        (renderer, gate_tx)
    }

    /// Close enough that every visible tile wants its finest level. Sees
    /// the four tiles of the +X hemisphere.
    fn close_camera() -> Camera {
        Camera::looking_at(DVec3::new(3.0, 0.0, 0.0), DVec3::ZERO)
    }

    fn render_until<F>(
        renderer: &mut TileEarthRenderer<HeadlessTextureBackend>,
        camera: &Camera,
        options: &RenderingOptions,
        done: F,
    ) -> FramePlan
    where
        F: Fn(&FramePlan) -> bool,
    {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let plan = renderer.render(camera, WINDOW, options);
            if done(&plan) || Instant::now() > deadline {
                return plan;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    fn assert_counts_add_up(stats: &RenderingStatistics) {
        assert_eq!(
            stats.num_tiles,
            stats.frustum_culled_tiles + stats.backface_culled_tiles + stats.pending_tiles
                + stats.drawn_tiles
        );
    }

    /// A tile whose texture is not ready asks for it once, and keeps not
    /// asking until the loader answers.
    #[test]
    fn test_missing_texture_requested_once_until_loaded() {
        let (mut renderer, gate) = renderer(64, 1000);
        let camera = close_camera();
        let options = RenderingOptions::default();

        let first = renderer.render(&camera, WINDOW, &options);
        let requested = first.statistics.requested_textures;
        assert!(requested > 0);
        assert_eq!(first.statistics.in_flight_requests, requested);
        assert!(first.commands.is_empty());
        assert_counts_add_up(&first.statistics);

        for _ in 0..5 {
            let plan = renderer.render(&camera, WINDOW, &options);
            assert_eq!(plan.statistics.requested_textures, 0);
            assert_eq!(plan.statistics.in_flight_requests, requested);
        }

        for _ in 0..requested {
            gate.send(()).unwrap();
        }
        let plan = render_until(&mut renderer, &camera, &options, |p| {
            p.statistics.in_flight_requests == 0
        });
        assert_eq!(plan.statistics.in_flight_requests, 0);
        assert_eq!(plan.statistics.loaded_textures, requested);
        assert_eq!(renderer.backend().upload_count(), requested);
        assert_eq!(plan.statistics.drawn_tiles, plan.commands.len());
        assert!(plan.commands.iter().all(|c| matches!(
            c.day,
            Some(TextureBinding {
                source: BindingSource::Exact,
                ..
            })
        )));
        assert_counts_add_up(&plan.statistics);
        drop(gate);
        renderer.destroy();
    }

    /// Once the coarse level is resident, close-up tiles draw with it while
    /// their own texture streams in.
    #[test]
    fn test_coarser_fallback_is_reported() {
        let (mut renderer, gate) = renderer(64, 1000);
        let options = RenderingOptions::default();

        // Far away: every visible tile selects the coarse level.
        let far = Camera::looking_at(DVec3::new(100.0, 0.0, 0.0), DVec3::ZERO);
        let plan = renderer.render(&far, WINDOW, &options);
        assert!(plan.commands.is_empty());
        assert!(plan.statistics.requested_textures > 0);
        let coarse = plan.statistics.requested_textures;
        for _ in 0..coarse {
            gate.send(()).unwrap();
        }
        let plan = render_until(&mut renderer, &far, &options, |p| {
            p.statistics.loaded_textures == coarse
        });
        assert!(plan.commands.iter().all(|c| c.level == 0));
        assert!(!plan.commands.is_empty());

        let close = renderer.render(&close_camera(), WINDOW, &options);
        assert!(!close.commands.is_empty());
        assert!(close.statistics.requested_textures > 0);
        for command in &close.commands {
            assert_eq!(command.level, 1);
            let day = command.day.unwrap();
            assert_eq!(day.source, BindingSource::Coarser);
            assert!(day.footprint.contains(&command.tile_rect));
        }
        assert_eq!(close.statistics.fallback_bindings, close.commands.len());
        assert_counts_add_up(&close.statistics);
        drop(gate);
        renderer.destroy();
    }

    #[test]
    fn test_untextured_tiles_drawn_on_request() {
        let (mut renderer, gate) = renderer(64, 1000);
        let options = RenderingOptions {
            draw_untextured: true,
            ..RenderingOptions::default()
        };
        let plan = renderer.render(&close_camera(), WINDOW, &options);
        assert_eq!(plan.statistics.drawn_tiles, 4);
        assert_eq!(plan.statistics.pending_tiles, 0);
        assert!(plan.commands.iter().all(|c| c.day.is_none()));
        drop(gate);
        renderer.destroy();
    }

    #[test]
    fn test_disabled_textures_issue_no_requests() {
        let (mut renderer, gate) = renderer(64, 1000);
        let options = RenderingOptions {
            texture_enabled: false,
            ..RenderingOptions::default()
        };
        let plan = renderer.render(&close_camera(), WINDOW, &options);
        assert_eq!(plan.statistics.requested_textures, 0);
        assert_eq!(plan.statistics.drawn_tiles, 4);
        drop(gate);
        renderer.destroy();
    }

    /// Requests nobody answered are re-issued after the backoff.
    #[test]
    fn test_unanswered_request_retried_after_backoff() {
        let (mut renderer, gate) = renderer(64, 3);
        let camera = close_camera();
        let options = RenderingOptions::default();

        let requested = renderer
            .render(&camera, WINDOW, &options)
            .statistics
            .requested_textures;
        assert!(requested > 0);
        assert_eq!(renderer.render(&camera, WINDOW, &options).statistics.requested_textures, 0);
        assert_eq!(renderer.render(&camera, WINDOW, &options).statistics.requested_textures, 0);
        let retry = renderer.render(&camera, WINDOW, &options);
        assert_eq!(retry.statistics.requested_textures, requested);
        assert_eq!(retry.statistics.in_flight_requests, requested);
        drop(gate);
        renderer.destroy();
    }

    #[test]
    fn test_culling_counts() {
        let (mut renderer, gate) = renderer(64, 1000);
        let plan = renderer.render(&close_camera(), WINDOW, &RenderingOptions::default());
        let stats = plan.statistics;
        assert_eq!(stats.num_tiles, 8);
        // The -X hemisphere is inside the frustum but faces away.
        assert_eq!(stats.frustum_culled_tiles, 0);
        assert_eq!(stats.backface_culled_tiles, 4);
        assert_eq!(stats.pending_tiles, 4);
        assert_counts_add_up(&stats);
        assert_eq!(stats.camera_position, DVec3::new(3.0, 0.0, 0.0));
        drop(gate);
        renderer.destroy();
    }

    /// The light direction follows the light source from frame to frame.
    #[test]
    fn test_frame_carries_light_direction() {
        let (mut renderer, gate) = renderer(64, 1000);
        let camera = close_camera();
        let options = RenderingOptions::default();
        assert_eq!(renderer.render(&camera, WINDOW, &options).light_direction, None);

        let simulation = tessera_config::SimulationConfig {
            time_scale: 3600.0,
            start_day: 171.5,
        };
        renderer.set_light_source(Box::new(SolarSimulator::new(SUN_DISTANCE_RADII, &simulation)));
        let noon = renderer.render(&camera, WINDOW, &options).light_direction.unwrap();
        assert!(noon.x > 0.9 && noon.y.abs() < 1e-9);

        renderer.advance_light(6.0);
        let evening = renderer.render(&camera, WINDOW, &options).light_direction.unwrap();
        assert!(evening.y < -0.9);
        assert!((evening.length() - 1.0).abs() < 1e-9);
        drop(gate);
        renderer.destroy();
    }

    struct Collect(Arc<Mutex<Vec<RenderingStatistics>>>);

    impl RendererSubscriber for Collect {
        fn notify(&mut self, statistics: &RenderingStatistics) {
            self.0.lock().unwrap().push(*statistics);
        }
    }

    #[test]
    fn test_subscribers_receive_every_frame() {
        let (mut renderer, gate) = renderer(64, 1000);
        let seen = Arc::new(Mutex::new(Vec::new()));
        renderer.subscribe(Box::new(Collect(Arc::clone(&seen))));
        let camera = close_camera();
        let last = (0..3)
            .map(|_| renderer.render(&camera, WINDOW, &RenderingOptions::default()))
            .last()
            .unwrap();
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen.iter().map(|s| s.frame).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(seen[2], last.statistics);
        drop(seen);
        drop(gate);
        renderer.destroy();
    }

    #[test]
    fn test_destroy_releases_everything() {
        let (mut renderer, gate) = renderer(64, 1000);
        let camera = close_camera();
        let options = RenderingOptions::default();
        let requested = renderer.render(&camera, WINDOW, &options).statistics.requested_textures;
        for _ in 0..requested {
            gate.send(()).unwrap();
        }
        render_until(&mut renderer, &camera, &options, |p| {
            p.statistics.loaded_textures == requested
        });
        assert!(renderer.is_loader_running());

        drop(gate);
        renderer.destroy();
        assert!(!renderer.is_loader_running());
        assert_eq!(renderer.manager().resident_count(), 0);
        assert_eq!(renderer.backend().resident_count(), 0);
        assert!(renderer.in_flight().is_empty());
        assert!(
            renderer
                .container()
                .textures()
                .iter()
                .all(|(_, t)| !t.is_resident())
        );
    }

    /// A small cache still never holds more than its capacity.
    #[test]
    fn test_cache_capacity_respected() {
        let (mut renderer, gate) = renderer(2, 1000);
        let camera = close_camera();
        let options = RenderingOptions::default();
        let requested = renderer.render(&camera, WINDOW, &options).statistics.requested_textures;
        assert!(requested > 2);
        for _ in 0..requested {
            gate.send(()).unwrap();
        }
        // Evicted textures are requested again; only the first round is fed.
        let deadline = Instant::now() + Duration::from_secs(5);
        while renderer.backend().upload_count() < requested && Instant::now() < deadline {
            let plan = renderer.render(&camera, WINDOW, &options);
            assert!(plan.statistics.loaded_textures <= 2);
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(renderer.backend().upload_count(), requested);
        assert_eq!(renderer.backend().resident_count(), 2);
        assert_eq!(renderer.manager().resident_count(), 2);
        drop(gate);
        renderer.destroy();
    }
}
