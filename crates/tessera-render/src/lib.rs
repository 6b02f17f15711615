//! Per-frame tile selection and texture streaming for the globe.
//!
//! [`TileEarthRenderer`] turns a camera and a [`tessera_tiling::TileContainer`]
//! into a [`FramePlan`]: the tiles to draw, the LOD of each and the best
//! resident texture for every enabled layer. Missing textures are requested
//! from the background loader and never waited on.
//!
//! Uploading is behind [`tessera_resources::TextureBackend`]; this crate ships
//! a recording [`HeadlessTextureBackend`] and the wgpu-backed
//! [`WgpuTextureBackend`].

pub mod camera;
pub mod gpu;
pub mod headless;
pub mod in_flight;
pub mod light;
pub mod options;
pub mod renderer;
pub mod stats;
pub mod uniforms;

pub use camera::Camera;
pub use gpu::{GpuTexture, TextureError, WgpuTextureBackend, request_device};
pub use headless::HeadlessTextureBackend;
pub use in_flight::{InFlight, InFlightRequests};
pub use light::{LightSource, SUN_DISTANCE_RADII, SolarSimulator};
pub use options::RenderingOptions;
pub use renderer::{
    BindingSource, FramePlan, Renderer, TextureBinding, TileDrawCommand, TileEarthRenderer,
};
pub use stats::{LoggingSubscriber, RendererSubscriber, RenderingStatistics};
pub use uniforms::{CameraUniform, TileUniform, TileVertex, texture_window};
