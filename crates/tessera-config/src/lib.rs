//! Configuration for the Tessera globe viewer.
//!
//! Settings persist to disk as `config.ron`, can be overridden from the
//! command line via clap, and are validated before they reach the tiling
//! and streaming layers.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    Config, DebugConfig, EllipsoidKind, GlobeConfig, LodConfig, RenderConfig, SimulationConfig,
    StreamingConfig, WindowConfig,
};
pub use error::ConfigError;
