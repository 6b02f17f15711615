//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Tessera command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug)]
#[command(name = "tessera", about = "Tile-streaming globe viewer")]
pub struct CliArgs {
    /// Directory with the day imagery atlas.
    #[arg(long)]
    pub atlas_dir: Option<PathBuf>,

    /// Maximum number of GPU-resident textures.
    #[arg(long)]
    pub cache_capacity: Option<usize>,

    /// Framebuffer width.
    #[arg(long)]
    pub width: Option<u32>,

    /// Framebuffer height.
    #[arg(long)]
    pub height: Option<u32>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of frames the viewer renders before exiting.
    #[arg(long, default_value_t = 600)]
    pub frames: u32,

    /// Upload textures to a wgpu device instead of the headless backend.
    #[arg(long)]
    pub gpu: bool,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(ref dir) = args.atlas_dir {
            self.globe.day_atlas_dir = dir.clone();
        }
        if let Some(capacity) = args.cache_capacity {
            self.streaming.texture_cache_capacity = capacity;
        }
        if let Some(w) = args.width {
            self.window.width = w;
        }
        if let Some(h) = args.height {
            self.window.height = h;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
