//! Error types for atlas loading and tile construction.

use std::path::PathBuf;

use tessera_geo::{GeoRect, GridSize};
use tessera_resources::TextureType;

/// Errors raised while reading or querying a texture atlas.
#[derive(Debug, thiserror::Error)]
pub enum AtlasError {
    /// The atlas directory or one of its level directories could not be listed.
    #[error("failed to read atlas directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Two level directories split the source image the same way.
    #[error("atlas levels {first} and {second} both use a {grid:?} grid")]
    DuplicateLevel {
        grid: GridSize,
        first: PathBuf,
        second: PathBuf,
    },

    /// No level directory contained a single valid tile image.
    #[error("atlas {path} contains no usable level")]
    Empty { path: PathBuf },

    /// No image of the level covers the requested rect.
    #[error("no texture at level {level} contains {tile}")]
    NoTexture { level: usize, tile: GeoRect },
}

/// Errors raised while building the tile grid.
#[derive(Debug, thiserror::Error)]
pub enum TilingError {
    #[error(transparent)]
    Atlas(#[from] AtlasError),

    /// A tile would end up with no level of detail to select from.
    #[error("tile {tile} has no levels of detail")]
    EmptyTile { tile: GeoRect },

    /// A resource references a texture that does not cover the tile.
    #[error("tile {tile} lies outside texture {texture}")]
    TileOutsideTexture { tile: GeoRect, texture: PathBuf },

    /// An optional atlas does not line up with the day atlas.
    #[error("{texture_type:?} atlas has {found} levels, day atlas has {expected}")]
    LevelMismatch {
        texture_type: TextureType,
        expected: usize,
        found: usize,
    },
}
