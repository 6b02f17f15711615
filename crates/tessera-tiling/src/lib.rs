//! The geographic tile grid and its level-of-detail hierarchy.
//!
//! A [`TileContainer`] divides the globe into a uniform grid of [`Tile`]s.
//! Every tile owns one [`TileResources`] entry per LOD, built from one or
//! more [`TextureAtlas`]es and a [`MeshTesselator`]. Resources of the same
//! tile are linked coarse ↔ fine inside a [`ResourceArena`], which the
//! renderer walks to find a substitute when the exact texture is not
//! resident yet.

mod atlas;
mod container;
mod error;
mod frustum;
mod tesselator;
mod tile;
mod tile_resources;

pub use atlas::{AtlasEntry, TextureAtlas};
pub use container::{
    ContainerSources, TileContainer, determine_mesh_resolution, divide_globe_into_tiles,
    level_mesh_cap,
};
pub use error::{AtlasError, TilingError};
pub use frustum::Frustum;
pub use tesselator::{EllipsoidTileTesselator, MeshTesselator, TileMesh, UnitGridTesselator};
pub use tile::{LodEntry, Tile};
pub use tile_resources::{
    ResourceArena, ResourceId, TextureRef, TextureResolution, TileResources,
};
