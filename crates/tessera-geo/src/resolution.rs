//! Pixel/vertex extents and atlas grid sizes.

use std::fmt;

/// Width and height in pixels (textures) or vertices (meshes).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of texels / vertices covered.
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Clamp both axes into `[min, max]`.
    pub fn clamped(&self, min: u32, max: u32) -> Self {
        Self {
            width: self.width.clamp(min, max),
            height: self.height.clamp(min, max),
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Number of atlas tiles along longitude (`x_tiles`) and latitude (`y_tiles`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridSize {
    pub x_tiles: u32,
    pub y_tiles: u32,
}

impl GridSize {
    pub const fn new(x_tiles: u32, y_tiles: u32) -> Self {
        Self { x_tiles, y_tiles }
    }

    /// Total number of tiles in the grid.
    pub fn tile_count(&self) -> u64 {
        u64::from(self.x_tiles) * u64::from(self.y_tiles)
    }

    /// Longitude span of one grid cell in degrees.
    pub fn cell_longitude_width(&self) -> f64 {
        360.0 / f64::from(self.x_tiles)
    }

    /// Latitude span of one grid cell in degrees.
    pub fn cell_latitude_width(&self) -> f64 {
        180.0 / f64::from(self.y_tiles)
    }
}
