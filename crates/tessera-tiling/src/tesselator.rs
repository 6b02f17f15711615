//! Triangle meshes for tiles.

use glam::Vec3;
use tessera_geo::{GeoRect, GeodeticSurface, Resolution};

/// Non-indexed triangle list; every three positions form one triangle.
#[derive(Clone, Debug, PartialEq)]
pub struct TileMesh {
    pub resolution: Resolution,
    pub positions: Vec<Vec3>,
}

impl TileMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.positions.len() / 3
    }
}

/// Produces the mesh for one tile at a given vertex resolution.
pub trait MeshTesselator {
    fn generate(
        &self,
        resolution: Resolution,
        surface: &dyn GeodeticSurface,
        tile: &GeoRect,
    ) -> TileMesh;

    /// `true` if [`generate`](Self::generate) ignores `surface` and `tile`,
    /// so one mesh per resolution can be shared by every tile.
    fn is_position_independent(&self) -> bool;
}

/// Two triangles per grid cell, counter-clockwise when seen from outside.
fn grid_triangles<F>(resolution: Resolution, vertex: F) -> Vec<Vec3>
where
    F: Fn(u32, u32) -> Vec3,
{
    let (w, h) = (resolution.width, resolution.height);
    if w < 2 || h < 2 {
        return Vec::new();
    }
    let mut positions = Vec::with_capacity(((w - 1) * (h - 1) * 6) as usize);
    for y in 0..h - 1 {
        for x in 0..w - 1 {
            let v00 = vertex(x, y);
            let v10 = vertex(x + 1, y);
            let v01 = vertex(x, y + 1);
            let v11 = vertex(x + 1, y + 1);
            positions.extend_from_slice(&[v00, v10, v01, v10, v11, v01]);
        }
    }
    positions
}

/// Emits a `(u, v, 0)` grid over the unit square.
///
/// The vertex shader maps `u` onto the tile's longitude span and `v` onto
/// its latitude span, then projects onto the ellipsoid.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnitGridTesselator;

impl MeshTesselator for UnitGridTesselator {
    fn generate(
        &self,
        resolution: Resolution,
        _surface: &dyn GeodeticSurface,
        _tile: &GeoRect,
    ) -> TileMesh {
        let du = 1.0 / (resolution.width.max(2) - 1) as f32;
        let dv = 1.0 / (resolution.height.max(2) - 1) as f32;
        TileMesh {
            resolution,
            positions: grid_triangles(resolution, |x, y| {
                Vec3::new(x as f32 * du, y as f32 * dv, 0.0)
            }),
        }
    }

    fn is_position_independent(&self) -> bool {
        true
    }
}

/// Projects the grid directly onto the surface in geocentric coordinates.
#[derive(Debug, Default, Clone, Copy)]
pub struct EllipsoidTileTesselator;

impl MeshTesselator for EllipsoidTileTesselator {
    fn generate(
        &self,
        resolution: Resolution,
        surface: &dyn GeodeticSurface,
        tile: &GeoRect,
    ) -> TileMesh {
        let lon_step = tile.longitude_width / f64::from(resolution.width.max(2) - 1);
        let lat_step = tile.latitude_width / f64::from(resolution.height.max(2) - 1);
        TileMesh {
            resolution,
            positions: grid_triangles(resolution, |x, y| {
                let longitude = (tile.longitude + f64::from(x) * lon_step).to_radians();
                let latitude = (tile.latitude + f64::from(y) * lat_step).to_radians();
                surface
                    .geodetic_to_geocentric(longitude, latitude, 0.0)
                    .as_vec3()
            }),
        }
    }

    fn is_position_independent(&self) -> bool {
        false
    }
}
