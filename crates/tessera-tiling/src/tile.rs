//! One cell of the geographic grid and its LOD selection.

use glam::DVec3;
use tessera_geo::{GeoRect, GeodeticSurface};
use tessera_resources::TextureArena;

use crate::error::TilingError;
use crate::frustum::Frustum;
use crate::tile_resources::{ResourceArena, ResourceId};

/// One level of detail of a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LodEntry {
    /// Atlas level this entry was built from.
    pub level: usize,
    pub resources: ResourceId,
    /// Drives the geometric error of the level.
    pub triangle_count: usize,
}

/// A fixed longitude/latitude window with its LOD chain and cached
/// geocentric placement.
#[derive(Clone, Debug)]
pub struct Tile {
    rect: GeoRect,
    lods: Vec<LodEntry>,
    corners: [DVec3; 4],
    center: DVec3,
    normal: DVec3,
    width: f64,
}

impl Tile {
    pub fn new(rect: GeoRect) -> Self {
        Self {
            rect,
            lods: Vec::new(),
            corners: [DVec3::ZERO; 4],
            center: DVec3::ZERO,
            normal: DVec3::Z,
            width: 0.0,
        }
    }

    pub fn rect(&self) -> &GeoRect {
        &self.rect
    }

    pub fn lods(&self) -> &[LodEntry] {
        &self.lods
    }

    pub fn num_levels(&self) -> usize {
        self.lods.len()
    }

    /// Geocentric corners in [`GeoRect::corners`] order.
    pub fn corners(&self) -> &[DVec3; 4] {
        &self.corners
    }

    pub fn center(&self) -> DVec3 {
        self.center
    }

    pub fn normal(&self) -> DVec3 {
        self.normal
    }

    /// Longer of the two geocentric east-west edge chords. Tiles touching a
    /// pole have one degenerate edge.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Recompute the cached corners, center, normal and width.
    pub fn update_geocentric_position(&mut self, surface: &dyn GeodeticSurface) {
        let to_geocentric = |(lon, lat): (f64, f64)| {
            surface.geodetic_to_geocentric(lon.to_radians(), lat.to_radians(), 0.0)
        };
        self.corners = self.rect.corners().map(to_geocentric);
        let (lon, lat) = self.rect.center();
        self.center = to_geocentric((lon, lat));
        self.normal = surface.surface_normal(lon.to_radians(), lat.to_radians());
        let [sw, se, ne, nw] = self.corners;
        self.width = sw.distance(se).max(nw.distance(ne));
    }

    /// Append the next finer level.
    ///
    /// Every texture the resources reference must cover this tile. The new
    /// entry is linked below the previous one in `arena`.
    ///
    /// # Panics
    ///
    /// Panics if `level` is not greater than the last added level, or if its
    /// mesh does not have more triangles than the last level's.
    pub fn add_resources(
        &mut self,
        level: usize,
        id: ResourceId,
        arena: &mut ResourceArena,
        textures: &TextureArena,
    ) -> Result<(), TilingError> {
        if let Some(last) = self.lods.last() {
            assert!(
                level > last.level,
                "levels must be added coarse to fine: {level} after {}",
                last.level
            );
        }
        let resources = arena.get(id);
        for (_, texture) in resources.textures() {
            if !texture.footprint.contains(&self.rect) {
                return Err(TilingError::TileOutsideTexture {
                    tile: self.rect,
                    texture: textures.get(texture.id).path().to_path_buf(),
                });
            }
        }
        let triangle_count = resources.mesh().triangle_count();

        if let Some(last) = self.lods.last() {
            assert!(
                triangle_count > last.triangle_count,
                "level {level} needs more triangles than level {}: {triangle_count} <= {}",
                last.level,
                last.triangle_count
            );
            arena.link(last.resources, id);
        }
        self.lods.push(LodEntry {
            level,
            resources: id,
            triangle_count,
        });
        Ok(())
    }

    /// Screen-space error in pixels of the LOD at `index`.
    pub fn screen_space_error(
        &self,
        index: usize,
        screen_width: f64,
        distance: f64,
        fov: f64,
    ) -> f64 {
        let view_frustum_width = 2.0 * distance.max(f64::EPSILON) * (fov / 2.0).tan();
        let geometric_error = self.width / self.lods[index].triangle_count.max(1) as f64;
        screen_width * geometric_error / view_frustum_width
    }

    /// Index into [`lods`](Self::lods) of the coarsest level whose
    /// screen-space error stays below `threshold`.
    ///
    /// Scans finest to coarsest and stops at the first level over the
    /// threshold. If even the finest level is over, the finest is returned.
    ///
    /// # Panics
    ///
    /// Panics if the tile has no levels.
    pub fn select_lod(&self, screen_width: f64, distance: f64, fov: f64, threshold: f64) -> usize {
        assert!(!self.lods.is_empty(), "tile {} has no levels of detail", self.rect);
        let finest = self.lods.len() - 1;
        let mut selected = finest;
        for index in (0..=finest).rev() {
            if self.screen_space_error(index, screen_width, distance, fov) < threshold {
                selected = index;
            } else {
                break;
            }
        }
        selected.min(finest)
    }

    /// Resources of the level [`select_lod`](Self::select_lod) picks.
    pub fn get_resources(
        &self,
        screen_width: f64,
        distance: f64,
        fov: f64,
        threshold: f64,
    ) -> LodEntry {
        self.lods[self.select_lod(screen_width, distance, fov, threshold)]
    }

    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn get_resources_by_level(&self, index: usize) -> LodEntry {
        assert!(
            index < self.lods.len(),
            "level {index} out of range for tile with {} levels",
            self.lods.len()
        );
        self.lods[index]
    }

    /// Conservative frustum test on the four geocentric corners.
    ///
    /// Visible if any corner is inside. When all four are outside the tile is
    /// culled if one plane has every corner behind it, otherwise it stays
    /// visible if one of its edges crosses a plane (large tiles straddling
    /// the view).
    pub fn is_in_view_frustum(&self, frustum: &Frustum) -> bool {
        let outside = self
            .corners
            .iter()
            .filter(|&&c| frustum.is_point_outside(c))
            .count();
        if outside < 4 {
            return true;
        }
        // Side planes cross behind the eye, so an edge there can change sign
        // against one of them without coming near the view.
        if frustum.separates(&self.corners) {
            return false;
        }
        (0..4).any(|i| frustum.intersects_edge(self.corners[i], self.corners[(i + 1) % 4]))
    }

    pub fn is_facing_camera(&self, camera_position: DVec3) -> bool {
        self.normal.dot(camera_position - self.center) > 0.0
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use glam::DMat4;
    use tessera_geo::{Ellipsoid, GridSize, Resolution};
    use tessera_resources::{TextureDescriptor, TextureType};

    use super::*;
    use crate::tesselator::TileMesh;
    use crate::tile_resources::{TextureRef, TileResources};

    fn mesh_with_triangles(triangles: usize) -> Arc<TileMesh> {
        Arc::new(TileMesh {
            resolution: Resolution::new(2, 2),
            positions: vec![glam::Vec3::ZERO; triangles * 3],
        })
    }

    /// A tile on the unit sphere with levels of 2, 8, 32 and 128 triangles.
    fn tile_with_levels(rect: GeoRect) -> (Tile, ResourceArena) {
        let mut tile = Tile::new(rect);
        tile.update_geocentric_position(&Ellipsoid::unit_sphere());
        let mut arena = ResourceArena::new();
        let textures = TextureArena::new();
        for (level, triangles) in [2, 8, 32, 128].into_iter().enumerate() {
            let id = arena.insert(TileResources::new(mesh_with_triangles(triangles)));
            tile.add_resources(level, id, &mut arena, &textures).unwrap();
        }
        (tile, arena)
    }

    fn fov() -> f64 {
        45f64.to_radians()
    }

    #[test]
    fn test_geocentric_position_on_unit_sphere() {
        let mut tile = Tile::new(GeoRect::new(-5.0, -5.0, 10.0, 10.0));
        tile.update_geocentric_position(&Ellipsoid::unit_sphere());
        assert!((tile.center() - DVec3::X).length() < 1e-12);
        assert!((tile.normal() - DVec3::X).length() < 1e-12);
        for corner in tile.corners() {
            assert!((corner.length() - 1.0).abs() < 1e-12);
        }
        assert!(tile.width() > 0.17 && tile.width() < 0.18);
    }

    #[test]
    fn test_polar_tile_has_width() {
        let mut tile = Tile::new(GeoRect::new(0.0, -90.0, 90.0, 90.0));
        tile.update_geocentric_position(&Ellipsoid::unit_sphere());
        assert!((tile.width() - 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_add_resources_links_levels() {
        let (tile, arena) = tile_with_levels(GeoRect::new(0.0, 0.0, 10.0, 10.0));
        let lods = tile.lods();
        assert_eq!(lods.len(), 4);
        assert_eq!(lods[3].triangle_count, 128);
        assert_eq!(arena.get(lods[1].resources).coarser(), Some(lods[0].resources));
        assert_eq!(arena.get(lods[1].resources).finer(), &[lods[2].resources]);
    }

    #[test]
    #[should_panic(expected = "coarse to fine")]
    fn test_out_of_order_level_panics() {
        let (mut tile, mut arena) = tile_with_levels(GeoRect::new(0.0, 0.0, 10.0, 10.0));
        let id = arena.insert(TileResources::new(mesh_with_triangles(2)));
        let _ = tile.add_resources(2, id, &mut arena, &TextureArena::new());
    }

    #[test]
    #[should_panic(expected = "more triangles")]
    fn test_level_without_more_triangles_panics() {
        let (mut tile, mut arena) = tile_with_levels(GeoRect::new(0.0, 0.0, 10.0, 10.0));
        let id = arena.insert(TileResources::new(mesh_with_triangles(128)));
        let _ = tile.add_resources(4, id, &mut arena, &TextureArena::new());
    }

    #[test]
    fn test_resources_outside_texture_rejected() {
        let rect = GeoRect::new(90.0, 0.0, 10.0, 10.0);
        let mut tile = Tile::new(rect);
        let mut arena = ResourceArena::new();
        let mut textures = TextureArena::new();
        let footprint = GeoRect::new(-180.0, 0.0, 180.0, 90.0);
        let texture = textures.intern(TextureDescriptor {
            path: PathBuf::from("day/west.png"),
            texture_type: TextureType::Day,
            resolution: Resolution::new(8, 8),
            footprint,
            grid: GridSize::new(2, 2),
        });
        let id = arena.insert(
            TileResources::new(mesh_with_triangles(2))
                .with_texture(TextureType::Day, TextureRef { id: texture, footprint }),
        );
        let err = tile.add_resources(0, id, &mut arena, &textures).unwrap_err();
        assert!(matches!(err, TilingError::TileOutsideTexture { .. }));
        assert!(tile.lods().is_empty());
    }

    #[test]
    fn test_single_level_always_selected() {
        let mut tile = Tile::new(GeoRect::new(0.0, 0.0, 10.0, 10.0));
        tile.update_geocentric_position(&Ellipsoid::unit_sphere());
        let mut arena = ResourceArena::new();
        let id = arena.insert(TileResources::new(mesh_with_triangles(2)));
        tile.add_resources(0, id, &mut arena, &TextureArena::new()).unwrap();
        for distance in [0.0, 0.01, 1.0, 1000.0] {
            assert_eq!(tile.select_lod(1280.0, distance, fov(), 10.0), 0);
        }
    }

    #[test]
    fn test_far_tiles_use_coarsest_level() {
        let (tile, _) = tile_with_levels(GeoRect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(tile.select_lod(1280.0, 1.0e6, fov(), 10.0), 0);
    }

    #[test]
    fn test_zero_distance_selects_finest() {
        let (tile, _) = tile_with_levels(GeoRect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(tile.select_lod(1280.0, 0.0, fov(), 10.0), 3);
        assert!(tile.screen_space_error(3, 1280.0, 0.0, fov()).is_finite());
    }

    /// Moving closer never selects a coarser level.
    #[test]
    fn test_lod_monotonic_in_distance() {
        let (tile, _) = tile_with_levels(GeoRect::new(0.0, 0.0, 10.0, 10.0));
        let mut previous = 0;
        let mut distance = 100.0;
        let mut seen = Vec::new();
        while distance > 1e-4 {
            let level = tile.select_lod(1280.0, distance, fov(), 10.0);
            assert!(level >= previous, "level {level} at {distance} after {previous}");
            previous = level;
            seen.push(level);
            distance *= 0.8;
        }
        seen.dedup();
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_get_resources_by_level() {
        let (tile, _) = tile_with_levels(GeoRect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(tile.get_resources_by_level(2).triangle_count, 32);
        let entry = tile.get_resources(1280.0, 1.0e6, fov(), 10.0);
        assert_eq!(entry, tile.get_resources_by_level(0));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_get_resources_by_level_out_of_range_panics() {
        let (tile, _) = tile_with_levels(GeoRect::new(0.0, 0.0, 10.0, 10.0));
        tile.get_resources_by_level(4);
    }

    #[test]
    #[should_panic(expected = "no levels of detail")]
    fn test_select_on_empty_tile_panics() {
        Tile::new(GeoRect::globe()).select_lod(1280.0, 1.0, fov(), 10.0);
    }

    fn camera_frustum(eye: DVec3) -> Frustum {
        let view = DMat4::look_at_rh(eye, DVec3::ZERO, DVec3::Z);
        let projection = DMat4::perspective_rh_gl(fov(), 16.0 / 9.0, 0.01, 100.0);
        Frustum::new(&view, &projection)
    }

    #[test]
    fn test_tile_in_front_of_camera_is_visible() {
        let mut tile = Tile::new(GeoRect::new(-5.0, -5.0, 10.0, 10.0));
        tile.update_geocentric_position(&Ellipsoid::unit_sphere());
        let eye = DVec3::new(3.0, 0.0, 0.0);
        assert!(tile.is_in_view_frustum(&camera_frustum(eye)));
        assert!(tile.is_facing_camera(eye));
    }

    #[test]
    fn test_tile_behind_globe_is_backfacing_and_culled() {
        let mut tile = Tile::new(GeoRect::new(175.0, -5.0, 10.0, 10.0));
        tile.update_geocentric_position(&Ellipsoid::unit_sphere());
        let eye = DVec3::new(3.0, 0.0, 0.0);
        assert!(!tile.is_facing_camera(eye));
        // Frustum says visible (the far side is inside the view volume);
        // only back-face culling removes it.
        assert!(tile.is_in_view_frustum(&camera_frustum(eye)));
    }

    #[test]
    fn test_tile_outside_one_plane_is_culled() {
        let mut tile = Tile::new(GeoRect::new(-5.0, -5.0, 10.0, 10.0));
        tile.update_geocentric_position(&Ellipsoid::unit_sphere());
        // Looking away from the tile: all corners behind the near plane.
        let view = DMat4::look_at_rh(DVec3::new(3.0, 0.0, 0.0), DVec3::new(6.0, 0.0, 0.0), DVec3::Z);
        let projection = DMat4::perspective_rh_gl(fov(), 1.0, 0.01, 100.0);
        let frustum = Frustum::new(&view, &projection);
        assert!(!tile.is_in_view_frustum(&frustum));
    }

    /// Looking away from the globe, every tile sits behind the near plane
    /// and must be culled even where its edges cross the side planes.
    #[test]
    fn test_tiles_behind_one_plane_are_culled() {
        let sphere = Ellipsoid::unit_sphere();
        let projection = DMat4::perspective_rh_gl(60f64.to_radians(), 1.0, 0.01, 100.0);
        let mut separated = 0;
        for eye_x in [1.0, 1.5, 2.0, 3.0] {
            let eye = DVec3::new(eye_x, 0.0, 0.0);
            let view = DMat4::look_at_rh(eye, eye + DVec3::X, DVec3::Z);
            let frustum = Frustum::new(&view, &projection);
            for lon in (-180..180).step_by(30) {
                for lat in (-90..90).step_by(20) {
                    let rect = GeoRect::new(f64::from(lon), f64::from(lat), 30.0, 20.0);
                    let mut tile = Tile::new(rect);
                    tile.update_geocentric_position(&sphere);
                    let behind_one_plane = frustum.planes().iter().any(|plane| {
                        tile.corners()
                            .iter()
                            .all(|c| plane.dot(c.extend(1.0)) < 0.0)
                    });
                    if behind_one_plane {
                        separated += 1;
                        assert!(!tile.is_in_view_frustum(&frustum), "{rect} seen from {eye}");
                    }
                }
            }
        }
        assert_eq!(separated, 4 * 12 * 9);
    }

    /// A tile much larger than the view whose corners all sit outside still
    /// counts as visible when its edges cross the frustum.
    #[test]
    fn test_large_tile_with_crossing_edge_is_visible() {
        let mut tile = Tile::new(GeoRect::new(-60.0, -10.0, 120.0, 20.0));
        tile.update_geocentric_position(&Ellipsoid::unit_sphere());
        // Close to the surface with a narrow view: every corner falls outside.
        let eye = DVec3::new(1.2, 0.0, 0.0);
        let view = DMat4::look_at_rh(eye, DVec3::ZERO, DVec3::Z);
        let projection = DMat4::perspective_rh_gl(10f64.to_radians(), 1.0, 0.01, 100.0);
        let frustum = Frustum::new(&view, &projection);
        assert!(tile.corners().iter().all(|&c| frustum.is_point_outside(c)));
        assert!(tile.is_in_view_frustum(&frustum));
    }
}
