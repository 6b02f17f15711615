//! The full tile grid and the per-tile LOD chains built from the atlases.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tessera_config::{GlobeConfig, LodConfig};
use tessera_geo::{GeoRect, GeodeticSurface, Resolution};
use tessera_resources::{TextureArena, TextureType};

use crate::atlas::TextureAtlas;
use crate::error::{AtlasError, TilingError};
use crate::tesselator::{MeshTesselator, TileMesh};
use crate::tile::Tile;
use crate::tile_resources::{ResourceArena, TextureRef, TileResources};

/// Atlases a container is built from, plus the arena their textures live in.
#[derive(Debug)]
pub struct ContainerSources {
    pub textures: TextureArena,
    pub day: TextureAtlas,
    pub night: Option<TextureAtlas>,
    pub height: Option<TextureAtlas>,
}

impl ContainerSources {
    /// Scan the atlas directories named in `globe`.
    pub fn load(globe: &GlobeConfig) -> Result<Self, AtlasError> {
        let mut textures = TextureArena::new();
        let day = TextureAtlas::from_directory(&globe.day_atlas_dir, TextureType::Day, &mut textures)?;
        let night = globe
            .night_atlas_dir
            .as_deref()
            .map(|dir| TextureAtlas::from_directory(dir, TextureType::Night, &mut textures))
            .transpose()?;
        let height = globe
            .height_atlas_dir
            .as_deref()
            .map(|dir| TextureAtlas::from_directory(dir, TextureType::HeightMap, &mut textures))
            .transpose()?;
        Ok(Self {
            textures,
            day,
            night,
            height,
        })
    }

    fn optional_atlases(&self) -> impl Iterator<Item = &TextureAtlas> {
        self.night.iter().chain(self.height.iter())
    }
}

/// Every tile of the globe with its LOD chain.
#[derive(Debug)]
pub struct TileContainer {
    tiles: Vec<Tile>,
    resources: ResourceArena,
    textures: TextureArena,
    num_levels: usize,
    unique_meshes: usize,
}

impl TileContainer {
    pub fn build(
        sources: ContainerSources,
        tesselator: &dyn MeshTesselator,
        surface: &dyn GeodeticSurface,
        lod: &LodConfig,
    ) -> Result<Self, TilingError> {
        let num_levels = sources.day.num_levels();
        for atlas in sources.optional_atlases() {
            if atlas.num_levels() != num_levels {
                return Err(TilingError::LevelMismatch {
                    texture_type: atlas.texture_type(),
                    expected: num_levels,
                    found: atlas.num_levels(),
                });
            }
        }

        let finest = sources.day.most_detailed_level_dimensions();
        let subdivision = lod.tile_subdivision.max(1);
        let tiles = divide_globe_into_tiles(finest.x_tiles * subdivision, finest.y_tiles * subdivision);

        let mut builder = Builder {
            sources: &sources,
            tesselator,
            surface,
            max_resolution: lod.max_mesh_resolution.max(2),
            resources: ResourceArena::new(),
            mesh_cache: FxHashMap::default(),
            unique_meshes: 0,
        };
        let mut built = Vec::with_capacity(tiles.len());
        for mut tile in tiles {
            builder.setup_tile(&mut tile, num_levels)?;
            tile.update_geocentric_position(surface);
            built.push(tile);
        }
        let Builder {
            resources,
            unique_meshes,
            ..
        } = builder;

        tracing::info!(
            tiles = built.len(),
            levels = num_levels,
            meshes = unique_meshes,
            textures = sources.textures.len(),
            "tile container built"
        );
        Ok(Self {
            tiles: built,
            resources,
            textures: sources.textures,
            num_levels,
            unique_meshes,
        })
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn tile(&self, index: usize) -> &Tile {
        &self.tiles[index]
    }

    pub fn resources(&self) -> &ResourceArena {
        &self.resources
    }

    pub fn textures(&self) -> &TextureArena {
        &self.textures
    }

    pub fn textures_mut(&mut self) -> &mut TextureArena {
        &mut self.textures
    }

    pub fn num_levels(&self) -> usize {
        self.num_levels
    }

    /// Distinct meshes generated; lower than `tiles × levels` when meshes
    /// are shared.
    pub fn unique_mesh_count(&self) -> usize {
        self.unique_meshes
    }

    /// Re-project every tile onto `surface`. Meshes are left as built.
    pub fn update_geocentric_positions(&mut self, surface: &dyn GeodeticSurface) {
        for tile in &mut self.tiles {
            tile.update_geocentric_position(surface);
        }
    }
}

/// Uniform grid over the globe, rows from south to north, west to east
/// within a row.
pub fn divide_globe_into_tiles(num_longitude: u32, num_latitude: u32) -> Vec<Tile> {
    let width = 360.0 / f64::from(num_longitude);
    let height = 180.0 / f64::from(num_latitude);
    (0..num_latitude)
        .flat_map(|lat| {
            (0..num_longitude).map(move |lon| {
                Tile::new(GeoRect::new(
                    -180.0 + f64::from(lon) * width,
                    -90.0 + f64::from(lat) * height,
                    width,
                    height,
                ))
            })
        })
        .collect()
}

/// Vertices per axis so that one vertex lands on roughly each texel of the
/// part of `texture_resolution` the tile covers.
pub fn determine_mesh_resolution(
    texture_resolution: Resolution,
    texture_footprint: &GeoRect,
    tile: &GeoRect,
    max_resolution: u32,
) -> Resolution {
    let (fx, fy) = texture_footprint.coverage_of(tile);
    Resolution::new(
        (f64::from(texture_resolution.width) * fx).round() as u32,
        (f64::from(texture_resolution.height) * fy).round() as u32,
    )
    .clamped(2, max_resolution.max(2))
}

/// Per-axis vertex cap of `level`: `max_resolution` at the finest level,
/// halved for every coarser one, never below 2.
pub fn level_mesh_cap(max_resolution: u32, level: usize, num_levels: usize) -> u32 {
    let halvings = num_levels.saturating_sub(level + 1).min(31) as u32;
    (max_resolution >> halvings).max(2)
}

/// Triangles a `resolution` grid is split into.
fn grid_triangles(resolution: Resolution) -> u64 {
    u64::from(resolution.width.saturating_sub(1))
        * u64::from(resolution.height.saturating_sub(1))
        * 2
}

/// `resolution`, grown by one vertex per axis past `coarser` when it would
/// not add triangles over it.
fn finer_than(resolution: Resolution, coarser: Resolution) -> Resolution {
    if grid_triangles(resolution) > grid_triangles(coarser) {
        return resolution;
    }
    Resolution::new(
        resolution.width.max(coarser.width) + 1,
        resolution.height.max(coarser.height) + 1,
    )
}

struct Builder<'a> {
    sources: &'a ContainerSources,
    tesselator: &'a dyn MeshTesselator,
    surface: &'a dyn GeodeticSurface,
    max_resolution: u32,
    resources: ResourceArena,
    mesh_cache: FxHashMap<Resolution, Arc<TileMesh>>,
    unique_meshes: usize,
}

impl<'a> Builder<'a> {
    fn setup_tile(&mut self, tile: &mut Tile, num_levels: usize) -> Result<(), TilingError> {
        if num_levels == 0 {
            return Err(TilingError::EmptyTile { tile: *tile.rect() });
        }
        let sources: &'a ContainerSources = self.sources;
        let textures = &sources.textures;
        let mut coarser: Option<Resolution> = None;
        for level in 0..num_levels {
            let rect = *tile.rect();
            let texture_ref = |atlas: &TextureAtlas| -> Result<TextureRef, AtlasError> {
                let id = atlas.get_texture(level, &rect)?;
                Ok(TextureRef {
                    id,
                    footprint: textures.get(id).footprint(),
                })
            };

            let day = texture_ref(&sources.day)?;
            let night = sources.night.as_ref().map(texture_ref).transpose()?;
            let height = sources.height.as_ref().map(texture_ref).transpose()?;

            let shape_source = height.unwrap_or(day);
            let mut resolution = determine_mesh_resolution(
                textures.get(shape_source.id).resolution(),
                &shape_source.footprint,
                &rect,
                level_mesh_cap(self.max_resolution, level, num_levels),
            );
            if let Some(coarser) = coarser {
                resolution = finer_than(resolution, coarser);
            }
            coarser = Some(resolution);
            let mesh = self.mesh(resolution, &rect);

            let mut resources = TileResources::new(mesh).with_texture(TextureType::Day, day);
            if let Some(night) = night {
                resources = resources.with_texture(TextureType::Night, night);
            }
            if let Some(height) = height {
                resources = resources.with_texture(TextureType::HeightMap, height);
            }
            let id = self.resources.insert(resources);
            tile.add_resources(level, id, &mut self.resources, textures)?;
        }
        Ok(())
    }

    fn mesh(&mut self, resolution: Resolution, rect: &GeoRect) -> Arc<TileMesh> {
        if !self.tesselator.is_position_independent() {
            self.unique_meshes += 1;
            return Arc::new(self.tesselator.generate(resolution, self.surface, rect));
        }
        let (tesselator, surface) = (self.tesselator, self.surface);
        let unique_meshes = &mut self.unique_meshes;
        Arc::clone(self.mesh_cache.entry(resolution).or_insert_with(|| {
            *unique_meshes += 1;
            Arc::new(tesselator.generate(resolution, surface, rect))
        }))
    }
}
