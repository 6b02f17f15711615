//! Pre-tiled image pyramids on disk.
//!
//! An atlas directory holds one subdirectory per level of detail. Each level
//! is a grid of images named
//! `{name}_{x}_{y}_{x_tiles}_{y_tiles}_{width}_{height}.{ext}`, where
//! `width × height` is the source image size before splitting. `x` counts
//! eastward from -180°, `y` counts southward from the north pole.

use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use tessera_geo::{GeoRect, GridSize, Resolution};
use tessera_resources::{TextureArena, TextureDescriptor, TextureId, TextureType};

use crate::error::AtlasError;

/// One image of one level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AtlasEntry {
    pub texture: TextureId,
    pub footprint: GeoRect,
    pub x_index: u32,
    pub y_index: u32,
}

#[derive(Debug)]
struct AtlasLevel {
    grid: GridSize,
    entries: Vec<AtlasEntry>,
    by_index: FxHashMap<(u32, u32), usize>,
}

/// Maps `(level, tile rect)` to the texture covering it. Level 0 is the
/// coarsest.
#[derive(Debug)]
pub struct TextureAtlas {
    texture_type: TextureType,
    levels: Vec<AtlasLevel>,
}

/// Fields encoded in an atlas file name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct TileName {
    x_index: u32,
    y_index: u32,
    grid: GridSize,
    source: Resolution,
}

impl TileName {
    fn parse(file_name: &str) -> Option<Self> {
        let stem = Path::new(file_name).file_stem()?.to_str()?;
        let tokens: Vec<&str> = stem.rsplitn(7, '_').collect();
        if tokens.len() != 7 || tokens[6].is_empty() {
            return None;
        }
        let number = |i: usize| tokens[i].parse::<u32>().ok();
        let name = TileName {
            x_index: number(5)?,
            y_index: number(4)?,
            grid: GridSize::new(number(3)?, number(2)?),
            source: Resolution::new(number(1)?, number(0)?),
        };
        let valid = name.grid.x_tiles > 0
            && name.grid.y_tiles > 0
            && name.x_index < name.grid.x_tiles
            && name.y_index < name.grid.y_tiles;
        valid.then_some(name)
    }

    fn footprint(&self) -> GeoRect {
        let lon_width = self.grid.cell_longitude_width();
        let lat_width = self.grid.cell_latitude_width();
        GeoRect::new(
            -180.0 + f64::from(self.x_index) * lon_width,
            90.0 - f64::from(self.y_index + 1) * lat_width,
            lon_width,
            lat_width,
        )
    }

    /// Size of one split image as implied by the file name.
    fn tile_resolution(&self) -> Resolution {
        Resolution::new(
            self.source.width / self.grid.x_tiles,
            self.source.height / self.grid.y_tiles,
        )
    }
}

impl TextureAtlas {
    /// Scan `path` for level subdirectories and register every tile image
    /// in `arena`.
    pub fn from_directory(
        path: &Path,
        texture_type: TextureType,
        arena: &mut TextureArena,
    ) -> Result<Self, AtlasError> {
        let mut level_dirs = list_dir(path)?
            .into_iter()
            .filter(|p| p.is_dir())
            .collect::<Vec<_>>();
        level_dirs.sort();

        let mut levels = Vec::new();
        let mut sources: Vec<PathBuf> = Vec::new();
        for dir in level_dirs {
            let descriptors = scan_level(&dir, texture_type)?;
            if descriptors.is_empty() {
                tracing::warn!(dir = %dir.display(), "atlas level has no valid tiles, skipping");
                continue;
            }
            levels.push(descriptors);
            sources.push(dir);
        }
        if levels.is_empty() {
            return Err(AtlasError::Empty {
                path: path.to_path_buf(),
            });
        }

        let atlas = Self::build(texture_type, levels, sources, arena)?;
        tracing::info!(
            path = %path.display(),
            levels = atlas.num_levels(),
            textures = atlas.levels.iter().map(|l| l.entries.len()).sum::<usize>(),
            "atlas registered"
        );
        Ok(atlas)
    }

    /// Build an atlas from descriptors already in memory, one `Vec` per level
    /// in any order. Every descriptor of a level must share the same grid.
    pub fn from_entries(
        texture_type: TextureType,
        levels: Vec<Vec<TextureDescriptor>>,
        arena: &mut TextureArena,
    ) -> Result<Self, AtlasError> {
        if levels.iter().all(Vec::is_empty) {
            return Err(AtlasError::Empty {
                path: PathBuf::new(),
            });
        }
        let levels: Vec<_> = levels.into_iter().filter(|l| !l.is_empty()).collect();
        let sources = levels
            .iter()
            .map(|l| l[0].path.parent().map(Path::to_path_buf).unwrap_or_default())
            .collect();
        Self::build(texture_type, levels, sources, arena)
    }

    fn build(
        texture_type: TextureType,
        levels: Vec<Vec<TextureDescriptor>>,
        sources: Vec<PathBuf>,
        arena: &mut TextureArena,
    ) -> Result<Self, AtlasError> {
        let mut ordered: Vec<(GridSize, Vec<TextureDescriptor>, PathBuf)> = levels
            .into_iter()
            .zip(sources)
            .map(|(descriptors, source)| (descriptors[0].grid, descriptors, source))
            .collect();
        ordered.sort_by_key(|(grid, _, _)| (grid.tile_count(), *grid));

        for pair in ordered.windows(2) {
            if pair[0].0 == pair[1].0 {
                return Err(AtlasError::DuplicateLevel {
                    grid: pair[0].0,
                    first: pair[0].2.clone(),
                    second: pair[1].2.clone(),
                });
            }
        }

        let levels = ordered
            .into_iter()
            .map(|(grid, descriptors, _)| {
                let mut level = AtlasLevel {
                    grid,
                    entries: Vec::with_capacity(descriptors.len()),
                    by_index: FxHashMap::default(),
                };
                for descriptor in descriptors {
                    let footprint = descriptor.footprint;
                    let x_index = ((footprint.longitude + 180.0) / grid.cell_longitude_width())
                        .round() as u32;
                    let y_index = ((90.0 - footprint.north()) / grid.cell_latitude_width())
                        .round() as u32;
                    let texture = arena.intern(TextureDescriptor {
                        texture_type,
                        ..descriptor
                    });
                    level.by_index.insert((x_index, y_index), level.entries.len());
                    level.entries.push(AtlasEntry {
                        texture,
                        footprint,
                        x_index,
                        y_index,
                    });
                }
                level
            })
            .collect();

        Ok(Self {
            texture_type,
            levels,
        })
    }

    pub fn texture_type(&self) -> TextureType {
        self.texture_type
    }

    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    /// # Panics
    ///
    /// Panics if `level` is out of range.
    pub fn level_dimensions(&self, level: usize) -> GridSize {
        assert!(
            level < self.levels.len(),
            "atlas level {level} out of range ({} levels)",
            self.levels.len()
        );
        self.levels[level].grid
    }

    pub fn most_detailed_level_dimensions(&self) -> GridSize {
        self.level_dimensions(self.levels.len() - 1)
    }

    pub fn entries(&self, level: usize) -> &[AtlasEntry] {
        self.levels
            .get(level)
            .map(|l| l.entries.as_slice())
            .unwrap_or_default()
    }

    /// Texture of `level` whose footprint contains `tile`.
    pub fn get_texture(&self, level: usize, tile: &GeoRect) -> Result<TextureId, AtlasError> {
        let not_found = || AtlasError::NoTexture { level, tile: *tile };
        let level_data = self.levels.get(level).ok_or_else(not_found)?;
        let grid = level_data.grid;

        let (lon, lat) = tile.center();
        let x_index = ((lon + 180.0) / grid.cell_longitude_width()).floor();
        let y_index = ((90.0 - lat) / grid.cell_latitude_width()).floor();
        if x_index < 0.0 || y_index < 0.0 {
            return Err(not_found());
        }
        let entry = level_data
            .by_index
            .get(&(x_index as u32, y_index as u32))
            .map(|&i| level_data.entries[i])
            .ok_or_else(not_found)?;
        if entry.footprint.contains(tile) {
            Ok(entry.texture)
        } else {
            Err(not_found())
        }
    }
}

fn list_dir(path: &Path) -> Result<Vec<PathBuf>, AtlasError> {
    let io_err = |source| AtlasError::Io {
        path: path.to_path_buf(),
        source,
    };
    std::fs::read_dir(path)
        .map_err(io_err)?
        .map(|entry| entry.map(|e| e.path()).map_err(io_err))
        .collect()
}

/// Parse every tile image of one level directory. Files that do not match
/// the naming scheme, or disagree with the level's grid, are skipped.
fn scan_level(dir: &Path, texture_type: TextureType) -> Result<Vec<TextureDescriptor>, AtlasError> {
    let mut files = list_dir(dir)?;
    files.sort();

    let mut grid = None;
    let mut descriptors = Vec::new();
    for file in files {
        if !file.is_file() {
            continue;
        }
        let Some(name) = file
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(TileName::parse)
        else {
            tracing::warn!(file = %file.display(), "not an atlas tile name, skipping");
            continue;
        };
        match grid {
            None => grid = Some(name.grid),
            Some(g) if g != name.grid => {
                tracing::warn!(
                    file = %file.display(),
                    expected = ?g,
                    found = ?name.grid,
                    "tile grid differs from the rest of its level, skipping"
                );
                continue;
            }
            Some(_) => {}
        }

        let resolution = match image::image_dimensions(&file) {
            Ok((width, height)) => Resolution::new(width, height),
            Err(err) => {
                tracing::debug!(
                    file = %file.display(),
                    "cannot read image header ({err}), using size from file name"
                );
                name.tile_resolution()
            }
        };
        descriptors.push(TextureDescriptor {
            path: file,
            texture_type,
            resolution,
            footprint: name.footprint(),
            grid: name.grid,
        });
    }
    Ok(descriptors)
}
