//! Per-LOD tile resources and the coarser/finer fallback hierarchy.

use std::collections::VecDeque;
use std::sync::Arc;

use tessera_geo::GeoRect;
use tessera_resources::{TextureArena, TextureId, TextureType};

use crate::tesselator::TileMesh;

/// Stable index of a [`TileResources`] inside its [`ResourceArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub u32);

impl ResourceId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A texture as seen by one tile level: its id plus the geographic window
/// the image covers, needed to compute texture coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextureRef {
    pub id: TextureId,
    pub footprint: GeoRect,
}

/// Outcome of looking up a texture for a tile level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TextureResolution {
    /// The texture of the requested level is resident.
    Exact(TextureRef),
    /// A resident texture of a coarser level of the same tile.
    Coarser(TextureRef),
    /// A resident texture of a finer level that still covers the tile.
    Finer(TextureRef),
    /// Nothing usable is resident.
    Missing,
}

impl TextureResolution {
    pub fn texture(&self) -> Option<TextureRef> {
        match *self {
            TextureResolution::Exact(t)
            | TextureResolution::Coarser(t)
            | TextureResolution::Finer(t) => Some(t),
            TextureResolution::Missing => None,
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, TextureResolution::Exact(_))
    }
}

/// One LOD of one tile: the mesh plus the textures it is shaded with.
#[derive(Debug)]
pub struct TileResources {
    mesh: Arc<TileMesh>,
    textures: [Option<TextureRef>; 3],
    coarser: Option<ResourceId>,
    finer: Vec<ResourceId>,
}

impl TileResources {
    pub fn new(mesh: Arc<TileMesh>) -> Self {
        Self {
            mesh,
            textures: [None; 3],
            coarser: None,
            finer: Vec::new(),
        }
    }

    pub fn with_texture(mut self, texture_type: TextureType, texture: TextureRef) -> Self {
        self.textures[texture_type.index()] = Some(texture);
        self
    }

    pub fn mesh(&self) -> &Arc<TileMesh> {
        &self.mesh
    }

    pub fn texture(&self, texture_type: TextureType) -> Option<TextureRef> {
        self.textures[texture_type.index()]
    }

    /// Every texture this level references, in [`TextureType::ALL`] order.
    pub fn textures(&self) -> impl Iterator<Item = (TextureType, TextureRef)> + '_ {
        TextureType::ALL
            .into_iter()
            .filter_map(move |ty| self.texture(ty).map(|t| (ty, t)))
    }

    pub fn coarser(&self) -> Option<ResourceId> {
        self.coarser
    }

    pub fn finer(&self) -> &[ResourceId] {
        &self.finer
    }
}

/// Owner of every [`TileResources`]; links between them are ids.
#[derive(Debug, Default)]
pub struct ResourceArena {
    resources: Vec<TileResources>,
}

impl ResourceArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, resources: TileResources) -> ResourceId {
        let id = ResourceId(self.resources.len() as u32);
        self.resources.push(resources);
        id
    }

    /// # Panics
    ///
    /// Panics if `id` was not produced by this arena.
    pub fn get(&self, id: ResourceId) -> &TileResources {
        &self.resources[id.index()]
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Make `coarser` the parent of `finer`.
    ///
    /// # Panics
    ///
    /// Panics if `finer` already has a parent or if the link would point a
    /// resource at itself. Links are only ever added coarse to fine with a
    /// single parent each, which keeps every upward walk finite.
    pub fn link(&mut self, coarser: ResourceId, finer: ResourceId) {
        assert_ne!(coarser, finer, "a resource cannot be its own coarser level");
        let child = &mut self.resources[finer.index()];
        assert!(
            child.coarser.is_none(),
            "resource {finer:?} already has a coarser level"
        );
        child.coarser = Some(coarser);
        self.resources[coarser.index()].finer.push(finer);
    }

    /// The texture of `texture_type` at exactly this level, resident or not.
    pub fn texture(&self, id: ResourceId, texture_type: TextureType) -> Option<TextureRef> {
        self.get(id).texture(texture_type)
    }

    /// Nearest coarser level whose texture of `texture_type` is resident.
    pub fn coarser_texture(
        &self,
        id: ResourceId,
        texture_type: TextureType,
        textures: &TextureArena,
    ) -> Option<TextureRef> {
        let mut current = self.get(id).coarser;
        while let Some(parent) = current {
            let resources = self.get(parent);
            if let Some(texture) = resources.texture(texture_type) {
                if textures.is_resident(texture.id) {
                    return Some(texture);
                }
            }
            current = resources.coarser;
        }
        None
    }

    /// Nearest finer level whose texture of `texture_type` is resident and
    /// still covers `tile`.
    ///
    /// Breadth-first, so a resident child wins over a resident grandchild.
    /// Only descends through levels whose texture covers the tile.
    pub fn finer_texture(
        &self,
        id: ResourceId,
        tile: &GeoRect,
        texture_type: TextureType,
        textures: &TextureArena,
    ) -> Option<TextureRef> {
        let mut queue: VecDeque<ResourceId> = self.get(id).finer.iter().copied().collect();
        while let Some(next) = queue.pop_front() {
            let resources = self.get(next);
            let Some(texture) = resources.texture(texture_type) else {
                continue;
            };
            if !texture.footprint.contains(tile) {
                continue;
            }
            if textures.is_resident(texture.id) {
                return Some(texture);
            }
            queue.extend(resources.finer.iter().copied());
        }
        None
    }

    /// Exact texture if resident, else the nearest coarser, else the nearest
    /// finer substitute.
    pub fn resolve_texture(
        &self,
        id: ResourceId,
        tile: &GeoRect,
        texture_type: TextureType,
        textures: &TextureArena,
    ) -> TextureResolution {
        if let Some(exact) = self.texture(id, texture_type) {
            if textures.is_resident(exact.id) {
                return TextureResolution::Exact(exact);
            }
        }
        if let Some(coarser) = self.coarser_texture(id, texture_type, textures) {
            return TextureResolution::Coarser(coarser);
        }
        if let Some(finer) = self.finer_texture(id, tile, texture_type, textures) {
            return TextureResolution::Finer(finer);
        }
        TextureResolution::Missing
    }
}
