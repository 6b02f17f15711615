//! Textures and the arena that owns them.
//!
//! A texture is one atlas image on disk. Several LODs of several tiles may
//! point at the same image, so textures are interned by path into a
//! [`TextureArena`] and referenced everywhere else by [`TextureId`].

use std::fmt;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use tessera_geo::{GeoRect, GridSize, Resolution};

/// Stable index of a texture inside its [`TextureArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

impl TextureId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "texture#{}", self.0)
    }
}

/// What an image is used for when shading a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureType {
    Day,
    Night,
    HeightMap,
}

impl TextureType {
    pub const ALL: [TextureType; 3] = [TextureType::Day, TextureType::Night, TextureType::HeightMap];

    /// Dense index, usable for per-type arrays.
    pub const fn index(self) -> usize {
        match self {
            TextureType::Day => 0,
            TextureType::Night => 1,
            TextureType::HeightMap => 2,
        }
    }
}

/// Decoded pixels handed from the loader thread to the renderer.
#[derive(Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    /// Size the pixel buffer must have for the declared dimensions.
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * self.channels as usize
    }
}

impl fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("channels", &self.channels)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// Lifecycle of a texture.
///
/// `Unloaded → DataLoaded → Resident`. Eviction from the GPU cache sends a
/// texture back to `Unloaded` so it can be streamed again later.
#[derive(Debug, Default)]
pub enum TextureState {
    #[default]
    Unloaded,
    /// CPU pixels present, waiting for a GPU upload.
    DataLoaded(DecodedImage),
    /// Uploaded; CPU pixels have been dropped.
    Resident,
}

/// Everything an atlas knows about an image before it is ever read.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureDescriptor {
    pub path: PathBuf,
    pub texture_type: TextureType,
    pub resolution: Resolution,
    pub footprint: GeoRect,
    pub grid: GridSize,
}

/// One atlas image and its streaming state.
#[derive(Debug)]
pub struct Texture {
    descriptor: TextureDescriptor,
    state: TextureState,
}

impl Texture {
    pub fn path(&self) -> &Path {
        &self.descriptor.path
    }

    pub fn texture_type(&self) -> TextureType {
        self.descriptor.texture_type
    }

    pub fn resolution(&self) -> Resolution {
        self.descriptor.resolution
    }

    /// Geographic window the image covers.
    pub fn footprint(&self) -> GeoRect {
        self.descriptor.footprint
    }

    pub fn grid(&self) -> GridSize {
        self.descriptor.grid
    }

    pub fn state(&self) -> &TextureState {
        &self.state
    }

    pub fn is_resident(&self) -> bool {
        matches!(self.state, TextureState::Resident)
    }

    pub fn is_data_loaded(&self) -> bool {
        matches!(self.state, TextureState::DataLoaded(_))
    }

    /// Store freshly decoded pixels. Ignored (returns `false`) if the texture
    /// is already resident.
    pub fn set_data(&mut self, image: DecodedImage) -> bool {
        if self.is_resident() {
            return false;
        }
        self.descriptor.resolution = Resolution::new(image.width, image.height);
        self.state = TextureState::DataLoaded(image);
        true
    }

    /// Move the CPU pixels out, leaving the texture `Unloaded`.
    pub fn take_data(&mut self) -> Option<DecodedImage> {
        match std::mem::take(&mut self.state) {
            TextureState::DataLoaded(image) => Some(image),
            other => {
                self.state = other;
                None
            }
        }
    }

    pub fn mark_resident(&mut self) {
        self.state = TextureState::Resident;
    }

    pub fn mark_unloaded(&mut self) {
        self.state = TextureState::Unloaded;
    }
}

/// Owner of every texture, interned by path.
#[derive(Debug, Default)]
pub struct TextureArena {
    textures: Vec<Texture>,
    by_path: FxHashMap<PathBuf, TextureId>,
}

impl TextureArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a texture, or return the id already assigned to its path.
    pub fn intern(&mut self, descriptor: TextureDescriptor) -> TextureId {
        if let Some(&id) = self.by_path.get(&descriptor.path) {
            return id;
        }
        let id = TextureId(self.textures.len() as u32);
        self.by_path.insert(descriptor.path.clone(), id);
        self.textures.push(Texture {
            descriptor,
            state: TextureState::Unloaded,
        });
        id
    }

    /// # Panics
    ///
    /// Panics if `id` was not produced by this arena.
    pub fn get(&self, id: TextureId) -> &Texture {
        &self.textures[id.index()]
    }

    /// # Panics
    ///
    /// Panics if `id` was not produced by this arena.
    pub fn get_mut(&mut self, id: TextureId) -> &mut Texture {
        &mut self.textures[id.index()]
    }

    pub fn id_for_path(&self, path: &Path) -> Option<TextureId> {
        self.by_path.get(path).copied()
    }

    pub fn is_resident(&self, id: TextureId) -> bool {
        self.get(id).is_resident()
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TextureId, &Texture)> {
        self.textures
            .iter()
            .enumerate()
            .map(|(i, t)| (TextureId(i as u32), t))
    }
}
