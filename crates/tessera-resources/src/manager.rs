//! Bounded LRU of GPU-resident textures.

use crate::error::ResourceError;
use crate::lru::LruList;
use crate::texture::{DecodedImage, TextureArena, TextureId};

/// Where resident textures actually live.
///
/// The cache decides what is resident; the backend owns the GPU objects,
/// keyed by [`TextureId`].
pub trait TextureBackend {
    type Error: std::fmt::Display;

    /// Reject images [`upload`](Self::upload) is known to fail on, before
    /// anything is evicted for them.
    fn check(&self, _image: &DecodedImage) -> Result<(), Self::Error> {
        Ok(())
    }

    fn upload(&mut self, id: TextureId, image: &DecodedImage) -> Result<(), Self::Error>;

    /// Free the GPU copy of `id`. Releasing an unknown id is a no-op.
    fn release(&mut self, id: TextureId);
}

/// Keeps at most `capacity` textures resident, evicting the least recently
/// used one before each new upload.
///
/// Images the backend rejects in [`TextureBackend::check`] never evict. An
/// upload that fails after the check has already cost the evicted texture.
#[derive(Debug)]
pub struct ResourceManager {
    capacity: usize,
    lru: LruList,
}

impl ResourceManager {
    pub fn new(capacity: usize) -> Result<Self, ResourceError> {
        if capacity == 0 {
            return Err(ResourceError::ZeroCapacity);
        }
        Ok(Self {
            capacity,
            lru: LruList::new(),
        })
    }

    /// Make `id` resident if it has decoded pixels.
    ///
    /// Returns `true` if the texture is resident afterwards. A texture with
    /// no pixels yet, or whose upload fails, stays non-resident.
    pub fn add_texture_into_context<B: TextureBackend>(
        &mut self,
        arena: &mut TextureArena,
        id: TextureId,
        backend: &mut B,
    ) -> bool {
        let texture = arena.get(id);
        if texture.is_resident() {
            self.note_usage(id);
            return true;
        }
        if !texture.is_data_loaded() {
            tracing::debug!(%id, "no decoded pixels to upload");
            return false;
        }

        let texture = arena.get_mut(id);
        let Some(image) = texture.take_data() else {
            return false;
        };
        // Rejected images must not cost a resident texture.
        if let Err(err) = backend.check(&image) {
            tracing::warn!(path = %texture.path().display(), "texture rejected: {err}");
            return false;
        }

        if self.lru.len() >= self.capacity {
            self.pop_texture(arena, backend);
        }

        let texture = arena.get_mut(id);
        match backend.upload(id, &image) {
            Ok(()) => {
                texture.mark_resident();
                self.lru.push_front(id);
                tracing::trace!(%id, resident = self.lru.len(), "texture uploaded");
                true
            }
            Err(err) => {
                tracing::warn!(path = %texture.path().display(), "texture upload failed: {err}");
                false
            }
        }
    }

    /// Mark `id` most recently used. Ignored if it is not resident.
    pub fn note_usage(&mut self, id: TextureId) {
        self.lru.move_to_front(id);
    }

    /// Evict the least recently used texture, if any.
    pub fn pop_texture<B: TextureBackend>(
        &mut self,
        arena: &mut TextureArena,
        backend: &mut B,
    ) -> Option<TextureId> {
        let victim = self.lru.pop_back()?;
        backend.release(victim);
        arena.get_mut(victim).mark_unloaded();
        tracing::trace!(id = %victim, "texture evicted");
        Some(victim)
    }

    /// Evict everything. Used on renderer teardown.
    pub fn release_all<B: TextureBackend>(&mut self, arena: &mut TextureArena, backend: &mut B) {
        while self.pop_texture(arena, backend).is_some() {}
    }

    pub fn resident_count(&self) -> usize {
        self.lru.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_resident(&self, id: TextureId) -> bool {
        self.lru.contains(id)
    }

    /// Resident ids, most recently used first.
    pub fn lru_order(&self) -> Vec<TextureId> {
        self.lru.iter().collect()
    }
}
