//! A [`TextureBackend`] without a GPU, for tools and tests.

use std::convert::Infallible;

use rustc_hash::FxHashMap;
use tessera_geo::Resolution;
use tessera_resources::{DecodedImage, TextureBackend, TextureId};

/// Remembers the size of every uploaded texture and counts traffic.
#[derive(Debug, Default)]
pub struct HeadlessTextureBackend {
    resident: FxHashMap<TextureId, Resolution>,
    uploads: usize,
    releases: usize,
}

impl HeadlessTextureBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: TextureId) -> bool {
        self.resident.contains_key(&id)
    }

    pub fn resolution(&self, id: TextureId) -> Option<Resolution> {
        self.resident.get(&id).copied()
    }

    pub fn resident_count(&self) -> usize {
        self.resident.len()
    }

    pub fn upload_count(&self) -> usize {
        self.uploads
    }

    pub fn release_count(&self) -> usize {
        self.releases
    }
}

impl TextureBackend for HeadlessTextureBackend {
    type Error = Infallible;

    fn upload(&mut self, id: TextureId, image: &DecodedImage) -> Result<(), Infallible> {
        self.resident
            .insert(id, Resolution::new(image.width, image.height));
        self.uploads += 1;
        Ok(())
    }

    fn release(&mut self, id: TextureId) {
        if self.resident.remove(&id).is_some() {
            self.releases += 1;
        }
    }
}
