//! Texture streaming: the texture arena, the background loader, and the
//! bounded GPU residency cache.
//!
//! The renderer thread owns the [`TextureArena`] and the [`ResourceManager`].
//! Disk I/O happens on a single [`ResourceLoader`] thread; the only state the
//! two threads share is the [`ResourceChannel`] between a [`ResourceFetcher`]
//! and that loader.

mod channel;
mod decoder;
mod error;
mod fetcher;
mod loader;
mod lru;
mod manager;
mod texture;

pub use channel::{ResourceChannel, TextureLoadRequest, TextureLoadResult};
pub use decoder::{DecodeError, FileImageDecoder, ImageDecoder};
pub use error::ResourceError;
pub use fetcher::ResourceFetcher;
pub use loader::{LoaderHandle, ResourceLoader};
pub use lru::LruList;
pub use manager::{ResourceManager, TextureBackend};
pub use texture::{
    DecodedImage, Texture, TextureArena, TextureDescriptor, TextureId, TextureState, TextureType,
};
