//! Renderer-side handle for asking the loader for textures.

use std::path::PathBuf;
use std::sync::Arc;

use crate::channel::{ResourceChannel, TextureLoadRequest, TextureLoadResult};

/// Thin, cloneable front end to a [`ResourceChannel`].
#[derive(Clone)]
pub struct ResourceFetcher {
    channel: Arc<ResourceChannel>,
}

impl ResourceFetcher {
    pub fn new(channel: Arc<ResourceChannel>) -> Self {
        Self { channel }
    }

    /// Ask for `path` to be decoded. Never blocks.
    ///
    /// Returns `false` if the loader has been stopped and the request was
    /// dropped.
    pub fn request(&self, path: impl Into<PathBuf>) -> bool {
        let path = path.into();
        let accepted = self.channel.push_request(TextureLoadRequest { path });
        if !accepted {
            tracing::debug!("texture request dropped, loader stopped");
        }
        accepted
    }

    /// Everything decoded since the last call, in completion order.
    pub fn retrieve_loaded_resources(&self) -> Vec<TextureLoadResult> {
        self.channel.drain_results()
    }

    /// Requests the loader has not started on yet.
    pub fn pending_requests(&self) -> usize {
        self.channel.pending_requests()
    }

    pub fn channel(&self) -> &Arc<ResourceChannel> {
        &self.channel
    }
}
