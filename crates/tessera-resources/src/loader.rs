//! The background thread that decodes requested textures.

use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::select;

use crate::channel::{ResourceChannel, TextureLoadResult};
use crate::decoder::ImageDecoder;
use crate::error::ResourceError;

/// Consumes requests from a [`ResourceChannel`] and publishes decoded images.
///
/// Requests are handled strictly in arrival order. A request that fails to
/// decode produces no result; the renderer's retry backoff re-issues it.
pub struct ResourceLoader {
    channel: Arc<ResourceChannel>,
    decoder: Box<dyn ImageDecoder>,
}

impl ResourceLoader {
    /// Attach a loader to `channel`. Fails if one is already attached.
    pub fn new(
        channel: Arc<ResourceChannel>,
        decoder: Box<dyn ImageDecoder>,
    ) -> Result<Self, ResourceError> {
        if !channel.attach_loader() {
            return Err(ResourceError::LoaderAlreadyRunning);
        }
        Ok(Self { channel, decoder })
    }

    /// Start a loader on a dedicated `texture-loader` thread.
    pub fn spawn(
        channel: Arc<ResourceChannel>,
        decoder: Box<dyn ImageDecoder>,
    ) -> Result<LoaderHandle, ResourceError> {
        let loader = Self::new(Arc::clone(&channel), decoder)?;
        let handle = std::thread::Builder::new()
            .name("texture-loader".to_string())
            .spawn(move || loader.start())
            .map_err(ResourceError::Spawn)?;
        Ok(LoaderHandle {
            channel,
            handle: Some(handle),
        })
    }

    /// Block on the request queue until the channel is stopped.
    pub fn start(self) {
        tracing::debug!("texture loader started");
        loop {
            if self.channel.is_stopped() {
                break;
            }
            select! {
                recv(self.channel.request_receiver()) -> msg => match msg {
                    Ok(request) => self.load(request.path),
                    Err(_) => break,
                },
                recv(self.channel.shutdown_receiver()) -> _ => break,
            }
        }
        tracing::debug!("texture loader stopped");
    }

    fn load(&self, path: std::path::PathBuf) {
        let _span = tracing::trace_span!("decode_texture", path = %path.display()).entered();
        match self.decoder.decode(&path) {
            Ok(image) => {
                tracing::trace!(width = image.width, height = image.height, "decoded");
                self.channel.push_result(TextureLoadResult { path, image });
            }
            Err(err) => {
                self.channel.record_failure();
                tracing::warn!("{err}");
            }
        }
    }
}

/// Owns the loader thread; stops and joins it on [`shutdown`](Self::shutdown)
/// or drop.
pub struct LoaderHandle {
    channel: Arc<ResourceChannel>,
    handle: Option<JoinHandle<()>>,
}

impl LoaderHandle {
    pub fn channel(&self) -> &Arc<ResourceChannel> {
        &self.channel
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Signal the loader to stop and wait for it. Idempotent.
    pub fn shutdown(&mut self) {
        self.channel.request_stop();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("texture loader thread panicked");
            }
        }
    }
}

impl Drop for LoaderHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
