//! The request/result queues shared by fetchers and the loader thread.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crossbeam_channel::{Receiver, Sender};

use crate::texture::DecodedImage;

/// A path the renderer wants decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureLoadRequest {
    pub path: PathBuf,
}

/// A decoded image, tagged with the path it was requested under.
#[derive(Debug)]
pub struct TextureLoadResult {
    pub path: PathBuf,
    pub image: DecodedImage,
}

/// Two FIFO queues plus the stop signal for one loader.
///
/// Any number of [`crate::ResourceFetcher`]s may push requests and drain
/// results concurrently; exactly one [`crate::ResourceLoader`] consumes
/// requests. Both queues are unbounded, so producers never block.
pub struct ResourceChannel {
    request_tx: Sender<TextureLoadRequest>,
    request_rx: Receiver<TextureLoadRequest>,
    result_tx: Sender<TextureLoadResult>,
    result_rx: Receiver<TextureLoadResult>,
    shutdown_tx: Sender<()>,
    shutdown_rx: Receiver<()>,
    stopped: AtomicBool,
    loader_attached: AtomicBool,
    failed_loads: AtomicUsize,
}

impl ResourceChannel {
    pub fn new() -> Self {
        let (request_tx, request_rx) = crossbeam_channel::unbounded();
        let (result_tx, result_rx) = crossbeam_channel::unbounded();
        // One slot is enough: a single loader waits on it.
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);
        Self {
            request_tx,
            request_rx,
            result_tx,
            result_rx,
            shutdown_tx,
            shutdown_rx,
            stopped: AtomicBool::new(false),
            loader_attached: AtomicBool::new(false),
            failed_loads: AtomicUsize::new(0),
        }
    }

    /// Enqueue a request. Returns `false` once the channel has been stopped.
    pub fn push_request(&self, request: TextureLoadRequest) -> bool {
        if self.is_stopped() {
            return false;
        }
        self.request_tx.send(request).is_ok()
    }

    pub(crate) fn push_result(&self, result: TextureLoadResult) {
        // Our own receiver lives as long as `self`, so this cannot disconnect.
        let _ = self.result_tx.send(result);
    }

    /// Drain every result that is ready right now without blocking.
    pub fn drain_results(&self) -> Vec<TextureLoadResult> {
        self.result_rx.try_iter().collect()
    }

    /// Requests queued but not yet picked up by the loader.
    pub fn pending_requests(&self) -> usize {
        self.request_rx.len()
    }

    /// Ask the loader to exit after the request it is currently decoding.
    pub fn request_stop(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            let _ = self.shutdown_tx.try_send(());
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Number of requests whose image could not be decoded.
    pub fn failed_loads(&self) -> usize {
        self.failed_loads.load(Ordering::Relaxed)
    }

    pub(crate) fn record_failure(&self) {
        self.failed_loads.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn request_receiver(&self) -> &Receiver<TextureLoadRequest> {
        &self.request_rx
    }

    pub(crate) fn shutdown_receiver(&self) -> &Receiver<()> {
        &self.shutdown_rx
    }

    /// Claim the single loader slot. Returns `false` if it was already taken.
    pub(crate) fn attach_loader(&self) -> bool {
        !self.loader_attached.swap(true, Ordering::SeqCst)
    }
}

impl Default for ResourceChannel {
    fn default() -> Self {
        Self::new()
    }
}
