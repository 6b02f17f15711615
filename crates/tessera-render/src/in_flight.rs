//! Bookkeeping of texture load requests the loader has not answered yet.

use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use tessera_resources::TextureId;

/// One outstanding request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InFlight {
    pub texture: TextureId,
    /// Frame the request was (last) issued in.
    pub requested_at: u64,
}

/// Outstanding requests keyed by path, with a retry backoff.
///
/// A path is requested at most once until its result arrives or until
/// `retry_after` frames have passed, which covers files the loader failed to
/// decode. A `retry_after` of zero never re-issues.
#[derive(Debug, Default)]
pub struct InFlightRequests {
    entries: FxHashMap<PathBuf, InFlight>,
    retry_after: u64,
}

impl InFlightRequests {
    pub fn new(retry_after: u64) -> Self {
        Self {
            entries: FxHashMap::default(),
            retry_after,
        }
    }

    /// Whether `path` may be requested in `frame`.
    pub fn should_request(&self, path: &Path, frame: u64) -> bool {
        match self.entries.get(path) {
            None => true,
            Some(_) if self.retry_after == 0 => false,
            Some(entry) => frame.saturating_sub(entry.requested_at) >= self.retry_after,
        }
    }

    /// Record a request issued in `frame`, replacing an expired entry.
    pub fn insert(&mut self, path: PathBuf, texture: TextureId, frame: u64) {
        self.entries.insert(
            path,
            InFlight {
                texture,
                requested_at: frame,
            },
        );
    }

    /// Remove and return the entry for an answered request.
    pub fn complete(&mut self, path: &Path) -> Option<InFlight> {
        self.entries.remove(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
