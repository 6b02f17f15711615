//! Errors raised while setting up the streaming layer.

/// Construction-time failures of the streaming layer.
///
/// Runtime conditions (texture not decoded yet, cache full, decode failed)
/// are never errors; they surface as "not ready" to the renderer.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    /// A cache that can hold no texture would evict everything it admits.
    #[error("texture cache capacity must be at least 1")]
    ZeroCapacity,

    /// A second loader was started on the same channel.
    #[error("a texture loader is already attached to this channel")]
    LoaderAlreadyRunning,

    /// The OS refused to start the loader thread.
    #[error("failed to spawn texture loader thread: {0}")]
    Spawn(#[source] std::io::Error),
}
