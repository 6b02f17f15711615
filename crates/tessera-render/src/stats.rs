//! Frame statistics and the observers that receive them.

use std::fmt;

use glam::DVec3;

/// Counters of one rendered frame.
///
/// Every tile ends up in exactly one of `frustum_culled_tiles`,
/// `backface_culled_tiles`, `pending_tiles` or `drawn_tiles`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RenderingStatistics {
    pub frame: u64,
    pub num_tiles: usize,
    pub frustum_culled_tiles: usize,
    pub backface_culled_tiles: usize,
    /// Visible tiles skipped because no day texture is resident yet.
    pub pending_tiles: usize,
    pub drawn_tiles: usize,
    /// Textures resident on the backend after this frame.
    pub loaded_textures: usize,
    /// Load requests waiting for the loader.
    pub in_flight_requests: usize,
    /// Load requests issued during this frame.
    pub requested_textures: usize,
    /// Bindings that used a coarser or finer texture than the selected level.
    pub fallback_bindings: usize,
    pub camera_position: DVec3,
}

impl fmt::Display for RenderingStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "frame {}: {}/{} tiles drawn ({} frustum culled, {} back-facing, {} pending), \
             {} textures resident, {} in flight",
            self.frame,
            self.drawn_tiles,
            self.num_tiles,
            self.frustum_culled_tiles,
            self.backface_culled_tiles,
            self.pending_tiles,
            self.loaded_textures,
            self.in_flight_requests,
        )
    }
}

/// Receives the statistics of every frame.
pub trait RendererSubscriber {
    fn notify(&mut self, statistics: &RenderingStatistics);
}

/// Logs every frame at `debug`.
#[derive(Debug, Default)]
pub struct LoggingSubscriber;

impl RendererSubscriber for LoggingSubscriber {
    fn notify(&mut self, statistics: &RenderingStatistics) {
        tracing::debug!(
            frame = statistics.frame,
            drawn = statistics.drawn_tiles,
            frustum_culled = statistics.frustum_culled_tiles,
            backface_culled = statistics.backface_culled_tiles,
            resident = statistics.loaded_textures,
            in_flight = statistics.in_flight_requests,
            "frame rendered"
        );
    }
}
