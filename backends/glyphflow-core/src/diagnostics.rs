// this_file: backends/glyphflow-core/src/diagnostics.rs

//! Cache observability helpers for structured debug logging.

use log::{debug, log_enabled, Level};

/// Snapshot of the layout cache's accounting and hit history.
///
/// Observability only; nothing here participates in the functional
/// contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Entries currently resident.
    pub entries: usize,
    /// Bytes attributed to resident entries.
    pub current_bytes: usize,
    /// Fixed byte budget.
    pub max_bytes: usize,
    /// Lookups answered from the cache.
    pub hit_count: u64,
    /// Cumulative compute time avoided by hits, minus lookup overhead.
    /// Can go negative when lookups cost more than the cached compute.
    pub nanos_saved: i64,
}

impl CacheStats {
    /// Emit the snapshot at debug level when logging is enabled.
    pub fn log(&self) {
        if log_enabled!(Level::Debug) {
            let remaining = self.max_bytes.saturating_sub(self.current_bytes);
            debug!(
                target: "glyphflow::cache",
                "entries={entries} used={used} max={max} remaining={remaining} hits={hits} saved_ms={saved:.3}",
                entries = self.entries,
                used = self.current_bytes,
                max = self.max_bytes,
                hits = self.hit_count,
                saved = self.nanos_saved as f64 * 1e-6,
            );
        }
    }
}
