use crate::sample::{Sample, Timestamp};

/// All messages (events) that can flow through the monitor's event bus.
///
/// Sources:
/// - System sampler task   → `LiveSample`
/// - Archive reader task   → `ArchiveBatch`
/// - Refresh heuristic     → `RefreshRequested`
/// - Config watcher task   → `ConfigReloaded`
/// - Poll timer            → `Tick`
#[derive(Debug, Clone)]
pub enum Message {
    // ── Live data ─────────────────────────────────────────────────────────────
    /// A new live value for the named item.
    LiveSample { item: String, sample: Sample },

    // ── Archive ───────────────────────────────────────────────────────────────
    /// A completed archive query (may be empty).
    ArchiveBatch {
        item:    String,
        source:  String,
        samples: Vec<Sample>,
    },
    /// The refresh heuristic asked for the named item's history to be re-read.
    RefreshRequested {
        item:  String,
        start: Timestamp,
        end:   Timestamp,
    },

    // ── Config ────────────────────────────────────────────────────────────────
    /// Config file changed on disk; triggers a live reload.
    ConfigReloaded,

    // ── Internal ──────────────────────────────────────────────────────────────
    /// Renderer poll tick.
    Tick,
    /// Graceful shutdown requested.
    Shutdown,
}
