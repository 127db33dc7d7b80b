/// Trait for reporting duplicate scan progress.
///
/// The CLI implements it with indicatif; library callers can forward it to
/// whatever UI runtime they drive. All methods have default no-op
/// implementations.
///
/// Callbacks run without the cache lock held, so they may clear or inspect
/// the cache. Starting another scan on the same cache from a callback waits
/// for the current scan and never returns.
pub trait ProgressReporter: Send + Sync {
    fn on_scan_start(&self, _total_characters: usize) {}
    /// Called at every chunk boundary with an integer percentage.
    fn on_scan_progress(&self, _percent: u8) {}
    fn on_scan_complete(&self, _groups: usize, _duration_secs: f64) {}
    fn on_cache_hit(&self, _groups: usize) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
