/// Trait for reporting progress of the long-running passes.
///
/// The CLI implements this with indicatif; tests and embedders that don't
/// care use [`SilentReporter`]. All methods have default no-op
/// implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_scan_start(&self) {}
    fn on_scan_progress(&self, _files_seen: usize, _current_dir: &str) {}
    fn on_rebuild_start(&self) {}
    fn on_rebuild_complete(&self, _rows: usize, _duration_secs: f64) {}
    fn on_reconcile_start(&self) {}
    fn on_reconcile_progress(&self, _records_seen: usize) {}
    fn on_reconcile_complete(&self, _inserted: usize, _updated: usize, _duration_secs: f64) {}
    fn on_cleanup_start(&self, _total_documents: usize) {}
    fn on_cleanup_progress(&self, _documents_checked: usize, _total_documents: usize) {}
    fn on_cleanup_complete(&self, _removed: usize, _mismatched: usize, _duration_secs: f64) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
