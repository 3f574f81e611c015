use bookdex_core::ProgressReporter;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;

/// CLI progress reporter using indicatif progress bars.
///
/// - Scan/rebuild phase: spinner (total file count unknown upfront)
/// - Reconcile phase: spinner with a running record count
/// - Cleanup phase: progress bar (document total known from the store)
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn set_bar(&self, pb: ProgressBar) {
        let mut guard = self.bar.lock().unwrap();
        if let Some(old) = guard.take() {
            old.finish_and_clear();
        }
        *guard = Some(pb);
    }

    fn finish_bar(&self) {
        let mut guard = self.bar.lock().unwrap();
        if let Some(pb) = guard.take() {
            pb.finish_and_clear();
        }
    }

    fn spinner(&self, message: &'static str) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        pb.set_message(message);
        pb.enable_steady_tick(std::time::Duration::from_millis(80));
        self.set_bar(pb);
    }
}

impl Default for CliReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for CliReporter {
    fn on_scan_start(&self) {
        self.spinner("Scanning files...");
    }

    fn on_scan_progress(&self, files_seen: usize, current_dir: &str) {
        let guard = self.bar.lock().unwrap();
        if let Some(pb) = guard.as_ref() {
            pb.set_message(format!("Scanning {}... {} files", current_dir, files_seen));
        }
    }

    fn on_rebuild_complete(&self, rows: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Snapshot rebuilt: {} rows in {:.2}s",
            rows, duration_secs
        );
    }

    fn on_reconcile_start(&self) {
        self.spinner("Scanning for new documents...");
    }

    fn on_reconcile_progress(&self, records_seen: usize) {
        let guard = self.bar.lock().unwrap();
        if let Some(pb) = guard.as_ref() {
            pb.set_message(format!("Reconciling... {} records", records_seen));
        }
    }

    fn on_reconcile_complete(&self, inserted: usize, updated: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Reconcile complete: {} inserted, {} updated in {:.2}s",
            inserted, updated, duration_secs
        );
    }

    fn on_cleanup_start(&self, total_documents: usize) {
        let pb = ProgressBar::new(total_documents as u64);
        pb.set_style(
            ProgressStyle::with_template(
                "  {spinner:.cyan} Checking [{bar:30.cyan/dim}] {pos}/{len} documents ({eta} remaining)",
            )
            .unwrap()
            .progress_chars("━╸─")
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        pb.enable_steady_tick(std::time::Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn on_cleanup_progress(&self, documents_checked: usize, _total_documents: usize) {
        let guard = self.bar.lock().unwrap();
        if let Some(pb) = guard.as_ref() {
            pb.set_position(documents_checked as u64);
        }
    }

    fn on_cleanup_complete(&self, removed: usize, mismatched: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Cleanup complete: {} removed, {} mismatched in {:.2}s",
            removed, mismatched, duration_secs
        );
    }
}
