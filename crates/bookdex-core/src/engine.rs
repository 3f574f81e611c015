use crate::config::AppConfig;
use crate::error::Error;
use crate::progress::ProgressReporter;
use crate::scanner::Scanner;
use crate::summary::{LibrarySummary, SummaryIndex, SummaryRow};
use crate::sync::{CleanupStats, Document, ReconcileStats, SyncIndex};
use std::io::Write;
use std::path::PathBuf;

/// The engine facade: owns the configuration, the scanner, and both
/// persistence layers. This is the only surface a presentation layer calls.
///
/// One `Library` is one logical writer; running two reconciliation passes
/// against the same store concurrently is the caller's bug to avoid.
pub struct Library {
    config: AppConfig,
    scanner: Scanner,
    summary: SummaryIndex,
    sync: SyncIndex,
}

impl Library {
    pub fn open(config: AppConfig) -> Result<Library, Error> {
        let scanner = Scanner::new(&config);
        let summary = SummaryIndex::open(&config.summary_db_path())?;
        let sync = SyncIndex::open(
            &config.sync_store_path(),
            PathBuf::from(&config.library_root),
        )?;
        Ok(Library {
            config,
            scanner,
            summary,
            sync,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Snapshot rows ordered by title; materializes the snapshot on first
    /// use.
    pub fn list(&self, reporter: &dyn ProgressReporter) -> Result<Vec<SummaryRow>, Error> {
        self.summary.list(&self.scanner, reporter)
    }

    /// Per-directory and per-root document counts.
    pub fn summarize(&self, reporter: &dyn ProgressReporter) -> Result<LibrarySummary, Error> {
        self.summary.summarize(&self.scanner, reporter)
    }

    /// Force-invalidate and rebuild the summary snapshot. Returns the row
    /// count.
    pub fn reload(&self, reporter: &dyn ProgressReporter) -> Result<usize, Error> {
        self.summary.rebuild(&self.scanner, reporter)
    }

    /// Incremental reconciliation of the sync store against the filesystem.
    pub fn rescan(&self, reporter: &dyn ProgressReporter) -> Result<ReconcileStats, Error> {
        self.sync.check_new(&self.scanner, reporter)
    }

    /// Drop stale documents; verify stored hashes when asked.
    pub fn cleanup(
        &self,
        check_hash: bool,
        reporter: &dyn ProgressReporter,
    ) -> Result<CleanupStats, Error> {
        self.sync.cleanup(check_hash, reporter)
    }

    pub fn find_by_title(&self, title: &str) -> Result<Vec<Document>, Error> {
        self.sync.find_by_title(title)
    }

    pub fn find_by_hash(&self, hash: u64) -> Result<Vec<Document>, Error> {
        self.sync.find_by_hash(hash)
    }

    pub fn dump_titles(&self, out: &mut dyn Write) -> Result<usize, Error> {
        self.sync.dump_titles(out)
    }

    pub fn count(&self) -> Result<usize, Error> {
        self.sync.count()
    }
}
