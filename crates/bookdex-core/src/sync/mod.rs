//! The sync index: a durable document store kept consistent with the
//! filesystem through incremental reconciliation.
//!
//! `check_new` diffs one scan pass against the stored documents using the
//! size+mtime heuristic, hashing only inserts, changes, and unhashed
//! leftovers. `cleanup` walks the store the other way: it drops documents
//! whose backing file is gone and can optionally re-verify content hashes
//! without repairing them; repair only happens through `check_new`.

mod store;

pub use store::{Document, SyncStore};

use crate::error::Error;
use crate::hasher;
use crate::progress::ProgressReporter;
use crate::scanner::{FileRecord, Scanner};
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Counts from one `check_new` pass, for drift auditing.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ReconcileStats {
    pub scanned: usize,
    pub inserted: usize,
    pub updated: usize,
    pub backfilled: usize,
    pub hash_failures: usize,
}

/// Counts from one `cleanup` pass.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CleanupStats {
    pub examined: usize,
    pub removed: usize,
    pub verified: usize,
    pub mismatched: usize,
    pub read_failures: usize,
}

pub struct SyncIndex {
    store: SyncStore,
    library_root: PathBuf,
}

impl SyncIndex {
    pub fn open(store_path: &std::path::Path, library_root: PathBuf) -> Result<Self, Error> {
        Ok(SyncIndex {
            store: SyncStore::open(store_path)?,
            library_root,
        })
    }

    /// Reconcile the store against one scan pass.
    ///
    /// Must not run concurrently with `cleanup` on the same store; callers
    /// serialize reconciliation.
    pub fn check_new(
        &self,
        scanner: &Scanner,
        reporter: &dyn ProgressReporter,
    ) -> Result<ReconcileStats, Error> {
        info!("Scanning for new documents...");
        reporter.on_reconcile_start();
        let start = Instant::now();

        let mut stats = ReconcileStats::default();
        for record in scanner.scan() {
            stats.scanned += 1;
            reporter.on_reconcile_progress(stats.scanned);

            let matches = self.store.find_matching(&record.title, &record.file_type)?;
            match matches
                .into_iter()
                .find(|doc| doc.directory == record.directory)
            {
                Some(existing) => self.refresh(existing, &record, &mut stats)?,
                None => self.insert(&record, &mut stats)?,
            }
        }

        let secs = start.elapsed().as_secs_f64();
        info!(
            "Reconciled {} records in {:.2}s: {} inserted, {} updated, {} hashes backfilled, {} hash failures",
            stats.scanned, secs, stats.inserted, stats.updated, stats.backfilled, stats.hash_failures,
        );
        reporter.on_reconcile_complete(stats.inserted, stats.updated, secs);
        Ok(stats)
    }

    fn insert(&self, record: &FileRecord, stats: &mut ReconcileStats) -> Result<(), Error> {
        let hash = match hasher::hash_file(&record.path) {
            Ok(hash) => hash,
            Err(err) => {
                error!("Error hashing {}: {}", record.path.display(), err);
                stats.hash_failures += 1;
                return Ok(());
            }
        };
        debug!("I {}/{}", record.directory, record.title);
        self.store
            .put(&Document::from_record(record, Some(hash)), None)?;
        stats.inserted += 1;
        Ok(())
    }

    /// Bring one stored document up to date with the record scanned for it.
    ///
    /// A size or mtime difference refreshes size, mtime, and hash; an
    /// unchanged record only backfills a still-missing hash. Unchanged and
    /// already-hashed documents are never rehashed.
    fn refresh(
        &self,
        doc: Document,
        record: &FileRecord,
        stats: &mut ReconcileStats,
    ) -> Result<(), Error> {
        if doc.size != record.size || doc.mtime != record.mtime {
            let hash = match hasher::hash_file(&record.path) {
                Ok(hash) => hash,
                Err(err) => {
                    error!("Error hashing {}: {}", record.path.display(), err);
                    stats.hash_failures += 1;
                    return Ok(());
                }
            };
            debug!(
                "U {}/{} ({:+})",
                record.directory,
                record.title,
                record.size as i64 - doc.size as i64
            );
            let updated = Document {
                size: record.size,
                mtime: record.mtime,
                hash: Some(hash),
                ..doc.clone()
            };
            self.store.put(&updated, Some(&doc))?;
            stats.updated += 1;
        } else if doc.hash.is_none() {
            let hash = match hasher::hash_file(&record.path) {
                Ok(hash) => hash,
                Err(err) => {
                    error!("Error hashing {}: {}", record.path.display(), err);
                    stats.hash_failures += 1;
                    return Ok(());
                }
            };
            debug!("H {}/{}", record.directory, record.title);
            let backfilled = Document {
                hash: Some(hash),
                ..doc.clone()
            };
            self.store.put(&backfilled, Some(&doc))?;
            stats.backfilled += 1;
        }
        Ok(())
    }

    /// Remove documents whose backing file is gone; optionally verify the
    /// stored hashes of those that remain.
    ///
    /// Verification is read-mostly: a mismatch is logged and counted but the
    /// stored hash is left untouched. Hashing fans out across documents.
    pub fn cleanup(
        &self,
        check_hash: bool,
        reporter: &dyn ProgressReporter,
    ) -> Result<CleanupStats, Error> {
        info!(
            "Cleaning up{}...",
            if check_hash { " and checking hashes" } else { "" }
        );
        let documents = self.store.all_documents()?;
        let examined = documents.len();
        reporter.on_cleanup_start(examined);
        let start = Instant::now();

        let progress = AtomicUsize::new(0);
        let removed = AtomicUsize::new(0);
        let verified = AtomicUsize::new(0);
        let mismatched = AtomicUsize::new(0);
        let read_failures = AtomicUsize::new(0);

        documents.par_iter().try_for_each(|doc| {
            let checked = progress.fetch_add(1, Ordering::Relaxed) + 1;
            reporter.on_cleanup_progress(checked, examined);

            let path = doc.expected_path(&self.library_root);
            if !path.exists() {
                debug!("R {}/{}", doc.directory, doc.title);
                self.store.remove(doc)?;
                removed.fetch_add(1, Ordering::Relaxed);
                return Ok(());
            }

            if check_hash {
                match hasher::hash_file(&path) {
                    Ok(hash) => {
                        verified.fetch_add(1, Ordering::Relaxed);
                        if doc.hash != Some(hash) {
                            warn!(
                                "Hash mismatch for {}/{} (stored {:?}, found {:016x})",
                                doc.directory, doc.title, doc.hash, hash
                            );
                            mismatched.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                    Err(err) => {
                        error!("Error hashing {}: {}", path.display(), err);
                        read_failures.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
            Ok::<(), Error>(())
        })?;

        let stats = CleanupStats {
            examined,
            removed: removed.into_inner(),
            verified: verified.into_inner(),
            mismatched: mismatched.into_inner(),
            read_failures: read_failures.into_inner(),
        };
        let secs = start.elapsed().as_secs_f64();
        info!(
            "Cleanup examined {} documents in {:.2}s: {} removed, {} mismatched",
            stats.examined, secs, stats.removed, stats.mismatched,
        );
        reporter.on_cleanup_complete(stats.removed, stats.mismatched, secs);
        Ok(stats)
    }

    pub fn find_by_hash(&self, hash: u64) -> Result<Vec<Document>, Error> {
        self.store.find_by_hash(hash)
    }

    /// Case-insensitive exact-title lookup.
    pub fn find_by_title(&self, title: &str) -> Result<Vec<Document>, Error> {
        self.store.find_by_title(title)
    }

    /// Write every distinct title, one per line. Returns how many.
    pub fn dump_titles(&self, out: &mut dyn Write) -> Result<usize, Error> {
        let titles: BTreeSet<String> = self
            .store
            .all_documents()?
            .into_iter()
            .map(|doc| doc.title)
            .collect();
        for title in &titles {
            writeln!(out, "{}", title)?;
        }
        Ok(titles.len())
    }

    pub fn count(&self) -> Result<usize, Error> {
        self.store.count()
    }
}
