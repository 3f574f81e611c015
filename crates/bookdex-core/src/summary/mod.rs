//! The summary snapshot: a disposable, wholesale-rebuilt SQLite listing
//! used for fast browsing. Distinct from the incrementally maintained sync
//! store.

mod models;
mod sqlite;

pub use models::{LibrarySummary, SummaryRow};
pub use sqlite::Database;

use crate::error::Error;
use crate::progress::ProgressReporter;
use crate::scanner::{DirectoryCounters, Scanner};
use rusqlite::params;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Instant, UNIX_EPOCH};
use tracing::info;

/// Rename the freshly populated table into place and rebuild the lookup
/// indexes, dropping any previous snapshot in the same transaction.
const SWAP_SQL: &str = "DROP TABLE IF EXISTS book;
ALTER TABLE book_new RENAME TO book;
CREATE INDEX idx_book_title ON book (title ASC);
CREATE INDEX idx_book_dir ON book (dir);
CREATE INDEX idx_book_type ON book (type);";

pub struct SummaryIndex {
    db: Database,
    /// Counters from the most recent rebuild, if one happened in-process.
    counters: Mutex<Option<Arc<DirectoryCounters>>>,
}

impl SummaryIndex {
    pub fn open(path: &Path) -> Result<Self, Error> {
        Ok(SummaryIndex {
            db: Database::open(path)?,
            counters: Mutex::new(None),
        })
    }

    pub fn open_in_memory() -> Result<Self, Error> {
        Ok(SummaryIndex {
            db: Database::open_in_memory()?,
            counters: Mutex::new(None),
        })
    }

    /// Wholesale rebuild from a fresh scan pass. Returns the row count.
    ///
    /// The new snapshot is populated into a side table and swapped in at
    /// commit, so a failed rebuild never leaves a partial snapshot behind.
    pub fn rebuild(
        &self,
        scanner: &Scanner,
        reporter: &dyn ProgressReporter,
    ) -> Result<usize, Error> {
        reporter.on_rebuild_start();
        reporter.on_scan_start();
        let start = Instant::now();

        let scan = scanner.scan();
        let counters = scan.counters();

        let tx = self.db.connection().unchecked_transaction()?;
        tx.execute_batch("DROP TABLE IF EXISTS book_new;")?;
        tx.execute_batch(include_str!("schema.sql"))?;

        let mut rows = 0;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO book_new (type, dir, title, fsize, mtime) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for record in scan {
                let mtime = record
                    .mtime
                    .duration_since(UNIX_EPOCH)
                    .ok()
                    .map(|d| d.as_secs() as i64)
                    .unwrap_or(0);
                stmt.execute(params![
                    record.file_type,
                    record.directory,
                    record.title,
                    record.size as i64,
                    mtime,
                ])?;
                rows += 1;
                reporter.on_scan_progress(rows, &record.directory);
            }
        }
        tx.execute_batch(SWAP_SQL)?;
        tx.commit()?;

        *self.counters.lock().unwrap() = Some(counters);

        let secs = start.elapsed().as_secs_f64();
        info!("Summary snapshot rebuilt: {} rows in {:.2}s", rows, secs);
        reporter.on_rebuild_complete(rows, secs);
        Ok(rows)
    }

    /// All rows ordered by title ascending.
    ///
    /// Lazily materializes the snapshot if none exists yet.
    pub fn list(
        &self,
        scanner: &Scanner,
        reporter: &dyn ProgressReporter,
    ) -> Result<Vec<SummaryRow>, Error> {
        self.ensure_snapshot(scanner, reporter)?;

        let mut stmt = self.db.connection().prepare_cached(
            "SELECT type, dir, title, fsize, mtime FROM book ORDER BY title ASC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(SummaryRow {
                    file_type: row.get(0)?,
                    directory: row.get(1)?,
                    title: row.get(2)?,
                    size: row.get(3)?,
                    mtime: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Per-directory counts plus the derived per-root aggregate.
    ///
    /// Counters cached from an in-process rebuild are preferred; otherwise
    /// the counts are recomputed from the persisted rows rather than by
    /// re-walking the filesystem.
    pub fn summarize(
        &self,
        scanner: &Scanner,
        reporter: &dyn ProgressReporter,
    ) -> Result<LibrarySummary, Error> {
        self.ensure_snapshot(scanner, reporter)?;

        if let Some(counters) = self.counters.lock().unwrap().as_ref() {
            return Ok(LibrarySummary::from_directory_counts(
                counters.by_directory(),
            ));
        }

        let mut stmt = self
            .db
            .connection()
            .prepare_cached("SELECT dir, COUNT(*) FROM book GROUP BY dir")?;
        let by_directory = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<rusqlite::Result<BTreeMap<String, u64>>>()?;
        Ok(LibrarySummary::from_directory_counts(by_directory))
    }

    fn ensure_snapshot(
        &self,
        scanner: &Scanner,
        reporter: &dyn ProgressReporter,
    ) -> Result<(), Error> {
        if !self.has_snapshot()? {
            info!("No summary snapshot found, rebuilding");
            self.rebuild(scanner, reporter)?;
        }
        Ok(())
    }

    fn has_snapshot(&self) -> Result<bool, Error> {
        let count: i64 = self.db.connection().query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'book'",
            [],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}
