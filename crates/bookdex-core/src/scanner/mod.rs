//! Recursive directory scanning over the declared library roots.

mod walk;

pub use walk::Scan;

use crate::config::{self, AppConfig};
use dashmap::DashMap;
use glob::Pattern;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::SystemTime;
use tracing::{error, info};

/// A classified file produced by one scan pass.
///
/// Ephemeral: records are rebuilt from the filesystem on every scan and are
/// never persisted as-is.
#[derive(Debug, Clone)]
pub struct FileRecord {
    /// Path relative to the library root, `/`-joined; the first segment is
    /// the declared root the file was found under.
    pub directory: String,
    /// Logical title, separator token decoded.
    pub title: String,
    /// Lowercase extension tag, possibly multi-part (`"tar.gz"`); empty if
    /// the name could not be classified.
    pub file_type: String,
    pub size: u64,
    pub mtime: SystemTime,
    /// Handle to re-open the underlying file for hashing.
    pub path: PathBuf,
}

/// Per-directory file counts for one scan pass.
///
/// Every visited directory is present, empty ones with a zero count. The
/// per-root aggregate is always recomputed from the per-directory map.
#[derive(Debug, Default)]
pub struct DirectoryCounters {
    counts: DashMap<String, u64>,
}

impl DirectoryCounters {
    pub fn register(&self, dir: &str) {
        self.counts.entry(dir.to_string()).or_insert(0);
    }

    pub fn increment(&self, dir: &str) {
        *self.counts.entry(dir.to_string()).or_insert(0) += 1;
    }

    pub fn by_directory(&self) -> BTreeMap<String, u64> {
        self.counts
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }

    /// Counts aggregated by top-level root (first path segment).
    pub fn by_root(&self) -> BTreeMap<String, u64> {
        let mut roots: BTreeMap<String, u64> = BTreeMap::new();
        for entry in self.counts.iter() {
            let root = entry
                .key()
                .split('/')
                .next()
                .unwrap_or(entry.key())
                .to_string();
            *roots.entry(root).or_insert(0) += *entry.value();
        }
        roots
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|entry| *entry.value()).sum()
    }
}

/// Recursive scanner over the configured library roots.
pub struct Scanner {
    library_root: PathBuf,
    root_dirs: Vec<String>,
    ignore_patterns: Vec<Pattern>,
}

impl Scanner {
    pub fn new(config: &AppConfig) -> Self {
        let root_dirs = config::non_overlapping_roots(config.root_dirs.clone());
        info!("Scanning roots: {:?}", root_dirs);

        let ignore_patterns = config
            .ignore_patterns
            .iter()
            .filter_map(|glob| match Pattern::new(glob) {
                Ok(pattern) => Some(pattern),
                Err(err) => {
                    error!("Invalid glob pattern '{}': {}", glob, err);
                    None
                }
            })
            .collect();

        Scanner {
            library_root: PathBuf::from(&config.library_root),
            root_dirs,
            ignore_patterns,
        }
    }

    pub fn library_root(&self) -> &PathBuf {
        &self.library_root
    }

    /// Start a single-pass scan.
    ///
    /// The returned iterator is not restartable; call `scan` again for a
    /// fresh pass.
    pub fn scan(&self) -> Scan<'_> {
        Scan::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn scanner_for(root: &std::path::Path, root_dirs: &[&str]) -> Scanner {
        let config = AppConfig {
            library_root: root.to_string_lossy().into_owned(),
            root_dirs: root_dirs.iter().map(|s| s.to_string()).collect(),
            ignore_patterns: vec![],
            summary_db: "book-list.sqlite".to_string(),
            sync_store: "book-index.rocks".to_string(),
        };
        Scanner::new(&config)
    }

    #[test]
    fn test_scan_classifies_and_counts() {
        let tmp = tempdir().unwrap();
        let books = tmp.path().join("Books");
        fs::create_dir_all(books.join("Archive")).unwrap();
        fs::write(books.join("report.pdf"), vec![0u8; 150]).unwrap();
        fs::write(books.join("Archive").join("data.tar.gz"), vec![0u8; 50]).unwrap();

        let scanner = scanner_for(tmp.path(), &["Books"]);
        let scan = scanner.scan();
        let counters = scan.counters();
        let records: Vec<FileRecord> = scan.collect();

        assert_eq!(records.len(), 2);
        let report = records.iter().find(|r| r.title == "report").unwrap();
        assert_eq!(report.directory, "Books");
        assert_eq!(report.file_type, "pdf");
        assert_eq!(report.size, 150);

        let data = records.iter().find(|r| r.title == "data").unwrap();
        assert_eq!(data.directory, "Books/Archive");
        assert_eq!(data.file_type, "tar.gz");

        let by_dir = counters.by_directory();
        assert_eq!(by_dir.get("Books"), Some(&1));
        assert_eq!(by_dir.get("Books/Archive"), Some(&1));
        assert_eq!(counters.total(), 2);
    }

    #[test]
    fn test_empty_directories_register_with_zero() {
        let tmp = tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("Papers").join("Drafts")).unwrap();

        let scanner = scanner_for(tmp.path(), &["Papers"]);
        let scan = scanner.scan();
        let counters = scan.counters();
        let records: Vec<FileRecord> = scan.collect();

        assert!(records.is_empty());
        let by_dir = counters.by_directory();
        assert_eq!(by_dir.get("Papers"), Some(&0));
        assert_eq!(by_dir.get("Papers/Drafts"), Some(&0));
    }

    #[test]
    fn test_directories_visited_in_sorted_order() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().join("Docs");
        for sub in ["zeta", "alpha", "midway"] {
            fs::create_dir_all(root.join(sub)).unwrap();
            fs::write(root.join(sub).join("file.txt"), "x").unwrap();
        }
        fs::write(root.join("top.txt"), "x").unwrap();

        let scanner = scanner_for(tmp.path(), &["Docs"]);
        let dirs: Vec<String> = scanner.scan().map(|r| r.directory).collect();

        assert_eq!(
            dirs,
            vec!["Docs", "Docs/alpha", "Docs/midway", "Docs/zeta"]
        );
    }

    #[test]
    fn test_titles_are_decoded() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().join("Books");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("AC%2fDC live.txt"), "riff").unwrap();

        let scanner = scanner_for(tmp.path(), &["Books"]);
        let records: Vec<FileRecord> = scanner.scan().collect();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "AC/DC live");
        assert_eq!(records[0].file_type, "txt");
    }

    #[test]
    fn test_missing_root_is_skipped() {
        let tmp = tempdir().unwrap();
        let books = tmp.path().join("Books");
        fs::create_dir_all(&books).unwrap();
        fs::write(books.join("a.txt"), "x").unwrap();

        let scanner = scanner_for(tmp.path(), &["NoSuchRoot", "Books"]);
        let scan = scanner.scan();
        let counters = scan.counters();
        let records: Vec<FileRecord> = scan.collect();

        assert_eq!(records.len(), 1);
        // The unreadable root is still registered, with nothing under it.
        assert_eq!(counters.by_directory().get("NoSuchRoot"), Some(&0));
    }

    #[test]
    fn test_root_aggregate_matches_directory_sum() {
        let counters = DirectoryCounters::default();
        counters.register("Books");
        counters.increment("Books");
        counters.increment("Books/Archive");
        counters.increment("Books/Archive");
        counters.increment("Papers");

        let by_root = counters.by_root();
        assert_eq!(by_root.get("Books"), Some(&3));
        assert_eq!(by_root.get("Papers"), Some(&1));
        assert_eq!(counters.total(), 4);
    }
}
