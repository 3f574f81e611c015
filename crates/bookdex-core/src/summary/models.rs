use std::collections::BTreeMap;

/// One row of the disposable library snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub file_type: String,
    pub directory: String,
    pub title: String,
    pub size: i64,
    /// Unix seconds.
    pub mtime: i64,
}

/// Document counts by directory and by top-level root.
///
/// The root aggregate and total are always derived from the per-directory
/// counts, never patched incrementally.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LibrarySummary {
    pub by_directory: BTreeMap<String, u64>,
    pub by_root: BTreeMap<String, u64>,
    pub total: u64,
}

impl LibrarySummary {
    pub fn from_directory_counts(by_directory: BTreeMap<String, u64>) -> Self {
        let mut by_root: BTreeMap<String, u64> = BTreeMap::new();
        let mut total = 0;
        for (dir, count) in &by_directory {
            let root = dir.split('/').next().unwrap_or(dir).to_string();
            *by_root.entry(root).or_insert(0) += count;
            total += count;
        }
        LibrarySummary {
            by_directory,
            by_root,
            total,
        }
    }
}
