use super::{DirectoryCounters, FileRecord, Scanner};
use crate::classify;
use std::collections::VecDeque;
use std::fs;
use std::sync::Arc;
use tracing::{debug, error};

/// One scan pass: a lazy, once-through iterator of [`FileRecord`]s.
///
/// All regular files of a directory are yielded (in OS enumeration order,
/// an accepted nondeterminism) before its subdirectories, which are visited
/// sorted lexicographically. Unreadable directories are logged and skipped;
/// the pass continues with the remaining siblings and roots.
pub struct Scan<'a> {
    scanner: &'a Scanner,
    counters: Arc<DirectoryCounters>,
    /// Directories yet to visit, depth-first (top of the stack is next).
    pending: Vec<String>,
    /// Records of the directory currently being drained.
    current: VecDeque<FileRecord>,
}

impl<'a> Scan<'a> {
    pub(super) fn new(scanner: &'a Scanner) -> Self {
        let pending = scanner.root_dirs.iter().rev().cloned().collect();
        Scan {
            scanner,
            counters: Arc::new(DirectoryCounters::default()),
            pending,
            current: VecDeque::new(),
        }
    }

    /// Counter handle for this pass; counts grow as the iterator advances
    /// and are complete once it is exhausted.
    pub fn counters(&self) -> Arc<DirectoryCounters> {
        Arc::clone(&self.counters)
    }

    fn visit(&mut self, dir: String) {
        let dir_path = self.scanner.library_root.join(&dir);
        if self
            .scanner
            .ignore_patterns
            .iter()
            .any(|pattern| pattern.matches_path(&dir_path))
        {
            return;
        }

        debug!("Scanning {}", dir_path.display());
        self.counters.register(&dir);

        let entries = match fs::read_dir(&dir_path) {
            Ok(entries) => entries,
            Err(err) => {
                error!("Error reading directory {}: {}", dir_path.display(), err);
                return;
            }
        };

        let mut subdirs: Vec<String> = Vec::new();
        for entry_result in entries {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(err) => {
                    error!(
                        "Error reading entry in directory {}: {}",
                        dir_path.display(),
                        err
                    );
                    continue;
                }
            };

            let entry_type = match entry.file_type() {
                Ok(entry_type) => entry_type,
                Err(err) => {
                    error!("Error getting type of {:?}: {}", entry.path(), err);
                    continue;
                }
            };

            let name = entry.file_name().to_string_lossy().into_owned();
            if entry_type.is_dir() {
                subdirs.push(name);
                continue;
            }
            if !entry_type.is_file() {
                // Symlinks and special files are not library documents.
                continue;
            }

            let path = entry.path();
            if self
                .scanner
                .ignore_patterns
                .iter()
                .any(|pattern| pattern.matches_path(&path))
            {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(err) => {
                    error!("Error getting metadata for {}: {}", path.display(), err);
                    continue;
                }
            };
            let mtime = match metadata.modified() {
                Ok(mtime) => mtime,
                Err(err) => {
                    error!("Error getting mtime for {}: {}", path.display(), err);
                    continue;
                }
            };

            let (stem, file_type) = classify::classify(&name);
            self.counters.increment(&dir);
            self.current.push_back(FileRecord {
                directory: dir.clone(),
                title: classify::decode_title(&stem),
                file_type,
                size: metadata.len(),
                mtime,
                path,
            });
        }

        subdirs.sort();
        for sub in subdirs.into_iter().rev() {
            self.pending.push(format!("{}/{}", dir, sub));
        }
    }
}

impl Iterator for Scan<'_> {
    type Item = FileRecord;

    fn next(&mut self) -> Option<FileRecord> {
        loop {
            if let Some(record) = self.current.pop_front() {
                return Some(record);
            }
            let dir = self.pending.pop()?;
            self.visit(dir);
        }
    }
}
