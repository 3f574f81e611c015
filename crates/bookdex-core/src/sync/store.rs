use crate::classify;
use crate::error::Error;
use crate::scanner::FileRecord;
use rocksdb::{Direction, IteratorMode, Options, WriteBatch, DB};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;
use tracing::debug;

// Key space layout. Titles and types cannot contain NUL, so `\0` is a safe
// field separator and `d\0title\0type\0` is an exact (title, type) prefix.
const DOC_PREFIX: &[u8] = b"d\0";
const HASH_IDX_PREFIX: &[u8] = b"h\0";
const TITLE_IDX_PREFIX: &[u8] = b"t\0";
const HASH_MARKER: &[u8] = b"m\0hash";
const TITLE_MARKER: &[u8] = b"m\0title";

/// A persisted library document.
///
/// Identity is `(title, file_type, directory)`; the same title and type may
/// appear in several directories without colliding. The hash stays `None`
/// until first computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub title: String,
    pub file_type: String,
    pub directory: String,
    pub size: u64,
    pub mtime: SystemTime,
    pub hash: Option<u64>,
}

impl Document {
    pub fn from_record(record: &FileRecord, hash: Option<u64>) -> Document {
        Document {
            title: record.title.clone(),
            file_type: record.file_type.clone(),
            directory: record.directory.clone(),
            size: record.size,
            mtime: record.mtime,
            hash,
        }
    }

    /// Expected on-disk location, with the title re-escaped.
    pub fn expected_path(&self, library_root: &Path) -> PathBuf {
        library_root
            .join(&self.directory)
            .join(classify::file_name_for(&self.title, &self.file_type))
    }
}

/// Durable document store on RocksDB with bincode-serialized values.
///
/// Secondary hash and title lookups are served from index entries in the
/// same key space; each index is built on first use (its marker key records
/// that) and maintained on every mutation from then on.
pub struct SyncStore {
    db: DB,
    hash_indexed: AtomicBool,
    title_indexed: AtomicBool,
}

impl SyncStore {
    pub fn open(path: &Path) -> Result<SyncStore, Error> {
        let mut db_options = Options::default();
        db_options.create_if_missing(true);
        let db = DB::open(&db_options, path)?;
        debug!("Using '{}' for sync store", path.display());

        let hash_indexed = AtomicBool::new(db.get(HASH_MARKER)?.is_some());
        let title_indexed = AtomicBool::new(db.get(TITLE_MARKER)?.is_some());
        Ok(SyncStore {
            db,
            hash_indexed,
            title_indexed,
        })
    }

    fn identity_key(title: &str, file_type: &str, directory: &str) -> Vec<u8> {
        let mut key =
            Vec::with_capacity(title.len() + file_type.len() + directory.len() + 2);
        key.extend_from_slice(title.as_bytes());
        key.push(0);
        key.extend_from_slice(file_type.as_bytes());
        key.push(0);
        key.extend_from_slice(directory.as_bytes());
        key
    }

    fn doc_key(title: &str, file_type: &str, directory: &str) -> Vec<u8> {
        let mut key = DOC_PREFIX.to_vec();
        key.extend_from_slice(&Self::identity_key(title, file_type, directory));
        key
    }

    fn hash_idx_key(hash: u64, doc: &Document) -> Vec<u8> {
        let mut key = HASH_IDX_PREFIX.to_vec();
        key.extend_from_slice(format!("{:016x}", hash).as_bytes());
        key.push(0);
        key.extend_from_slice(&Self::identity_key(
            &doc.title,
            &doc.file_type,
            &doc.directory,
        ));
        key
    }

    fn title_idx_key(doc: &Document) -> Vec<u8> {
        let mut key = TITLE_IDX_PREFIX.to_vec();
        key.extend_from_slice(doc.title.to_lowercase().as_bytes());
        key.push(0);
        key.extend_from_slice(&Self::identity_key(
            &doc.title,
            &doc.file_type,
            &doc.directory,
        ));
        key
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Box<[u8]>, Box<[u8]>)>, Error> {
        let mut entries = Vec::new();
        for item in self
            .db
            .iterator(IteratorMode::From(prefix, Direction::Forward))
        {
            let (key, value) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            entries.push((key, value));
        }
        Ok(entries)
    }

    /// All documents sharing `(title, file_type)`, across directories.
    pub fn find_matching(&self, title: &str, file_type: &str) -> Result<Vec<Document>, Error> {
        let prefix = Self::doc_key(title, file_type, "");
        self.scan_prefix(&prefix)?
            .iter()
            .map(|(_, value)| Ok(bincode::deserialize(value)?))
            .collect()
    }

    /// Insert or overwrite a document, maintaining any built indexes.
    ///
    /// `previous` is the stored document being replaced, if any; it is
    /// needed to retire a superseded hash index entry.
    pub fn put(&self, doc: &Document, previous: Option<&Document>) -> Result<(), Error> {
        let mut batch = WriteBatch::default();
        batch.put(
            Self::doc_key(&doc.title, &doc.file_type, &doc.directory),
            bincode::serialize(doc)?,
        );
        if self.hash_indexed.load(Ordering::Acquire) {
            if let Some(prev_hash) = previous.and_then(|prev| prev.hash) {
                if doc.hash != Some(prev_hash) {
                    batch.delete(Self::hash_idx_key(prev_hash, doc));
                }
            }
            if let Some(hash) = doc.hash {
                batch.put(Self::hash_idx_key(hash, doc), b"");
            }
        }
        if self.title_indexed.load(Ordering::Acquire) {
            batch.put(Self::title_idx_key(doc), b"");
        }
        self.db.write(batch)?;
        Ok(())
    }

    pub fn remove(&self, doc: &Document) -> Result<(), Error> {
        let mut batch = WriteBatch::default();
        batch.delete(Self::doc_key(&doc.title, &doc.file_type, &doc.directory));
        if self.hash_indexed.load(Ordering::Acquire) {
            if let Some(hash) = doc.hash {
                batch.delete(Self::hash_idx_key(hash, doc));
            }
        }
        if self.title_indexed.load(Ordering::Acquire) {
            batch.delete(Self::title_idx_key(doc));
        }
        self.db.write(batch)?;
        Ok(())
    }

    /// Snapshot of every document, collected eagerly so callers may mutate
    /// the store while working through the list.
    pub fn all_documents(&self) -> Result<Vec<Document>, Error> {
        self.scan_prefix(DOC_PREFIX)?
            .iter()
            .map(|(_, value)| Ok(bincode::deserialize(value)?))
            .collect()
    }

    pub fn count(&self) -> Result<usize, Error> {
        let mut count = 0;
        for item in self
            .db
            .iterator(IteratorMode::From(DOC_PREFIX, Direction::Forward))
        {
            let (key, _) = item?;
            if !key.starts_with(DOC_PREFIX) {
                break;
            }
            count += 1;
        }
        Ok(count)
    }

    /// Build the hash index if it has not been built yet.
    pub fn ensure_hash_index(&self) -> Result<(), Error> {
        if self.hash_indexed.load(Ordering::Acquire) {
            return Ok(());
        }
        let documents = self.all_documents()?;
        let mut batch = WriteBatch::default();
        for doc in &documents {
            if let Some(hash) = doc.hash {
                batch.put(Self::hash_idx_key(hash, doc), b"");
            }
        }
        batch.put(HASH_MARKER, b"");
        self.db.write(batch)?;
        self.hash_indexed.store(true, Ordering::Release);
        debug!("Hash index built over {} documents", documents.len());
        Ok(())
    }

    /// Build the title index if it has not been built yet.
    pub fn ensure_title_index(&self) -> Result<(), Error> {
        if self.title_indexed.load(Ordering::Acquire) {
            return Ok(());
        }
        let documents = self.all_documents()?;
        let mut batch = WriteBatch::default();
        for doc in &documents {
            batch.put(Self::title_idx_key(doc), b"");
        }
        batch.put(TITLE_MARKER, b"");
        self.db.write(batch)?;
        self.title_indexed.store(true, Ordering::Release);
        debug!("Title index built over {} documents", documents.len());
        Ok(())
    }

    pub fn find_by_hash(&self, hash: u64) -> Result<Vec<Document>, Error> {
        self.ensure_hash_index()?;
        let mut prefix = HASH_IDX_PREFIX.to_vec();
        prefix.extend_from_slice(format!("{:016x}", hash).as_bytes());
        prefix.push(0);
        self.documents_for_index_entries(&prefix)
    }

    /// Case-insensitive title lookup.
    pub fn find_by_title(&self, title: &str) -> Result<Vec<Document>, Error> {
        self.ensure_title_index()?;
        let mut prefix = TITLE_IDX_PREFIX.to_vec();
        prefix.extend_from_slice(title.to_lowercase().as_bytes());
        prefix.push(0);
        self.documents_for_index_entries(&prefix)
    }

    fn documents_for_index_entries(&self, prefix: &[u8]) -> Result<Vec<Document>, Error> {
        let mut documents = Vec::new();
        for (key, _) in self.scan_prefix(prefix)? {
            let identity = &key[prefix.len()..];
            let mut doc_key = DOC_PREFIX.to_vec();
            doc_key.extend_from_slice(identity);
            if let Some(value) = self.db.get(&doc_key)? {
                documents.push(bincode::deserialize(&value)?);
            }
        }
        Ok(documents)
    }
}
