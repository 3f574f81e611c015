//! Content digests for change detection and integrity verification.
//!
//! Not a security boundary. Read errors surface as plain `io::Error`;
//! callers treat `ErrorKind::NotFound` as "file absent" where that matters
//! (cleanup tests existence separately, so absence there is a removal
//! signal, never a hashing error).

use std::fs::File;
use std::hash::Hasher as _;
use std::io::{self, Read};
use std::path::Path;
use twox_hash::XxHash64;

/// Digest of a file's full byte content.
pub fn hash_file(file: &Path) -> io::Result<u64> {
    let data = read_full_file(file)?;
    Ok(hash_data(&data))
}

pub fn read_full_file(file: &Path) -> io::Result<Vec<u8>> {
    let mut f = File::open(file)?;
    let mut buffer = Vec::new();
    f.read_to_end(&mut buffer)?;
    Ok(buffer)
}

pub fn hash_data(data: &[u8]) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(data);
    hasher.finish()
}
