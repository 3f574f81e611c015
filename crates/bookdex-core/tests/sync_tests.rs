use std::fs;
use std::path::Path;

use bookdex_core::scanner::Scanner;
use bookdex_core::sync::SyncIndex;
use bookdex_core::{hasher, AppConfig, Library, SilentReporter};
use tempfile::tempdir;

fn test_config(library_root: &Path, root_dirs: &[&str]) -> AppConfig {
    AppConfig {
        library_root: library_root.to_string_lossy().into_owned(),
        root_dirs: root_dirs.iter().map(|s| s.to_string()).collect(),
        ignore_patterns: vec![],
        summary_db: "book-list.sqlite".to_string(),
        sync_store: "book-index.rocks".to_string(),
    }
}

fn open_index(config: &AppConfig) -> SyncIndex {
    SyncIndex::open(
        &config.sync_store_path(),
        Path::new(&config.library_root).to_path_buf(),
    )
    .unwrap()
}

/// The layout from the reconciliation walkthrough:
///   Documents/report.pdf          (150000 bytes)
///   Documents/Archive/data.tar.gz (50000 bytes)
fn create_document_tree(root: &Path) {
    let documents = root.join("Documents");
    fs::create_dir_all(documents.join("Archive")).unwrap();
    fs::write(documents.join("report.pdf"), vec![0x25u8; 150_000]).unwrap();
    fs::write(
        documents.join("Archive").join("data.tar.gz"),
        vec![0x1fu8; 50_000],
    )
    .unwrap();
}

#[test]
fn test_check_new_inserts_classified_documents() {
    let tmp = tempdir().unwrap();
    create_document_tree(tmp.path());
    let config = test_config(tmp.path(), &["Documents"]);
    let scanner = Scanner::new(&config);
    let index = open_index(&config);

    let stats = index.check_new(&scanner, &SilentReporter).unwrap();
    assert_eq!(stats.scanned, 2);
    assert_eq!(stats.inserted, 2);
    assert_eq!(stats.updated, 0);
    assert_eq!(stats.hash_failures, 0);
    assert_eq!(index.count().unwrap(), 2);

    let report = index.find_by_title("report").unwrap();
    assert_eq!(report.len(), 1);
    assert_eq!(report[0].file_type, "pdf");
    assert_eq!(report[0].directory, "Documents");
    assert_eq!(report[0].size, 150_000);
    assert!(report[0].hash.is_some());

    let data = index.find_by_title("data").unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0].file_type, "tar.gz");
    assert_eq!(data[0].directory, "Documents/Archive");
    assert_eq!(data[0].size, 50_000);
    assert!(data[0].hash.is_some());
}

#[test]
fn test_check_new_is_idempotent() {
    let tmp = tempdir().unwrap();
    create_document_tree(tmp.path());
    let config = test_config(tmp.path(), &["Documents"]);
    let scanner = Scanner::new(&config);
    let index = open_index(&config);

    index.check_new(&scanner, &SilentReporter).unwrap();
    let second = index.check_new(&scanner, &SilentReporter).unwrap();

    assert_eq!(second.scanned, 2);
    assert_eq!(second.inserted, 0);
    assert_eq!(second.updated, 0);
    assert_eq!(second.backfilled, 0);
    assert_eq!(index.count().unwrap(), 2);
}

#[test]
fn test_change_detection_triggers_rehash() {
    let tmp = tempdir().unwrap();
    let documents = tmp.path().join("Documents");
    fs::create_dir_all(&documents).unwrap();
    fs::write(documents.join("notes.txt"), "AAAA").unwrap();

    let config = test_config(tmp.path(), &["Documents"]);
    let scanner = Scanner::new(&config);
    let index = open_index(&config);

    index.check_new(&scanner, &SilentReporter).unwrap();
    let before = index.find_by_title("notes").unwrap()[0].clone();

    // Same size, new content: only mtime and hash should change.
    fs::write(documents.join("notes.txt"), "BBBB").unwrap();
    let stats = index.check_new(&scanner, &SilentReporter).unwrap();

    assert_eq!(stats.inserted, 0);
    assert_eq!(stats.updated, 1);

    let after = index.find_by_title("notes").unwrap()[0].clone();
    assert_eq!(after.size, before.size);
    assert_ne!(after.hash, before.hash);
    assert_eq!(
        after.hash.unwrap(),
        hasher::hash_file(&documents.join("notes.txt")).unwrap()
    );
}

#[test]
fn test_same_title_and_type_in_two_directories_are_distinct() {
    let tmp = tempdir().unwrap();
    let documents = tmp.path().join("Documents");
    fs::create_dir_all(documents.join("Archive")).unwrap();
    fs::write(documents.join("ledger.txt"), "current year").unwrap();
    fs::write(documents.join("Archive").join("ledger.txt"), "prior year").unwrap();

    let config = test_config(tmp.path(), &["Documents"]);
    let scanner = Scanner::new(&config);
    let index = open_index(&config);

    let stats = index.check_new(&scanner, &SilentReporter).unwrap();
    assert_eq!(stats.inserted, 2);

    let matches = index.find_by_title("ledger").unwrap();
    assert_eq!(matches.len(), 2);
    let dirs: Vec<&str> = matches.iter().map(|d| d.directory.as_str()).collect();
    assert!(dirs.contains(&"Documents"));
    assert!(dirs.contains(&"Documents/Archive"));
    assert_ne!(matches[0].hash, matches[1].hash);
}

#[test]
fn test_cleanup_removes_exactly_the_stale_document() {
    let tmp = tempdir().unwrap();
    create_document_tree(tmp.path());
    let config = test_config(tmp.path(), &["Documents"]);
    let scanner = Scanner::new(&config);
    let index = open_index(&config);

    index.check_new(&scanner, &SilentReporter).unwrap();
    assert_eq!(index.count().unwrap(), 2);

    fs::remove_file(tmp.path().join("Documents").join("report.pdf")).unwrap();
    let stats = index.cleanup(false, &SilentReporter).unwrap();

    assert_eq!(stats.examined, 2);
    assert_eq!(stats.removed, 1);
    assert_eq!(index.count().unwrap(), 1);
    assert!(index.find_by_title("report").unwrap().is_empty());
    assert_eq!(index.find_by_title("data").unwrap().len(), 1);
}

#[test]
fn test_cleanup_check_hash_reports_but_does_not_repair() {
    let tmp = tempdir().unwrap();
    let documents = tmp.path().join("Documents");
    fs::create_dir_all(&documents).unwrap();
    fs::write(documents.join("notes.txt"), "AAAA").unwrap();

    let config = test_config(tmp.path(), &["Documents"]);
    let scanner = Scanner::new(&config);
    let index = open_index(&config);

    index.check_new(&scanner, &SilentReporter).unwrap();
    let stored = index.find_by_title("notes").unwrap()[0].clone();

    // Change the content behind the store's back.
    fs::write(documents.join("notes.txt"), "BBBB").unwrap();
    let stats = index.cleanup(true, &SilentReporter).unwrap();

    assert_eq!(stats.examined, 1);
    assert_eq!(stats.removed, 0);
    assert_eq!(stats.verified, 1);
    assert_eq!(stats.mismatched, 1);

    // The stored hash is intentionally left alone; repair is check_new's job.
    let after = index.find_by_title("notes").unwrap()[0].clone();
    assert_eq!(after.hash, stored.hash);
}

#[test]
fn test_escaped_titles_survive_cleanup() {
    let tmp = tempdir().unwrap();
    let documents = tmp.path().join("Documents");
    fs::create_dir_all(&documents).unwrap();
    fs::write(documents.join("AC%2fDC live.txt"), "riff").unwrap();

    let config = test_config(tmp.path(), &["Documents"]);
    let scanner = Scanner::new(&config);
    let index = open_index(&config);

    index.check_new(&scanner, &SilentReporter).unwrap();
    let matches = index.find_by_title("AC/DC live").unwrap();
    assert_eq!(matches.len(), 1);

    // The expected path is rebuilt with the separator re-encoded, so the
    // document must not be treated as stale.
    let stats = index.cleanup(true, &SilentReporter).unwrap();
    assert_eq!(stats.removed, 0);
    assert_eq!(stats.mismatched, 0);
    assert_eq!(index.count().unwrap(), 1);

    fs::remove_file(documents.join("AC%2fDC live.txt")).unwrap();
    let stats = index.cleanup(false, &SilentReporter).unwrap();
    assert_eq!(stats.removed, 1);
    assert_eq!(index.count().unwrap(), 0);
}

#[test]
fn test_unclassified_files_round_trip_without_extension_dot() {
    let tmp = tempdir().unwrap();
    let documents = tmp.path().join("Documents");
    fs::create_dir_all(&documents).unwrap();
    fs::write(documents.join("README"), "plain").unwrap();

    let config = test_config(tmp.path(), &["Documents"]);
    let scanner = Scanner::new(&config);
    let index = open_index(&config);

    index.check_new(&scanner, &SilentReporter).unwrap();
    let matches = index.find_by_title("readme").unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].file_type, "");

    let stats = index.cleanup(true, &SilentReporter).unwrap();
    assert_eq!(stats.removed, 0);
    assert_eq!(stats.mismatched, 0);
}

#[test]
fn test_find_by_hash_and_title_lookups() {
    let tmp = tempdir().unwrap();
    create_document_tree(tmp.path());
    let config = test_config(tmp.path(), &["Documents"]);
    let scanner = Scanner::new(&config);
    let index = open_index(&config);

    index.check_new(&scanner, &SilentReporter).unwrap();

    let report_hash = hasher::hash_file(
        &tmp.path().join("Documents").join("report.pdf"),
    )
    .unwrap();
    let by_hash = index.find_by_hash(report_hash).unwrap();
    assert_eq!(by_hash.len(), 1);
    assert_eq!(by_hash[0].title, "report");

    // Title lookup is case-insensitive.
    let by_title = index.find_by_title("REPORT").unwrap();
    assert_eq!(by_title.len(), 1);
    assert_eq!(by_title[0].title, "report");

    assert!(index.find_by_hash(report_hash.wrapping_add(1)).unwrap().is_empty());
}

#[test]
fn test_hash_index_tracks_updates() {
    let tmp = tempdir().unwrap();
    let documents = tmp.path().join("Documents");
    fs::create_dir_all(&documents).unwrap();
    fs::write(documents.join("notes.txt"), "AAAA").unwrap();

    let config = test_config(tmp.path(), &["Documents"]);
    let scanner = Scanner::new(&config);
    let index = open_index(&config);

    index.check_new(&scanner, &SilentReporter).unwrap();
    let old_hash = index.find_by_title("notes").unwrap()[0].hash.unwrap();
    // Force the hash index into existence before the update.
    assert_eq!(index.find_by_hash(old_hash).unwrap().len(), 1);

    fs::write(documents.join("notes.txt"), "BBBB").unwrap();
    index.check_new(&scanner, &SilentReporter).unwrap();

    let new_hash = index.find_by_title("notes").unwrap()[0].hash.unwrap();
    assert!(index.find_by_hash(old_hash).unwrap().is_empty());
    assert_eq!(index.find_by_hash(new_hash).unwrap().len(), 1);
}

#[test]
fn test_dump_titles_is_distinct() {
    let tmp = tempdir().unwrap();
    let documents = tmp.path().join("Documents");
    fs::create_dir_all(documents.join("Archive")).unwrap();
    fs::write(documents.join("ledger.txt"), "current").unwrap();
    fs::write(documents.join("Archive").join("ledger.txt"), "prior").unwrap();
    fs::write(documents.join("report.pdf"), "body").unwrap();

    let config = test_config(tmp.path(), &["Documents"]);
    let scanner = Scanner::new(&config);
    let index = open_index(&config);
    index.check_new(&scanner, &SilentReporter).unwrap();

    let mut out = Vec::new();
    let count = index.dump_titles(&mut out).unwrap();
    assert_eq!(count, 2);
    let text = String::from_utf8(out).unwrap();
    let mut lines: Vec<&str> = text.lines().collect();
    lines.sort();
    assert_eq!(lines, vec!["ledger", "report"]);
}

#[test]
fn test_library_facade_end_to_end() {
    let tmp = tempdir().unwrap();
    create_document_tree(tmp.path());
    let config = test_config(tmp.path(), &["Documents"]);

    let library = Library::open(config).unwrap();

    let rows = library.list(&SilentReporter).unwrap();
    let titles: Vec<&str> = rows.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["data", "report"]);

    let summary = library.summarize(&SilentReporter).unwrap();
    assert_eq!(summary.by_root.get("Documents"), Some(&2));
    assert_eq!(summary.total, 2);

    let stats = library.rescan(&SilentReporter).unwrap();
    assert_eq!(stats.inserted, 2);
    assert_eq!(library.count().unwrap(), 2);

    fs::remove_file(tmp.path().join("Documents").join("report.pdf")).unwrap();
    let cleanup = library.cleanup(false, &SilentReporter).unwrap();
    assert_eq!(cleanup.removed, 1);
    assert_eq!(library.count().unwrap(), 1);

    let reloaded = library.reload(&SilentReporter).unwrap();
    assert_eq!(reloaded, 1);
}
