use std::fs;

use surge::quarantine::{QuarantineStore, DEFAULT_RETENTION_DAYS};
use surge::{CancelToken, SurgeError};

use crate::common::{age, write_bytes, write_file, Sandbox};

fn store(sandbox: &Sandbox) -> QuarantineStore {
    QuarantineStore::open(&sandbox.quarantine).unwrap()
}

#[test]
fn test_open_creates_the_root() {
    let sandbox = Sandbox::new();
    assert!(!sandbox.quarantine.exists());

    let store = store(&sandbox);
    assert!(sandbox.quarantine.is_dir());
    assert_eq!(store.root(), sandbox.quarantine.as_path());
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn test_equal_names_never_collide() {
    let sandbox = Sandbox::new();
    let store = store(&sandbox);
    let first = sandbox.home.join("a/report.pdf");
    let second = sandbox.home.join("b/report.pdf");
    write_bytes(&first, b"first");
    write_bytes(&second, b"second");

    let one = store.quarantine(&first, 5).unwrap();
    let two = store.quarantine(&second, 6).unwrap();

    assert_ne!(one.quarantine_path, two.quarantine_path);
    assert_eq!(fs::read(&one.quarantine_path).unwrap(), b"first");
    assert_eq!(fs::read(&two.quarantine_path).unwrap(), b"second");
    let name = two.quarantine_path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.ends_with("_report.pdf") || name.ends_with("_report.pdf (1)"), "{}", name);
}

#[test]
fn test_list_reports_original_names() {
    let sandbox = Sandbox::new();
    let store = store(&sandbox);
    write_file(&sandbox.home.join("big.iso"), 4096);
    write_file(&sandbox.home.join("cache/x"), 100);
    write_file(&sandbox.home.join("cache/y"), 200);
    store.quarantine(&sandbox.home.join("big.iso"), 4096).unwrap();
    store.quarantine(&sandbox.home.join("cache"), 300).unwrap();
    write_file(&sandbox.quarantine.join("stray"), 1);

    let entries = store.list().unwrap();

    assert_eq!(entries.len(), 3);
    // Entries without a timestamp sort first
    assert_eq!(entries[0].original_name, "stray");
    assert!(entries[0].quarantined_at.is_none());

    let cache = entries.iter().find(|e| e.original_name == "cache").unwrap();
    assert!(cache.is_directory);
    assert_eq!(cache.size_bytes, 300);
    assert!(cache.quarantined_at.is_some());
    let iso = entries.iter().find(|e| e.original_name == "big.iso").unwrap();
    assert_eq!(iso.size_bytes, 4096);
}

#[test]
fn test_purge_removes_only_expired_entries() {
    let sandbox = Sandbox::new();
    let store = store(&sandbox);
    write_file(&sandbox.home.join("old.bin"), 1000);
    write_file(&sandbox.home.join("new.bin"), 2000);
    let old = store.quarantine(&sandbox.home.join("old.bin"), 1000).unwrap();
    let new = store.quarantine(&sandbox.home.join("new.bin"), 2000).unwrap();
    age(&old.quarantine_path, DEFAULT_RETENTION_DAYS + 1);

    let report = store.purge(DEFAULT_RETENTION_DAYS, &CancelToken::none()).unwrap();

    assert_eq!(report.removed, 1);
    assert_eq!(report.freed_bytes, 1000);
    assert!(report.errors.is_empty());
    assert!(!old.quarantine_path.exists());
    assert!(new.quarantine_path.exists());

    // A second sweep finds nothing more to do
    let again = store.purge(DEFAULT_RETENTION_DAYS, &CancelToken::none()).unwrap();
    assert_eq!(again.removed, 0);
    assert!(new.quarantine_path.exists());
}

#[test]
fn test_retention_starts_at_quarantine_time() {
    let sandbox = Sandbox::new();
    let store = store(&sandbox);
    let ancient = sandbox.home.join("ancient.log");
    write_file(&ancient, 500);
    age(&ancient, 400);

    let record = store.quarantine(&ancient, 500).unwrap();
    let report = store.purge(30, &CancelToken::none()).unwrap();

    assert_eq!(report.removed, 0);
    assert!(record.quarantine_path.exists());
}

#[test]
fn test_purge_removes_expired_directories() {
    let sandbox = Sandbox::new();
    let store = store(&sandbox);
    let dir = sandbox.home.join("node_modules");
    write_file(&dir.join("a/index.js"), 700);
    write_file(&dir.join("b/index.js"), 300);
    let record = store.quarantine(&dir, 1000).unwrap();
    age(&record.quarantine_path, 45);

    let report = store.purge(30, &CancelToken::none()).unwrap();

    assert_eq!(report.removed, 1);
    assert_eq!(report.freed_bytes, 1000);
    assert!(!record.quarantine_path.exists());
}

#[test]
fn test_purge_rejects_zero_days() {
    let sandbox = Sandbox::new();
    assert!(matches!(
        store(&sandbox).purge(0, &CancelToken::none()),
        Err(SurgeError::InvalidRequest { .. })
    ));
}

#[test]
fn test_restore_refuses_an_occupied_location() {
    let sandbox = Sandbox::new();
    let store = store(&sandbox);
    let path = sandbox.home.join("config.json");
    write_bytes(&path, b"{}");
    let record = store.quarantine(&path, 2).unwrap();
    write_bytes(&path, b"{\"new\": true}");

    assert!(matches!(store.restore(&record), Err(SurgeError::OperationFailed { .. })));
    assert!(record.quarantine_path.exists());
    assert_eq!(fs::read(&path).unwrap(), b"{\"new\": true}");
}

#[test]
fn test_restore_recreates_missing_parents() {
    let sandbox = Sandbox::new();
    let store = store(&sandbox);
    let path = sandbox.home.join("deep/tree/file.txt");
    write_bytes(&path, b"payload");
    let record = store.quarantine(&path, 7).unwrap();
    fs::remove_dir_all(sandbox.home.join("deep")).unwrap();

    store.restore(&record).unwrap();
    assert_eq!(fs::read(&path).unwrap(), b"payload");
}

#[test]
fn test_restore_only_from_inside_the_root() {
    let sandbox = Sandbox::new();
    let store = store(&sandbox);
    let path = sandbox.home.join("x.txt");
    write_bytes(&path, b"x");
    let mut record = store.quarantine(&path, 1).unwrap();
    record.quarantine_path = sandbox.home.join("elsewhere");

    assert!(matches!(store.restore(&record), Err(SurgeError::InvalidRequest { .. })));
}
