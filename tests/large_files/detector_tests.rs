use std::path::PathBuf;

use surge::large_files::{LargeOldFileDetector, SizeClasses};
use surge::{CancelToken, SurgeError};

use crate::common::{age, write_file, write_sparse, Sandbox};

const MB: u64 = 1024 * 1024;

// Scenario: 150 MB modified 400 days ago, 200 MB modified 10 days ago
#[test]
fn test_size_and_age_are_both_required() {
    let sandbox = Sandbox::new();
    let root = sandbox.home.join("videos");
    let old = root.join("old-recording.mov");
    let recent = root.join("recent-recording.mov");
    write_sparse(&old, 150 * MB);
    write_sparse(&recent, 200 * MB);
    age(&old, 400);
    age(&recent, 10);

    let records = LargeOldFileDetector::new(sandbox.walker())
        .find(&[&root], 100 * MB, 365, &CancelToken::none())
        .unwrap();

    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.path, old);
    assert_eq!(record.name, "old-recording.mov");
    assert_eq!(record.size_bytes, 150 * MB);
    assert!((399..=401).contains(&record.age_days), "age {}", record.age_days);
    assert!(record.last_access_date.is_some());
}

#[test]
fn test_small_old_files_are_excluded() {
    let sandbox = Sandbox::new();
    let root = sandbox.home.join("archive");
    let small = root.join("notes.txt");
    write_file(&small, 10);
    age(&small, 1000);

    let records = LargeOldFileDetector::new(sandbox.walker())
        .find(&[&root], 1024, 30, &CancelToken::none())
        .unwrap();
    assert!(records.is_empty());
}

#[test]
fn test_sorted_by_size_and_classified() {
    let sandbox = Sandbox::new();
    let root = sandbox.home.join("disk");
    let files = [
        ("vm.qcow2", 2048 * MB),
        ("backup.tar", 600 * MB),
        ("dump.sql", 150 * MB),
        ("log.txt", 20 * MB),
    ];
    for (name, size) in files {
        let path = root.join(name);
        write_sparse(&path, size);
        age(&path, 200);
    }

    let records = LargeOldFileDetector::new(sandbox.walker())
        .find(&[&root], MB, 100, &CancelToken::none())
        .unwrap();

    let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["vm.qcow2", "backup.tar", "dump.sql", "log.txt"]);

    let classes = SizeClasses::classify(&records);
    assert_eq!(classes.huge.len(), 1);
    assert_eq!(classes.very_large.len(), 1);
    assert_eq!(classes.large.len(), 1);
    assert_eq!(classes.medium.len(), 1);
    assert_eq!(classes.total_count(), 4);
    assert_eq!(classes.total_size(), surge::large_files::total_size(&records));
}

#[test]
fn test_overlapping_roots_report_each_file_once() {
    let sandbox = Sandbox::new();
    let root = sandbox.home.join("nested");
    let file = root.join("inner/big.bin");
    write_sparse(&file, 5 * MB);
    age(&file, 60);

    let records = LargeOldFileDetector::new(sandbox.walker())
        .find(&[root.clone(), root.join("inner")], MB, 30, &CancelToken::none())
        .unwrap();
    assert_eq!(records.len(), 1);
}

#[test]
fn test_invalid_requests() {
    let sandbox = Sandbox::new();
    let detector = LargeOldFileDetector::new(sandbox.walker());
    let none: Vec<PathBuf> = Vec::new();

    assert!(matches!(
        detector.find(&none, MB, 30, &CancelToken::none()),
        Err(SurgeError::InvalidRequest { .. })
    ));
    assert!(matches!(
        detector.find(&[&sandbox.home], MB, 0, &CancelToken::none()),
        Err(SurgeError::InvalidRequest { .. })
    ));
    assert!(matches!(
        detector.find(&[&sandbox.protected], MB, 30, &CancelToken::none()),
        Err(SurgeError::Blacklisted { .. })
    ));
}

#[test]
fn test_huge_age_threshold_does_not_overflow() {
    let sandbox = Sandbox::new();
    let root = sandbox.home.join("ancient");
    let file = root.join("f.bin");
    write_sparse(&file, 2 * MB);
    age(&file, 3000);

    let records = LargeOldFileDetector::new(sandbox.walker())
        .find(&[&root], MB, u64::MAX, &CancelToken::none())
        .unwrap();
    assert!(records.is_empty());
}
