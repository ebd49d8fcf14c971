use std::collections::HashSet;

use surge::hash::{hash_file, total_wasted_space, DuplicateDetector, KeepPolicy};
use surge::{CancelToken, SurgeError};

#[cfg(unix)]
use crate::common::lock;
use crate::common::{age, write_bytes, write_file, Sandbox};

const MB: usize = 1024 * 1024;

fn filled(byte: u8, len: usize) -> Vec<u8> {
    vec![byte; len]
}

// Scenario: two identical 10 MB files and one different 5 MB file
#[test]
fn test_two_identical_files_form_one_group() {
    let sandbox = Sandbox::new();
    let root = sandbox.home.join("photos");
    write_bytes(&root.join("a.raw"), &filled(1, 10 * MB));
    write_bytes(&root.join("copy/a.raw"), &filled(1, 10 * MB));
    write_bytes(&root.join("b.raw"), &filled(2, 5 * MB));

    let groups = DuplicateDetector::new(sandbox.walker())
        .find_duplicates(&[&root], MB as u64, &CancelToken::none())
        .unwrap();

    assert_eq!(groups.len(), 1);
    let group = &groups[0];
    assert_eq!(group.members.len(), 2);
    assert_eq!(group.total_size, 20 * MB as u64);
    assert_eq!(group.wasted_space, 10 * MB as u64);
    assert_eq!(total_wasted_space(&groups), 10 * MB as u64);
}

#[test]
fn test_groups_are_sound() {
    let sandbox = Sandbox::new();
    let root = sandbox.home.join("mixed");
    // Same size, different content: bucketed together, never grouped
    write_bytes(&root.join("x1"), &filled(b'x', 4096));
    write_bytes(&root.join("y1"), &filled(b'y', 4096));
    write_bytes(&root.join("x2"), &filled(b'x', 4096));
    write_bytes(&root.join("y2"), &filled(b'y', 4096));
    write_bytes(&root.join("y3"), &filled(b'y', 4096));
    write_bytes(&root.join("lonely"), &filled(b'z', 9000));

    let groups = DuplicateDetector::new(sandbox.walker())
        .find_duplicates(&[&root], 1, &CancelToken::none())
        .unwrap();

    assert_eq!(groups.len(), 2);
    for group in &groups {
        assert!(group.members.len() >= 2);
        let sizes: HashSet<u64> = group.members.iter().map(|m| m.size_bytes).collect();
        assert_eq!(sizes.len(), 1);
        for member in &group.members {
            assert_eq!(hash_file(&member.path, &CancelToken::none()).unwrap(), group.content_hash);
        }
    }
    // Largest wasted space first
    assert_eq!(groups[0].members.len(), 3);
    assert_eq!(groups[0].wasted_space, 8192);
    assert_eq!(groups[1].wasted_space, 4096);
}

#[test]
fn test_min_size_excludes_small_files() {
    let sandbox = Sandbox::new();
    let root = sandbox.home.join("small");
    write_bytes(&root.join("a"), &filled(7, 100));
    write_bytes(&root.join("b"), &filled(7, 100));

    let detector = DuplicateDetector::new(sandbox.walker());
    assert!(detector.find_duplicates(&[&root], 101, &CancelToken::none()).unwrap().is_empty());
    assert_eq!(detector.find_duplicates(&[&root], 100, &CancelToken::none()).unwrap().len(), 1);
}

#[test]
fn test_empty_files_are_never_duplicates() {
    let sandbox = Sandbox::new();
    let root = sandbox.home.join("empties");
    write_file(&root.join("a"), 0);
    write_file(&root.join("b"), 0);

    let groups = DuplicateDetector::new(sandbox.walker())
        .find_duplicates(&[&root], 0, &CancelToken::none())
        .unwrap();
    assert!(groups.is_empty());
}

#[test]
fn test_overlapping_roots_count_each_file_once() {
    let sandbox = Sandbox::new();
    let root = sandbox.home.join("overlap");
    write_bytes(&root.join("inner/a"), &filled(3, 2048));
    write_bytes(&root.join("b"), &filled(3, 2048));

    let groups = DuplicateDetector::new(sandbox.walker())
        .find_duplicates(&[root.clone(), root.join("inner")], 1, &CancelToken::none())
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].members.len(), 2);
}

#[cfg(unix)]
#[test]
fn test_hard_links_are_not_duplicates() {
    let sandbox = Sandbox::new();
    let root = sandbox.home.join("links");
    write_bytes(&root.join("original"), &filled(9, 4096));
    std::fs::hard_link(root.join("original"), root.join("hardlink")).unwrap();

    let groups = DuplicateDetector::new(sandbox.walker())
        .find_duplicates(&[&root], 1, &CancelToken::none())
        .unwrap();
    assert!(groups.is_empty());
}

#[test]
fn test_members_are_ordered_oldest_first() {
    let sandbox = Sandbox::new();
    let root = sandbox.home.join("ages");
    for (name, days) in [("new", 1), ("oldest", 90), ("middle", 30)] {
        let path = root.join(name);
        write_bytes(&path, &filled(5, 3000));
        age(&path, days);
    }

    let groups = DuplicateDetector::new(sandbox.walker())
        .find_duplicates(&[&root], 1, &CancelToken::none())
        .unwrap();
    let group = &groups[0];
    let names: Vec<&str> = group.members.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["oldest", "middle", "new"]);

    let redundant: Vec<&str> = group
        .redundant_members(KeepPolicy::Oldest)
        .iter()
        .map(|m| m.name.as_str())
        .collect();
    assert_eq!(redundant, vec!["middle", "new"]);

    let redundant: Vec<&str> = group
        .redundant_members(KeepPolicy::Newest)
        .iter()
        .map(|m| m.name.as_str())
        .collect();
    assert_eq!(redundant, vec!["oldest", "middle"]);
}

#[test]
fn test_dedicated_hashing_pool() {
    let sandbox = Sandbox::new();
    let root = sandbox.home.join("pool");
    for i in 0..6 {
        write_bytes(&root.join(format!("f{}", i)), &filled(i / 2, 1024 + (i / 2) as usize));
    }

    let groups = DuplicateDetector::new(sandbox.walker())
        .with_threads(2)
        .find_duplicates(&[&root], 1, &CancelToken::none())
        .unwrap();

    assert_eq!(groups.len(), 3);
    assert!(groups.iter().all(|g| g.members.len() == 2));
    assert!(groups.windows(2).all(|w| w[0].wasted_space >= w[1].wasted_space));
}

#[test]
fn test_roots_are_authorized() {
    let sandbox = Sandbox::new();
    write_bytes(&sandbox.protected.join("a"), &filled(1, 2048));
    write_bytes(&sandbox.protected.join("b"), &filled(1, 2048));
    let detector = DuplicateDetector::new(sandbox.walker());

    assert!(matches!(
        detector.find_duplicates(&[&sandbox.protected], 1, &CancelToken::none()),
        Err(SurgeError::Blacklisted { .. })
    ));
    // A broad root never descends into the blacklisted subtree
    assert!(detector
        .find_duplicates(&[&sandbox.root], 1, &CancelToken::none())
        .unwrap()
        .is_empty());
}

#[test]
fn test_no_roots_is_invalid() {
    let sandbox = Sandbox::new();
    let roots: Vec<std::path::PathBuf> = Vec::new();
    assert!(matches!(
        DuplicateDetector::new(sandbox.walker()).find_duplicates(&roots, 1, &CancelToken::none()),
        Err(SurgeError::InvalidRequest { .. })
    ));
}

#[test]
fn test_cancelled_search() {
    let sandbox = Sandbox::new();
    let root = sandbox.home.join("cancel");
    write_bytes(&root.join("a"), &filled(1, 2048));
    write_bytes(&root.join("b"), &filled(1, 2048));
    let cancel = CancelToken::new();
    cancel.cancel();

    assert!(matches!(
        DuplicateDetector::new(sandbox.walker()).find_duplicates(&[&root], 1, &cancel),
        Err(SurgeError::Cancelled)
    ));
}

#[cfg(unix)]
#[test]
fn test_files_that_cannot_be_hashed_are_left_out() {
    let sandbox = Sandbox::new();
    let root = sandbox.home.join("backups");
    for name in ["a.bin", "b.bin", "c.bin"] {
        write_bytes(&root.join(name), &filled(7, 4096));
    }
    write_bytes(&root.join("x.bin"), &filled(8, 2048));
    write_bytes(&root.join("y.bin"), &filled(8, 2048));
    let Some(_a) = lock(&root.join("a.bin")) else {
        return;
    };
    let Some(_y) = lock(&root.join("y.bin")) else {
        return;
    };

    let groups = DuplicateDetector::new(sandbox.walker())
        .find_duplicates(&[&root], 1, &CancelToken::none())
        .unwrap();

    // x.bin lost its only twin, so its bucket yields nothing
    assert_eq!(groups.len(), 1);
    let mut names: Vec<&str> = groups[0].members.iter().map(|m| m.name.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["b.bin", "c.bin"]);
    assert_eq!(groups[0].wasted_space, 4096);
}
