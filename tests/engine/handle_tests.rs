use std::collections::BTreeSet;

use serde_json::json;

use surge::cleaner::{Category, CategoryLocations};
use surge::engine::ErrorReply;
use surge::{CancelToken, Engine, EngineConfig, Request, Response};

use crate::common::{age, age_tree, write_bytes, write_file, Sandbox};

fn request(value: serde_json::Value) -> Request {
    serde_json::from_value(value).unwrap()
}

fn error_code(response: &Response) -> Option<&str> {
    match response {
        Response::Error(ErrorReply { code, .. }) => Some(code.as_str()),
        _ => None,
    }
}

#[test]
fn test_request_wire_format() {
    let parsed = request(json!({
        "op": "deletePaths",
        "paths": ["/tmp/a", "/tmp/b"]
    }));
    match parsed {
        Request::DeletePaths { paths, use_quarantine } => {
            assert_eq!(paths.len(), 2);
            assert!(use_quarantine, "quarantine is the default");
        }
        other => panic!("unexpected request {:?}", other),
    }

    let parsed = request(json!({
        "op": "findLargeOldFiles",
        "roots": ["/srv"],
        "minSize": 1024,
        "minAgeDays": 90
    }));
    assert_eq!(
        parsed,
        Request::FindLargeOldFiles {
            roots: vec!["/srv".into()],
            min_size: 1024,
            min_age_days: 90,
        }
    );

    let parsed = request(json!({ "op": "scanCategories", "categories": ["userCaches", "logs"] }));
    let expected: BTreeSet<Category> = [Category::UserCaches, Category::Logs].into_iter().collect();
    assert_eq!(parsed, Request::ScanCategories { categories: expected });

    assert_eq!(request(json!({ "op": "listQuarantine" })), Request::ListQuarantine);
    assert_eq!(
        request(json!({ "op": "purgeQuarantine" })),
        Request::PurgeQuarantine { older_than_days: None }
    );
    assert!(serde_json::from_value::<Request>(json!({ "op": "formatDisk" })).is_err());
}

#[test]
fn test_scan_disk_tree_reply() {
    let sandbox = Sandbox::new();
    let engine = sandbox.engine(CategoryLocations::empty());
    let root = sandbox.home.join("music");
    write_file(&root.join("a.flac"), 3000);
    write_file(&root.join("album/b.flac"), 1000);

    let response = engine.handle(
        request(json!({ "op": "scanDiskTree", "rootPath": root, "maxDepth": 2 })),
        &CancelToken::none(),
    );

    let value = serde_json::to_value(&response).unwrap();
    assert_eq!(value["kind"], "tree");
    assert_eq!(value["data"]["sizeBytes"], 4000);
    assert_eq!(value["data"]["isDirectory"], true);
    assert_eq!(value["data"]["children"][0]["name"], "a.flac");
}

#[test]
fn test_validation_failures_become_error_replies() {
    let sandbox = Sandbox::new();
    let engine = sandbox.engine(CategoryLocations::empty());
    let cancel = CancelToken::none();

    let cases = [
        (json!({ "op": "scanCategories", "categories": [] }), "invalidRequest"),
        (json!({ "op": "scanDiskTree", "rootPath": sandbox.home, "maxDepth": 0 }), "invalidRequest"),
        (json!({ "op": "scanTreeMapSource", "rootPath": sandbox.home, "maxDepth": 11 }), "invalidRequest"),
        (json!({ "op": "deletePaths", "paths": [] }), "invalidRequest"),
        (json!({ "op": "findDuplicates", "roots": [], "minSize": 1 }), "invalidRequest"),
        (json!({ "op": "findLargeOldFiles", "roots": [sandbox.home], "minSize": 1, "minAgeDays": 0 }), "invalidRequest"),
        (json!({ "op": "purgeQuarantine", "olderThanDays": 0 }), "invalidRequest"),
        (json!({ "op": "scanDiskTree", "rootPath": sandbox.protected, "maxDepth": 2 }), "blacklisted"),
        (json!({ "op": "scanDiskTree", "rootPath": "", "maxDepth": 2 }), "emptyPath"),
    ];

    for (value, code) in cases {
        let response = engine.handle(request(value.clone()), &cancel);
        assert_eq!(error_code(&response), Some(code), "{}", value);
    }
}

#[test]
fn test_delete_reply_reports_partial_success() {
    let sandbox = Sandbox::new();
    let engine = sandbox.engine(CategoryLocations::empty());
    let good = sandbox.home.join("old.zip");
    write_file(&good, 2048);
    let bad = sandbox.protected.join("boot.img");
    write_file(&bad, 10);

    let response = engine.handle(
        request(json!({ "op": "deletePaths", "paths": [good, bad] })),
        &CancelToken::none(),
    );

    let value = serde_json::to_value(&response).unwrap();
    assert_eq!(value["kind"], "deletion");
    assert_eq!(value["data"]["deletedCount"], 1);
    assert_eq!(value["data"]["freedSpaceBytes"], 2048);
    assert_eq!(value["data"]["errors"].as_array().unwrap().len(), 1);
    assert_eq!(value["data"]["quarantined"].as_array().unwrap().len(), 1);
}

#[test]
fn test_scan_then_delete_round_trip() {
    let sandbox = Sandbox::new();
    let caches = sandbox.home.join(".cache");
    write_file(&caches.join("browser-thumbs/t1"), 30_000);
    write_file(&caches.join("spotify/data"), 90_000);
    age_tree(&caches, 14);
    let engine = sandbox.engine(CategoryLocations::empty().with_roots(Category::UserCaches, [&caches]));
    let cancel = CancelToken::none();

    let categories: BTreeSet<Category> = [Category::UserCaches].into_iter().collect();
    let items = engine.scan_categories(&categories, &cancel).unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].path, caches.join("spotify"));

    let paths: Vec<_> = items.iter().map(|i| i.path.clone()).collect();
    let report = engine.delete_paths(&paths, true, &cancel).unwrap();
    assert_eq!(report.deleted_count, 2);
    assert_eq!(report.freed_space_bytes, 120_000);

    let listed = engine.list_quarantine().unwrap();
    let mut names: Vec<&str> = listed.iter().map(|e| e.original_name.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["browser-thumbs", "spotify"]);

    // Nothing left to report
    assert!(engine.scan_categories(&categories, &cancel).unwrap().is_empty());
}

#[test]
fn test_duplicates_and_large_files_replies() {
    let sandbox = Sandbox::new();
    let engine = sandbox.engine(CategoryLocations::empty());
    let root = sandbox.home.join("stuff");
    write_bytes(&root.join("a.jpg"), &vec![1u8; 5000]);
    write_bytes(&root.join("copy of a.jpg"), &vec![1u8; 5000]);
    let old = root.join("backup.tar");
    write_file(&old, 9000);
    age(&old, 500);

    let response = engine.handle(
        request(json!({ "op": "findDuplicates", "roots": [root], "minSize": 1000 })),
        &CancelToken::none(),
    );
    let value = serde_json::to_value(&response).unwrap();
    assert_eq!(value["kind"], "duplicates");
    assert_eq!(value["data"][0]["wastedSpace"], 5000);
    assert_eq!(value["data"][0]["contentHash"].as_str().unwrap().len(), 64);

    let response = engine.handle(
        request(json!({ "op": "findLargeOldFiles", "roots": [root], "minSize": 8000, "minAgeDays": 365 })),
        &CancelToken::none(),
    );
    match response {
        Response::LargeFiles(records) => {
            assert_eq!(records.len(), 1);
            assert_eq!(records[0].name, "backup.tar");
        }
        other => panic!("unexpected response {:?}", other),
    }
}

#[test]
fn test_purge_uses_configured_retention() {
    let sandbox = Sandbox::new();
    let config = EngineConfig {
        retention_days: 5,
        ..sandbox.config()
    };
    let engine = Engine::with_parts(sandbox.policy(), CategoryLocations::empty(), &config).unwrap();
    let file = sandbox.home.join("tmp.bin");
    write_file(&file, 100);
    let record = engine.delete_paths(&[&file], true, &CancelToken::none()).unwrap().quarantined[0].clone();
    age(&record.quarantine_path, 6);

    match engine.handle(request(json!({ "op": "purgeQuarantine" })), &CancelToken::none()) {
        Response::Purge(report) => assert_eq!(report.removed, 1),
        other => panic!("unexpected response {:?}", other),
    }
    match engine.handle(request(json!({ "op": "listQuarantine" })), &CancelToken::none()) {
        Response::Quarantine(entries) => assert!(entries.is_empty()),
        other => panic!("unexpected response {:?}", other),
    }
}

#[test]
fn test_extra_blacklist_from_config() {
    let sandbox = Sandbox::new();
    let private = sandbox.home.join("Private");
    write_file(&private.join("diary.txt"), 100);
    let config = EngineConfig {
        extra_blacklist: vec!["~/Private".into()],
        ..sandbox.config()
    };
    let engine = Engine::with_parts(sandbox.policy(), CategoryLocations::empty(), &config).unwrap();

    let report = engine
        .delete_paths(&[private.join("diary.txt")], true, &CancelToken::none())
        .unwrap();
    assert_eq!(report.deleted_count, 0);
    assert!(report.errors[0].contains("blacklisted"));
    assert!(engine.authorizer().is_blacklisted(&private));
}

#[test]
fn test_bad_hidden_pattern_fails_engine_construction() {
    let sandbox = Sandbox::new();
    let config = EngineConfig {
        allowed_hidden: vec!["[".to_string()],
        ..sandbox.config()
    };
    assert!(Engine::with_parts(sandbox.policy(), CategoryLocations::empty(), &config).is_err());
}
