//! Exit-code behaviour of the `feedharvest` binary.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_missing_config_exits_1_without_output() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("data");

    Command::cargo_bin("feedharvest")
        .unwrap()
        .arg("--config")
        .arg(tmp.path().join("missing.yaml"))
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("not found"));

    assert!(!out.exists());
}

#[test]
fn test_feeds_path_env_override() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("data");

    Command::cargo_bin("feedharvest")
        .unwrap()
        .env("FEEDS_PATH", tmp.path().join("elsewhere.yaml"))
        .env("HARVEST_OUTPUT_DIR", &out)
        .assert()
        .code(1);

    assert!(!out.exists());
}

#[test]
fn test_invalid_yaml_is_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    let config = tmp.path().join("feeds.yaml");
    std::fs::write(&config, "categories: [unclosed").unwrap();

    Command::cargo_bin("feedharvest")
        .unwrap()
        .arg("--config")
        .arg(&config)
        .arg("--output-dir")
        .arg(tmp.path().join("data"))
        .assert()
        .failure();
}

#[test]
fn test_empty_feed_list_writes_header_only_snapshot() {
    let tmp = tempfile::tempdir().unwrap();
    let config = tmp.path().join("feeds.yaml");
    let out = tmp.path().join("data");
    std::fs::write(&config, "categories: {}\n").unwrap();

    Command::cargo_bin("feedharvest")
        .unwrap()
        .arg("--config")
        .arg(&config)
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("harvest"));

    let files: Vec<_> = std::fs::read_dir(&out).unwrap().map(|e| e.unwrap()).collect();
    assert_eq!(files.len(), 1);
    let name = files[0].file_name().into_string().unwrap();
    assert!(name.starts_with("news_raw_") && name.ends_with(".csv"));
    assert_eq!(
        std::fs::read_to_string(files[0].path()).unwrap(),
        "source,category,title,link,summary,published,collected_at\n"
    );
}
