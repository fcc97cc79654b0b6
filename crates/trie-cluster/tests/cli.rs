//! End-to-end CLI integration tests
//!
//! These tests invoke the compiled binary as a subprocess to verify
//! that the CLI behaves correctly from a user's perspective.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Returns a Command configured to run our binary.
///
/// Note: `cargo_bin` is marked deprecated for edge cases involving custom
/// cargo build directories, but works correctly for standard project layouts.
#[allow(deprecated)]
fn cmd() -> Command {
    let mut cmd = Command::cargo_bin(env!("CARGO_PKG_NAME")).unwrap();
    cmd.env("TRIE_CLUSTER_LOG_DIR", std::env::temp_dir().join("trie-cluster-tests"));
    cmd
}

const CORPUS: &str = r#"{
  "documents": [
    {"source": "d1", "tags": "sport-cup-final", "texts": {"ArticleHeading": ["cup final in oslo tonight"]}},
    {"source": "d2", "tags": "sport-cup-final", "texts": {"ArticleHeading": ["cup final in oslo sold out"]}},
    {"source": "d3", "tags": "music-concert", "texts": {"ArticleHeading": ["jazz concert at the harbour"]}},
    {"source": "d4", "tags": "music-concert", "texts": {"ArticleHeading": ["jazz concert at the opera"]}},
    {"source": "d5", "tags": "weather", "texts": {"ArticleHeading": ["rain all week"]}}
  ]
}"#;

/// Write the sample corpus into a fresh temp dir.
fn corpus() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("corpus.json");
    fs::write(&path, CORPUS).unwrap();
    (tmp, path)
}

fn stdout_json(cmd: &mut Command) -> Value {
    let output = cmd.output().expect("failed to run command");
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("invalid JSON output")
}

// =============================================================================
// Help & Version
// =============================================================================

#[test]
fn help_flag_shows_usage() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("Commands:"))
        .stdout(predicate::str::contains("cluster"))
        .stdout(predicate::str::contains("base-clusters"));
}

#[test]
fn version_flag_shows_version() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn version_only_prints_bare_version() {
    cmd()
        .arg("--version-only")
        .assert()
        .success()
        .stdout(predicate::str::diff(format!(
            "{}\n",
            env!("CARGO_PKG_VERSION")
        )));
}

// =============================================================================
// Info Command
// =============================================================================

#[test]
fn info_shows_package_name_and_version() {
    cmd()
        .arg("info")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_NAME")))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")))
        .stdout(predicate::str::contains("Parameters"));
}

#[test]
fn info_json_outputs_valid_json() {
    let json = stdout_json(cmd().args(["info", "--json"]));
    assert_eq!(json["name"], env!("CARGO_PKG_NAME"));
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(json["config"]["parameters"]["top_base_clusters"], 500);
    assert_eq!(json["config"]["parameters"]["expansion"]["kind"], "suffix");
}

// =============================================================================
// Global Flags
// =============================================================================

#[test]
fn quiet_flag_accepted() {
    cmd().args(["-q", "info"]).assert().success();
}

#[test]
fn multiple_verbose_flags_accepted() {
    cmd().args(["-vv", "info"]).assert().success();
}

#[test]
fn color_never_accepted() {
    cmd().args(["--color", "never", "info"]).assert().success();
}

// =============================================================================
// Cluster Command
// =============================================================================

#[test]
fn cluster_json_reports_result() {
    let (_tmp, path) = corpus();
    let json = stdout_json(cmd().arg("cluster").arg(&path).arg("--json"));

    assert_eq!(json["ground_truth_clusters"], 2);
    assert!(json["clusters"].as_u64().unwrap() > 0);
    assert_eq!(json["f_measures"].as_array().unwrap().len(), 6);
    assert!(json.get("details").is_none());
}

#[test]
fn cluster_text_shows_summary() {
    let (_tmp, path) = corpus();
    cmd()
        .args(["--color", "never", "cluster"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Clustered"))
        .stdout(predicate::str::contains("Precision"))
        .stdout(predicate::str::contains("F-measure (b=0.5)"));
}

#[test]
fn cluster_details_include_options_and_clusters() {
    let (_tmp, path) = corpus();
    cmd()
        .args(["--color", "never", "cluster", "--details"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Tree type: suffix"))
        .stdout(predicate::str::contains("Ground truth represented:"))
        .stdout(predicate::str::contains("Labels:"));
}

#[test]
fn cluster_flags_override_parameters() {
    let (_tmp, path) = corpus();
    let json = stdout_json(
        cmd()
            .arg("cluster")
            .arg(&path)
            .args(["--expansion", "n-slice", "--slice-n", "2"])
            .args(["--similarity", "jaccard", "--threshold", "0.3"])
            .args(["--top", "20", "--f-beta", "1.0", "--details", "--json"]),
    );
    let options = json["details"]["options"].as_str().unwrap();
    assert!(options.contains("Tree type: n slice of length 2"));
    assert!(options.contains("Number of top base clusters: 20"));
    assert!(options.contains("jaccard"));
    assert!(json["base_clusters"].as_u64().unwrap() <= 20);
}

#[test]
fn n_slice_without_length_fails() {
    let (_tmp, path) = corpus();
    cmd()
        .arg("cluster")
        .arg(&path)
        .args(["--expansion", "n-slice"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--slice-n"));
}

#[test]
fn unknown_similarity_is_rejected() {
    let (_tmp, path) = corpus();
    cmd()
        .arg("cluster")
        .arg(&path)
        .args(["--similarity", "euclid"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn missing_corpus_fails() {
    cmd()
        .args(["cluster", "/nonexistent/corpus.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read"));
}

#[test]
fn malformed_corpus_fails() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("corpus.json");
    fs::write(&path, "{\"documents\": [").unwrap();
    cmd()
        .arg("cluster")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid corpus"));
}

// =============================================================================
// Base Clusters Command
// =============================================================================

#[test]
fn base_clusters_json_lists_scored_rows() {
    let (_tmp, path) = corpus();
    let json = stdout_json(
        cmd()
            .arg("base-clusters")
            .arg(&path)
            .args(["--drop-singletons", "--json"]),
    );
    let rows = json.as_array().unwrap();
    // four shared sub-phrases per category pair
    assert_eq!(rows.len(), 8);
    assert!(rows.iter().all(|r| r["size"] == 2));
    assert!(rows.iter().any(|r| r["label"] == "cup final in oslo"));
}

#[test]
fn base_clusters_text_lists_labels() {
    let (_tmp, path) = corpus();
    cmd()
        .args(["--color", "never", "base-clusters"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("jazz concert at the"));
}

// =============================================================================
// Error Cases
// =============================================================================

#[test]
fn no_subcommand_shows_help() {
    // arg_required_else_help makes clap print help to stderr and exit 2
    cmd()
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn invalid_subcommand_shows_error() {
    cmd()
        .arg("not-a-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn chdir_nonexistent_fails() {
    cmd()
        .args(["-C", "/nonexistent/path/that/does/not/exist", "info"])
        .assert()
        .failure();
}
