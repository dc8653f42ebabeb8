use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn kh_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("kh");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let data_dir = root.join("data");
    fs::create_dir_all(&data_dir).unwrap();

    let files_dir = root.join("files");
    fs::create_dir_all(&files_dir).unwrap();
    fs::write(
        files_dir.join("rust-guide.md"),
        "# Rust Guide\n\nOwnership and borrowing explained with cargo examples.",
    )
    .unwrap();
    fs::write(
        files_dir.join("api-reference.txt"),
        "HTTP API reference.\n\nEndpoints for deployment and infrastructure.",
    )
    .unwrap();
    fs::write(
        files_dir.join("train.py"),
        "import torch\n\ndef train(model):\n    return model\n",
    )
    .unwrap();
    fs::write(files_dir.join("logo.png"), [0u8; 16]).unwrap();

    let config_content = format!(
        r#"[db]
path = "{root}/data/kh.sqlite"

[search]
default_mode = "keyword"
history_limit = 5

[upload]
dir = "{root}/data/uploads"
summarize = false

[server]
bind = "127.0.0.1:7341"
"#,
        root = root.display()
    );

    let config_path = config_dir.join("kh.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_kh(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = kh_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run kh binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn files_dir(config_path: &Path) -> PathBuf {
    config_path.parent().unwrap().parent().unwrap().join("files")
}

#[test]
fn test_init_creates_database() {
    let (tmp, config_path) = setup_test_env();
    let (stdout, stderr, success) = run_kh(&config_path, &["init"]);
    assert!(success, "init failed: {}", stderr);
    assert!(stdout.contains("Database initialized successfully"));
    assert!(tmp.path().join("data/kh.sqlite").exists());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();
    let (_, _, s1) = run_kh(&config_path, &["init"]);
    let (_, stderr, s2) = run_kh(&config_path, &["init"]);
    assert!(s1);
    assert!(s2, "second init failed: {}", stderr);
}

#[test]
fn test_upload_directory_skips_unsupported_files() {
    let (tmp, config_path) = setup_test_env();
    run_kh(&config_path, &["init"]);

    let dir = files_dir(&config_path);
    let (stdout, stderr, success) = run_kh(&config_path, &["upload", dir.to_str().unwrap()]);
    assert!(success, "upload failed: {}", stderr);
    assert!(stdout.contains("files: 3"), "stdout: {}", stdout);
    assert!(stdout.contains("uploaded: 3"));
    assert!(!stdout.contains("logo.png"));

    let stored: Vec<_> = fs::read_dir(tmp.path().join("data/uploads"))
        .unwrap()
        .filter_map(|e| e.ok())
        .collect();
    assert_eq!(stored.len(), 3);
}

#[test]
fn test_upload_explicit_unsupported_file_reports_error() {
    let (_tmp, config_path) = setup_test_env();
    run_kh(&config_path, &["init"]);

    let logo = files_dir(&config_path).join("logo.png");
    let (stdout, stderr, success) = run_kh(&config_path, &["upload", logo.to_str().unwrap()]);
    assert!(success, "upload failed: {}", stderr);
    assert!(stdout.contains("error logo.png"), "stdout: {}", stdout);
    assert!(stdout.contains("failed: 1"));
}

#[test]
fn test_reupload_is_skipped() {
    let (_tmp, config_path) = setup_test_env();
    run_kh(&config_path, &["init"]);

    let guide = files_dir(&config_path).join("rust-guide.md");
    let (_, _, first) = run_kh(&config_path, &["upload", guide.to_str().unwrap()]);
    assert!(first);

    let (stdout, stderr, success) = run_kh(&config_path, &["upload", guide.to_str().unwrap()]);
    assert!(success, "second upload failed: {}", stderr);
    assert!(stdout.contains("skipped: 1"), "stdout: {}", stdout);
    assert!(stdout.contains("uploaded: 0"));
}

#[test]
fn test_keyword_search_after_upload() {
    let (_tmp, config_path) = setup_test_env();
    run_kh(&config_path, &["init"]);
    let dir = files_dir(&config_path);
    run_kh(&config_path, &["upload", dir.to_str().unwrap()]);

    let (stdout, stderr, success) =
        run_kh(&config_path, &["search", "borrowing", "--mode", "keyword"]);
    assert!(success, "search failed: {}", stderr);
    assert!(stdout.contains("1 result for \"borrowing\""), "stdout: {}", stdout);
    assert!(stdout.contains("rust-guide.md"));
    assert!(stdout.contains("category: tutorial"));
}

#[test]
fn test_search_no_results() {
    let (_tmp, config_path) = setup_test_env();
    run_kh(&config_path, &["init"]);
    let dir = files_dir(&config_path);
    run_kh(&config_path, &["upload", dir.to_str().unwrap()]);

    let (stdout, _, success) = run_kh(&config_path, &["search", "xyzzyplugh"]);
    assert!(success);
    assert!(stdout.contains("0 results"), "stdout: {}", stdout);
}

#[test]
fn test_search_json_output() {
    let (_tmp, config_path) = setup_test_env();
    run_kh(&config_path, &["init"]);
    let dir = files_dir(&config_path);
    run_kh(&config_path, &["upload", dir.to_str().unwrap()]);

    let (stdout, stderr, success) = run_kh(
        &config_path,
        &["search", "deployment", "--mode", "keyword", "--json"],
    );
    assert!(success, "search failed: {}", stderr);
    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let results = value["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
}

#[test]
fn test_empty_query_is_not_recorded() {
    let (_tmp, config_path) = setup_test_env();
    run_kh(&config_path, &["init"]);

    let (stdout, _, success) = run_kh(&config_path, &["search", "   "]);
    assert!(success);
    assert!(stdout.contains("Empty query"));

    let (stdout, _, _) = run_kh(&config_path, &["history"]);
    assert!(stdout.contains("No searches yet."));
}

#[test]
fn test_history_lists_searches() {
    let (_tmp, config_path) = setup_test_env();
    run_kh(&config_path, &["init"]);
    run_kh(&config_path, &["search", "ownership"]);
    run_kh(&config_path, &["search", "tokio runtime"]);

    let (stdout, stderr, success) = run_kh(&config_path, &["history"]);
    assert!(success, "history failed: {}", stderr);
    assert!(stdout.contains("ownership"));
    assert!(stdout.contains("tokio runtime"));
    assert!(stdout.find("tokio runtime").unwrap() < stdout.find("ownership").unwrap());
}

#[test]
fn test_semantic_search_without_provider_fails() {
    let (_tmp, config_path) = setup_test_env();
    run_kh(&config_path, &["init"]);

    let (_, stderr, success) = run_kh(&config_path, &["search", "borrowing", "--mode", "semantic"]);
    assert!(!success, "semantic search should fail with no provider");
    assert!(!stderr.is_empty());
}

#[test]
fn test_invalid_mode_rejected() {
    let (_tmp, config_path) = setup_test_env();
    run_kh(&config_path, &["init"]);

    let (_, _, success) = run_kh(&config_path, &["search", "rust", "--mode", "fuzzy"]);
    assert!(!success);
}

#[test]
fn test_stats_counts() {
    let (_tmp, config_path) = setup_test_env();
    run_kh(&config_path, &["init"]);
    let dir = files_dir(&config_path);
    run_kh(&config_path, &["upload", dir.to_str().unwrap()]);
    run_kh(&config_path, &["search", "cargo"]);

    let (stdout, stderr, success) = run_kh(&config_path, &["stats"]);
    assert!(success, "stats failed: {}", stderr);
    assert!(stdout.contains("Documents:   3"), "stdout: {}", stdout);
    assert!(stdout.contains("Searches:    1"));
    assert!(stdout.contains("Scraped:     0"));
    assert!(stdout.contains("Reports:     0"));
}

#[test]
fn test_analytics_json() {
    let (_tmp, config_path) = setup_test_env();
    run_kh(&config_path, &["init"]);
    let dir = files_dir(&config_path);
    run_kh(&config_path, &["upload", dir.to_str().unwrap()]);
    run_kh(&config_path, &["search", "deployment pipeline"]);

    let (stdout, stderr, success) = run_kh(&config_path, &["analytics", "--json"]);
    assert!(success, "analytics failed: {}", stderr);
    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(value["total_documents"], 3);
    assert_eq!(value["total_searches"], 1);
    assert_eq!(value["recent_documents"], 3);
}

#[test]
fn test_browse_by_category() {
    let (_tmp, config_path) = setup_test_env();
    run_kh(&config_path, &["init"]);
    let dir = files_dir(&config_path);
    run_kh(&config_path, &["upload", dir.to_str().unwrap()]);

    let (stdout, stderr, success) = run_kh(&config_path, &["browse", "--category", "code"]);
    assert!(success, "browse failed: {}", stderr);
    assert!(stdout.contains("1 of 3 documents"), "stdout: {}", stdout);
    assert!(stdout.contains("train.py"));
    assert!(!stdout.contains("rust-guide.md"));
}

#[test]
fn test_browse_unknown_category_rejected() {
    let (_tmp, config_path) = setup_test_env();
    run_kh(&config_path, &["init"]);

    let (_, stderr, success) = run_kh(&config_path, &["browse", "--category", "poetry"]);
    assert!(!success);
    assert!(stderr.contains("Unknown category"));
}

#[test]
fn test_report_list_empty_shows_types() {
    let (_tmp, config_path) = setup_test_env();
    run_kh(&config_path, &["init"]);

    let (stdout, stderr, success) = run_kh(&config_path, &["report", "list"]);
    assert!(success, "report list failed: {}", stderr);
    assert!(stdout.contains("No reports yet"));
    assert!(stdout.contains("usage_analytics"));
    assert!(stdout.contains("processing_stats"));
}

#[test]
fn test_report_generate_without_provider_persists_nothing() {
    let (_tmp, config_path) = setup_test_env();
    run_kh(&config_path, &["init"]);

    let (_, _, success) = run_kh(&config_path, &["report", "generate", "usage_analytics"]);
    assert!(!success);

    let (stdout, _, _) = run_kh(&config_path, &["stats"]);
    assert!(stdout.contains("Reports:     0"));
}

#[test]
fn test_missing_config_fails() {
    let (_, _, success) = run_kh(Path::new("/nonexistent/kh.toml"), &["init"]);
    assert!(!success);
}
