use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn faq_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("faq");
    path
}

/// Config pointing at an unroutable source so no test touches the network.
fn setup_test_env(seed_cache: bool) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    let data_dir = root.join("data");
    fs::create_dir_all(&data_dir).unwrap();

    let cache_path = data_dir.join("faqs_cache.json");
    if seed_cache {
        fs::write(
            &cache_path,
            r#"[
  {
    "id": 0,
    "question": "How do I collect my saliva sample?",
    "answer": "Use the kit mailed to you.",
    "url": "https://faq.example.com/faqs/"
  },
  {
    "id": 1,
    "question": "How can I contact customer support?",
    "answer": "Email our support team.",
    "url": "https://faq.example.com/faqs/"
  }
]"#,
        )
        .unwrap();
    }

    let config_content = format!(
        r#"[source]
url = "http://127.0.0.1:9/faqs/"
timeout_secs = 2
max_retries = 0

[cache]
path = "{}"
"#,
        cache_path.display()
    );

    let config_path = config_dir.join("faq.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_faq(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = faq_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run faq binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_search_from_cache() {
    let (_tmp, config_path) = setup_test_env(true);

    let (stdout, stderr, success) = run_faq(&config_path, &["search", "how to collect sample"]);
    assert!(success, "search failed: stdout={}, stderr={}", stdout, stderr);
    let first = stdout.lines().next().unwrap();
    assert!(first.starts_with("1. ["), "unexpected output: {}", stdout);
    assert!(first.contains("How do I collect my saliva sample?"));
    assert!(stdout.contains("url: https://faq.example.com/faqs/"));
}

#[test]
fn test_search_strict_json() {
    let (_tmp, config_path) = setup_test_env(true);

    let (stdout, stderr, success) = run_faq(
        &config_path,
        &[
            "search",
            "How can I contact customer support?",
            "--mode",
            "strict",
            "--json",
        ],
    );
    assert!(success, "search failed: stdout={}, stderr={}", stdout, stderr);

    let response: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(response["query"], "How can I contact customer support?");
    let results = response["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["question"], "How can I contact customer support?");
    assert_eq!(results[0]["url"], "https://faq.example.com/faqs/");
    assert!((results[0]["score"].as_f64().unwrap() - 1.0).abs() < 1e-9);
}

#[test]
fn test_search_limit() {
    let (_tmp, config_path) = setup_test_env(true);

    let (stdout, _, success) = run_faq(
        &config_path,
        &["search", "how to collect sample", "--limit", "1", "--json"],
    );
    assert!(success);
    let response: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(response["results"].as_array().unwrap().len(), 1);
}

#[test]
fn test_search_unrelated_strict_no_results() {
    let (_tmp, config_path) = setup_test_env(true);

    let (stdout, _, success) = run_faq(
        &config_path,
        &["search", "what is the weather today", "--mode", "strict"],
    );
    assert!(success);
    assert!(stdout.contains("No results."));
}

#[test]
fn test_search_without_cache_or_network_is_fail_soft() {
    let (_tmp, config_path) = setup_test_env(false);

    let (stdout, stderr, success) = run_faq(&config_path, &["search", "saliva kit", "--json"]);
    assert!(success, "search failed: stdout={}, stderr={}", stdout, stderr);
    let response: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(response["query"], "saliva kit");
    assert!(response["results"].as_array().unwrap().is_empty());
}

#[test]
fn test_search_rejects_unknown_mode() {
    let (_tmp, config_path) = setup_test_env(true);

    let (_, stderr, success) = run_faq(&config_path, &["search", "kit", "--mode", "fuzzy"]);
    assert!(!success);
    assert!(stderr.contains("Unknown match mode"));
}

#[test]
fn test_list_prints_cached_entries() {
    let (_tmp, config_path) = setup_test_env(true);

    let (stdout, stderr, success) = run_faq(&config_path, &["list"]);
    assert!(success, "list failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.starts_with("2 entries"));
    assert!(stdout.contains("0. How do I collect my saliva sample?"));
    assert!(stdout.contains("1. How can I contact customer support?"));
    assert!(stdout.contains("faqs_cache.json"));
}

#[test]
fn test_refresh_fails_when_source_unreachable() {
    let (_tmp, config_path) = setup_test_env(true);

    let (_, stderr, success) = run_faq(&config_path, &["refresh"]);
    assert!(!success);
    assert!(stderr.contains("Failed to refresh"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let (_tmp, config_path) = setup_test_env(true);
    fs::write(
        &config_path,
        "[extraction]\nstrategies = [\"accordion\", \"headings\"]\n",
    )
    .unwrap();

    let (_, stderr, success) = run_faq(&config_path, &["list"]);
    assert!(!success);
    assert!(stderr.contains("accordion"));
}
