use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use tempfile::TempDir;

use grok_docs::config::Config;
use grok_docs::corpus::Corpus;
use grok_docs::search::SearchEngine;
use grok_docs::tools::{ToolContext, ToolRegistry};

fn binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("grok-docs");
    path
}

const ENDPOINTS_JSON: &str = r#"{
  "endpoints": [
    {"method": "POST", "path": "/v1/chat/completions", "description": "Create a chat completion", "category": "chat", "api": "inference"},
    {"method": "POST", "path": "/v1/images/generations", "description": "Generate images from a prompt", "category": "images", "api": "inference"},
    {"method": "GET", "path": "/auth/teams/{team_id}/api-keys", "description": "List API keys for a team", "category": "api-keys", "api": "management"}
  ],
  "apiBaseUrls": {"inference": "https://api.x.ai", "management": "https://management-api.x.ai"},
  "categories": {"chat": "Chat completions", "images": "Image generation", "api-keys": "API key management"}
}"#;

const MODELS_JSON: &str = r#"{
  "models": [
    {"id": "grok-4", "name": "Grok 4", "description": "Flagship reasoning model.", "contextLength": 256000, "capabilities": ["text", "vision", "function-calling"], "knowledgeCutoff": "2024-11"},
    {"id": "grok-2-image", "name": "Grok 2 Image", "description": "Image generation model.", "contextLength": null, "capabilities": ["image-generation"]}
  ],
  "aliases": {
    "description": "Aliases point at a specific model version.",
    "formats": [{"pattern": "<model>-latest", "description": "Most recent version"}]
  },
  "recommendedModels": {
    "complexReasoning": "grok-4",
    "imageGeneration": ["grok-2-image"]
  }
}"#;

fn write_data(dir: &Path) {
    fs::write(
        dir.join("function-calling.md"),
        "# Function Calling\n\nConnect Grok to external tools.\n\n## Defining tools\n\nEach function takes a JSON schema for its parameters.\n\n```json\n{\"type\": \"function\"}\n```\n",
    )
    .unwrap();
    fs::write(
        dir.join("streaming.md"),
        "# Streaming\n\nSet `stream: true` to receive server-sent events as tokens are generated.\n",
    )
    .unwrap();
    fs::write(dir.join("notes.txt"), "function function function").unwrap();
    fs::write(dir.join("endpoints.json"), ENDPOINTS_JSON).unwrap();
    fs::write(dir.join("models.json"), MODELS_JSON).unwrap();
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let data_dir = root.join("data");
    fs::create_dir_all(&data_dir).unwrap();
    write_data(&data_dir);

    let config_content = format!(
        r#"[data]
dir = "{}"

[search]
max_results = 5

[log]
filter = "grok_docs=warn"
"#,
        data_dir.display()
    );

    let config_path = root.join("grok-docs.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run grok-docs binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

// ============ CLI ============

#[test]
fn test_search_finds_bundled_page() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run(&config_path, &["search", "function calling"]);
    assert!(success, "search failed: stdout={}, stderr={}", stdout, stderr);
    assert!(
        stdout.starts_with("Found "),
        "unexpected output: {}",
        stdout
    );
    assert!(stdout.contains("## Function Calling (function-calling)"));
    assert!(!stdout.contains("notes"));
}

#[test]
fn test_search_without_hits() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run(&config_path, &["search", "kubernetes"]);
    assert!(success);
    assert!(stdout.starts_with("No results found for \"kubernetes\""));
}

#[test]
fn test_search_is_deterministic() {
    let (_tmp, config_path) = setup_test_env();

    let (first, _, _) = run(&config_path, &["search", "grok"]);
    let (second, _, _) = run(&config_path, &["search", "grok"]);
    assert_eq!(first, second);
}

#[test]
fn test_endpoints_by_category() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run(&config_path, &["endpoints", "--category", "chat"]);
    assert!(success, "endpoints failed: {}", stderr);
    assert!(stdout.starts_with("# xAI API Endpoints (chat)\n\n**Inference API:** https://api.x.ai"));
    assert!(stdout.contains("| POST | /v1/chat/completions | Create a chat completion | chat | inference |"));
    assert!(!stdout.contains("/v1/images/generations"));
}

#[test]
fn test_endpoints_unknown_category_warns() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run(&config_path, &["endpoints", "--category", "image"]);
    assert!(success);
    assert!(stdout.contains("> **Warning**: Unknown category \"image\""));
    assert!(stdout.contains("Did you mean: images?"));
    assert!(stdout.contains("No endpoints found."));
}

#[test]
fn test_models_listing() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run(&config_path, &["models"]);
    assert!(success, "models failed: {}", stderr);
    assert!(stdout.starts_with("# Grok Models\n\n| Model ID | Name | Context | Capabilities |"));
    assert!(stdout.contains("| `grok-4` | Grok 4 | 256K | text, vision, function-calling |"));
    assert!(stdout.contains("| `grok-2-image` | Grok 2 Image | N/A | image-generation |"));
    assert!(stdout.contains("- **Complex Reasoning**: `grok-4`"));
}

#[test]
fn test_fetch_rejects_traversal_without_network() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run(&config_path, &["fetch", "../etc/passwd"]);
    assert!(!success, "traversal path should fail");
    assert!(stdout.is_empty());
    assert!(stderr.contains("Error fetching documentation: Invalid path: path traversal not allowed"));
    assert!(stderr.contains("Try using search_docs"));
}

#[test]
fn test_models_missing_catalog_fails() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("grok-docs.toml");
    fs::write(
        &config_path,
        format!("[data]\ndir = \"{}\"\n", tmp.path().display()),
    )
    .unwrap();

    let (_, stderr, success) = run(&config_path, &["models"]);
    assert!(!success);
    assert!(stderr.contains("Error: Data file not found"));
    assert!(!stderr.contains(&tmp.path().display().to_string()));
}

#[test]
fn test_tools_lists_builtins() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run(&config_path, &["tools"]);
    assert!(success);
    for name in ["search_docs", "get_doc_page", "list_api_endpoints", "list_models"] {
        assert!(stdout.contains(name), "missing {} in {}", name, stdout);
    }
}

#[test]
fn test_invalid_config_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("grok-docs.toml");
    fs::write(&config_path, "[search]\nmax_results = 50\n").unwrap();

    let (_, _, success) = run(&config_path, &["search", "grok"]);
    assert!(!success);
}

// ============ Library ============

#[test]
fn test_corpus_is_loaded_once_and_shared() {
    let tmp = TempDir::new().unwrap();
    write_data(tmp.path());

    let corpus = Arc::new(Corpus::new(tmp.path()));
    let engine = SearchEngine::with_corpus(corpus.clone());
    assert!(!corpus.is_loaded());

    let results = engine.search("streaming");
    assert!(corpus.is_loaded());
    assert_eq!(results[0].source, "streaming");

    // Files added after the first load are not picked up.
    fs::write(tmp.path().join("late.md"), "# Streaming Late\n\nstreaming").unwrap();
    assert!(engine.search("streaming").iter().all(|r| r.source != "late"));

    let names: Vec<&str> = corpus.documents().iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["endpoints", "function-calling", "models", "streaming"]);
}

#[test]
fn test_catalogs_are_searchable() {
    let tmp = TempDir::new().unwrap();
    write_data(tmp.path());

    let engine = SearchEngine::with_corpus(Arc::new(Corpus::new(tmp.path())));
    let results = engine.search("completions");
    assert_eq!(results[0].source, "endpoints");
    assert_eq!(results[0].title, "API Endpoints Reference");
    assert!(results[0].snippet.contains("/v1/chat/completions"));
}

#[tokio::test]
async fn test_tool_context_runs_every_builtin_offline() {
    let tmp = TempDir::new().unwrap();
    write_data(tmp.path());

    let ctx = ToolContext::from_config(Config::with_data_dir(tmp.path())).unwrap();
    let registry = ToolRegistry::with_builtins();

    let search = registry.find("search_docs").unwrap();
    let out = search
        .execute(serde_json::json!({"query": "json schema"}), &ctx)
        .await
        .unwrap();
    assert!(out.contains("(function-calling)"));

    let endpoints = registry.find("list_api_endpoints").unwrap();
    let out = endpoints
        .execute(serde_json::json!({}), &ctx)
        .await
        .unwrap();
    assert!(out.starts_with("# xAI API Endpoints\n\n"));
    assert!(out.contains("/auth/teams/{team_id}/api-keys"));

    let models = registry.find("list_models").unwrap();
    let out = models.execute(serde_json::json!({}), &ctx).await.unwrap();
    assert!(out.contains("## Model Aliases"));
}
