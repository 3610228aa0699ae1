//! Corpus loader and process-lifetime cache.
//!
//! The data directory is scanned once, on first use. Markdown files become
//! pages; `endpoints.json` and `models.json` are flattened into one synthetic
//! text document each so that the same relevance scorer covers them. A file
//! that cannot be read or parsed is logged and left out; it never aborts the
//! load. There is no invalidation: the loaded set lives as long as the
//! [`Corpus`] value that owns it.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use walkdir::WalkDir;

use crate::catalog::{parse_catalog, ENDPOINTS_FILE, MODELS_FILE};
use crate::format::{format_context_length, format_model_value};
use crate::logging::sanitize_for_log;
use crate::models::{Document, Endpoint, EndpointsData, Model, ModelsData};

const MAX_TITLE_LENGTH: usize = 200;
const MARKDOWN_EXT: &str = ".md";
const JSON_EXT: &str = ".json";

/// Lazily loaded, immutable document set.
pub struct Corpus {
    data_dir: PathBuf,
    documents: OnceLock<Vec<Document>>,
}

impl Corpus {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            documents: OnceLock::new(),
        }
    }

    /// A corpus that is already loaded with `documents`.
    pub fn from_documents(documents: Vec<Document>) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(documents);
        Self {
            data_dir: PathBuf::new(),
            documents: cell,
        }
    }

    /// The document set, loading it on the first call.
    ///
    /// Every call on the same `Corpus` returns the same slice.
    pub fn documents(&self) -> &[Document] {
        self.documents
            .get_or_init(|| load_documents(&self.data_dir).documents)
    }

    pub fn is_loaded(&self) -> bool {
        self.documents.get().is_some()
    }
}

/// Outcome of one directory scan.
#[derive(Debug, Default)]
pub struct CorpusLoad {
    pub documents: Vec<Document>,
    /// File names of `.md`/`.json` entries that failed to load.
    pub failed: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Page,
    Endpoints,
    Models,
}

fn classify(file_name: &str) -> Option<EntryKind> {
    if file_name.ends_with(MARKDOWN_EXT) {
        Some(EntryKind::Page)
    } else if file_name == ENDPOINTS_FILE {
        Some(EntryKind::Endpoints)
    } else if file_name == MODELS_FILE {
        Some(EntryKind::Models)
    } else {
        None
    }
}

fn is_trackable(file_name: &str) -> bool {
    file_name.ends_with(MARKDOWN_EXT) || file_name.ends_with(JSON_EXT)
}

/// Scan `data_dir` and build documents from every recognised entry.
pub fn load_documents(data_dir: &Path) -> CorpusLoad {
    let mut load = CorpusLoad::default();

    if !data_dir.is_dir() {
        tracing::error!(
            dir = %sanitize_for_log(&data_dir.display().to_string()),
            "data directory cannot be enumerated"
        );
        return load;
    }

    let mut catalogs_loaded = (false, false);

    let walker = WalkDir::new(data_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable directory entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy().to_string();
        let Some(kind) = classify(&file_name) else {
            continue;
        };

        match load_entry(entry.path(), &file_name, kind) {
            Some(doc) => {
                match kind {
                    EntryKind::Endpoints => catalogs_loaded.0 = true,
                    EntryKind::Models => catalogs_loaded.1 = true,
                    EntryKind::Page => {}
                }
                load.documents.push(doc);
            }
            None if is_trackable(&file_name) => load.failed.push(file_name),
            None => {}
        }
    }

    for (loaded, file) in [
        (catalogs_loaded.0, ENDPOINTS_FILE),
        (catalogs_loaded.1, MODELS_FILE),
    ] {
        if !loaded {
            tracing::warn!(file, "critical data file failed to load or is missing");
        }
    }

    if !load.failed.is_empty() {
        let names: Vec<String> = load.failed.iter().map(|f| sanitize_for_log(f)).collect();
        tracing::warn!(
            count = load.failed.len(),
            files = %names.join(", "),
            "some data files failed to load"
        );
    }

    tracing::debug!(documents = load.documents.len(), "corpus loaded");
    load
}

fn load_entry(path: &Path, file_name: &str, kind: EntryKind) -> Option<Document> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::error!(file = %sanitize_for_log(file_name), error = %e, "failed to read data file");
            return None;
        }
    };

    let parsed = match kind {
        EntryKind::Page => Some(parse_page(&raw, file_name)),
        EntryKind::Endpoints => parse_catalog::<EndpointsData>(&raw, file_name)
            .ok()
            .map(|data| Document {
                name: "endpoints".to_string(),
                title: "API Endpoints Reference".to_string(),
                content: flatten_endpoints(&data),
            }),
        EntryKind::Models => parse_catalog::<ModelsData>(&raw, file_name)
            .ok()
            .map(|data| Document {
                name: "models".to_string(),
                title: "Models Reference".to_string(),
                content: flatten_models(&data),
            }),
    };

    if parsed.is_none() {
        tracing::warn!(file = %sanitize_for_log(file_name), "failed to parse data file");
    }
    parsed
}

fn parse_page(content: &str, file_name: &str) -> Document {
    let name = file_name
        .strip_suffix(MARKDOWN_EXT)
        .unwrap_or(file_name)
        .to_string();
    Document {
        name,
        title: extract_title(content, file_name),
        content: content.to_string(),
    }
}

/// Title of a page: its first Markdown heading, else derived from the file name.
pub fn extract_title(content: &str, file_name: &str) -> String {
    if let Some(heading) = content.lines().find_map(heading_text) {
        return truncate_title(heading);
    }
    let fallback = file_name.replace('-', " ");
    let fallback = fallback.strip_suffix(MARKDOWN_EXT).unwrap_or(&fallback);
    truncate_title(fallback)
}

/// Text of an ATX heading line (`#`..`######`-style, any depth), if any.
fn heading_text(line: &str) -> Option<&str> {
    let rest = line.trim_start_matches('#');
    if rest.len() == line.len() || !rest.starts_with([' ', '\t']) {
        return None;
    }
    let text = rest.trim();
    (!text.is_empty()).then_some(text)
}

fn truncate_title(title: &str) -> String {
    match title.char_indices().nth(MAX_TITLE_LENGTH) {
        Some((cut, _)) => format!("{}...", &title[..cut]),
        None => title.to_string(),
    }
}

fn endpoint_line(endpoint: &Endpoint) -> String {
    format!(
        "{} {}: {} ({}, {} API)",
        endpoint.method, endpoint.path, endpoint.description, endpoint.category, endpoint.api
    )
}

fn model_line(model: &Model) -> String {
    format!(
        "{} ({}): {}. Context: {}. Capabilities: {}",
        model.name,
        model.id,
        model.description,
        format_context_length(model.context_length),
        model.capabilities.join(", ")
    )
}

pub fn flatten_endpoints(data: &EndpointsData) -> String {
    data.endpoints
        .iter()
        .map(endpoint_line)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn flatten_models(data: &ModelsData) -> String {
    let mut content = data
        .models
        .iter()
        .map(model_line)
        .collect::<Vec<_>>()
        .join("\n");

    if let Some(recommended) = &data.recommended_models {
        content.push_str("\n\nRecommended Models:\n");
        for (use_case, value) in recommended {
            content.push_str(&format!("{}: {}\n", use_case, format_model_value(value, false)));
        }
    }
    content
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const ENDPOINTS: &str = r#"{
        "endpoints": [
            {"method": "POST", "path": "/v1/chat/completions", "description": "Create a chat completion", "category": "chat", "api": "inference"},
            {"method": "GET", "path": "/v1/api-key", "description": "Get API key info", "category": "api-keys", "api": "management"}
        ],
        "apiBaseUrls": {"inference": "https://api.x.ai", "management": "https://management-api.x.ai"},
        "categories": {"chat": "Chat", "api-keys": "API Keys"}
    }"#;

    const MODELS: &str = r#"{
        "models": [
            {"id": "grok-4", "name": "Grok 4", "description": "Flagship reasoning model", "contextLength": 256000, "capabilities": ["text", "vision"]}
        ],
        "recommendedModels": {"coding": ["grok-code-fast-1", "grok-4"]}
    }"#;

    fn data_dir() -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("function-calling.md"), "# Function Calling\n\nDefine tools.").unwrap();
        fs::write(tmp.path().join("untitled-page.md"), "no heading here").unwrap();
        fs::write(tmp.path().join(ENDPOINTS_FILE), ENDPOINTS).unwrap();
        fs::write(tmp.path().join(MODELS_FILE), MODELS).unwrap();
        fs::write(tmp.path().join("notes.txt"), "ignored").unwrap();
        tmp
    }

    #[test]
    fn title_from_first_heading_of_any_depth() {
        assert_eq!(extract_title("intro\n## Title\n# Later", "x.md"), "Title");
        assert_eq!(extract_title("# Function Calling\n", "x.md"), "Function Calling");
    }

    #[test]
    fn title_ignores_hash_without_space() {
        assert_eq!(extract_title("#hashtag\ntext", "my-page.md"), "my page");
    }

    #[test]
    fn title_is_truncated_with_marker() {
        let long = format!("# {}", "a".repeat(250));
        let title = extract_title(&long, "x.md");
        assert_eq!(title.chars().count(), MAX_TITLE_LENGTH + 3);
        assert!(title.ends_with("..."));
    }

    #[test]
    fn loads_pages_and_catalogs_in_name_order() {
        let tmp = data_dir();
        let load = load_documents(tmp.path());
        let names: Vec<&str> = load.documents.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["endpoints", "function-calling", "models", "untitled-page"]);
        assert!(load.failed.is_empty());

        let untitled = &load.documents[3];
        assert_eq!(untitled.title, "untitled page");
    }

    #[test]
    fn catalog_flattening_formats() {
        let tmp = data_dir();
        let load = load_documents(tmp.path());
        let endpoints = &load.documents[0];
        assert_eq!(endpoints.title, "API Endpoints Reference");
        assert_eq!(
            endpoints.content.lines().next().unwrap(),
            "POST /v1/chat/completions: Create a chat completion (chat, inference API)"
        );

        let models = &load.documents[2];
        assert!(models.content.starts_with(
            "Grok 4 (grok-4): Flagship reasoning model. Context: 256K. Capabilities: text, vision"
        ));
        assert!(models
            .content
            .contains("\n\nRecommended Models:\ncoding: grok-code-fast-1, grok-4\n"));
    }

    #[test]
    fn broken_catalog_degrades_only_itself() {
        let tmp = data_dir();
        fs::write(tmp.path().join(MODELS_FILE), "{ not json").unwrap();
        let load = load_documents(tmp.path());
        assert_eq!(load.failed, vec![MODELS_FILE.to_string()]);
        assert!(load.documents.iter().all(|d| d.name != "models"));
        assert!(load.documents.iter().any(|d| d.name == "endpoints"));
    }

    #[test]
    fn schema_violation_degrades_catalog() {
        let tmp = data_dir();
        fs::write(tmp.path().join(ENDPOINTS_FILE), r#"{"endpoints": {}}"#).unwrap();
        let load = load_documents(tmp.path());
        assert_eq!(load.failed, vec![ENDPOINTS_FILE.to_string()]);
    }

    #[test]
    fn missing_directory_yields_empty_corpus() {
        let tmp = TempDir::new().unwrap();
        let load = load_documents(&tmp.path().join("nope"));
        assert!(load.documents.is_empty());
    }

    #[test]
    fn corpus_loads_once_and_is_reference_stable() {
        let tmp = data_dir();
        let corpus = Corpus::new(tmp.path());
        assert!(!corpus.is_loaded());
        let first = corpus.documents();
        assert!(corpus.is_loaded());

        fs::write(tmp.path().join("late.md"), "# Late").unwrap();
        let second = corpus.documents();
        assert!(std::ptr::eq(first, second));
        assert_eq!(second.len(), 4);
    }
}
