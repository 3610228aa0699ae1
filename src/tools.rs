//! Agent-facing tools.
//!
//! Each tool is a [`Tool`] trait object held by a [`ToolRegistry`]. The MCP
//! bridge ([`crate::mcp`]) and the CLI both dispatch through the registry, so
//! the four built-in tools behave identically on either surface.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                ToolRegistry                  │
//! │  search_docs   get_doc_page                  │
//! │  list_api_endpoints   list_models            │
//! └──────────────┬───────────────────────────────┘
//!                ▼
//!   ToolContext { SearchEngine, DocFetcher, Config }
//! ```
//!
//! Tools return their output as Markdown text. A failed call is an `Err`;
//! [`error_text`] turns it into the message shown to the agent.

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::catalog;
use crate::config::Config;
use crate::corpus::Corpus;
use crate::fetch::{DocFetcher, FetchedPage};
use crate::listing::{self, VALID_CATEGORIES};
use crate::models::SearchResult;
use crate::search::SearchEngine;

/// A tool that agents can discover and call.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Lowercase identifier with underscores, e.g. `"search_docs"`.
    fn name(&self) -> &str;

    /// One-line description for agent discovery.
    fn description(&self) -> &str;

    /// JSON Schema (`type: "object"`) of the accepted parameters.
    fn parameters_schema(&self) -> Value;

    /// Run the tool. `params` is always a JSON object.
    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<String>;
}

/// A failure whose text is already the complete message for the agent.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct ToolMessage(pub String);

/// User-facing text for a failed tool call.
pub fn error_text(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ToolMessage>() {
        Some(message) => message.0.clone(),
        None => format!("Error: {}", err),
    }
}

/// Shared services handed to every tool invocation.
pub struct ToolContext {
    config: Arc<Config>,
    engine: Arc<SearchEngine>,
    fetcher: Arc<DocFetcher>,
}

impl ToolContext {
    pub fn new(config: Arc<Config>, engine: Arc<SearchEngine>, fetcher: Arc<DocFetcher>) -> Self {
        Self {
            config,
            engine,
            fetcher,
        }
    }

    /// Build the search engine and fetcher described by `config`.
    ///
    /// The corpus is not read until the first search.
    pub fn from_config(config: Config) -> Result<Self> {
        let corpus = Arc::new(Corpus::new(config.data.dir.clone()));
        let engine = Arc::new(SearchEngine::new(corpus, &config.search));
        let fetcher = Arc::new(DocFetcher::new(&config.fetch)?);
        Ok(Self::new(Arc::new(config), engine, fetcher))
    }
}

fn string_param<'a>(params: &'a Value, key: &str) -> Result<&'a str> {
    match params.get(key) {
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(_) => bail!("{} must be a string", key),
        None => bail!("missing required parameter: {}", key),
    }
}

fn optional_string_param<'a>(params: &'a Value, key: &str) -> Result<Option<&'a str>> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => bail!("{} must be a string", key),
    }
}

// ============ search_docs ============

pub struct SearchDocsTool;

pub fn format_search_results(query: &str, results: &[SearchResult]) -> String {
    if results.is_empty() {
        return format!(
            "No results found for \"{}\". Try different keywords or use get_doc_page to fetch specific documentation pages.",
            query
        );
    }

    let blocks: Vec<String> = results
        .iter()
        .map(|r| format!("## {} ({})\n\n{}", r.title, r.source, r.snippet))
        .collect();
    format!(
        "Found {} result(s) for \"{}\":\n\n{}",
        results.len(),
        query,
        blocks.join("\n\n---\n\n")
    )
}

#[async_trait]
impl Tool for SearchDocsTool {
    fn name(&self) -> &str {
        "search_docs"
    }

    fn description(&self) -> &str {
        "Search bundled Grok API documentation for relevant information. Use this for quick lookups of API features, models, function calling, and built-in tools."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search term or phrase to find in documentation"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<String> {
        let query = string_param(&params, "query")?;
        let results = ctx.engine.search(query);
        Ok(format_search_results(query, &results))
    }
}

// ============ get_doc_page ============

pub struct GetDocPageTool;

pub fn format_doc_page(page: &FetchedPage) -> String {
    format!(
        "# Documentation: {}\n\nSource: {}\n\n{}",
        page.path, page.url, page.markdown
    )
}

#[async_trait]
impl Tool for GetDocPageTool {
    fn name(&self) -> &str {
        "get_doc_page"
    }

    fn description(&self) -> &str {
        "Fetch fresh documentation from docs.x.ai. Use this when you need the latest information or content not available in bundled docs."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Documentation path, e.g., 'guides/function-calling', 'api-reference', 'models'"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<String> {
        let path = string_param(&params, "path")?;
        match ctx.fetcher.fetch_page(path).await {
            Ok(page) => Ok(format_doc_page(&page)),
            Err(e) => Err(ToolMessage(format!(
                "Error fetching documentation: {}\n\nTry using search_docs to find bundled documentation instead.",
                e
            ))
            .into()),
        }
    }
}

// ============ list_api_endpoints ============

pub struct ListEndpointsTool;

#[async_trait]
impl Tool for ListEndpointsTool {
    fn name(&self) -> &str {
        "list_api_endpoints"
    }

    fn description(&self) -> &str {
        "List available xAI API endpoints. Filter by category: chat, images, videos, voice, models, files, batch, collections, api-keys, billing, team, audit."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "category": {
                    "type": "string",
                    "description": format!("Filter by category: {}", VALID_CATEGORIES.join(", "))
                }
            }
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<String> {
        let category = optional_string_param(&params, "category")?.filter(|c| !c.is_empty());
        let data = catalog::load_endpoints(&ctx.config.data.dir)?;

        let listing = listing::list_endpoints(&data, category);
        let header = match category {
            Some(c) => format!("# xAI API Endpoints ({})", c),
            None => "# xAI API Endpoints".to_string(),
        };
        Ok(format!(
            "{}\n\n**Inference API:** {}\n**Management API:** {}\n\n{}",
            header,
            data.api_base_urls.inference,
            data.api_base_urls.management,
            listing::format_endpoints_table(&listing)
        ))
    }
}

// ============ list_models ============

pub struct ListModelsTool;

#[async_trait]
impl Tool for ListModelsTool {
    fn name(&self) -> &str {
        "list_models"
    }

    fn description(&self) -> &str {
        "List all available Grok models with their IDs, context lengths, and capabilities."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, _params: Value, ctx: &ToolContext) -> Result<String> {
        let data = catalog::load_models(&ctx.config.data.dir)?;
        Ok(format!("# Grok Models\n\n{}", listing::format_models(&data)))
    }
}

// ============ Registry ============

/// Ordered set of tools exposed to agents.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Registry with `search_docs`, `get_doc_page`, `list_api_endpoints`
    /// and `list_models`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(SearchDocsTool));
        registry.register(Box::new(GetDocPageTool));
        registry.register(Box::new(ListEndpointsTool));
        registry.register(Box::new(ListModelsTool));
        registry
    }

    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.push(tool);
    }

    pub fn tools(&self) -> &[Box<dyn Tool>] {
        &self.tools
    }

    pub fn find(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const ENDPOINTS: &str = r#"{
        "endpoints": [
            {"method": "POST", "path": "/v1/chat/completions", "description": "Create a chat completion", "category": "chat", "api": "inference"},
            {"method": "GET", "path": "/v1/models", "description": "List models", "category": "models", "api": "inference"}
        ],
        "apiBaseUrls": {"inference": "https://api.x.ai", "management": "https://management-api.x.ai"},
        "categories": {"chat": "Chat", "models": "Models"}
    }"#;

    const MODELS: &str = r#"{
        "models": [
            {"id": "grok-4", "name": "Grok 4", "description": "Flagship reasoning model", "contextLength": 256000, "capabilities": ["text"]}
        ]
    }"#;

    fn context() -> (TempDir, ToolContext) {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("function-calling.md"),
            "# Function Calling\n\nDefine tools with a JSON schema.",
        )
        .unwrap();
        fs::write(tmp.path().join("endpoints.json"), ENDPOINTS).unwrap();
        fs::write(tmp.path().join("models.json"), MODELS).unwrap();
        let ctx = ToolContext::from_config(Config::with_data_dir(tmp.path())).unwrap();
        (tmp, ctx)
    }

    #[test]
    fn test_registry_builtins() {
        let registry = ToolRegistry::with_builtins();
        assert_eq!(registry.len(), 4);
        for name in ["search_docs", "get_doc_page", "list_api_endpoints", "list_models"] {
            let tool = registry.find(name).unwrap();
            assert_eq!(tool.parameters_schema()["type"], "object");
        }
        assert!(registry.find("search").is_none());
    }

    #[tokio::test]
    async fn test_search_docs_output() {
        let (_tmp, ctx) = context();
        let out = SearchDocsTool
            .execute(json!({"query": "function calling"}), &ctx)
            .await
            .unwrap();
        assert!(out.starts_with("Found 1 result(s) for \"function calling\":\n\n## Function Calling (function-calling)\n\n# Function Calling"));
    }

    #[tokio::test]
    async fn test_search_docs_no_results() {
        let (_tmp, ctx) = context();
        let out = SearchDocsTool
            .execute(json!({"query": "quantum teleportation"}), &ctx)
            .await
            .unwrap();
        assert!(out.starts_with("No results found for \"quantum teleportation\"."));
        assert!(out.contains("get_doc_page"));
    }

    #[tokio::test]
    async fn test_search_docs_requires_query() {
        let (_tmp, ctx) = context();
        let err = SearchDocsTool.execute(json!({}), &ctx).await.unwrap_err();
        assert_eq!(error_text(&err), "Error: missing required parameter: query");
    }

    #[tokio::test]
    async fn test_get_doc_page_rejects_traversal() {
        let (_tmp, ctx) = context();
        let err = GetDocPageTool
            .execute(json!({"path": "../etc/passwd"}), &ctx)
            .await
            .unwrap_err();
        assert_eq!(
            error_text(&err),
            "Error fetching documentation: Invalid path: path traversal not allowed\n\nTry using search_docs to find bundled documentation instead."
        );
    }

    #[test]
    fn test_doc_page_cites_fetched_url() {
        let page = FetchedPage {
            path: "guides/streaming".to_string(),
            url: crate::fetch::build_url("/guides/streaming").unwrap(),
            markdown: "# Streaming".to_string(),
        };
        assert_eq!(
            format_doc_page(&page),
            "# Documentation: guides/streaming\n\nSource: https://docs.x.ai/docs/guides/streaming\n\n# Streaming"
        );
    }

    #[tokio::test]
    async fn test_list_endpoints_header_and_base_urls() {
        let (_tmp, ctx) = context();
        let out = ListEndpointsTool
            .execute(json!({"category": "chat"}), &ctx)
            .await
            .unwrap();
        assert!(out.starts_with(
            "# xAI API Endpoints (chat)\n\n**Inference API:** https://api.x.ai\n**Management API:** https://management-api.x.ai\n\n| Method |"
        ));
        assert!(out.contains("/v1/chat/completions"));
        assert!(!out.contains("/v1/models"));
    }

    #[tokio::test]
    async fn test_list_endpoints_unknown_category() {
        let (_tmp, ctx) = context();
        let out = ListEndpointsTool
            .execute(json!({"category": "chats"}), &ctx)
            .await
            .unwrap();
        assert!(out.contains("> **Warning**: Unknown category \"chats\"."));
        assert!(out.contains("Did you mean: chat?"));
        assert!(out.ends_with("No endpoints found."));
    }

    #[tokio::test]
    async fn test_list_models() {
        let (_tmp, ctx) = context();
        let out = ListModelsTool.execute(json!({}), &ctx).await.unwrap();
        assert!(out.starts_with("# Grok Models\n\n| Model ID |"));
        assert!(out.contains("| `grok-4` | Grok 4 | 256K | text |"));
    }

    #[tokio::test]
    async fn test_missing_catalog_is_reported_safely() {
        let (tmp, ctx) = context();
        fs::remove_file(tmp.path().join("models.json")).unwrap();
        let err = ListModelsTool.execute(json!({}), &ctx).await.unwrap_err();
        assert_eq!(error_text(&err), "Error: Data file not found");
    }
}
