//! MCP JSON-RPC protocol bridge.
//!
//! Exposes the [`ToolRegistry`] as MCP tools via `list_tools` /
//! `call_tool`. A failing tool never fails the JSON-RPC request: it produces
//! a tool result flagged as an error whose text is the safe message from
//! [`error_text`].

use std::borrow::Cow;
use std::sync::Arc;

use rmcp::model::*;
use rmcp::{ErrorData as McpError, ServerHandler};

use crate::logging::sanitize_for_log;
use crate::tools::{error_text, ToolContext, ToolRegistry};

pub const SERVER_NAME: &str = "grok-api-docs";

/// Bridges the tool registry to the MCP JSON-RPC protocol.
///
/// Everything is behind `Arc`, so clones share the corpus, the pattern
/// cache and the HTTP client.
#[derive(Clone)]
pub struct McpBridge {
    ctx: Arc<ToolContext>,
    tools: Arc<ToolRegistry>,
}

impl McpBridge {
    pub fn new(ctx: Arc<ToolContext>, tools: Arc<ToolRegistry>) -> Self {
        Self { ctx, tools }
    }

    /// Convert a registry tool into an rmcp `Tool` descriptor.
    fn to_mcp_tool(tool: &dyn crate::tools::Tool) -> Tool {
        let input_schema: Arc<serde_json::Map<String, serde_json::Value>> =
            match tool.parameters_schema() {
                serde_json::Value::Object(map) => Arc::new(map),
                _ => Arc::new(serde_json::Map::new()),
            };

        Tool {
            name: Cow::Owned(tool.name().to_string()),
            title: None,
            description: Some(Cow::Owned(tool.description().to_string())),
            input_schema,
            output_schema: None,
            annotations: Some(ToolAnnotations::new().read_only(true)),
            execution: None,
            icons: None,
            meta: None,
        }
    }

    /// Run `name` with `arguments`, mapping failures to an error result.
    pub async fn dispatch(
        &self,
        name: &str,
        arguments: Option<serde_json::Map<String, serde_json::Value>>,
    ) -> Result<CallToolResult, McpError> {
        let tool = self.tools.find(name).ok_or_else(|| {
            McpError::new(
                ErrorCode::METHOD_NOT_FOUND,
                format!("no tool registered with name: {}", name),
                None,
            )
        })?;

        let params = serde_json::Value::Object(arguments.unwrap_or_default());

        match tool.execute(params, &self.ctx).await {
            Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
            Err(e) => {
                tracing::error!(
                    tool = %sanitize_for_log(name),
                    error = %sanitize_for_log(&e.to_string()),
                    "tool handler failed"
                );
                Ok(CallToolResult::error(vec![Content::text(error_text(&e))]))
            }
        }
    }
}

impl ServerHandler for McpBridge {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                title: Some("Grok API Docs".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                description: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Grok API documentation. Use search_docs for bundled guides, endpoints and \
                 models, get_doc_page to fetch a live page from docs.x.ai, and \
                 list_api_endpoints / list_models for the reference tables."
                    .to_string(),
            ),
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        let tools: Vec<Tool> = self
            .tools
            .tools()
            .iter()
            .map(|t| Self::to_mcp_tool(t.as_ref()))
            .collect();
        std::future::ready(Ok(ListToolsResult::with_all_items(tools)))
    }

    fn get_tool(&self, name: &str) -> Option<Tool> {
        self.tools.find(name).map(Self::to_mcp_tool)
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        self.dispatch(&request.name, request.arguments).await
    }
}
