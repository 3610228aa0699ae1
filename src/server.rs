//! MCP server over stdio.
//!
//! The client spawns the binary and speaks JSON-RPC over stdin/stdout. All
//! diagnostics go to stderr (see [`crate::logging`]).
//!
//! # Client Integration
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "grok-docs": {
//!       "command": "grok-docs",
//!       "args": ["--config", "/path/to/grok-docs.toml", "serve"]
//!     }
//!   }
//! }
//! ```

use rmcp::ServiceExt;
use std::sync::Arc;

use crate::config::Config;
use crate::mcp::{McpBridge, SERVER_NAME};
use crate::tools::{ToolContext, ToolRegistry};

/// Serve the built-in tools until the client disconnects.
pub async fn run_stdio_server(config: Config) -> anyhow::Result<()> {
    run_stdio_server_with_tools(config, ToolRegistry::with_builtins()).await
}

/// Like [`run_stdio_server`], serving `tools` instead of the built-ins.
pub async fn run_stdio_server_with_tools(config: Config, tools: ToolRegistry) -> anyhow::Result<()> {
    let data_dir = config.data.dir.display().to_string();
    let ctx = Arc::new(ToolContext::from_config(config)?);

    let tool_names: Vec<&str> = tools.tools().iter().map(|t| t.name()).collect();
    tracing::info!(
        tools = %tool_names.join(", "),
        data_dir = %data_dir,
        "{} v{} running on stdio",
        SERVER_NAME,
        env!("CARGO_PKG_VERSION")
    );

    let bridge = McpBridge::new(ctx, Arc::new(tools));
    let service = bridge.serve(rmcp::transport::stdio()).await?;
    service.waiting().await?;

    tracing::info!("client disconnected; shutting down");
    Ok(())
}
