//! # Grok Docs CLI (`grok-docs`)
//!
//! Serves the Grok API documentation tools to an MCP client over stdio, and
//! runs the same tools one-shot from the command line.
//!
//! ## Usage
//!
//! ```bash
//! grok-docs --config ./config/grok-docs.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `grok-docs serve` | Start the MCP server on stdio |
//! | `grok-docs search "<query>"` | Search the bundled documentation |
//! | `grok-docs fetch <path>` | Fetch a live page from docs.x.ai as Markdown |
//! | `grok-docs endpoints [--category C]` | List API endpoints |
//! | `grok-docs models` | List models |
//! | `grok-docs tools` | List the tools exposed over MCP |
//!
//! ## Examples
//!
//! ```bash
//! grok-docs search "function calling"
//! grok-docs fetch guides/function-calling
//! grok-docs endpoints --category chat
//! ```

use anyhow::anyhow;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::path::PathBuf;

use grok_docs::config::{self, Config};
use grok_docs::logging;
use grok_docs::server;
use grok_docs::tools::{error_text, ToolContext, ToolRegistry};

/// Grok API documentation server and lookup tool.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. When the file does not exist, built-in defaults are used. See
/// `config/grok-docs.example.toml` for every option.
#[derive(Parser)]
#[command(
    name = "grok-docs",
    about = "Search bundled Grok API docs and fetch live pages from docs.x.ai",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/grok-docs.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the MCP server on stdin/stdout.
    Serve,

    /// Search the bundled documentation.
    Search {
        /// Search term or phrase.
        query: String,
    },

    /// Fetch a documentation page from docs.x.ai and print it as Markdown.
    Fetch {
        /// Documentation path, e.g. `guides/function-calling`.
        path: String,
    },

    /// List API endpoints, optionally filtered by category.
    Endpoints {
        /// One of: chat, images, videos, voice, models, files, batch,
        /// collections, api-keys, billing, team, audit.
        #[arg(long)]
        category: Option<String>,
    },

    /// List available models.
    Models,

    /// List the tools exposed over MCP.
    Tools,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = config::load_or_default(&cli.config)?;
    logging::init(&cfg.log.filter);

    match cli.command {
        Commands::Serve => {
            server::run_stdio_server(cfg).await?;
        }
        Commands::Search { query } => {
            run_tool(cfg, "search_docs", json!({ "query": query })).await?;
        }
        Commands::Fetch { path } => {
            run_tool(cfg, "get_doc_page", json!({ "path": path })).await?;
        }
        Commands::Endpoints { category } => {
            run_tool(cfg, "list_api_endpoints", json!({ "category": category })).await?;
        }
        Commands::Models => {
            run_tool(cfg, "list_models", json!({})).await?;
        }
        Commands::Tools => {
            for tool in ToolRegistry::with_builtins().tools() {
                println!("{:<20} {}", tool.name(), tool.description());
            }
        }
    }

    Ok(())
}

/// Run one built-in tool and print its output.
///
/// A tool failure is printed to stderr and exits with status 1.
async fn run_tool(cfg: Config, name: &str, params: Value) -> anyhow::Result<()> {
    let ctx = ToolContext::from_config(cfg)?;
    let registry = ToolRegistry::with_builtins();
    let tool = registry
        .find(name)
        .ok_or_else(|| anyhow!("unknown tool: {}", name))?;

    match tool.execute(params, &ctx).await {
        Ok(text) => {
            println!("{}", text);
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", error_text(&e));
            std::process::exit(1);
        }
    }
}
