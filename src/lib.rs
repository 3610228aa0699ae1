//! # Grok Docs
//!
//! An MCP server giving AI assistants access to the Grok API documentation.
//!
//! Bundled Markdown guides plus the endpoint and model catalogs are loaded
//! into memory and searched with a small weighted scorer. Live pages are
//! fetched from `docs.x.ai` through a validated path, size-limited download
//! and an HTML to Markdown pipeline that degrades gracefully.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌──────────────┐
//! │  data/*.md  │──▶│   Corpus    │──▶│ SearchEngine │──┐
//! │  *.json     │   │ (lazy load) │   │  + snippets  │  │
//! └─────────────┘   └─────────────┘   └──────────────┘  │   ┌──────────┐
//!                                                       ├──▶│  Tools   │──▶ MCP (stdio) / CLI
//! ┌─────────────┐   ┌─────────────┐   ┌──────────────┐  │   └──────────┘
//! │ docs.x.ai   │──▶│ DocFetcher  │──▶│   Pipeline   │──┘
//! │  (HTTPS)    │   │ (validated) │   │ HTML → MD    │
//! └─────────────┘   └─────────────┘   └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! grok-docs search "function calling"
//! grok-docs fetch guides/streaming
//! grok-docs serve                     # MCP over stdio
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`catalog`] | Endpoint and model catalog loading |
//! | [`corpus`] | Lazily loaded searchable documents |
//! | [`patterns`] | Bounded cache of compiled term patterns |
//! | [`search`] | Relevance scoring and ranking |
//! | [`snippet`] | Match-centred excerpts |
//! | [`doc_path`] | Documentation path validation |
//! | [`markdown`] | HTML to Markdown pipeline |
//! | [`fetch`] | Remote page fetching |
//! | [`format`] | Table and value formatting |
//! | [`listing`] | Endpoint and model listings |
//! | [`tools`] | Tool trait, context and registry |
//! | [`mcp`] | MCP protocol bridge |
//! | [`server`] | stdio server entry point |
//! | [`logging`] | Tracing setup and log sanitizing |
//! | [`error`] | Typed errors |

pub mod catalog;
pub mod config;
pub mod corpus;
pub mod doc_path;
pub mod error;
pub mod fetch;
pub mod format;
pub mod listing;
pub mod logging;
pub mod markdown;
pub mod mcp;
pub mod models;
pub mod patterns;
pub mod search;
pub mod server;
pub mod snippet;
pub mod tools;
