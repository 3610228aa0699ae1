//! Diagnostic logging.
//!
//! All log output goes to stderr: when serving MCP over stdio, stdout is
//! reserved for JSON-RPC frames and any stray byte there corrupts the stream.

use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over the configured filter. Calling this more
/// than once is harmless; later calls are ignored.
pub fn init(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Make a caller-controlled string safe to embed in a single log line.
///
/// Backslashes and common whitespace escapes are made visible, other control
/// characters are dropped, so a crafted value cannot forge extra log lines.
pub fn sanitize_for_log(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_ascii_control() => {}
            c => out.push(c),
        }
    }
    out
}
