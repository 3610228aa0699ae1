//! Small text formatters shared by the corpus flattener and the listing tools.

use crate::models::ModelValue;

const MILLION: i64 = 1_000_000;
const THOUSAND: i64 = 1_000;

/// Render a token window as `"2M"`, `"128K"`, `"512"` or `"N/A"`.
pub fn format_context_length(context_length: Option<i64>) -> String {
    match context_length {
        Some(n) if n >= MILLION => format!("{}M", round_div(n, MILLION)),
        Some(n) if n >= THOUSAND => format!("{}K", round_div(n, THOUSAND)),
        Some(n) if n > 0 => n.to_string(),
        _ => "N/A".to_string(),
    }
}

fn round_div(n: i64, d: i64) -> i64 {
    (n as f64 / d as f64).round() as i64
}

/// Join one or several model ids, optionally as inline code.
pub fn format_model_value(value: &ModelValue, markdown: bool) -> String {
    let wrap = |m: &str| {
        if markdown {
            format!("`{}`", m)
        } else {
            m.to_string()
        }
    };
    match value {
        ModelValue::One(m) => wrap(m),
        ModelValue::Many(ms) => ms.iter().map(|m| wrap(m)).collect::<Vec<_>>().join(", "),
    }
}

/// Render a Markdown table. Rows are padded or cut to the header width.
pub fn format_markdown_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    if headers.is_empty() {
        return String::new();
    }

    let width = headers.len();
    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(format!("| {} |", headers.join(" | ")));
    lines.push(format!("|{}|", vec!["---"; width].join("|")));

    for row in rows {
        let mut cells: Vec<&str> = row.iter().map(String::as_str).take(width).collect();
        cells.resize(width, "");
        lines.push(format!("| {} |", cells.join(" | ")));
    }

    lines.join("\n")
}
