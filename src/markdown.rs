//! Regex-driven HTML → Markdown conversion.
//!
//! The conversion is a fixed sequence of named [`TransformStep`]s. Each step
//! runs in isolation: if it returns an error or panics, its input passes
//! through unchanged, the step name is recorded, and the remaining steps
//! still run. When anything failed, the output is prefixed with a visible
//! degradation notice listing the failed steps.
//!
//! This is pattern matching, not an HTML parser. Nested or malformed markup
//! is handled only as well as the non-greedy patterns below allow, and a tag
//! pattern such as `<b[^>]*>` also matches longer names (`<body>`, `<br>`).
//! Those outputs are kept stable rather than corrected. The response size
//! limit in [`crate::fetch`] bounds the work.

use regex::{Captures, Regex};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::OnceLock;

use crate::error::TransformError;

pub type StepFn = fn(&str) -> Result<String, TransformError>;

/// One named stage of the pipeline.
#[derive(Clone, Copy)]
pub struct TransformStep {
    pub name: &'static str,
    pub run: StepFn,
}

impl std::fmt::Debug for TransformStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformStep").field("name", &self.name).finish()
    }
}

/// Steps whose failure leaves the output structurally unreliable.
const CRITICAL_STEPS: [&str; 3] = [
    "remove_scripts_and_styles",
    "extract_main_content",
    "cleanup_markdown",
];

/// Result of a pipeline run before the degradation notice is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    pub markdown: String,
    pub failed_steps: Vec<&'static str>,
}

impl Conversion {
    /// The Markdown, prefixed with a warning if any step failed.
    pub fn into_text(self) -> String {
        if self.failed_steps.is_empty() {
            self.markdown
        } else {
            format!(
                "> **Warning**: Some formatting may be incomplete (failed: {})\n\n{}",
                self.failed_steps.join(", "),
                self.markdown
            )
        }
    }
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    steps: Vec<TransformStep>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::standard()
    }
}

impl Pipeline {
    pub fn new(steps: Vec<TransformStep>) -> Self {
        Self { steps }
    }

    /// The full HTML → Markdown sequence, in order.
    pub fn standard() -> Self {
        Self::new(vec![
            TransformStep { name: "remove_scripts_and_styles", run: remove_scripts_and_styles },
            TransformStep { name: "extract_main_content", run: extract_main_content },
            TransformStep { name: "convert_headers", run: convert_headers },
            TransformStep { name: "convert_code_blocks", run: convert_code_blocks },
            TransformStep { name: "convert_links", run: convert_links },
            TransformStep { name: "convert_lists", run: convert_lists },
            TransformStep { name: "convert_text_formatting", run: convert_text_formatting },
            TransformStep { name: "decode_html_entities", run: decode_html_entities },
            TransformStep { name: "cleanup_markdown", run: cleanup_markdown },
        ])
    }

    pub fn steps(&self) -> &[TransformStep] {
        &self.steps
    }

    pub fn convert(&self, html: &str) -> Conversion {
        let mut content = html.to_string();
        let mut failed_steps = Vec::new();

        for step in &self.steps {
            let outcome = catch_unwind(AssertUnwindSafe(|| (step.run)(&content)))
                .unwrap_or(Err(TransformError::Panicked));
            match outcome {
                Ok(next) => content = next,
                Err(e) => {
                    tracing::error!(step = step.name, error = %e, "transform step failed");
                    failed_steps.push(step.name);
                }
            }
        }

        let critical: Vec<&str> = failed_steps
            .iter()
            .copied()
            .filter(|name| CRITICAL_STEPS.contains(name))
            .collect();
        if !critical.is_empty() {
            tracing::warn!(
                steps = %critical.join(", "),
                "critical transform failed; output may contain raw HTML"
            );
        }

        Conversion {
            markdown: content,
            failed_steps,
        }
    }

    /// Convert and apply the degradation notice.
    pub fn run(&self, html: &str) -> String {
        self.convert(html).into_text()
    }
}

/// Convert `html` with [`Pipeline::standard`].
pub fn html_to_markdown(html: &str) -> String {
    Pipeline::standard().run(html)
}

// ============ Patterns ============

fn compiled(cell: &'static OnceLock<Regex>, pattern: &str) -> Result<&'static Regex, TransformError> {
    if let Some(re) = cell.get() {
        return Ok(re);
    }
    let re = Regex::new(pattern)?;
    Ok(cell.get_or_init(|| re))
}

macro_rules! regex {
    ($pattern:expr) => {{
        static CELL: OnceLock<Regex> = OnceLock::new();
        compiled(&CELL, $pattern)
    }};
}

/// A pattern and its `$n`-style replacement.
type Rule = (&'static str, &'static str);

fn apply_rules(
    cell: &'static OnceLock<Vec<Regex>>,
    rules: &[Rule],
    input: &str,
) -> Result<String, TransformError> {
    let compiled = match cell.get() {
        Some(compiled) => compiled,
        None => {
            let built = rules
                .iter()
                .map(|(pattern, _)| Regex::new(pattern))
                .collect::<Result<Vec<_>, _>>()?;
            cell.get_or_init(|| built)
        }
    };

    let mut out = input.to_string();
    for (re, (_, replacement)) in compiled.iter().zip(rules) {
        out = re.replace_all(&out, *replacement).into_owned();
    }
    Ok(out)
}

const HEADER_RULES: [Rule; 6] = [
    (r"(?i)<h1[^>]*>([\s\S]*?)</h1>", "\n# ${1}\n"),
    (r"(?i)<h2[^>]*>([\s\S]*?)</h2>", "\n## ${1}\n"),
    (r"(?i)<h3[^>]*>([\s\S]*?)</h3>", "\n### ${1}\n"),
    (r"(?i)<h4[^>]*>([\s\S]*?)</h4>", "\n#### ${1}\n"),
    (r"(?i)<h5[^>]*>([\s\S]*?)</h5>", "\n##### ${1}\n"),
    (r"(?i)<h6[^>]*>([\s\S]*?)</h6>", "\n###### ${1}\n"),
];

const CODE_RULES: [Rule; 4] = [
    (
        r#"(?i)<pre[^>]*><code[^>]*class="[^"]*language-(\w+)[^"]*"[^>]*>([\s\S]*?)</code></pre>"#,
        "\n```${1}\n${2}\n```\n",
    ),
    (r"(?i)<pre[^>]*><code[^>]*>([\s\S]*?)</code></pre>", "\n```\n${1}\n```\n"),
    (r"(?i)<pre[^>]*>([\s\S]*?)</pre>", "\n```\n${1}\n```\n"),
    (r"(?i)<code[^>]*>([\s\S]*?)</code>", "`${1}`"),
];

const LIST_RULES: [Rule; 5] = [
    (r"(?i)<ul[^>]*>", "\n"),
    (r"(?i)</ul>", "\n"),
    (r"(?i)<ol[^>]*>", "\n"),
    (r"(?i)</ol>", "\n"),
    (r"(?i)<li[^>]*>([\s\S]*?)</li>", "- ${1}\n"),
];

const TEXT_RULES: [Rule; 7] = [
    (r"(?i)<p[^>]*>([\s\S]*?)</p>", "\n${1}\n"),
    (r"(?i)<strong[^>]*>([\s\S]*?)</strong>", "**${1}**"),
    (r"(?i)<b[^>]*>([\s\S]*?)</b>", "**${1}**"),
    (r"(?i)<em[^>]*>([\s\S]*?)</em>", "*${1}*"),
    (r"(?i)<i[^>]*>([\s\S]*?)</i>", "*${1}*"),
    (r"(?i)<br\s*/?>", "\n"),
    (r"(?i)<blockquote[^>]*>([\s\S]*?)</blockquote>", "\n> ${1}\n"),
];

const MAIN_CONTENT_PATTERNS: [&str; 3] = [
    r"(?i)<main[^>]*>([\s\S]*?)</main>",
    r"(?i)<article[^>]*>([\s\S]*?)</article>",
    r#"(?i)<div[^>]*class="[^"]*content[^"]*"[^>]*>([\s\S]*?)</div>"#,
];

const NAMED_ENTITIES: [(&str, &str); 31] = [
    ("&amp;", "&"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&apos;", "'"),
    ("&nbsp;", " "),
    ("&ndash;", "\u{2013}"),
    ("&mdash;", "\u{2014}"),
    ("&hellip;", "\u{2026}"),
    ("&lsquo;", "\u{2018}"),
    ("&rsquo;", "\u{2019}"),
    ("&ldquo;", "\u{201C}"),
    ("&rdquo;", "\u{201D}"),
    ("&bull;", "\u{2022}"),
    ("&middot;", "\u{00B7}"),
    ("&copy;", "\u{00A9}"),
    ("&reg;", "\u{00AE}"),
    ("&trade;", "\u{2122}"),
    ("&deg;", "\u{00B0}"),
    ("&plusmn;", "\u{00B1}"),
    ("&times;", "\u{00D7}"),
    ("&divide;", "\u{00F7}"),
    ("&cent;", "\u{00A2}"),
    ("&pound;", "\u{00A3}"),
    ("&euro;", "\u{20AC}"),
    ("&yen;", "\u{00A5}"),
    ("&larr;", "\u{2190}"),
    ("&rarr;", "\u{2192}"),
    ("&uarr;", "\u{2191}"),
    ("&darr;", "\u{2193}"),
];

// ============ Steps ============

pub fn remove_scripts_and_styles(html: &str) -> Result<String, TransformError> {
    let scripts = regex!(r"(?i)<script[^>]*>[\s\S]*?</script>")?;
    let styles = regex!(r"(?i)<style[^>]*>[\s\S]*?</style>")?;
    let without_scripts = scripts.replace_all(html, "");
    Ok(styles.replace_all(&without_scripts, "").into_owned())
}

/// Inner HTML of the first `<main>`, `<article>` or content-class `<div>`.
pub fn extract_main_content(html: &str) -> Result<String, TransformError> {
    static CELL: OnceLock<Vec<Regex>> = OnceLock::new();
    let patterns = match CELL.get() {
        Some(patterns) => patterns,
        None => {
            let built = MAIN_CONTENT_PATTERNS
                .iter()
                .map(|p| Regex::new(p))
                .collect::<Result<Vec<_>, _>>()?;
            CELL.get_or_init(|| built)
        }
    };

    for re in patterns {
        if let Some(inner) = re.captures(html).and_then(|c| c.get(1)) {
            return Ok(inner.as_str().to_string());
        }
    }
    Ok(html.to_string())
}

pub fn convert_headers(html: &str) -> Result<String, TransformError> {
    static CELL: OnceLock<Vec<Regex>> = OnceLock::new();
    apply_rules(&CELL, &HEADER_RULES, html)
}

pub fn convert_code_blocks(html: &str) -> Result<String, TransformError> {
    static CELL: OnceLock<Vec<Regex>> = OnceLock::new();
    apply_rules(&CELL, &CODE_RULES, html)
}

pub fn convert_links(html: &str) -> Result<String, TransformError> {
    let links = regex!(r#"(?i)<a[^>]*href="([^"]*)"[^>]*>([\s\S]*?)</a>"#)?;
    Ok(links.replace_all(html, "[${2}](${1})").into_owned())
}

pub fn convert_lists(html: &str) -> Result<String, TransformError> {
    static CELL: OnceLock<Vec<Regex>> = OnceLock::new();
    apply_rules(&CELL, &LIST_RULES, html)
}

pub fn convert_text_formatting(html: &str) -> Result<String, TransformError> {
    static CELL: OnceLock<Vec<Regex>> = OnceLock::new();
    apply_rules(&CELL, &TEXT_RULES, html)
}

/// Decode the known named entities, then numeric ones.
///
/// Unknown named entities are left as they are. A numeric entity whose code
/// point fails [`is_safe_code_point`] decodes to nothing.
pub fn decode_html_entities(text: &str) -> Result<String, TransformError> {
    static NAMED: OnceLock<Regex> = OnceLock::new();
    let named = match NAMED.get() {
        Some(re) => re,
        None => {
            let alternation = NAMED_ENTITIES
                .iter()
                .map(|(entity, _)| regex::escape(entity))
                .collect::<Vec<_>>()
                .join("|");
            compiled(&NAMED, &alternation)?
        }
    };
    let numeric = regex!(r"&#(\d+);|&#x([0-9a-fA-F]+);")?;

    let decoded = named.replace_all(text, |caps: &Captures| {
        let entity = &caps[0];
        NAMED_ENTITIES
            .iter()
            .find(|(name, _)| *name == entity)
            .map_or(entity, |(_, value)| *value)
            .to_string()
    });

    let decoded = numeric.replace_all(&decoded, |caps: &Captures| {
        let code_point = match (caps.get(1), caps.get(2)) {
            (Some(dec), _) => dec.as_str().parse::<u32>().ok(),
            (None, Some(hex)) => u32::from_str_radix(hex.as_str(), 16).ok(),
            _ => None,
        };
        code_point
            .filter(|cp| is_safe_code_point(*cp))
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_default()
    });

    Ok(decoded.into_owned())
}

/// Whether `cp` may be emitted from a numeric entity.
///
/// Rejects out-of-range values, surrogates, NUL, C0 controls other than
/// tab/newline/carriage return, DEL and the C1 controls.
pub fn is_safe_code_point(cp: u32) -> bool {
    match cp {
        0 => false,
        9 | 10 | 13 => true,
        1..=31 => false,
        0x7F..=0x9F => false,
        0xD800..=0xDFFF => false,
        _ => cp <= 0x10FFFF,
    }
}

/// Strip leftover tags, collapse blank runs, trim.
pub fn cleanup_markdown(text: &str) -> Result<String, TransformError> {
    let tags = regex!(r"<[^>]+>")?;
    let blank_runs = regex!(r"\n{3,}")?;
    let stripped = tags.replace_all(text, "");
    Ok(blank_runs.replace_all(&stripped, "\n\n").trim().to_string())
}
