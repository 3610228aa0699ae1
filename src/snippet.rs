//! Snippet extraction around the best query match.
//!
//! Offsets are byte offsets into UTF-8 text but every length limit
//! (`max_length`, the wrap threshold, the fallback offset) is counted in
//! characters, and every cut lands on a character boundary.

use crate::patterns::{PatternCache, PatternKind};

pub const DEFAULT_MAX_LENGTH: usize = 400;
/// Upper bound on the bytes scanned per document.
pub const MAX_CONTENT_SIZE: usize = 1024 * 1024;

const LINE_WRAP_THRESHOLD: usize = 100;
const FALLBACK_OFFSET: usize = 50;
const ELLIPSIS: &str = "...";

const HEADING_PRIORITY: u8 = 3;
const REGULAR_PRIORITY: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchLocation {
    pub index: usize,
    pub priority: u8,
}

/// Best-ranked match across `terms`.
///
/// Heading matches outrank plain ones; on equal priority the earlier term
/// wins. Once a heading match is found no plain search is attempted.
pub fn find_best_match(content: &str, terms: &[String], patterns: &PatternCache) -> Option<MatchLocation> {
    let mut best: Option<MatchLocation> = None;
    let priority = |best: &Option<MatchLocation>| best.map_or(0, |m| m.priority);

    for term in terms {
        if let Some(found) = find_match(content, term, PatternKind::HeadingLocate, patterns) {
            if found.priority > priority(&best) {
                best = Some(found);
            }
        }
        if priority(&best) < REGULAR_PRIORITY {
            if let Some(found) = find_match(content, term, PatternKind::TermCount, patterns) {
                best = Some(found);
            }
        }
    }
    best
}

fn find_match(content: &str, term: &str, kind: PatternKind, patterns: &PatternCache) -> Option<MatchLocation> {
    let regex = match patterns.get(kind, term) {
        Ok(regex) => regex,
        Err(e) => {
            tracing::warn!(error = %e, "failed to compile match pattern");
            return None;
        }
    };
    let priority = match kind {
        PatternKind::HeadingLocate => HEADING_PRIORITY,
        _ => REGULAR_PRIORITY,
    };
    regex.find(content).map(|m| MatchLocation {
        index: m.start(),
        priority,
    })
}

/// Excerpt of at most `max_length` characters (plus ellipsis markers).
pub fn extract_snippet(content: &str, terms: &[String], max_length: usize, patterns: &PatternCache) -> String {
    let content = clamp(content, MAX_CONTENT_SIZE);

    let Some(best) = find_best_match(content, terms, patterns) else {
        let end = advance_chars(content, 0, max_length);
        return wrap(content[..end].trim(), false, end < content.len());
    };

    let start = snippet_start(content, best.index);
    let end = advance_chars(content, start, max_length);
    wrap(content[start..end].trim(), start > 0, end < content.len())
}

/// Prefer the start of the match's line unless it is too far back.
fn snippet_start(content: &str, match_index: usize) -> usize {
    let line_start = content[..match_index].rfind('\n').map_or(0, |i| i + 1);
    if content[line_start..match_index].chars().count() > LINE_WRAP_THRESHOLD {
        retreat_chars(content, match_index, FALLBACK_OFFSET)
    } else {
        line_start
    }
}

fn wrap(snippet: &str, leading: bool, trailing: bool) -> String {
    let mut out = String::with_capacity(snippet.len() + 2 * ELLIPSIS.len());
    if leading {
        out.push_str(ELLIPSIS);
    }
    out.push_str(snippet);
    if trailing {
        out.push_str(ELLIPSIS);
    }
    out
}

/// Longest prefix of `s` that is at most `max_bytes` long.
pub fn clamp(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Byte offset `n` characters after `from`, capped at the end of `s`.
fn advance_chars(s: &str, from: usize, n: usize) -> usize {
    s[from..]
        .char_indices()
        .nth(n)
        .map_or(s.len(), |(i, _)| from + i)
}

/// Byte offset `n` characters before `from`, floored at zero.
fn retreat_chars(s: &str, from: usize, n: usize) -> usize {
    if n == 0 {
        return from;
    }
    s[..from]
        .char_indices()
        .rev()
        .nth(n - 1)
        .map_or(0, |(i, _)| i)
}
