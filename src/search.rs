//! Keyword relevance scoring over the bundled corpus.
//!
//! A document's score is the sum, over every query term that occurs in it,
//! of the raw occurrence count plus weighted heading and inline-code
//! occurrences, plus a flat bonus when the whole query appears verbatim.
//! Matching is case-insensitive and literal: no stemming, no fuzzy matching.

use std::sync::Arc;

use crate::config::{SearchConfig, MAX_RESULTS_CAP};
use crate::corpus::Corpus;
use crate::logging::sanitize_for_log;
use crate::models::SearchResult;
use crate::patterns::{PatternCache, PatternKind};
use crate::snippet::{self, DEFAULT_MAX_LENGTH};

pub const EXACT_PHRASE_BONUS: u64 = 20;
pub const HEADER_MATCH_MULTIPLIER: u64 = 5;
pub const CODE_MATCH_MULTIPLIER: u64 = 2;

pub const MAX_QUERY_LENGTH: usize = 500;
/// Raw (untrimmed) length above which a query is dropped before trimming.
const MAX_RAW_QUERY_LENGTH: usize = MAX_QUERY_LENGTH * 2;

const MIN_TERM_LENGTH: usize = 2;
const MAX_TERM_LENGTH: usize = 100;
const MAX_TERM_COUNT: usize = 20;

/// Lower-cased whitespace tokens of sensible length, at most 20 of them.
pub fn parse_terms(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .filter(|t| (MIN_TERM_LENGTH..=MAX_TERM_LENGTH).contains(&t.chars().count()))
        .take(MAX_TERM_COUNT)
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QueryCheck {
    Ok,
    Empty,
    TooLong,
}

fn check_query(query: &str) -> QueryCheck {
    if query.chars().count() > MAX_RAW_QUERY_LENGTH {
        return QueryCheck::TooLong;
    }
    let trimmed = query.trim();
    if trimmed.is_empty() {
        QueryCheck::Empty
    } else if trimmed.chars().count() > MAX_QUERY_LENGTH {
        QueryCheck::TooLong
    } else {
        QueryCheck::Ok
    }
}

/// Search entry point. Owns the pattern cache and shares the corpus.
pub struct SearchEngine {
    corpus: Arc<Corpus>,
    patterns: PatternCache,
    max_results: usize,
    snippet_length: usize,
}

impl SearchEngine {
    pub fn new(corpus: Arc<Corpus>, config: &SearchConfig) -> Self {
        Self {
            corpus,
            patterns: PatternCache::default(),
            max_results: config.max_results.clamp(1, MAX_RESULTS_CAP),
            snippet_length: config.snippet_length,
        }
    }

    /// Engine with default limits (10 results, 400-character snippets).
    pub fn with_corpus(corpus: Arc<Corpus>) -> Self {
        Self {
            corpus,
            patterns: PatternCache::default(),
            max_results: MAX_RESULTS_CAP,
            snippet_length: DEFAULT_MAX_LENGTH,
        }
    }

    /// Ranked results for `query`, best first.
    ///
    /// An empty or over-length query logs a warning and yields no results.
    /// Ties keep corpus order.
    pub fn search(&self, query: &str) -> Vec<SearchResult> {
        match check_query(query) {
            QueryCheck::Ok => {}
            QueryCheck::Empty => {
                tracing::warn!("empty search query");
                return Vec::new();
            }
            QueryCheck::TooLong => {
                tracing::warn!(max = MAX_QUERY_LENGTH, "search query exceeds max length");
                return Vec::new();
            }
        }

        let terms = parse_terms(query);
        let mut results: Vec<SearchResult> = self
            .corpus
            .documents()
            .iter()
            .filter_map(|doc| {
                let relevance = self.score(&doc.content, query, &terms);
                (relevance > 0).then(|| SearchResult {
                    source: doc.name.clone(),
                    title: doc.title.clone(),
                    snippet: snippet::extract_snippet(
                        &doc.content,
                        &terms,
                        self.snippet_length,
                        &self.patterns,
                    ),
                    relevance,
                })
            })
            .collect();

        results.sort_by(|a, b| b.relevance.cmp(&a.relevance));
        results.truncate(self.max_results);

        tracing::debug!(
            query = %sanitize_for_log(query.trim()),
            results = results.len(),
            "search complete"
        );
        results
    }

    /// Score of `content` against `query`; 0 means no match.
    pub fn relevance(&self, content: &str, query: &str) -> u64 {
        if check_query(query) != QueryCheck::Ok {
            return 0;
        }
        self.score(content, query, &parse_terms(query))
    }

    /// Counts run over the whole document; only snippets are size-capped.
    fn score(&self, content: &str, query: &str, terms: &[String]) -> u64 {
        let mut score = 0;

        let phrase = query.trim().to_lowercase();
        if content.to_lowercase().contains(&phrase) {
            score += EXACT_PHRASE_BONUS;
        }

        for term in terms {
            let occurrences = self.count(PatternKind::TermCount, term, content);
            if occurrences == 0 {
                continue;
            }
            score += occurrences;
            score += self.count(PatternKind::HeadingCount, term, content) * HEADER_MATCH_MULTIPLIER;
            score += self.count(PatternKind::CodeCount, term, content) * CODE_MATCH_MULTIPLIER;
        }
        score
    }

    fn count(&self, kind: PatternKind, term: &str, content: &str) -> u64 {
        match self.patterns.count(kind, term, content) {
            Ok(n) => n as u64,
            Err(e) => {
                tracing::warn!(error = %e, "failed to compile match pattern");
                0
            }
        }
    }
}
