//! Bounded cache of compiled match patterns.
//!
//! Keys are `(PatternKind, term)`. A hit moves the entry to most-recently
//! used; a miss compiles and inserts, and once the cache holds `capacity`
//! entries the `eviction_batch` least-recently-used ones are dropped in one
//! go. Recency is a monotonically increasing tick kept in a `BTreeMap`, so the
//! oldest entries are always at the front.

use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

pub const DEFAULT_CAPACITY: usize = 1000;
pub const DEFAULT_EVICTION_BATCH: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternKind {
    /// Any occurrence of the term.
    TermCount,
    /// Occurrences on a Markdown heading line.
    HeadingCount,
    /// Occurrences inside an inline code span.
    CodeCount,
    /// First heading line containing the term; group 1 is the text before it.
    HeadingLocate,
}

impl PatternKind {
    fn source(self, term: &str) -> String {
        let escaped = regex::escape(term);
        match self {
            PatternKind::TermCount => format!("(?i){}", escaped),
            PatternKind::HeadingCount => format!("(?im)^#+.*?{}", escaped),
            PatternKind::CodeCount => format!("(?i)`[^`]*{}[^`]*`", escaped),
            PatternKind::HeadingLocate => format!("(?im)^(#+.*?){}", escaped),
        }
    }
}

type PatternKey = (PatternKind, String);

#[derive(Default)]
struct Inner {
    entries: HashMap<PatternKey, (Regex, u64)>,
    recency: BTreeMap<u64, PatternKey>,
    tick: u64,
}

impl Inner {
    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn evict_oldest(&mut self, count: usize) {
        let victims: Vec<u64> = self.recency.keys().take(count).copied().collect();
        for tick in victims {
            if let Some(key) = self.recency.remove(&tick) {
                self.entries.remove(&key);
            }
        }
    }
}

pub struct PatternCache {
    inner: Mutex<Inner>,
    capacity: usize,
    eviction_batch: usize,
}

impl Default for PatternCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_EVICTION_BATCH)
    }
}

impl PatternCache {
    pub fn new(capacity: usize, eviction_batch: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            capacity: capacity.max(1),
            eviction_batch: eviction_batch.clamp(1, capacity.max(1)),
        }
    }

    /// Compiled pattern for `(kind, term)`, compiling it on a miss.
    pub fn get(&self, kind: PatternKind, term: &str) -> Result<Regex, regex::Error> {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let inner = &mut *guard;
        let key = (kind, term.to_string());
        let tick = inner.next_tick();

        if let Some((regex, old_tick)) = inner.entries.get_mut(&key) {
            let regex = regex.clone();
            let old_tick = std::mem::replace(old_tick, tick);
            inner.recency.remove(&old_tick);
            inner.recency.insert(tick, key);
            return Ok(regex);
        }

        let regex = Regex::new(&kind.source(term))?;
        inner.entries.insert(key.clone(), (regex.clone(), tick));
        inner.recency.insert(tick, key);

        if inner.entries.len() >= self.capacity {
            let batch = self.eviction_batch;
            inner.evict_oldest(batch);
            tracing::debug!(evicted = batch, remaining = inner.entries.len(), "pattern cache eviction");
        }
        Ok(regex)
    }

    /// Number of non-overlapping matches of `(kind, term)` in `content`.
    pub fn count(&self, kind: PatternKind, term: &str, content: &str) -> Result<usize, regex::Error> {
        Ok(self.get(kind, term)?.find_iter(content).count())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, kind: PatternKind, term: &str) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entries
            .contains_key(&(kind, term.to_string()))
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
