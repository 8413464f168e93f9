//! Name search: find proteins by name and group them by cluster.
//!
//! A search runs in two stages:
//!
//! 1. **Match**: the term is compiled as a case-insensitive regex (falling
//!    back to a literal when it is not a valid pattern) and tested against
//!    every key of the [`ReverseNameIndex`] in index order. The first
//!    `match_limit` hits are stored in the [`SearchCache`], so repeated terms
//!    never rescan the key set.
//! 2. **Group**: the first `result_limit` hits are resolved to their cluster
//!    representative row and the full member list of that cluster. Hits whose
//!    representative is not in the point table are skipped.
//!
//! Results keep discovery order; there is no relevance ranking.

use crate::clusters::{ClusterMapping, ReverseNameIndex};
use crate::table::PointTable;
use crate::types::{clean_name, PointRecord};
use indexmap::IndexMap;
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

/// Hit/miss counters for a [`SearchCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Bounded least-recently-used map `search term -> matching keys`.
///
/// Entries are kept in recency order (oldest first) inside an [`IndexMap`];
/// a hit moves the entry to the back and an insert at capacity evicts the
/// front. Concurrent misses on the same term both compute and both insert;
/// the values are identical, so the last insert wins harmlessly.
///
/// Inserts are applied synchronously and never refused, so a term searched
/// twice in a row is always a hit the second time. Frequency-admitting
/// caches such as `mini_moka` may drop a new key and apply writes lazily.
#[derive(Debug)]
pub struct SearchCache {
    capacity: usize,
    entries: Mutex<IndexMap<String, Arc<Vec<String>>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl SearchCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(IndexMap::with_capacity(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn get(&self, term: &str) -> Option<Arc<Vec<String>>> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get_index_of(term) {
            Some(index) => {
                let last = entries.len() - 1;
                entries.move_index(index, last);
                self.hits.fetch_add(1, Ordering::Relaxed);
                entries.get_index(last).map(|(_, keys)| Arc::clone(keys))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn insert(&self, term: &str, keys: Arc<Vec<String>>) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.shift_remove(term);
        while entries.len() >= self.capacity {
            entries.shift_remove_index(0);
        }
        entries.insert(term.to_string(), keys);
    }

    pub fn contains(&self, term: &str) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(term)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// One member of a matched cluster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterMember {
    pub protein: String,
    /// Display name used by the client to reference this member's structure.
    pub name: String,
}

/// A search hit grouped with its cluster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    /// The protein name that matched the search term.
    pub matched: String,
    /// Table row of the cluster representative.
    pub representative: PointRecord,
    /// Every member of the cluster, in mapping order.
    pub members: Vec<ClusterMember>,
}

// ---------------------------------------------------------------------------
// Index
// ---------------------------------------------------------------------------

/// Limits applied by [`NameSearchIndex::search`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    /// Matching keys kept per term in the cache.
    pub match_limit: usize,
    /// Grouped hits returned per search.
    pub result_limit: usize,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            match_limit: 100,
            result_limit: 10,
        }
    }
}

/// Protein-name search over the reverse cluster index.
#[derive(Debug)]
pub struct NameSearchIndex {
    table: Arc<PointTable>,
    clusters: Arc<ClusterMapping>,
    reverse: Arc<ReverseNameIndex>,
    cache: Arc<SearchCache>,
    limits: SearchLimits,
}

impl NameSearchIndex {
    pub fn new(
        table: Arc<PointTable>,
        clusters: Arc<ClusterMapping>,
        reverse: Arc<ReverseNameIndex>,
        cache: Arc<SearchCache>,
        limits: SearchLimits,
    ) -> Self {
        Self {
            table,
            clusters,
            reverse,
            cache,
            limits,
        }
    }

    pub fn cache(&self) -> &SearchCache {
        &self.cache
    }

    /// Search for `term`. A blank term matches nothing.
    pub fn search(&self, term: &str) -> Vec<SearchHit> {
        if term.trim().is_empty() {
            return Vec::new();
        }
        let matches = self.matching_keys(term);
        matches
            .iter()
            .take(self.limits.result_limit)
            .filter_map(|protein| self.group(protein))
            .collect()
    }

    /// First `match_limit` reverse-index keys matching `term`, from cache
    /// when possible.
    pub fn matching_keys(&self, term: &str) -> Arc<Vec<String>> {
        if let Some(keys) = self.cache.get(term) {
            tracing::debug!(term, "search cache hit");
            return keys;
        }
        let keys: Arc<Vec<String>> = Arc::new(match compile(term) {
            Some(pattern) => self
                .reverse
                .keys()
                .filter(|key| pattern.is_match(key))
                .take(self.limits.match_limit)
                .map(str::to_string)
                .collect(),
            None => Vec::new(),
        });
        tracing::debug!(term, matches = keys.len(), "search cache miss");
        self.cache.insert(term, Arc::clone(&keys));
        keys
    }

    fn group(&self, protein: &str) -> Option<SearchHit> {
        let cluster = self.reverse.cluster_of(protein)?;
        let row = self.table.by_cluster(cluster)?;
        let members = self
            .clusters
            .members(cluster)
            .map(|members| {
                members
                    .iter()
                    .map(|m| ClusterMember {
                        protein: m.clone(),
                        name: clean_name(m).to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Some(SearchHit {
            matched: protein.to_string(),
            representative: self.table.record(row),
            members,
        })
    }
}

/// Case-insensitive regex for `term`, or its escaped literal when `term` is
/// not a valid pattern. `None` only if even the literal exceeds the regex
/// size limit.
fn compile(term: &str) -> Option<Regex> {
    RegexBuilder::new(term)
        .case_insensitive(true)
        .build()
        .or_else(|_| {
            RegexBuilder::new(&regex::escape(term))
                .case_insensitive(true)
                .build()
        })
        .ok()
}
