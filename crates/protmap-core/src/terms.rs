//! Term membership: which proteins carry a given ontology annotation.
//!
//! Membership sets live on disk, one file per term, at
//! `{root}/{ontology}/{term}` with one protein identifier per line. They are
//! loaded lazily the first time a query asks for them and then kept for the
//! lifetime of the process.
//!
//! # Concurrency
//!
//! The cache lock is only held to read or insert a map entry, never across
//! the file read. Two sessions missing on the same key at once will both
//! read the file and both insert; the sets are equal, so whichever insert
//! lands last is as good as the first. Entries are never evicted: the term
//! vocabulary is bounded in practice, and the cache logs its size on every
//! insert so growth stays visible.

use crate::error::{LoadError, TermError};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// Ontology used when a request names a term but no ontology.
pub const DEFAULT_ONTOLOGY: &str = "BP";

/// Identity of one membership set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TermKey {
    pub ontology: String,
    pub term: String,
}

impl TermKey {
    pub fn new(ontology: impl Into<String>, term: impl Into<String>) -> Self {
        Self {
            ontology: ontology.into(),
            term: term.into(),
        }
    }

    fn not_found(&self) -> TermError {
        TermError::NotFound {
            ontology: self.ontology.clone(),
            term: self.term.clone(),
        }
    }
}

impl std::fmt::Display for TermKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.ontology, self.term)
    }
}

/// A path component that cannot escape the store root.
fn is_plain_component(part: &str) -> bool {
    !part.is_empty() && part != "." && part != ".." && !part.contains(['/', '\\'])
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Directory of per-term membership files.
#[derive(Debug, Clone)]
pub struct TermStore {
    root: PathBuf,
}

impl TermStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read the membership file for `key`.
    ///
    /// Keys whose parts are not plain path components are reported as
    /// `NotFound` without touching the filesystem.
    pub async fn load(&self, key: &TermKey) -> Result<HashSet<String>, TermError> {
        if !is_plain_component(&key.ontology) || !is_plain_component(&key.term) {
            return Err(key.not_found());
        }
        let path = self.root.join(&key.ontology).join(&key.term);
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(key.not_found()),
            Err(source) => Err(TermError::Io { path, source }),
        }
    }
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

/// Lazily populated, never-evicting cache of term membership sets.
#[derive(Debug)]
pub struct TermMembershipCache {
    store: TermStore,
    entries: RwLock<HashMap<TermKey, Arc<HashSet<String>>>>,
    loads: AtomicU64,
}

impl TermMembershipCache {
    pub fn new(store: TermStore) -> Self {
        Self {
            store,
            entries: RwLock::new(HashMap::new()),
            loads: AtomicU64::new(0),
        }
    }

    /// Proteins annotated with `term` in `ontology`.
    pub async fn members_of(
        &self,
        ontology: &str,
        term: &str,
    ) -> Result<Arc<HashSet<String>>, TermError> {
        let key = TermKey::new(ontology, term);
        if let Some(members) = self.cached(&key) {
            return Ok(members);
        }

        self.loads.fetch_add(1, Ordering::Relaxed);
        let members = Arc::new(self.store.load(&key).await?);

        let size = {
            let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
            entries.insert(key.clone(), Arc::clone(&members));
            entries.len()
        };
        tracing::debug!(term = %key, members = members.len(), cached_terms = size, "term cached");
        Ok(members)
    }

    fn cached(&self, key: &TermKey) -> Option<Arc<HashSet<String>>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(key).cloned()
    }

    /// Number of cached terms.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total store reads attempted, including ones that found nothing.
    pub fn loads(&self) -> u64 {
        self.loads.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// One human-readable term name.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct TermName {
    pub id: String,
    pub name: String,
}

/// Term id -> name lookup, used for autocompletion.
///
/// Loaded from a TSV of `ontology<TAB>term<TAB>name` lines.
#[derive(Debug, Default)]
pub struct TermCatalog {
    by_ontology: HashMap<String, Vec<TermName>>,
}

impl TermCatalog {
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, &path.display().to_string())
    }

    pub fn parse(text: &str, origin: &str) -> Result<Self, LoadError> {
        let mut catalog = Self::default();
        for (i, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.splitn(3, '\t').collect();
            let [ontology, id, name] = fields[..] else {
                return Err(LoadError::MalformedLine {
                    path: origin.to_string(),
                    line: i + 1,
                    expected: 3,
                    found: fields.len(),
                });
            };
            catalog
                .by_ontology
                .entry(ontology.to_string())
                .or_default()
                .push(TermName {
                    id: id.to_string(),
                    name: name.trim_end().to_string(),
                });
        }
        Ok(catalog)
    }

    /// Terms of `ontology` whose id or name contains `needle`
    /// (case-insensitive), in file order, at most `limit`.
    pub fn lookup(&self, ontology: &str, needle: &str, limit: usize) -> Vec<TermName> {
        let needle = needle.to_lowercase();
        self.by_ontology
            .get(ontology)
            .into_iter()
            .flatten()
            .filter(|t| {
                t.id.to_lowercase().contains(&needle) || t.name.to_lowercase().contains(&needle)
            })
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.by_ontology.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
