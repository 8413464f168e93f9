//! Test builders: ergonomic constructors for rows, tables and a wired-up
//! engine.
//!
//! These builders are designed for readability in test assertions, not for
//! production use. They panic on invalid input rather than returning `Result`.

use protmap_core::clusters::{ClusterMapping, ReverseNameIndex};
use protmap_core::config::Config;
use protmap_core::search::{NameSearchIndex, SearchCache, SearchLimits};
use protmap_core::table::{PointRow, PointTableBuilder};
use protmap_core::terms::{TermMembershipCache, TermStore};
use protmap_core::{PointTable, QueryEngine};
use protmap_server::SessionContext;
use std::path::Path;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// RowBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for [`PointRow`] fixtures.
///
/// ```rust
/// let row = RowBuilder::new("MIP_00001")
///     .at(1.0, -2.0)
///     .kind("mip-clusters")
///     .plddt(85.0)
///     .build();
/// ```
pub struct RowBuilder {
    row: PointRow,
}

impl RowBuilder {
    pub fn new(protein: impl Into<String>) -> Self {
        Self {
            row: PointRow {
                protein: protein.into(),
                x: Some(0.0),
                y: Some(0.0),
                kind: "mip-clusters".to_string(),
                length: 100,
                plddt: None,
                supercog: "s1".to_string(),
                taxonomy: None,
                cluster: None,
            },
        }
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.row.x = Some(x);
        self.row.y = Some(y);
        self
    }

    pub fn kind(mut self, kind: &str) -> Self {
        self.row.kind = kind.to_string();
        self
    }

    pub fn length(mut self, length: u32) -> Self {
        self.row.length = length;
        self
    }

    pub fn plddt(mut self, plddt: f64) -> Self {
        self.row.plddt = Some(plddt);
        self
    }

    pub fn supercog(mut self, supercog: &str) -> Self {
        self.row.supercog = supercog.to_string();
        self
    }

    pub fn taxonomy(mut self, taxonomy: &str) -> Self {
        self.row.taxonomy = Some(taxonomy.to_string());
        self
    }

    pub fn cluster(mut self, cluster: &str) -> Self {
        self.row.cluster = Some(cluster.to_string());
        self
    }

    pub fn build(self) -> PointRow {
        self.row
    }
}

/// Build a table from rows with the default shuffle seed.
pub fn table_of(rows: impl IntoIterator<Item = PointRow>) -> Arc<PointTable> {
    let mut builder = PointTableBuilder::new();
    for row in rows {
        builder.push(row);
    }
    Arc::new(builder.build(Config::defaults().table.shuffle_seed))
}

// ---------------------------------------------------------------------------
// Engine wiring
// ---------------------------------------------------------------------------

/// Engine over `table` whose term store lives at `terms_dir`.
pub fn engine_with_terms(table: Arc<PointTable>, terms_dir: &Path) -> QueryEngine {
    let terms = TermMembershipCache::new(TermStore::new(terms_dir));
    QueryEngine::new(table, Arc::new(terms))
}

/// Engine over `table` with an empty term store.
pub fn engine(table: Arc<PointTable>) -> QueryEngine {
    engine_with_terms(table, Path::new("/nonexistent-protmap-terms"))
}

/// Session context with the default stream settings.
pub fn session_context(engine: QueryEngine) -> Arc<SessionContext> {
    Arc::new(SessionContext::new(engine, &Config::defaults().stream))
}

/// Name search over a table and cluster mapping.
pub fn search_index(
    table: Arc<PointTable>,
    clusters: ClusterMapping,
    cache_capacity: usize,
) -> NameSearchIndex {
    let reverse = ReverseNameIndex::build(&clusters);
    NameSearchIndex::new(
        table,
        Arc::new(clusters),
        Arc::new(reverse),
        Arc::new(SearchCache::new(cache_capacity)),
        SearchLimits::default(),
    )
}

/// Write a membership file `{root}/{ontology}/{term}`.
pub fn write_term(root: &Path, ontology: &str, term: &str, proteins: &[&str]) {
    let dir = root.join(ontology);
    std::fs::create_dir_all(&dir).expect("create ontology dir");
    std::fs::write(dir.join(term), proteins.join("\n")).expect("write term file");
}
