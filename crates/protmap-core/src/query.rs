//! Query engine: predicate composition, evaluation and truncation.
//!
//! A [`Query`] is compiled into an ordered list of [`Predicate`]s: the
//! bounding box first, then type, length, pLDDT, supercog, taxonomy and term
//! membership. A row matches when every predicate holds. Matching rows are
//! taken in table order and the result is cut to the first `result_limit`
//! (1000 by default); the cap is a prefix, never a sample.
//!
//! Every optional filter is an `Option`: `None` means "no filter". A present
//! but empty set is taken literally and matches nothing; the wire parser
//! maps empty lists to `None` before they get here.
//!
//! # Term filter
//!
//! The term filter is resolved before any row is scanned. When the
//! `(ontology, term)` pair has no membership file the engine returns an empty
//! result immediately, whatever the other predicates say.

use crate::error::TermError;
use crate::table::PointTable;
use crate::terms::TermMembershipCache;
use crate::types::{plddt_not_applicable, PointRecord};
use std::collections::HashSet;
use std::sync::Arc;

/// Default cap on the number of records returned by one query.
pub const DEFAULT_RESULT_LIMIT: usize = 1000;

// ---------------------------------------------------------------------------
// Query value
// ---------------------------------------------------------------------------

/// Inclusive rectangle in embedding coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x0: f64,
    pub x1: f64,
    pub y0: f64,
    pub y1: f64,
}

impl BoundingBox {
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.x0 <= x && x <= self.x1 && self.y0 <= y && y <= self.y1
    }
}

impl Default for BoundingBox {
    /// The whole plotted area.
    fn default() -> Self {
        Self {
            x0: -15.0,
            x1: 15.0,
            y0: -25.0,
            y1: 15.0,
        }
    }
}

/// Inclusive numeric range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
}

impl NumericRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }
}

/// Ontology annotation the results must carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermFilter {
    pub ontology: String,
    pub term: String,
}

/// A point query. Build with [`Query::default`] and set the filters needed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub bounds: BoundingBox,
    pub types: Option<HashSet<String>>,
    pub length: Option<NumericRange>,
    /// Records without a pLDDT value pass regardless of this range.
    pub plddt: Option<NumericRange>,
    pub supercog: Option<HashSet<String>>,
    pub taxonomy: Option<HashSet<String>>,
    pub term: Option<TermFilter>,
}

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

/// One compiled filter over table columns.
#[derive(Debug, Clone)]
pub enum Predicate {
    Bounds(BoundingBox),
    Kind(HashSet<u32>),
    Length(NumericRange),
    Plddt(NumericRange),
    Supercog(HashSet<u32>),
    Taxonomy(HashSet<u32>),
    Members(Arc<HashSet<String>>),
}

impl Predicate {
    pub fn matches(&self, table: &PointTable, row: usize) -> bool {
        match self {
            Predicate::Bounds(b) => b.contains(table.x(row), table.y(row)),
            Predicate::Kind(codes) => codes.contains(&table.kind_code(row)),
            Predicate::Length(range) => range.contains(f64::from(table.length(row))),
            Predicate::Plddt(range) => {
                let plddt = table.plddt(row);
                plddt_not_applicable(plddt) || range.contains(plddt)
            }
            Predicate::Supercog(codes) => codes.contains(&table.supercog_code(row)),
            Predicate::Taxonomy(codes) => table
                .taxonomy_code(row)
                .is_some_and(|code| codes.contains(&code)),
            Predicate::Members(members) => members.contains(table.protein(row)),
        }
    }
}

// ---------------------------------------------------------------------------
// Result set
// ---------------------------------------------------------------------------

/// Matching records in table order, at most the engine's result limit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    records: Vec<PointRecord>,
}

impl ResultSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[PointRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<PointRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Evaluates [`Query`] values against a shared [`PointTable`].
#[derive(Debug, Clone)]
pub struct QueryEngine {
    table: Arc<PointTable>,
    terms: Arc<TermMembershipCache>,
    result_limit: usize,
}

impl QueryEngine {
    pub fn new(table: Arc<PointTable>, terms: Arc<TermMembershipCache>) -> Self {
        Self {
            table,
            terms,
            result_limit: DEFAULT_RESULT_LIMIT,
        }
    }

    pub fn with_result_limit(mut self, limit: usize) -> Self {
        self.result_limit = limit;
        self
    }

    pub fn table(&self) -> &Arc<PointTable> {
        &self.table
    }

    pub fn terms(&self) -> &Arc<TermMembershipCache> {
        &self.terms
    }

    /// Run `query`.
    ///
    /// Only an unreadable (but present) term file is an error; a missing one
    /// yields an empty result.
    pub async fn evaluate(&self, query: &Query) -> Result<ResultSet, TermError> {
        let members = match &query.term {
            Some(filter) => match self.terms.members_of(&filter.ontology, &filter.term).await {
                Ok(members) => Some(members),
                Err(e) if e.is_not_found() => {
                    tracing::debug!(
                        ontology = %filter.ontology,
                        term = %filter.term,
                        "term has no membership data, returning empty result"
                    );
                    return Ok(ResultSet::empty());
                }
                Err(e) => return Err(e),
            },
            None => None,
        };

        let predicates = self.compile(query, members);
        Ok(self.scan(&predicates))
    }

    /// Compile `query` into predicates, in evaluation order.
    pub fn compile(&self, query: &Query, members: Option<Arc<HashSet<String>>>) -> Vec<Predicate> {
        let table = &self.table;
        let mut predicates = vec![Predicate::Bounds(query.bounds)];
        if let Some(types) = &query.types {
            predicates.push(Predicate::Kind(table.kinds().codes_for(types)));
        }
        if let Some(range) = query.length {
            predicates.push(Predicate::Length(range));
        }
        if let Some(range) = query.plddt {
            predicates.push(Predicate::Plddt(range));
        }
        if let Some(groups) = &query.supercog {
            predicates.push(Predicate::Supercog(table.supercogs().codes_for(groups)));
        }
        if let Some(taxa) = &query.taxonomy {
            predicates.push(Predicate::Taxonomy(table.taxonomies().codes_for(taxa)));
        }
        if let Some(members) = members {
            predicates.push(Predicate::Members(members));
        }
        predicates
    }

    /// Rows satisfying every predicate, first `result_limit` in table order.
    pub fn scan(&self, predicates: &[Predicate]) -> ResultSet {
        let table = &self.table;
        let records = table
            .rows_matching(|row| predicates.iter().all(|p| p.matches(table, row)))
            .take(self.result_limit)
            .map(|row| table.record(row))
            .collect();
        ResultSet { records }
    }
}
