//! Point table: immutable columnar store of every plottable record.
//!
//! The table is built exactly once at startup by [`PointTableBuilder`] and is
//! read-only afterwards, so it is shared between sessions behind an `Arc`
//! with no synchronisation.
//!
//! # Row order
//!
//! Rows are stored in a fixed permutation of the source order, produced by a
//! seeded shuffle at build time and kept in [`PointTable::permutation`]. Every
//! "first N" operation (result truncation, search grouping) is a prefix of
//! this order, which is what makes truncated result sets reproducible across
//! requests and across processes started with the same seed.
//!
//! # Categorical columns
//!
//! `type`, `supercog` and `taxonomy` are dictionary encoded. Set filters are
//! resolved to code sets once per query via [`Dictionary::codes_for`]; labels
//! not present in the table resolve to nothing and therefore match no rows.

use crate::types::{clean_name, PointRecord, PLDDT_NOT_APPLICABLE};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::{HashMap, HashSet};

// ---------------------------------------------------------------------------
// Dictionary
// ---------------------------------------------------------------------------

/// Interned labels for one categorical column.
#[derive(Debug, Default, Clone)]
pub struct Dictionary {
    labels: Vec<String>,
    codes: HashMap<String, u32>,
}

impl Dictionary {
    fn intern(&mut self, label: &str) -> u32 {
        if let Some(&code) = self.codes.get(label) {
            return code;
        }
        let code = self.labels.len() as u32;
        self.labels.push(label.to_string());
        self.codes.insert(label.to_string(), code);
        code
    }

    pub fn label(&self, code: u32) -> &str {
        &self.labels[code as usize]
    }

    pub fn code(&self, label: &str) -> Option<u32> {
        self.codes.get(label).copied()
    }

    /// Resolve a set of labels to their codes, dropping unknown labels.
    pub fn codes_for<'a>(&self, labels: impl IntoIterator<Item = &'a String>) -> HashSet<u32> {
        labels.into_iter().filter_map(|l| self.code(l)).collect()
    }

    /// Distinct labels, sorted.
    pub fn sorted_labels(&self) -> Vec<String> {
        let mut labels = self.labels.clone();
        labels.sort();
        labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// One source row as handed to the builder by the table loader.
#[derive(Debug, Clone, PartialEq)]
pub struct PointRow {
    pub protein: String,
    /// `None` when the source cell is empty; such rows are never stored.
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub kind: String,
    pub length: u32,
    /// `None` maps to [`PLDDT_NOT_APPLICABLE`].
    pub plddt: Option<f64>,
    pub supercog: String,
    pub taxonomy: Option<String>,
    /// Cluster representative; defaults to the record's own display name.
    pub cluster: Option<String>,
}

/// Accumulates source rows, then freezes them into a [`PointTable`].
#[derive(Debug, Default)]
pub struct PointTableBuilder {
    rows: Vec<PointRow>,
    dropped: usize,
}

impl PointTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a source row. Rows without finite coordinates are counted and
    /// discarded.
    pub fn push(&mut self, row: PointRow) {
        match (row.x, row.y) {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() => self.rows.push(row),
            _ => self.dropped += 1,
        }
    }

    /// Number of rows discarded for missing coordinates so far.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Shuffle with `seed` and build the columnar table plus its indices.
    pub fn build(self, seed: u64) -> PointTable {
        let mut permutation: Vec<usize> = (0..self.rows.len()).collect();
        permutation.shuffle(&mut ChaCha8Rng::seed_from_u64(seed));

        let n = self.rows.len();
        let mut table = PointTable {
            proteins: Vec::with_capacity(n),
            names: Vec::with_capacity(n),
            clusters: Vec::with_capacity(n),
            xs: Vec::with_capacity(n),
            ys: Vec::with_capacity(n),
            kinds: Vec::with_capacity(n),
            lengths: Vec::with_capacity(n),
            plddts: Vec::with_capacity(n),
            supercogs: Vec::with_capacity(n),
            taxonomies: Vec::with_capacity(n),
            kind_labels: Dictionary::default(),
            supercog_labels: Dictionary::default(),
            taxonomy_labels: Dictionary::default(),
            by_name: HashMap::with_capacity(n),
            by_protein: HashMap::with_capacity(n),
            permutation,
        };

        let mut rows: Vec<Option<PointRow>> = self.rows.into_iter().map(Some).collect();
        for position in 0..n {
            let source = table.permutation[position];
            let Some(row) = rows[source].take() else {
                continue;
            };
            let name = clean_name(&row.protein).to_string();

            table.by_name.entry(name.clone()).or_insert(position);
            table.by_protein.entry(row.protein.clone()).or_insert(position);

            let kind = table.kind_labels.intern(&row.kind);
            let supercog = table.supercog_labels.intern(&row.supercog);
            let taxonomy = row
                .taxonomy
                .as_deref()
                .map(|t| table.taxonomy_labels.intern(t));

            table.clusters.push(row.cluster.unwrap_or_else(|| name.clone()));
            table.names.push(name);
            table.proteins.push(row.protein);
            // Checked finite in `push`.
            table.xs.push(row.x.unwrap_or_default());
            table.ys.push(row.y.unwrap_or_default());
            table.kinds.push(kind);
            table.lengths.push(row.length);
            table.plddts.push(row.plddt.unwrap_or(PLDDT_NOT_APPLICABLE));
            table.supercogs.push(supercog);
            table.taxonomies.push(taxonomy);
        }

        table
    }
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// Immutable columnar table of plottable points. See the module docs.
#[derive(Debug)]
pub struct PointTable {
    proteins: Vec<String>,
    names: Vec<String>,
    clusters: Vec<String>,
    xs: Vec<f64>,
    ys: Vec<f64>,
    kinds: Vec<u32>,
    lengths: Vec<u32>,
    plddts: Vec<f64>,
    supercogs: Vec<u32>,
    taxonomies: Vec<Option<u32>>,
    kind_labels: Dictionary,
    supercog_labels: Dictionary,
    taxonomy_labels: Dictionary,
    /// Display name -> first row carrying it.
    by_name: HashMap<String, usize>,
    /// Protein identifier -> first row carrying it.
    by_protein: HashMap<String, usize>,
    /// `permutation[row]` is the source-order index of `row`.
    permutation: Vec<usize>,
}

impl PointTable {
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    /// Materialise one row.
    ///
    /// # Panics
    ///
    /// Panics if `row >= self.len()`.
    pub fn record(&self, row: usize) -> PointRecord {
        PointRecord {
            protein: self.proteins[row].clone(),
            x: self.xs[row],
            y: self.ys[row],
            kind: self.kind_labels.label(self.kinds[row]).to_string(),
            length: self.lengths[row],
            plddt: self.plddts[row],
            supercog: self.supercog_labels.label(self.supercogs[row]).to_string(),
            taxonomy: self.taxonomies[row].map(|c| self.taxonomy_labels.label(c).to_string()),
            name: self.names[row].clone(),
            cluster: self.clusters[row].clone(),
        }
    }

    /// Deterministic subset of `min(n, len)` records, in table order.
    ///
    /// The same `(n, seed)` always selects the same rows for a given table.
    pub fn sample(&self, n: usize, seed: u64) -> Vec<PointRecord> {
        let amount = n.min(self.len());
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut rows = rand::seq::index::sample(&mut rng, self.len(), amount).into_vec();
        rows.sort_unstable();
        rows.into_iter().map(|row| self.record(row)).collect()
    }

    /// Rows for which `predicate` holds, lazily, in table order.
    pub fn rows_matching<'a, P>(&'a self, predicate: P) -> impl Iterator<Item = usize> + 'a
    where
        P: Fn(usize) -> bool + 'a,
    {
        (0..self.len()).filter(move |&row| predicate(row))
    }

    // -- column accessors ---------------------------------------------------

    pub fn x(&self, row: usize) -> f64 {
        self.xs[row]
    }

    pub fn y(&self, row: usize) -> f64 {
        self.ys[row]
    }

    pub fn kind_code(&self, row: usize) -> u32 {
        self.kinds[row]
    }

    pub fn length(&self, row: usize) -> u32 {
        self.lengths[row]
    }

    pub fn plddt(&self, row: usize) -> f64 {
        self.plddts[row]
    }

    pub fn supercog_code(&self, row: usize) -> u32 {
        self.supercogs[row]
    }

    pub fn taxonomy_code(&self, row: usize) -> Option<u32> {
        self.taxonomies[row]
    }

    pub fn protein(&self, row: usize) -> &str {
        &self.proteins[row]
    }

    pub fn kinds(&self) -> &Dictionary {
        &self.kind_labels
    }

    pub fn supercogs(&self) -> &Dictionary {
        &self.supercog_labels
    }

    pub fn taxonomies(&self) -> &Dictionary {
        &self.taxonomy_labels
    }

    // -- indices ------------------------------------------------------------

    /// First row whose display name equals the display name of `cluster`.
    pub fn by_cluster(&self, cluster: &str) -> Option<usize> {
        self.by_name.get(clean_name(cluster)).copied()
    }

    pub fn by_protein(&self, protein: &str) -> Option<usize> {
        self.by_protein.get(protein).copied()
    }

    pub fn permutation(&self) -> &[usize] {
        &self.permutation
    }

    /// Smallest and largest sequence length, or `None` for an empty table.
    pub fn length_bounds(&self) -> Option<(u32, u32)> {
        let min = self.lengths.iter().min()?;
        let max = self.lengths.iter().max()?;
        Some((*min, *max))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
