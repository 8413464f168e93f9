//! Startup loaders: build the point table and cluster indices from disk.
//!
//! Everything here runs once, before the server accepts connections. Any
//! error is fatal: the caller must not start serving without a table.
//!
//! # Table format
//!
//! Tab-separated with a header row. Required columns: `protein`, `x`, `y`,
//! `type`, `length`. Optional: `pLDDT`, `supercog`, `taxonomy`. Column order
//! is free and unknown columns are ignored.
//!
//! | Cell                         | Meaning                                  |
//! |------------------------------|------------------------------------------|
//! | empty or `nan` `x` / `y`     | row is not plottable and is dropped      |
//! | empty or `nan` `pLDDT`       | not applicable (stored as `-1`)          |
//! | empty `taxonomy`             | no taxonomy label                        |
//!
//! # Cluster format
//!
//! Two columns per line, `representative<TAB>member`, as written by
//! mmseqs/foldseek `createtsv`.

use crate::clusters::{ClusterMapping, ReverseNameIndex};
use crate::config::{DataConfig, TableConfig};
use crate::error::LoadError;
use crate::table::{PointRow, PointTable, PointTableBuilder};
use crate::terms::TermCatalog;
use crate::types::clean_name;
use std::path::Path;
use std::sync::Arc;

fn read(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ---------------------------------------------------------------------------
// Clusters
// ---------------------------------------------------------------------------

pub fn load_clusters(path: &Path) -> Result<ClusterMapping, LoadError> {
    parse_clusters(&read(path)?, &path.display().to_string())
}

pub fn parse_clusters(text: &str, origin: &str) -> Result<ClusterMapping, LoadError> {
    let mut mapping = ClusterMapping::new();
    for (i, line) in text.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        let [representative, member] = fields[..] else {
            return Err(LoadError::MalformedLine {
                path: origin.to_string(),
                line: i + 1,
                expected: 2,
                found: fields.len(),
            });
        };
        mapping.insert(representative, member);
    }
    Ok(mapping)
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// Column positions resolved from the header row.
struct Columns {
    protein: usize,
    x: usize,
    y: usize,
    kind: usize,
    length: usize,
    plddt: Option<usize>,
    supercog: Option<usize>,
    taxonomy: Option<usize>,
    width: usize,
}

impl Columns {
    fn from_header(header: &str, origin: &str) -> Result<Self, LoadError> {
        let names: Vec<&str> = header.split('\t').map(str::trim).collect();
        let find = |name: &str| names.iter().position(|n| *n == name);
        let required = |name: &'static str| {
            find(name).ok_or_else(|| LoadError::MissingColumn {
                path: origin.to_string(),
                column: name,
            })
        };
        Ok(Self {
            protein: required("protein")?,
            x: required("x")?,
            y: required("y")?,
            kind: required("type")?,
            length: required("length")?,
            plddt: find("pLDDT"),
            supercog: find("supercog"),
            taxonomy: find("taxonomy"),
            width: names.len(),
        })
    }
}

fn is_missing(cell: &str) -> bool {
    cell.is_empty() || cell.eq_ignore_ascii_case("nan")
}

struct LineParser<'a> {
    origin: &'a str,
    line: usize,
}

impl LineParser<'_> {
    fn malformed(&self, column: &'static str, value: &str) -> LoadError {
        LoadError::MalformedCell {
            path: self.origin.to_string(),
            line: self.line,
            column,
            value: value.to_string(),
        }
    }

    fn optional_float(&self, column: &'static str, cell: &str) -> Result<Option<f64>, LoadError> {
        if is_missing(cell) {
            return Ok(None);
        }
        match cell.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Some(v)),
            _ => Err(self.malformed(column, cell)),
        }
    }

    fn length(&self, cell: &str) -> Result<u32, LoadError> {
        match cell.parse::<f64>() {
            // Whole numbers only; "120.0" is accepted, "120.7" is not.
            Ok(v) if v.fract() == 0.0 && v >= 0.0 && v <= f64::from(u32::MAX) => Ok(v as u32),
            _ => Err(self.malformed("length", cell)),
        }
    }
}

/// Parse a point table. `reverse` supplies each row's cluster representative.
pub fn parse_table(
    text: &str,
    origin: &str,
    reverse: &ReverseNameIndex,
    seed: u64,
) -> Result<PointTable, LoadError> {
    let mut lines = text.lines().enumerate().filter(|(_, l)| !l.trim().is_empty());
    let Some((_, header)) = lines.next() else {
        return Err(LoadError::Empty {
            path: origin.to_string(),
        });
    };
    let columns = Columns::from_header(header.trim_end_matches('\r'), origin)?;

    let mut builder = PointTableBuilder::new();
    for (i, line) in lines {
        let parser = LineParser { origin, line: i + 1 };
        let cells: Vec<&str> = line.trim_end_matches('\r').split('\t').map(str::trim).collect();
        if cells.len() < columns.width {
            return Err(LoadError::MalformedLine {
                path: origin.to_string(),
                line: i + 1,
                expected: columns.width,
                found: cells.len(),
            });
        }
        let optional = |index: Option<usize>| index.map(|i| cells[i]).filter(|c| !c.is_empty());

        let protein = cells[columns.protein].to_string();
        let cluster = reverse
            .cluster_of(&protein)
            .or_else(|| reverse.cluster_of(clean_name(&protein)))
            .map(str::to_string);

        builder.push(PointRow {
            x: parser.optional_float("x", cells[columns.x])?,
            y: parser.optional_float("y", cells[columns.y])?,
            kind: cells[columns.kind].to_string(),
            length: parser.length(cells[columns.length])?,
            plddt: match optional(columns.plddt) {
                Some(cell) => parser.optional_float("pLDDT", cell)?,
                None => None,
            },
            supercog: optional(columns.supercog).unwrap_or_default().to_string(),
            taxonomy: optional(columns.taxonomy).map(str::to_string),
            cluster,
            protein,
        });
    }

    if builder.dropped() > 0 {
        tracing::warn!(
            path = origin,
            dropped = builder.dropped(),
            "rows without coordinates were dropped"
        );
    }
    Ok(builder.build(seed))
}

pub fn load_table(
    path: &Path,
    reverse: &ReverseNameIndex,
    seed: u64,
) -> Result<PointTable, LoadError> {
    parse_table(&read(path)?, &path.display().to_string(), reverse, seed)
}

// ---------------------------------------------------------------------------
// Dataset
// ---------------------------------------------------------------------------

/// Everything built at startup, ready to be shared between sessions.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub table: Arc<PointTable>,
    pub clusters: Arc<ClusterMapping>,
    pub reverse: Arc<ReverseNameIndex>,
    pub catalog: Arc<TermCatalog>,
}

impl Dataset {
    pub fn load(data: &DataConfig, table: &TableConfig) -> Result<Self, LoadError> {
        let clusters = load_clusters(&data.clusters)?;
        let reverse = ReverseNameIndex::build(&clusters);
        tracing::info!(
            clusters = clusters.len(),
            proteins = reverse.len(),
            duplicates = reverse.duplicate_memberships(),
            "cluster mapping loaded"
        );

        let points = load_table(&data.table, &reverse, table.shuffle_seed)?;
        tracing::info!(rows = points.len(), seed = table.shuffle_seed, "point table loaded");

        let catalog = if data.term_names.exists() {
            TermCatalog::load(&data.term_names)?
        } else {
            tracing::warn!(path = %data.term_names.display(), "term name table not found, term lookup disabled");
            TermCatalog::default()
        };

        Ok(Self {
            table: Arc::new(points),
            clusters: Arc::new(clusters),
            reverse: Arc::new(reverse),
            catalog: Arc::new(catalog),
        })
    }
}
