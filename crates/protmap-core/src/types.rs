//! Core types shared across protmap layers.
//!
//! [`PointRecord`] is the materialised form of one table row; it is what the
//! query engine returns and what the session layer serialises onto the wire.
//! Field names on the wire follow the browser client (`type`, `pLDDT`).

use serde::Serialize;

/// Reserved pLDDT value meaning "no structure prediction for this record".
///
/// Records carrying it pass every pLDDT range filter.
pub const PLDDT_NOT_APPLICABLE: f64 = -1.0;

/// Returns `true` when `plddt` is the not-applicable sentinel.
#[allow(clippy::float_cmp)]
pub fn plddt_not_applicable(plddt: f64) -> bool {
    plddt == PLDDT_NOT_APPLICABLE
}

/// One row of the point table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointRecord {
    /// Stable identifier, exactly as it appears in the source table.
    pub protein: String,
    pub x: f64,
    pub y: f64,
    /// Origin / source database label (e.g. `mip-clusters`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Sequence length in residues.
    pub length: u32,
    /// Mean predicted confidence, or [`PLDDT_NOT_APPLICABLE`].
    #[serde(rename = "pLDDT")]
    pub plddt: f64,
    /// Functional super-group label.
    pub supercog: String,
    pub taxonomy: Option<String>,
    /// Display name: `protein` with directory prefix and structure-file
    /// suffix removed.
    pub name: String,
    /// Name of this record's cluster representative.
    pub cluster: String,
}

impl PointRecord {
    pub fn has_plddt(&self) -> bool {
        !plddt_not_applicable(self.plddt)
    }
}

/// Structure-file suffixes stripped by [`clean_name`], longest first.
const STRUCTURE_SUFFIXES: &[&str] = &[".pdb.gz", ".cif.gz", ".pdb", ".cif"];

/// Derive the display name for a protein identifier.
///
/// ```
/// use protmap_core::types::clean_name;
/// assert_eq!(clean_name("struct/MIP_00012.pdb"), "MIP_00012");
/// assert_eq!(clean_name("AF-P69905-F1-model_v4.cif.gz"), "AF-P69905-F1-model_v4");
/// assert_eq!(clean_name("plain"), "plain");
/// ```
pub fn clean_name(protein: &str) -> &str {
    let base = protein.rsplit('/').next().unwrap_or(protein);
    STRUCTURE_SUFFIXES
        .iter()
        .find_map(|suffix| base.strip_suffix(suffix))
        .unwrap_or(base)
}
