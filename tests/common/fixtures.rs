//! Static corpora used across harnesses.

use super::builders::RowBuilder;
use protmap_core::table::PointRow;

/// Cluster TSV: three clusters. The `ORPHAN_REP` representative has no row in
/// [`POINTS_TSV`].
pub const CLUSTERS_TSV: &str = "\
MIP_00001\tMIP_00001
MIP_00001\tMIP_00002
MIP_00001\tAF-P69905-F1
MIP_00010\tMIP_00010
MIP_00010\tMIP_00011
ORPHAN_REP\tORPHAN_REP
ORPHAN_REP\tORPHAN_MEMBER
";

/// Point table TSV matching [`CLUSTERS_TSV`]. `ORPHAN_REP` has no row, and
/// `NO_COORDS` has no coordinates.
pub const POINTS_TSV: &str = "\
protein\tx\ty\ttype\tlength\tpLDDT\tsupercog\ttaxonomy
MIP_00001.pdb\t1.0\t1.0\tmip-clusters\t120\t85.5\ts1\tBacteria
MIP_00002.pdb\t2.0\t2.0\tmip-clusters\t80\t\ts12\tArchaea
AF-P69905-F1\t-3.0\t4.0\tafdb-clusters-dark\t142\t97.1\ts2\tEukaryota
MIP_00010.pdb\t5.0\t-5.0\thclust30-clusters\t300\t40.0\ts3\t
MIP_00011.pdb\t6.0\t-6.0\thclust30-clusters\t310\t-1\ts3\tBacteria
ORPHAN_MEMBER\t0.0\t0.0\tmip-clusters\t50\t70\ts1\t
NO_COORDS\t\t\tmip-clusters\t50\t70\ts1\t
";

/// `n` rows spread over a grid covering the default bounding box, with every
/// attribute varying deterministically with the index.
pub fn grid_rows(n: usize) -> Vec<PointRow> {
    const KINDS: [&str; 4] = ["mip-clusters", "hclust30-clusters", "afdb-clusters-dark", "afdb-clusters-light"];
    const SUPERCOGS: [&str; 6] = ["s1", "s2", "s3", "s12", "s13", "s23"];
    (0..n)
        .map(|i| {
            let x = -15.0 + (i % 31) as f64;
            let y = -25.0 + ((i / 31) % 41) as f64;
            let mut row = RowBuilder::new(format!("P{i:05}"))
                .at(x, y)
                .kind(KINDS[i % KINDS.len()])
                .length(50 + (i % 500) as u32)
                .supercog(SUPERCOGS[i % SUPERCOGS.len()]);
            if i % 7 != 0 {
                row = row.plddt((i % 101) as f64);
            }
            if i % 3 == 0 {
                row = row.taxonomy("Bacteria");
            }
            row.build()
        })
        .collect()
}
