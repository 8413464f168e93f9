//! Domain-specific assertion macros for protmap harnesses.
//!
//! These add context-rich failure messages that make it clear *which* query
//! invariant was violated and by *which* record.

/// Assert that every record lies inside a bounding box.
///
/// ```rust
/// assert_in_bounds!(result.records(), query.bounds);
/// ```
#[macro_export]
macro_rules! assert_in_bounds {
    ($records:expr, $bounds:expr) => {{
        let records: &[protmap_core::PointRecord] = &$records;
        let bounds: protmap_core::BoundingBox = $bounds;
        if let Some(r) = records.iter().find(|r| !bounds.contains(r.x, r.y)) {
            panic!(
                "assert_in_bounds! failed: {} at ({}, {}) outside {:?}",
                r.protein, r.x, r.y, bounds
            );
        }
    }};
}

/// Assert that records appear in strictly increasing table row order.
///
/// ```rust
/// assert_table_order!(table, result.records());
/// ```
#[macro_export]
macro_rules! assert_table_order {
    ($table:expr, $records:expr) => {{
        let table: &protmap_core::PointTable = &$table;
        let records: &[protmap_core::PointRecord] = &$records;
        let rows: Vec<usize> = records
            .iter()
            .map(|r| {
                table
                    .by_protein(&r.protein)
                    .unwrap_or_else(|| panic!("{} is not in the table", r.protein))
            })
            .collect();
        if let Some(w) = rows.windows(2).find(|w| w[0] >= w[1]) {
            panic!(
                "assert_table_order! failed: row {} followed by row {}",
                w[0], w[1]
            );
        }
    }};
}

/// Assert the `(size, is_last)` shape of a sequence of update messages.
///
/// ```rust
/// assert_batches!(messages, [(100, false), (50, true)]);
/// ```
#[macro_export]
macro_rules! assert_batches {
    ($messages:expr, [$(($size:expr, $last:expr)),* $(,)?]) => {{
        let actual: Vec<(usize, bool)> = $messages
            .iter()
            .map(|m| match m {
                protmap_server::ServerMessage::Update { points, is_last } => (points.len(), *is_last),
                other => panic!("assert_batches! failed: non-update message {:?}", other),
            })
            .collect();
        let expected: Vec<(usize, bool)> = vec![$(($size, $last)),*];
        pretty_assertions::assert_eq!(actual, expected, "assert_batches! failed");
    }};
}
