//! Name search integration harness.
//!
//! # What this covers
//!
//! - **Idempotence**: the same term twice gives the same hits, and the second
//!   call is served from the cache.
//! - **Grouping**: each hit carries its cluster representative's record and
//!   every member of the cluster.
//! - **Unresolvable representatives**: clusters whose representative has no
//!   table row are skipped, never errors.
//! - **Limits**: at most `match_limit` keys are cached per term and at most
//!   `result_limit` hits are returned.
//! - **LRU**: the least recently used term is evicted first.
//!
//! # Running
//!
//! ```sh
//! cargo test --test search_harness
//! ```

mod common;
use common::*;

use pretty_assertions::assert_eq;
use protmap_core::clusters::{ClusterMapping, ReverseNameIndex};
use protmap_core::loader::{parse_clusters, parse_table};
use protmap_core::search::SearchHit;
use protmap_core::NameSearchIndex;
use std::sync::Arc;

fn fixture_index(cache_capacity: usize) -> NameSearchIndex {
    let clusters = parse_clusters(CLUSTERS_TSV, "clusters.tsv").unwrap();
    let reverse = ReverseNameIndex::build(&clusters);
    let table = Arc::new(parse_table(POINTS_TSV, "points.tsv", &reverse, 42).unwrap());
    search_index(table, clusters, cache_capacity)
}

fn matched(hits: &[SearchHit]) -> Vec<&str> {
    hits.iter().map(|h| h.matched.as_str()).collect()
}

// ---------------------------------------------------------------------------
// Caching
// ---------------------------------------------------------------------------

#[test]
fn repeated_search_is_identical_and_cached() {
    let index = fixture_index(16);
    let first = index.search("MIP_0000");
    let second = index.search("MIP_0000");

    assert_eq!(first, second);
    let stats = index.cache().stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 1);
}

#[test]
fn blank_term_is_not_searched() {
    let index = fixture_index(16);
    assert!(index.search("").is_empty());
    assert!(index.search("   ").is_empty());
    assert!(index.cache().is_empty());
}

#[test]
fn least_recently_used_term_is_evicted() {
    let index = fixture_index(2);
    index.search("MIP_00001");
    index.search("MIP_00010");
    index.search("MIP_00001");
    index.search("AF-");

    let cache = index.cache();
    assert_eq!(cache.len(), 2);
    assert!(cache.contains("MIP_00001"));
    assert!(cache.contains("AF-"));
    assert!(!cache.contains("MIP_00010"));
}

#[test]
fn fresh_term_is_always_admitted_under_churn() {
    let index = fixture_index(2);
    // Every term is new and the cache is full from the third round on; each
    // one must still be served from the cache on its very next search.
    for round in 0..50 {
        let term = format!("MIP_{round:05}");
        index.search(&term);
        let hits = index.cache().stats().hits;
        index.search(&term);
        assert_eq!(index.cache().stats().hits, hits + 1, "{term} was not cached");
        assert!(index.cache().len() <= 2);
    }
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

#[test]
fn hits_are_grouped_with_their_cluster() {
    let index = fixture_index(16);
    let hits = index.search("MIP_0000");

    assert_eq!(matched(&hits), vec!["MIP_00001", "MIP_00002"]);
    for hit in &hits {
        assert_eq!(hit.representative.protein, "MIP_00001.pdb");
        assert_eq!(hit.representative.cluster, "MIP_00001");
        let names: Vec<&str> = hit.members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["MIP_00001", "MIP_00002", "AF-P69905-F1"]);
    }
}

#[test]
fn search_is_case_insensitive() {
    let index = fixture_index(16);
    let hits = index.search("mip_00011");
    assert_eq!(matched(&hits), vec!["MIP_00011"]);
    assert_eq!(hits[0].representative.protein, "MIP_00010.pdb");
}

#[test]
fn invalid_pattern_is_matched_literally() {
    let index = fixture_index(16);
    assert!(index.search("MIP_(").is_empty());

    let hits = index.search("AF-P69905-F1");
    assert_eq!(matched(&hits), vec!["AF-P69905-F1"]);
    assert_eq!(hits[0].representative.protein, "MIP_00001.pdb");
}

#[test]
fn cluster_without_table_row_is_skipped() {
    let index = fixture_index(16);
    assert!(index.search("ORPHAN").is_empty());
    // The keys still matched; only grouping dropped them.
    assert_eq!(index.matching_keys("ORPHAN").len(), 2);
}

#[test]
fn later_cluster_wins_for_duplicated_member() {
    let clusters: ClusterMapping = [
        ("P00000", "P00000"),
        ("P00000", "shared"),
        ("P00001", "P00001"),
        ("P00001", "shared"),
    ]
    .into_iter()
    .collect();
    let index = search_index(table_of(grid_rows(4)), clusters, 16);

    let hits = index.search("^shared$");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].representative.protein, "P00001");
}

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

fn wide_index() -> NameSearchIndex {
    let clusters: ClusterMapping = (0..150)
        .map(|i| (format!("P{:05}", i % 10), format!("P{i:05}")))
        .collect();
    search_index(table_of(grid_rows(200)), clusters, 16)
}

#[test]
fn match_limit_caps_cached_keys() {
    let index = wide_index();
    let keys = index.matching_keys("^P");
    assert_eq!(keys.len(), 100);
    // First-seen order: cluster order, then member order.
    assert_eq!(keys[0], "P00000");
    assert_eq!(keys[1], "P00010");
}

#[test]
fn result_limit_caps_hits() {
    let index = wide_index();
    let hits = index.search("P0");
    assert_eq!(hits.len(), 10);
    assert!(hits.iter().all(|h| h.members.len() == 15));
}
