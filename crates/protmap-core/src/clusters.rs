//! Cluster membership: forward `representative -> members` mapping and the
//! reverse `protein -> representative` index derived from it.
//!
//! Both structures are built once at startup and never mutated afterwards.
//!
//! # Duplicate membership
//!
//! Source data is expected to list every protein under exactly one
//! representative. When a protein appears under several, the reverse index
//! keeps the **last** representative seen in mapping order. Whether this is
//! intended by the upstream clustering or an artifact of unchecked input is
//! unverified, so [`ReverseNameIndex::build`] counts such proteins and logs a
//! warning instead of assuming the input is clean.

use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;

/// Ordered mapping `representative -> ordered set of member proteins`.
#[derive(Debug, Default, Clone)]
pub struct ClusterMapping {
    clusters: IndexMap<String, IndexSet<String>>,
}

impl ClusterMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `member` under `representative`. Repeated pairs are ignored.
    pub fn insert(&mut self, representative: &str, member: &str) {
        self.clusters
            .entry(representative.to_string())
            .or_default()
            .insert(member.to_string());
    }

    pub fn members(&self, representative: &str) -> Option<&IndexSet<String>> {
        self.clusters.get(representative)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &IndexSet<String>)> {
        self.clusters.iter().map(|(rep, members)| (rep.as_str(), members))
    }

    /// Number of clusters.
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }
}

impl<R: AsRef<str>, M: AsRef<str>> FromIterator<(R, M)> for ClusterMapping {
    fn from_iter<I: IntoIterator<Item = (R, M)>>(pairs: I) -> Self {
        let mut mapping = Self::new();
        for (rep, member) in pairs {
            mapping.insert(rep.as_ref(), member.as_ref());
        }
        mapping
    }
}

/// Reverse index `protein -> representative`.
///
/// Keys iterate in first-seen order: cluster order of the mapping, then
/// member order within each cluster. Name search depends on this order.
#[derive(Debug, Default)]
pub struct ReverseNameIndex {
    keys: Vec<String>,
    cluster_of: HashMap<String, String>,
    duplicates: usize,
}

impl ReverseNameIndex {
    pub fn build(mapping: &ClusterMapping) -> Self {
        let mut index = Self::default();
        for (rep, members) in mapping.iter() {
            for member in members {
                match index.cluster_of.insert(member.clone(), rep.to_string()) {
                    None => index.keys.push(member.clone()),
                    Some(previous) if previous != rep => {
                        index.duplicates += 1;
                        tracing::debug!(
                            protein = %member,
                            previous = %previous,
                            current = %rep,
                            "protein listed under more than one cluster, keeping the later one"
                        );
                    }
                    Some(_) => {}
                }
            }
        }
        if index.duplicates > 0 {
            tracing::warn!(
                duplicates = index.duplicates,
                "cluster mapping lists proteins under several representatives; last one wins"
            );
        }
        index
    }

    pub fn cluster_of(&self, protein: &str) -> Option<&str> {
        self.cluster_of.get(protein).map(String::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    /// Number of proteins whose representative was overwritten during build.
    pub fn duplicate_memberships(&self) -> usize {
        self.duplicates
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
