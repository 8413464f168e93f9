//! protmap-core: point table, caches and query engine for protmap.
//!
//! # Architecture
//!
//! ```text
//! loader ──► PointTable ◄──────────── QueryEngine ◄── TermMembershipCache ◄── disk
//!    │           ▲                         ▲
//!    └──► ClusterMapping ──► ReverseNameIndex ──► NameSearchIndex ◄── SearchCache
//! ```
//!
//! The table and cluster indices are built once by [`loader`] and are
//! read-only afterwards. The two caches grow at runtime and are shared by
//! every session; both tolerate racing writers because a recomputed entry is
//! always equal to the one it replaces.

pub mod clusters;
pub mod config;
pub mod error;
pub mod loader;
pub mod query;
pub mod search;
pub mod table;
pub mod terms;
pub mod types;

pub use error::{LoadError, QueryError, TermError};
pub use query::{BoundingBox, NumericRange, Query, QueryEngine, ResultSet, TermFilter};
pub use search::{NameSearchIndex, SearchCache, SearchHit};
pub use table::PointTable;
pub use terms::TermMembershipCache;
pub use types::PointRecord;
