//! Configuration types for protmap.
//!
//! [`Config::load`] layers, lowest priority first: the embedded defaults, an
//! optional TOML file, and `PROTMAP__SECTION__KEY` environment variables.
//! [`Config::defaults`] returns the embedded defaults without touching the
//! filesystem or environment (useful in tests).

use serde::Deserialize;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Embedded defaults
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG: &str = r#"
[server]
bind = "0.0.0.0:8000"

[data]
table          = "data/points.tsv"
clusters       = "data/clusters.tsv"
terms_dir      = "data/terms"
term_names     = "data/term_names.tsv"
structures_dir = "data/structures"

[table]
shuffle_seed = 42

[stream]
batch_size     = 100
result_limit   = 1000
bootstrap_size = 10000
bootstrap_seed = 42
batch_pause_ms = 0

[search]
cache_capacity = 1024
match_limit    = 100
result_limit   = 10
"#;

const ENV_PREFIX: &str = "PROTMAP";

// ---------------------------------------------------------------------------
// Public config types
// ---------------------------------------------------------------------------

/// Top-level application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub data: DataConfig,
    pub table: TableConfig,
    pub stream: StreamConfig,
    pub search: SearchConfig,
}

/// `[server]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address to listen on.
    pub bind: String,
}

/// `[data]` section: where the startup loaders and the term store read from.
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// Point table TSV.
    pub table: PathBuf,
    /// Cluster TSV, `representative<TAB>member` per line.
    pub clusters: PathBuf,
    /// Root of the `{ontology}/{term}` membership files.
    pub terms_dir: PathBuf,
    /// Optional term-name TSV. A missing file yields an empty catalog.
    pub term_names: PathBuf,
    pub structures_dir: PathBuf,
}

/// `[table]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TableConfig {
    /// Seed of the load-time row permutation. Changing it changes which rows
    /// survive result truncation.
    pub shuffle_seed: u64,
}

/// `[stream]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamConfig {
    pub batch_size: usize,
    pub result_limit: usize,
    pub bootstrap_size: usize,
    pub bootstrap_seed: u64,
    /// Extra pause between batches, on top of the unconditional task yield.
    pub batch_pause_ms: u64,
}

/// `[search]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    pub cache_capacity: usize,
    pub match_limit: usize,
    pub result_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Config {
    /// Load the layered configuration. `path`, when given, must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder().add_source(config::File::from_str(
            DEFAULT_CONFIG,
            config::FileFormat::Toml,
        ));
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Return the built-in defaults without touching the filesystem.
    pub fn defaults() -> Self {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .build()
            .expect("built-in default config must be valid TOML")
            .try_deserialize()
            .expect("built-in default config must deserialize correctly")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_load() {
        let cfg = Config::defaults();
        assert_eq!(cfg.server.bind, "0.0.0.0:8000");
        assert_eq!(cfg.stream.batch_size, 100);
        assert_eq!(cfg.stream.result_limit, 1000);
        assert_eq!(cfg.stream.bootstrap_size, 10_000);
        assert_eq!(cfg.search.match_limit, 100);
        assert_eq!(cfg.search.result_limit, 10);
        assert_eq!(cfg.table.shuffle_seed, 42);
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("protmap.toml");
        std::fs::write(&path, "[stream]\nbatch_size = 25\n\n[search]\ncache_capacity = 8\n").unwrap();

        let cfg = Config::load(Some(&path)).unwrap();
        assert_eq!(cfg.stream.batch_size, 25);
        assert_eq!(cfg.search.cache_capacity, 8);
        assert_eq!(cfg.stream.result_limit, 1000);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("absent.toml"))).is_err());
    }
}
