//! Structure files: on-demand conversion and serving.
//!
//! Format conversion itself is an external concern behind
//! [`StructureConverter`]; this module only resolves names to files under the
//! structures directory and hands them to the converter.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Converts a structure file and returns the path of the converted file.
pub trait StructureConverter: Send + Sync + 'static {
    fn convert(&self, path: &Path) -> io::Result<PathBuf>;
}

/// Serves files as stored.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl StructureConverter for Passthrough {
    fn convert(&self, path: &Path) -> io::Result<PathBuf> {
        Ok(path.to_path_buf())
    }
}

/// Structure directory plus the converter applied on every fetch.
#[derive(Clone)]
pub struct StructureStore {
    root: PathBuf,
    converter: Arc<dyn StructureConverter>,
}

impl std::fmt::Debug for StructureStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructureStore").field("root", &self.root).finish_non_exhaustive()
    }
}

impl StructureStore {
    pub fn new(root: impl Into<PathBuf>, converter: Arc<dyn StructureConverter>) -> Self {
        Self {
            root: root.into(),
            converter,
        }
    }

    /// Converted bytes of the structure file `name`, or `None` when no such
    /// file exists. Names that are not a single path component never match.
    pub async fn fetch(&self, name: &str) -> io::Result<Option<Vec<u8>>> {
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Ok(None);
        }
        let source = self.root.join(name);
        if !tokio::fs::try_exists(&source).await? {
            return Ok(None);
        }
        let converter = Arc::clone(&self.converter);
        let converted = tokio::task::spawn_blocking(move || converter.convert(&source))
            .await
            .map_err(io::Error::other)??;
        tokio::fs::read(&converted).await.map(Some)
    }
}
