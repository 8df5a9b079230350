//! Snapshot providers: where raw export documents come from.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{debug, instrument};

/// A raw snapshot document and the name it was published under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSnapshot {
    pub name: String,
    pub contents: String,
}

/// Source of raw snapshots, returned in processing order.
pub trait SnapshotProvider {
    fn fetch(&self) -> Result<Vec<RawSnapshot>>;
}

/// Reads snapshot exports from a local drop folder.
///
/// Files are matched by extension (case-insensitive) and returned sorted by
/// file name. Exports are named after their creation time, so name order is
/// creation order. Subdirectories are not descended into.
#[derive(Debug, Clone)]
pub struct DirectoryProvider {
    dir: PathBuf,
    extension: String,
}

impl DirectoryProvider {
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
        }
    }

    fn list(&self) -> Result<Vec<PathBuf>> {
        if !self.dir.is_dir() {
            bail!("drop folder {} does not exist", self.dir.display());
        }
        let mut paths = Vec::new();
        for entry in
            fs::read_dir(&self.dir).with_context(|| format!("read {}", self.dir.display()))?
        {
            let entry = entry.context("read entry")?;
            let path = entry.path();
            if path.is_file() && self.matches(&path) {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }

    fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.extension))
    }
}

impl SnapshotProvider for DirectoryProvider {
    #[instrument(skip_all, fields(dir = %self.dir.display()))]
    fn fetch(&self) -> Result<Vec<RawSnapshot>> {
        let paths = self.list()?;
        debug!(count = paths.len(), "snapshot files found");
        paths
            .into_iter()
            .map(|path| {
                let contents = fs::read_to_string(&path)
                    .with_context(|| format!("read snapshot {}", path.display()))?;
                let name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default();
                Ok(RawSnapshot { name, contents })
            })
            .collect()
    }
}

/// Fixed in-memory snapshots, mostly for tests and replays.
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    snapshots: Vec<RawSnapshot>,
}

impl StaticProvider {
    pub fn new(snapshots: Vec<RawSnapshot>) -> Self {
        Self { snapshots }
    }
}

impl SnapshotProvider for StaticProvider {
    fn fetch(&self) -> Result<Vec<RawSnapshot>> {
        Ok(self.snapshots.clone())
    }
}
