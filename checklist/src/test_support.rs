//! Test-only helpers for building runners, snapshots and drop folders.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;

use crate::core::parser::parse_snapshot_yaml;
use crate::core::timestamp::{Timestamp, normalize_timestamp};
use crate::core::types::{
    ChangeKind, ChangeLog, Field, ParsedSnapshot, RunnerRecord, SnapshotMetadata,
};

/// Parse a timestamp literal, panicking on bad input.
pub fn ts(raw: &str) -> Timestamp {
    normalize_timestamp(raw).expect("test timestamp should parse")
}

/// Builder for runner records with deterministic defaults.
#[derive(Debug, Clone)]
pub struct RunnerBuilder {
    record: RunnerRecord,
    log: Vec<(ChangeKind, Timestamp)>,
}

impl RunnerBuilder {
    pub fn new(id: &str, class_name: &str) -> Self {
        Self {
            record: RunnerRecord {
                id: id.to_string(),
                start_time: ts("2023-05-13T10:00:00"),
                class_name: class_name.to_string(),
                name: format!("Runner {id}"),
                club: "OK Test".to_string(),
                card: format!("10{id}"),
                start_status: BTreeSet::new(),
                new_card: Field::Absent,
                comment: Field::Absent,
                change_log: None,
            },
            log: Vec::new(),
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.record.name = name.to_string();
        self
    }

    pub fn start_time(mut self, raw: &str) -> Self {
        self.record.start_time = ts(raw);
        self
    }

    pub fn status(mut self, tag: &str) -> Self {
        self.record.start_status.insert(tag.to_string());
        self
    }

    pub fn new_card(mut self, field: Field<String>) -> Self {
        self.record.new_card = field;
        self
    }

    pub fn comment(mut self, field: Field<String>) -> Self {
        self.record.comment = field;
        self
    }

    /// Add a change-log entry; any entry makes the runner "changed".
    pub fn logged(mut self, kind: ChangeKind, raw: &str) -> Self {
        self.log.push((kind, ts(raw)));
        self
    }

    pub fn build(self) -> RunnerRecord {
        let mut record = self.record;
        if !self.log.is_empty() {
            record.change_log = Some(self.log.into_iter().collect::<ChangeLog>());
        }
        record
    }
}

/// Create a parsed snapshot with fixed metadata.
pub fn snapshot(id: &str, runners: Vec<RunnerRecord>) -> ParsedSnapshot {
    ParsedSnapshot {
        metadata: SnapshotMetadata {
            id: id.to_string(),
            created: ts("2023-05-13T10:30:00"),
            creator: "OChecklist v1.4.1".to_string(),
            version: 1,
        },
        runners,
    }
}

pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn read_fixture(name: &str) -> Result<String> {
    let path = fixture_path(name);
    fs::read_to_string(&path).with_context(|| format!("read fixture {}", path.display()))
}

/// Load and parse a YAML snapshot from `tests/fixtures/`.
pub fn load_snapshot_fixture(name: &str) -> Result<ParsedSnapshot> {
    let raw = read_fixture(name)?;
    Ok(parse_snapshot_yaml(name, &raw)?)
}

/// Temporary drop folder holding snapshot files.
pub struct DropFolder {
    dir: TempDir,
}

impl DropFolder {
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("create drop folder")?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }

    /// Copy a fixture into the folder under its own name.
    pub fn add_fixture(&self, name: &str) -> Result<PathBuf> {
        self.write(name, &read_fixture(name)?)
    }
}
