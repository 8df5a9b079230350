//! Snapshot parsing: raw export document to typed records.
//!
//! The expected document shape (O-Checklist YAML export):
//!
//! ```yaml
//! Version: 1
//! Creator: OChecklist v1.4.1
//! Created: 2023-05-13T10:15:22+02:00
//! Data:
//!   - Runner:
//!       Id: "1201"
//!       StartTime: 2023-05-13T10:02:00+02:00
//!       ClassName: H21
//!       Name: Jan Novak
//!       Org: OK Kamenice
//!       Card: 2045678
//!       StartStatus: DNS
//!       Comment: left before start
//!     ChangeLog:
//!       DNS: 2023-05-13T10:03:12+02:00
//!       Comment: 2023-05-13T10:03:40+02:00
//! ```
//!
//! Parsing borrows the document and never modifies it.

use std::collections::BTreeSet;

use serde_yaml::{Mapping, Value};

use crate::core::error::{MalformedSnapshotError, RunnerProblem};
use crate::core::timestamp::{Timestamp, normalize_timestamp};
use crate::core::types::{
    ChangeKind, ChangeLog, Field, ParsedSnapshot, RunnerRecord, SnapshotMetadata,
};

/// Parse raw YAML text into a snapshot.
pub fn parse_snapshot_yaml(
    snapshot: &str,
    raw: &str,
) -> Result<ParsedSnapshot, MalformedSnapshotError> {
    let document: Value =
        serde_yaml::from_str(raw).map_err(|err| MalformedSnapshotError::Document {
            snapshot: snapshot.to_string(),
            message: err.to_string(),
        })?;
    parse_snapshot(snapshot, &document)
}

/// Parse an already-decoded document into metadata and runner records.
///
/// Top-level `Data`, `Created`, `Creator` and `Version` are required. Metadata
/// is only returned together with every runner; any failure yields no output.
pub fn parse_snapshot(
    snapshot: &str,
    document: &Value,
) -> Result<ParsedSnapshot, MalformedSnapshotError> {
    let doc_error = |field: &'static str, expected: &'static str| {
        MalformedSnapshotError::InvalidField {
            snapshot: snapshot.to_string(),
            field,
            expected,
        }
    };
    let root = document
        .as_mapping()
        .ok_or_else(|| doc_error("<root>", "a mapping"))?;

    let data = required(root, snapshot, "Data")?
        .as_sequence()
        .ok_or_else(|| doc_error("Data", "a list"))?;

    let created_raw = required(root, snapshot, "Created")?
        .as_str()
        .ok_or_else(|| doc_error("Created", "a timestamp string"))?;
    let created =
        normalize_timestamp(created_raw).map_err(|source| MalformedSnapshotError::InvalidTimestamp {
            snapshot: snapshot.to_string(),
            field: "Created",
            source,
        })?;

    let creator = scalar_text(required(root, snapshot, "Creator")?)
        .ok_or_else(|| doc_error("Creator", "a string"))?;

    let version = parse_version(required(root, snapshot, "Version")?)
        .ok_or_else(|| doc_error("Version", "a non-negative integer"))?;

    let runners = data
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            parse_runner(entry).map_err(|problem| MalformedSnapshotError::Runner {
                snapshot: snapshot.to_string(),
                index,
                runner_id: runner_id_hint(entry),
                problem,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ParsedSnapshot {
        metadata: SnapshotMetadata {
            id: snapshot.to_string(),
            created,
            creator,
            version,
        },
        runners,
    })
}

fn required<'a>(
    root: &'a Mapping,
    snapshot: &str,
    field: &'static str,
) -> Result<&'a Value, MalformedSnapshotError> {
    match root.get(field) {
        Some(value) if !value.is_null() => Ok(value),
        _ => Err(MalformedSnapshotError::MissingField {
            snapshot: snapshot.to_string(),
            field,
        }),
    }
}

fn parse_version(value: &Value) -> Option<u32> {
    match value {
        Value::Number(number) => number.as_u64().and_then(|v| u32::try_from(v).ok()),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn parse_runner(entry: &Value) -> Result<RunnerRecord, RunnerProblem> {
    let runner = entry
        .get("Runner")
        .filter(|value| !value.is_null())
        .ok_or(RunnerProblem::MissingField("Runner"))?
        .as_mapping()
        .ok_or(RunnerProblem::InvalidField {
            field: "Runner",
            expected: "a mapping",
        })?;

    let start_time = match runner.get("StartTime") {
        Some(value) if !value.is_null() => timestamp_field(value, "StartTime")?,
        _ => return Err(RunnerProblem::MissingField("StartTime")),
    };
    let start_status = match runner.get("StartStatus") {
        Some(value) if !value.is_null() => parse_start_status(value)?,
        _ => return Err(RunnerProblem::MissingField("StartStatus")),
    };
    let class_name = match runner.get("ClassName") {
        Some(value) if !value.is_null() => {
            scalar_text(value).ok_or(RunnerProblem::InvalidField {
                field: "ClassName",
                expected: "a string or number",
            })?
        }
        _ => return Err(RunnerProblem::MissingField("ClassName")),
    };

    Ok(RunnerRecord {
        id: optional_text(runner, "Id")?,
        start_time,
        class_name,
        name: optional_text(runner, "Name")?,
        club: optional_text(runner, "Org")?,
        card: optional_text(runner, "Card")?,
        start_status,
        new_card: tri_state(runner, "NewCard")?,
        comment: tri_state(runner, "Comment")?,
        change_log: parse_change_log(entry.get("ChangeLog"))?,
    })
}

/// Missing or null maps to the empty string.
fn optional_text(runner: &Mapping, field: &'static str) -> Result<String, RunnerProblem> {
    match runner.get(field) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(value) => scalar_text(value).ok_or(RunnerProblem::InvalidField {
            field,
            expected: "a string or number",
        }),
    }
}

fn tri_state(runner: &Mapping, field: &'static str) -> Result<Field<String>, RunnerProblem> {
    match runner.get(field) {
        None => Ok(Field::Absent),
        Some(Value::Null) => Ok(Field::Empty),
        Some(value) => {
            let text = scalar_text(value).ok_or(RunnerProblem::InvalidField {
                field,
                expected: "a string or number",
            })?;
            if text.is_empty() {
                Ok(Field::Empty)
            } else {
                Ok(Field::Present(text))
            }
        }
    }
}

fn parse_start_status(value: &Value) -> Result<BTreeSet<String>, RunnerProblem> {
    let invalid = RunnerProblem::InvalidField {
        field: "StartStatus",
        expected: "a string or a list of strings",
    };
    match value {
        Value::String(tag) => Ok(tags_from(std::iter::once(tag.as_str()))),
        Value::Sequence(items) => {
            let tags = items
                .iter()
                .map(Value::as_str)
                .collect::<Option<Vec<_>>>()
                .ok_or(invalid)?;
            Ok(tags_from(tags))
        }
        _ => Err(invalid),
    }
}

fn tags_from<'a>(tags: impl IntoIterator<Item = &'a str>) -> BTreeSet<String> {
    tags.into_iter()
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// Only a missing or null change log means "started normally". A present
/// mapping stays `Some` even with no usable entries.
fn parse_change_log(value: Option<&Value>) -> Result<Option<ChangeLog>, RunnerProblem> {
    let mapping = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(value) => value.as_mapping().ok_or(RunnerProblem::InvalidField {
            field: "ChangeLog",
            expected: "a mapping",
        })?,
    };

    let mut entries = Vec::new();
    for (key, recorded) in mapping {
        // Unknown kinds have no bucket; a null time surfaces during aggregation.
        let Some(kind) = key.as_str().and_then(ChangeKind::from_log_key) else {
            continue;
        };
        if recorded.is_null() {
            continue;
        }
        entries.push((kind, timestamp_field(recorded, kind.log_key())?));
    }

    Ok(Some(entries.into_iter().collect()))
}

fn timestamp_field(value: &Value, field: &'static str) -> Result<Timestamp, RunnerProblem> {
    let raw = value.as_str().ok_or(RunnerProblem::InvalidField {
        field,
        expected: "a timestamp string",
    })?;
    normalize_timestamp(raw).map_err(|source| RunnerProblem::InvalidTimestamp { field, source })
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn runner_id_hint(entry: &Value) -> String {
    entry
        .get("Runner")
        .and_then(|runner| runner.get("Id"))
        .and_then(scalar_text)
        .unwrap_or_default()
}
