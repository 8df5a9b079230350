//! Errors raised while parsing or aggregating snapshots.

use thiserror::Error;

use crate::core::timestamp::TimestampError;
use crate::core::types::ChangeKind;

/// A snapshot that cannot be processed as-is.
///
/// Every variant names the snapshot, and runner-level problems also carry the
/// runner's position and id, so the caller can report exactly what to fix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedSnapshotError {
    #[error("snapshot {snapshot}: unreadable document: {message}")]
    Document { snapshot: String, message: String },

    #[error("snapshot {snapshot}: missing required field `{field}`")]
    MissingField {
        snapshot: String,
        field: &'static str,
    },

    #[error("snapshot {snapshot}: field `{field}` must be {expected}")]
    InvalidField {
        snapshot: String,
        field: &'static str,
        expected: &'static str,
    },

    #[error("snapshot {snapshot}: field `{field}`: {source}")]
    InvalidTimestamp {
        snapshot: String,
        field: &'static str,
        #[source]
        source: TimestampError,
    },

    #[error("snapshot {snapshot}: runner at index {index} (id '{runner_id}'): {problem}")]
    Runner {
        snapshot: String,
        index: usize,
        runner_id: String,
        #[source]
        problem: RunnerProblem,
    },
}

impl MalformedSnapshotError {
    pub fn snapshot(&self) -> &str {
        match self {
            MalformedSnapshotError::Document { snapshot, .. }
            | MalformedSnapshotError::MissingField { snapshot, .. }
            | MalformedSnapshotError::InvalidField { snapshot, .. }
            | MalformedSnapshotError::InvalidTimestamp { snapshot, .. }
            | MalformedSnapshotError::Runner { snapshot, .. } => snapshot,
        }
    }

    /// Index of the offending runner, if the problem is runner-level.
    pub fn runner_index(&self) -> Option<usize> {
        match self {
            MalformedSnapshotError::Runner { index, .. } => Some(*index),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunnerProblem {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("field `{field}` must be {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },

    #[error("field `{field}`: {source}")]
    InvalidTimestamp {
        field: &'static str,
        #[source]
        source: TimestampError,
    },

    #[error("change log has no `{}` entry", .0.log_key())]
    MissingChangeTime(ChangeKind),
}
