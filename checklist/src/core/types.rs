//! Shared deterministic types for parsing and aggregation.
//!
//! These types are the contract between the parser, the aggregator and any
//! report sink. They carry no I/O handles and are immutable once built.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::core::timestamp::Timestamp;

/// Start status tag for a runner who did not start.
pub const DNS_TAG: &str = "DNS";
/// Start status tag for a runner who started after their slot.
pub const LATE_START_TAG: &str = "Late start";

/// An optional record field where "present but empty" differs from "absent".
///
/// Card changes and comments are detected by the field being present at all,
/// so an empty value still counts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "lowercase")]
pub enum Field<T> {
    #[default]
    Absent,
    Empty,
    Present(T),
}

impl<T> Field<T> {
    pub fn is_present(&self) -> bool {
        !matches!(self, Field::Absent)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Field::Present(value) => Some(value),
            Field::Absent | Field::Empty => None,
        }
    }
}

/// A change category. Each kind is both a change-log key and a report bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    CardChange,
    Dns,
    LateStart,
    Comment,
}

impl ChangeKind {
    /// Classification order; first match is recorded first.
    pub const ALL: [ChangeKind; 4] = [
        ChangeKind::CardChange,
        ChangeKind::Dns,
        ChangeKind::LateStart,
        ChangeKind::Comment,
    ];

    /// Key used for this kind in a snapshot's change log.
    pub fn log_key(self) -> &'static str {
        match self {
            ChangeKind::CardChange => "NewCard",
            ChangeKind::Dns => "DNS",
            ChangeKind::LateStart => "LateStart",
            ChangeKind::Comment => "Comment",
        }
    }

    pub fn from_log_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.log_key() == key)
    }
}

/// When each kind of change was recorded for a runner.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChangeLog(BTreeMap<ChangeKind, Timestamp>);

impl ChangeLog {
    pub fn recorded_at(&self, kind: ChangeKind) -> Option<Timestamp> {
        self.0.get(&kind).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(ChangeKind, Timestamp)> for ChangeLog {
    fn from_iter<I: IntoIterator<Item = (ChangeKind, Timestamp)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// One runner as seen in one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerRecord {
    pub id: String,
    pub start_time: Timestamp,
    pub class_name: String,
    pub name: String,
    pub club: String,
    pub card: String,
    pub start_status: BTreeSet<String>,
    pub new_card: Field<String>,
    pub comment: Field<String>,
    /// `None` means the runner started normally.
    pub change_log: Option<ChangeLog>,
}

impl RunnerRecord {
    pub fn has_status(&self, tag: &str) -> bool {
        self.start_status.contains(tag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    /// Identifier supplied by the provider, usually the file name.
    pub id: String,
    pub created: Timestamp,
    /// Exporting application and its version.
    pub creator: String,
    pub version: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedSnapshot {
    pub metadata: SnapshotMetadata,
    pub runners: Vec<RunnerRecord>,
}

/// One row in a change bucket.
///
/// `P` is the bucket-specific payload: the new card id for card changes, the
/// comment text for comments, `()` otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEntry<P> {
    pub runner_id: String,
    pub start_time: Timestamp,
    pub changed_at: Timestamp,
    pub name: String,
    pub class_name: String,
    pub club: String,
    pub card: String,
    pub payload: P,
}

pub type ChangeBucket<P> = Vec<ChangeEntry<P>>;

/// A runner with a change log that matched no bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnclassifiedRunner {
    pub snapshot: String,
    pub index: usize,
    pub runner_id: String,
    pub name: String,
    pub class_name: String,
}
