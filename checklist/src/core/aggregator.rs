//! Change aggregation across an ordered sequence of snapshots.
//!
//! Aggregation is a left fold: an accumulator is moved through every runner of
//! every snapshot, in the order given, and becomes the result. Nothing is
//! reordered here; sorting for display belongs to the report sink.

use serde::{Deserialize, Serialize};

use crate::core::classifier::{Classification, classify_runner};
use crate::core::error::{MalformedSnapshotError, RunnerProblem};
use crate::core::statistics::{Counts, StatisticsRow, deltas};
use crate::core::timestamp::Timestamp;
use crate::core::types::{
    ChangeBucket, ChangeEntry, ChangeKind, ParsedSnapshot, RunnerRecord, SnapshotMetadata,
    UnclassifiedRunner,
};

/// Buckets accumulated over all snapshots plus one statistics row per snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AggregationResult {
    pub card_changes: ChangeBucket<String>,
    pub dns: ChangeBucket<()>,
    pub late_starts: ChangeBucket<()>,
    pub comments: ChangeBucket<String>,
    pub statistics: Vec<StatisticsRow>,
    /// Runners with a change log that matched no bucket.
    pub unclassified: Vec<UnclassifiedRunner>,
}

impl AggregationResult {
    /// Cumulative counts after the last snapshot (all zero when empty).
    pub fn totals(&self) -> Counts {
        self.statistics
            .last()
            .map(|row| row.counts)
            .unwrap_or_default()
    }

    /// Per-snapshot increments, aligned with `statistics`.
    pub fn deltas(&self) -> Vec<Counts> {
        deltas(&self.statistics)
    }

    pub fn bucket_len(&self, kind: ChangeKind) -> usize {
        match kind {
            ChangeKind::CardChange => self.card_changes.len(),
            ChangeKind::Dns => self.dns.len(),
            ChangeKind::LateStart => self.late_starts.len(),
            ChangeKind::Comment => self.comments.len(),
        }
    }
}

/// Aggregate parsed snapshots in the given order.
///
/// Fails on the first runner whose matched change has no recorded time; no
/// partial result is returned.
pub fn aggregate(
    snapshots: &[ParsedSnapshot],
) -> Result<AggregationResult, MalformedSnapshotError> {
    snapshots
        .iter()
        .try_fold(Accumulator::default(), Accumulator::absorb_snapshot)
        .map(Accumulator::finish)
}

#[derive(Debug, Default)]
struct Accumulator {
    result: AggregationResult,
    started: usize,
}

impl Accumulator {
    fn absorb_snapshot(self, snapshot: &ParsedSnapshot) -> Result<Self, MalformedSnapshotError> {
        let acc = snapshot
            .runners
            .iter()
            .enumerate()
            .try_fold(self, |acc, (index, runner)| {
                acc.absorb_runner(&snapshot.metadata, index, runner)
            })?;
        Ok(acc.close_snapshot(&snapshot.metadata))
    }

    fn absorb_runner(
        mut self,
        metadata: &SnapshotMetadata,
        index: usize,
        runner: &RunnerRecord,
    ) -> Result<Self, MalformedSnapshotError> {
        let matched = match classify_runner(runner) {
            Classification::StartedNormally => {
                self.started += 1;
                return Ok(self);
            }
            Classification::Unmatched => {
                self.result.unclassified.push(UnclassifiedRunner {
                    snapshot: metadata.id.clone(),
                    index,
                    runner_id: runner.id.clone(),
                    name: runner.name.clone(),
                    class_name: runner.class_name.clone(),
                });
                return Ok(self);
            }
            Classification::Changed(matched) => matched,
        };

        for (kind, recorded) in matched {
            let changed_at = recorded.ok_or_else(|| MalformedSnapshotError::Runner {
                snapshot: metadata.id.clone(),
                index,
                runner_id: runner.id.clone(),
                problem: RunnerProblem::MissingChangeTime(kind),
            })?;
            match kind {
                ChangeKind::CardChange => self.result.card_changes.push(entry(
                    runner,
                    changed_at,
                    runner.new_card.value().cloned().unwrap_or_default(),
                )),
                ChangeKind::Dns => self.result.dns.push(entry(runner, changed_at, ())),
                ChangeKind::LateStart => {
                    self.result.late_starts.push(entry(runner, changed_at, ()));
                }
                ChangeKind::Comment => self.result.comments.push(entry(
                    runner,
                    changed_at,
                    runner.comment.value().cloned().unwrap_or_default(),
                )),
            }
        }
        Ok(self)
    }

    fn close_snapshot(mut self, metadata: &SnapshotMetadata) -> Self {
        let counts = Counts {
            started: self.started,
            dns: self.result.dns.len(),
            card_changes: self.result.card_changes.len(),
            late_starts: self.result.late_starts.len(),
            comments: self.result.comments.len(),
        };
        self.result.statistics.push(StatisticsRow {
            snapshot: metadata.id.clone(),
            created: metadata.created,
            creator: metadata.creator.clone(),
            version: metadata.version,
            counts,
            unclassified: self.result.unclassified.len(),
        });
        self
    }

    fn finish(self) -> AggregationResult {
        self.result
    }
}

fn entry<P>(runner: &RunnerRecord, changed_at: Timestamp, payload: P) -> ChangeEntry<P> {
    ChangeEntry {
        runner_id: runner.id.clone(),
        start_time: runner.start_time,
        changed_at,
        name: runner.name.clone(),
        class_name: runner.class_name.clone(),
        club: runner.club.clone(),
        card: runner.card.clone(),
        payload,
    }
}
