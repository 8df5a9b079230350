//! Per-snapshot statistics rows and the delta view over them.

use serde::{Deserialize, Serialize};

use crate::core::timestamp::Timestamp;

/// Counts per category. In a [`StatisticsRow`] these are running totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Counts {
    pub started: usize,
    pub dns: usize,
    pub card_changes: usize,
    pub late_starts: usize,
    pub comments: usize,
}

impl Counts {
    /// Field-wise `self - earlier`, floored at zero.
    pub fn since(&self, earlier: &Counts) -> Counts {
        Counts {
            started: self.started.saturating_sub(earlier.started),
            dns: self.dns.saturating_sub(earlier.dns),
            card_changes: self.card_changes.saturating_sub(earlier.card_changes),
            late_starts: self.late_starts.saturating_sub(earlier.late_starts),
            comments: self.comments.saturating_sub(earlier.comments),
        }
    }

    /// True if no field is smaller than the matching field of `earlier`.
    pub fn dominates(&self, earlier: &Counts) -> bool {
        self.started >= earlier.started
            && self.dns >= earlier.dns
            && self.card_changes >= earlier.card_changes
            && self.late_starts >= earlier.late_starts
            && self.comments >= earlier.comments
    }
}

/// Cumulative statistics as of one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsRow {
    pub snapshot: String,
    pub created: Timestamp,
    pub creator: String,
    pub version: u32,
    pub counts: Counts,
    /// Running total of runners whose change log matched no bucket.
    pub unclassified: usize,
}

/// Increment from `previous` to `current`.
///
/// The first row has no predecessor, so its delta is its absolute value.
/// Rows produced by the aggregator never decrease, so no field is clamped for
/// them.
pub fn delta(previous: Option<&StatisticsRow>, current: &StatisticsRow) -> Counts {
    match previous {
        Some(previous) => current.counts.since(&previous.counts),
        None => current.counts,
    }
}

/// Deltas for a whole row sequence, one per row.
pub fn deltas(rows: &[StatisticsRow]) -> Vec<Counts> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| delta(i.checked_sub(1).map(|prev| &rows[prev]), row))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ts;

    fn row(counts: Counts) -> StatisticsRow {
        StatisticsRow {
            snapshot: "s.yaml".to_string(),
            created: ts("2023-05-13T10:00:00"),
            creator: "OChecklist".to_string(),
            version: 1,
            counts,
            unclassified: 0,
        }
    }

    #[test]
    fn first_row_delta_is_absolute() {
        let first = row(Counts {
            started: 4,
            dns: 1,
            ..Counts::default()
        });
        assert_eq!(delta(None, &first), first.counts);
    }

    #[test]
    fn later_row_delta_is_difference() {
        let first = row(Counts {
            started: 4,
            dns: 1,
            comments: 2,
            ..Counts::default()
        });
        let second = row(Counts {
            started: 9,
            dns: 2,
            comments: 2,
            late_starts: 1,
            ..Counts::default()
        });
        assert_eq!(
            delta(Some(&first), &second),
            Counts {
                started: 5,
                dns: 1,
                card_changes: 0,
                late_starts: 1,
                comments: 0,
            }
        );
    }

    #[test]
    fn deltas_cover_every_row() {
        let rows = vec![
            row(Counts {
                started: 1,
                ..Counts::default()
            }),
            row(Counts {
                started: 3,
                ..Counts::default()
            }),
            row(Counts {
                started: 3,
                dns: 1,
                ..Counts::default()
            }),
        ];
        let started: Vec<usize> = deltas(&rows).iter().map(|d| d.started).collect();
        let dns: Vec<usize> = deltas(&rows).iter().map(|d| d.dns).collect();
        assert_eq!(started, vec![1, 2, 0]);
        assert_eq!(dns, vec![0, 0, 1]);
    }

    #[test]
    fn deltas_of_empty_sequence_is_empty() {
        assert!(deltas(&[]).is_empty());
    }

    #[test]
    fn dominates_is_field_wise() {
        let low = Counts {
            dns: 1,
            ..Counts::default()
        };
        let high = Counts {
            started: 1,
            dns: 1,
            ..Counts::default()
        };
        assert!(high.dominates(&low));
        assert!(!low.dominates(&high));
    }
}
