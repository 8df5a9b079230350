//! Deterministic classification of runners into change buckets.

use crate::core::timestamp::Timestamp;
use crate::core::types::{ChangeKind, DNS_TAG, LATE_START_TAG, RunnerRecord};

/// How a single runner contributes to the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// No change log: counted as a normal start only.
    StartedNormally,
    /// Change log present; matched kinds in [`ChangeKind::ALL`] order, each
    /// with the time its change was logged, if it was.
    Changed(Vec<(ChangeKind, Option<Timestamp>)>),
    /// Change log present but no bucket predicate matched.
    Unmatched,
}

/// Classify a runner.
///
/// - No change log: `StartedNormally`, predicates are not evaluated.
/// - Otherwise each predicate is checked independently:
///   - `NewCard` field present (even if empty): card change
///   - start status contains `DNS`: did not start
///   - start status contains `Late start`: late start
///   - `Comment` field present (even if empty): comment
pub fn classify_runner(runner: &RunnerRecord) -> Classification {
    let Some(log) = &runner.change_log else {
        return Classification::StartedNormally;
    };

    let matched: Vec<(ChangeKind, Option<Timestamp>)> = ChangeKind::ALL
        .into_iter()
        .filter(|kind| matches_kind(runner, *kind))
        .map(|kind| (kind, log.recorded_at(kind)))
        .collect();

    if matched.is_empty() {
        Classification::Unmatched
    } else {
        Classification::Changed(matched)
    }
}

fn matches_kind(runner: &RunnerRecord, kind: ChangeKind) -> bool {
    match kind {
        ChangeKind::CardChange => runner.new_card.is_present(),
        ChangeKind::Dns => runner.has_status(DNS_TAG),
        ChangeKind::LateStart => runner.has_status(LATE_START_TAG),
        ChangeKind::Comment => runner.comment.is_present(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{ChangeLog, Field};
    use crate::test_support::{RunnerBuilder, ts};

    fn kinds(classification: &Classification) -> Vec<ChangeKind> {
        match classification {
            Classification::Changed(matched) => matched.iter().map(|(kind, _)| *kind).collect(),
            _ => Vec::new(),
        }
    }

    #[test]
    fn no_change_log_is_started_normally() {
        let runner = RunnerBuilder::new("1", "H21").status("DNS").build();
        assert_eq!(classify_runner(&runner), Classification::StartedNormally);
    }

    #[test]
    fn empty_change_log_is_not_a_normal_start() {
        let mut runner = RunnerBuilder::new("1", "H21").status("Started OK").build();
        runner.change_log = Some(ChangeLog::default());
        assert_eq!(classify_runner(&runner), Classification::Unmatched);
    }

    #[test]
    fn empty_new_card_still_counts_as_card_change() {
        let runner = RunnerBuilder::new("1", "H21")
            .new_card(Field::Empty)
            .logged(ChangeKind::CardChange, "2023-05-13T10:00:00")
            .build();
        assert_eq!(
            classify_runner(&runner),
            Classification::Changed(vec![(
                ChangeKind::CardChange,
                Some(ts("2023-05-13T10:00:00"))
            )])
        );
    }

    #[test]
    fn predicates_are_independent() {
        let runner = RunnerBuilder::new("1", "H21")
            .status("DNS")
            .comment(Field::Present("sick".to_string()))
            .logged(ChangeKind::Dns, "2023-05-13T10:00:00")
            .logged(ChangeKind::Comment, "2023-05-13T10:01:00")
            .build();
        assert_eq!(
            kinds(&classify_runner(&runner)),
            vec![ChangeKind::Dns, ChangeKind::Comment]
        );
    }

    #[test]
    fn all_four_kinds_in_fixed_order() {
        let runner = RunnerBuilder::new("1", "H21")
            .status("Late start")
            .status("DNS")
            .comment(Field::Empty)
            .new_card(Field::Present("99".to_string()))
            .logged(ChangeKind::Comment, "2023-05-13T10:00:00")
            .build();
        let classification = classify_runner(&runner);
        assert_eq!(kinds(&classification), ChangeKind::ALL.to_vec());
        let Classification::Changed(matched) = classification else {
            panic!("expected changed");
        };
        assert_eq!(matched[0].1, None);
        assert_eq!(matched[3].1, Some(ts("2023-05-13T10:00:00")));
    }

    #[test]
    fn change_log_without_matching_field_is_unmatched() {
        let runner = RunnerBuilder::new("1", "H21")
            .status("Started OK")
            .logged(ChangeKind::LateStart, "2023-05-13T10:00:00")
            .build();
        assert_eq!(classify_runner(&runner), Classification::Unmatched);
    }

    #[test]
    fn status_match_is_exact_tag() {
        let runner = RunnerBuilder::new("1", "H21")
            .status("DNS?")
            .logged(ChangeKind::Dns, "2023-05-13T10:00:00")
            .build();
        assert_eq!(classify_runner(&runner), Classification::Unmatched);
    }
}
