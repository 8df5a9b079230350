//! Orchestration: provider to parser to aggregator to sink.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, info, instrument, warn};

use crate::core::aggregator::{AggregationResult, aggregate};
use crate::core::parser::parse_snapshot_yaml;
use crate::core::types::ParsedSnapshot;
use crate::io::provider::SnapshotProvider;
use crate::io::report::ReportSink;

/// Result of a full report run.
#[derive(Debug, Clone)]
pub struct ReportOutcome {
    pub result: AggregationResult,
    pub report_path: PathBuf,
}

/// Fetch and parse every snapshot, preserving provider order.
///
/// Stops at the first malformed snapshot; the returned error downcasts to
/// [`crate::core::error::MalformedSnapshotError`].
pub fn load_snapshots<P: SnapshotProvider + ?Sized>(provider: &P) -> Result<Vec<ParsedSnapshot>> {
    let raw = provider.fetch().context("fetch snapshots")?;
    raw.iter()
        .map(|snapshot| {
            debug!(snapshot = %snapshot.name, bytes = snapshot.contents.len(), "parsing snapshot");
            parse_snapshot_yaml(&snapshot.name, &snapshot.contents).map_err(anyhow::Error::from)
        })
        .collect()
}

/// Load and aggregate all snapshots from `provider`.
#[instrument(skip_all)]
pub fn aggregate_from<P: SnapshotProvider + ?Sized>(provider: &P) -> Result<AggregationResult> {
    let snapshots = load_snapshots(provider)?;
    let result = aggregate(&snapshots)?;
    for runner in &result.unclassified {
        warn!(
            snapshot = %runner.snapshot,
            index = runner.index,
            runner_id = %runner.runner_id,
            class = %runner.class_name,
            "change log matched no bucket; runner left out of all counts"
        );
    }
    info!(
        snapshots = snapshots.len(),
        unclassified = result.unclassified.len(),
        "aggregation complete"
    );
    Ok(result)
}

/// Aggregate everything the provider has and hand it to `sink`.
pub fn run_report<P, S>(provider: &P, sink: &S) -> Result<ReportOutcome>
where
    P: SnapshotProvider + ?Sized,
    S: ReportSink + ?Sized,
{
    let result = aggregate_from(provider)?;
    let report_path = sink.write_report(&result).context("write report")?;
    info!(path = %report_path.display(), "report written");
    Ok(ReportOutcome {
        result,
        report_path,
    })
}

/// Console summary of the final cumulative counts.
pub fn summary_lines(result: &AggregationResult) -> Vec<String> {
    let totals = result.totals();
    let mut lines = vec![
        "Event statistics:".to_string(),
        format!("- started runners: {}", totals.started),
        format!("- dns: {}", totals.dns),
        format!("- card changes: {}", totals.card_changes),
        format!("- late starts: {}", totals.late_starts),
        format!("- new comments: {}", totals.comments),
    ];
    if !result.unclassified.is_empty() {
        lines.push(format!(
            "- unmatched change logs: {}",
            result.unclassified.len()
        ));
    }
    lines
}

/// One line per snapshot: absolute for the first, increments afterwards.
pub fn statistics_lines(result: &AggregationResult) -> Vec<String> {
    result
        .statistics
        .iter()
        .zip(result.deltas())
        .enumerate()
        .map(|(i, (row, delta))| {
            let sign = if i == 0 { "" } else { "+" };
            format!(
                "{} created={} creator=\"{}\" version={} ok={sign}{} dns={sign}{} cards={sign}{} late={sign}{} comments={sign}{}",
                row.snapshot,
                row.created.clock(),
                row.creator,
                row.version,
                delta.started,
                delta.dns,
                delta.card_changes,
                delta.late_starts,
                delta.comments,
            )
        })
        .collect()
}
