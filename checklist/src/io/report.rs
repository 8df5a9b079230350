//! Report sinks: rendering an aggregation for officials.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use minijinja::{Environment, context};
use serde::Serialize;
use tracing::debug;

use crate::core::aggregator::AggregationResult;
use crate::core::statistics::Counts;
use crate::core::types::ChangeEntry;
use crate::io::config::{ReportConfig, ReportFormat, write_atomic};

const REPORT_TEMPLATE: &str = include_str!("templates/report.html");

/// Consumer of a finished aggregation.
pub trait ReportSink {
    /// Render and store the report, returning where it was written.
    fn write_report(&self, result: &AggregationResult) -> Result<PathBuf>;
}

/// Build the sink configured for `report`.
pub fn sink_for(report: &ReportConfig, generated_at: NaiveDateTime) -> Box<dyn ReportSink> {
    let path = report.output_path();
    match report.format {
        ReportFormat::Html => Box::new(HtmlReport::new(path, report.title.clone(), generated_at)),
        ReportFormat::Json => Box::new(JsonReport::new(path)),
    }
}

/// Standalone HTML page with one table per bucket and a statistics table.
#[derive(Debug, Clone)]
pub struct HtmlReport {
    path: PathBuf,
    title: String,
    generated_at: NaiveDateTime,
}

impl HtmlReport {
    pub fn new(path: impl Into<PathBuf>, title: String, generated_at: NaiveDateTime) -> Self {
        Self {
            path: path.into(),
            title,
            generated_at,
        }
    }
}

impl ReportSink for HtmlReport {
    fn write_report(&self, result: &AggregationResult) -> Result<PathBuf> {
        let html = render_html(result, &self.title, self.generated_at)?;
        debug!(path = %self.path.display(), bytes = html.len(), "writing html report");
        write_atomic(&self.path, &html)?;
        Ok(self.path.clone())
    }
}

/// The aggregation as pretty-printed JSON.
#[derive(Debug, Clone)]
pub struct JsonReport {
    path: PathBuf,
}

impl JsonReport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ReportSink for JsonReport {
    fn write_report(&self, result: &AggregationResult) -> Result<PathBuf> {
        let mut buf = serde_json::to_string_pretty(result).context("serialize report json")?;
        buf.push('\n');
        debug!(path = %self.path.display(), "writing json report");
        write_atomic(&self.path, &buf)?;
        Ok(self.path.clone())
    }
}

#[derive(Debug, Clone, Serialize)]
struct TableView {
    id: &'static str,
    kind: &'static str,
    title: &'static str,
    empty_message: &'static str,
    rows: Vec<RowView>,
}

#[derive(Debug, Clone, Serialize)]
struct RowView {
    /// Stable across regenerations so the resolved checkbox survives reloads.
    row_id: String,
    changed_at: String,
    start_time: String,
    name: String,
    class_name: String,
    club: String,
    card: String,
    payload: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct StatisticsView {
    snapshot: String,
    created: String,
    creator: String,
    version: u32,
    counts: Counts,
    unclassified: usize,
}

/// Render the HTML report.
///
/// Bucket rows are sorted by change time, then scheduled start. The first
/// statistics row is absolute, later rows show the increment over the
/// previous snapshot.
pub fn render_html(
    result: &AggregationResult,
    title: &str,
    generated_at: NaiveDateTime,
) -> Result<String> {
    let mut env = Environment::new();
    env.add_template("report.html", REPORT_TEMPLATE)
        .context("parse report template")?;
    let template = env.get_template("report.html")?;

    let tables = vec![
        TableView {
            id: "dataDNS",
            kind: "dns",
            title: "Did not start",
            empty_message: "No runners reported as not starting.",
            rows: rows(&result.dns, |_| None),
        },
        TableView {
            id: "dataCards",
            kind: "card",
            title: "Card changes",
            empty_message: "No card changes.",
            rows: rows(&result.card_changes, |card| Some(card.clone())),
        },
        TableView {
            id: "dataLateStart",
            kind: "late",
            title: "Late starts",
            empty_message: "No late starts.",
            rows: rows(&result.late_starts, |_| None),
        },
        TableView {
            id: "dataComments",
            kind: "comment",
            title: "Comments from the start",
            empty_message: "No new comments.",
            rows: rows(&result.comments, |text| Some(text.clone())),
        },
    ];

    let rendered = template
        .render(context! {
            title => title,
            generated_at => generated_at.format("%d.%m.%Y %H:%M:%S").to_string(),
            tables => tables,
            statistics => statistics_views(result),
        })
        .context("render report template")?;
    Ok(rendered)
}

fn rows<P>(bucket: &[ChangeEntry<P>], payload: impl Fn(&P) -> Option<String>) -> Vec<RowView> {
    let mut sorted: Vec<&ChangeEntry<P>> = bucket.iter().collect();
    sorted.sort_by_key(|entry| (entry.changed_at, entry.start_time));
    sorted
        .into_iter()
        .map(|entry| RowView {
            row_id: row_id(entry),
            changed_at: entry.changed_at.clock(),
            start_time: entry.start_time.clock(),
            name: entry.name.clone(),
            class_name: entry.class_name.clone(),
            club: entry.club.clone(),
            card: entry.card.clone(),
            payload: payload(&entry.payload),
        })
        .collect()
}

fn row_id<P>(entry: &ChangeEntry<P>) -> String {
    let class: String = entry
        .class_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    format!("{}{}", entry.start_time.compact(), class)
}

fn statistics_views(result: &AggregationResult) -> Vec<StatisticsView> {
    let deltas = result.deltas();
    result
        .statistics
        .iter()
        .zip(deltas)
        .enumerate()
        .map(|(i, (row, counts))| {
            let previous_unclassified = i
                .checked_sub(1)
                .map(|prev| result.statistics[prev].unclassified)
                .unwrap_or(0);
            StatisticsView {
                snapshot: row.snapshot.clone(),
                created: row.created.clock(),
                creator: row.creator.clone(),
                version: row.version,
                counts,
                unclassified: row.unclassified.saturating_sub(previous_unclassified),
            }
        })
        .collect()
}

/// Report file name for display, falling back to the full path.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::aggregator::aggregate;
    use crate::core::types::{ChangeKind, Field};
    use crate::test_support::{RunnerBuilder, load_snapshot_fixture, snapshot, ts};

    fn generated_at() -> NaiveDateTime {
        ts("2023-05-13T10:20:00").as_datetime().naive_local()
    }

    fn fixture_result() -> AggregationResult {
        let first = load_snapshot_fixture("snapshot_1000.yaml").expect("fixture");
        let second = load_snapshot_fixture("snapshot_1015.yaml").expect("fixture");
        aggregate(&[first, second]).expect("aggregate")
    }

    #[test]
    fn renders_every_bucket_table() {
        let html = render_html(&fixture_result(), "Spring Cup", generated_at()).expect("render");
        assert!(html.contains("<title>Spring Cup</title>"));
        assert!(html.contains("13.05.2023 10:20:00"));
        for id in ["dataDNS", "dataCards", "dataLateStart", "dataComments", "dataStatistics"] {
            assert!(html.contains(&format!("id=\"{id}\"")), "missing table {id}");
        }
        assert!(html.contains("left before start"));
        assert!(html.contains("8123456"));
        assert!(html.contains("Tomas Maly"));
    }

    #[test]
    fn empty_result_shows_no_data_rows() {
        let html =
            render_html(&AggregationResult::default(), "Empty", generated_at()).expect("render");
        assert!(html.contains("No card changes."));
        assert!(html.contains("No late starts."));
        assert!(html.contains("No snapshots processed."));
        assert!(!html.contains("type=\"checkbox\""));
    }

    #[test]
    fn row_ids_use_start_time_and_class() {
        let html = render_html(&fixture_result(), "t", generated_at()).expect("render");
        assert!(html.contains("id=\"20230513095900H21\""));
    }

    #[test]
    fn statistics_show_deltas_after_first_row() {
        let views = statistics_views(&fixture_result());
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].counts.started, 1);
        assert_eq!(views[0].counts.dns, 1);
        assert_eq!(views[1].counts.started, 1);
        assert_eq!(views[1].counts.dns, 1);
        assert_eq!(views[1].counts.late_starts, 1);
        assert_eq!(views[1].counts.card_changes, 0);
        assert_eq!(views[1].unclassified, 1);
        assert_eq!(views[0].created, "10:00:41");
    }

    #[test]
    fn bucket_rows_sorted_by_change_time() {
        let late = RunnerBuilder::new("2", "H21")
            .status("DNS")
            .logged(ChangeKind::Dns, "2023-05-13T10:30:00")
            .build();
        let early = RunnerBuilder::new("1", "H21")
            .status("DNS")
            .logged(ChangeKind::Dns, "2023-05-13T10:10:00")
            .build();
        let result = aggregate(&[snapshot("s.yaml", vec![late, early])]).expect("aggregate");
        let rendered = rows(&result.dns, |_| None);
        let names: Vec<&str> = rendered.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Runner 1", "Runner 2"]);
        // aggregation order is untouched
        assert_eq!(result.dns[0].runner_id, "2");
    }

    #[test]
    fn equal_change_times_fall_back_to_start_time() {
        let later_start = RunnerBuilder::new("1", "H21")
            .start_time("2023-05-13T10:12:00")
            .status("DNS")
            .logged(ChangeKind::Dns, "2023-05-13T10:10:00")
            .build();
        let earlier_start = RunnerBuilder::new("2", "H21")
            .start_time("2023-05-13T10:04:00")
            .status("DNS")
            .logged(ChangeKind::Dns, "2023-05-13T10:10:00")
            .build();
        let result =
            aggregate(&[snapshot("s.yaml", vec![later_start, earlier_start])]).expect("aggregate");
        let rendered = rows(&result.dns, |_| None);
        let starts: Vec<&str> = rendered.iter().map(|r| r.start_time.as_str()).collect();
        assert_eq!(starts, vec!["10:04:00", "10:12:00"]);
        assert_eq!(rendered[0].row_id, "20230513100400H21");
    }

    #[test]
    fn markup_in_fields_is_escaped() {
        let runner = RunnerBuilder::new("1", "H21")
            .comment(Field::Present("<b>late</b>".to_string()))
            .logged(ChangeKind::Comment, "2023-05-13T10:10:00")
            .build();
        let result = aggregate(&[snapshot("s.yaml", vec![runner])]).expect("aggregate");
        let html = render_html(&result, "t", generated_at()).expect("render");
        assert!(!html.contains("<b>late</b>"));
        assert!(html.contains("&lt;b&gt;late"));
    }

    #[test]
    fn json_sink_writes_aggregation() {
        let temp = tempfile::tempdir().expect("tempdir");
        let sink = JsonReport::new(temp.path().join("out.json"));
        let path = sink.write_report(&fixture_result()).expect("write");
        let contents = std::fs::read_to_string(&path).expect("read");
        let value: serde_json::Value = serde_json::from_str(&contents).expect("json");
        assert_eq!(value["statistics"].as_array().map(Vec::len), Some(2));
        assert_eq!(value["card_changes"][0]["payload"], "8123456");
    }

    #[test]
    fn html_sink_writes_into_missing_directory() {
        let temp = tempfile::tempdir().expect("tempdir");
        let sink = HtmlReport::new(
            temp.path().join("out").join("report.html"),
            "t".to_string(),
            generated_at(),
        );
        let path = sink.write_report(&fixture_result()).expect("write");
        assert!(path.is_file());
        assert_eq!(display_name(&path), "report.html");
    }
}
