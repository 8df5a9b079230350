//! Copying a rendered report into the publish folder.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::io::config::write_atomic;

/// Copy `report` into `publish_dir`, keeping its file name.
///
/// The copy is written to a temp file and renamed, so a web server reading the
/// folder never serves a half-written page.
pub fn publish_report(report: &Path, publish_dir: &Path) -> Result<PathBuf> {
    let file_name = report
        .file_name()
        .with_context(|| format!("report path has no file name {}", report.display()))?;
    let contents =
        fs::read_to_string(report).with_context(|| format!("read report {}", report.display()))?;
    let target = publish_dir.join(file_name);
    write_atomic(&target, &contents)?;
    info!(target = %target.display(), "report published");
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copies_into_new_publish_dir() {
        let temp = tempfile::tempdir().expect("tempdir");
        let report = temp.path().join("online-checklist.html");
        fs::write(&report, "<html></html>").expect("write");

        let target = publish_report(&report, &temp.path().join("www")).expect("publish");
        assert_eq!(target, temp.path().join("www").join("online-checklist.html"));
        assert_eq!(fs::read_to_string(&target).expect("read"), "<html></html>");
    }

    #[test]
    fn overwrites_previous_copy() {
        let temp = tempfile::tempdir().expect("tempdir");
        let report = temp.path().join("r.html");
        let publish_dir = temp.path().join("www");
        fs::write(&report, "v1").expect("write");
        publish_report(&report, &publish_dir).expect("publish v1");
        fs::write(&report, "v2").expect("write");
        let target = publish_report(&report, &publish_dir).expect("publish v2");
        assert_eq!(fs::read_to_string(target).expect("read"), "v2");
    }

    #[test]
    fn missing_report_is_an_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let err = publish_report(&temp.path().join("none.html"), temp.path()).unwrap_err();
        assert!(format!("{err:#}").contains("read report"));
    }
}
