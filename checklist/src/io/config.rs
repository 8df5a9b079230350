//! Report configuration stored in `checklist.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "checklist.toml";

/// Checklist configuration (TOML).
///
/// Edited by event officials before the start opens. Missing fields default to
/// values that work for a drop folder next to the config file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct ChecklistConfig {
    pub source: SourceConfig,
    pub report: ReportConfig,
    pub publish: PublishConfig,
}

/// Where snapshot exports are dropped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SourceConfig {
    pub dir: PathBuf,
    /// File extension of snapshot exports, without the dot.
    pub extension: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("snapshots"),
            extension: "yaml".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Html,
    Json,
}

impl ReportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ReportFormat::Html => "html",
            ReportFormat::Json => "json",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReportConfig {
    /// Output file stem; the extension follows `format`.
    pub name: String,
    pub output_dir: PathBuf,
    pub title: String,
    pub format: ReportFormat,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            name: "online-checklist".to_string(),
            output_dir: PathBuf::from("."),
            title: "O Checklist report".to_string(),
            format: ReportFormat::Html,
        }
    }
}

impl ReportConfig {
    pub fn output_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", self.name, self.format.extension()))
    }
}

/// Copy of the rendered report for officials away from the start.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PublishConfig {
    pub enabled: bool,
    pub dir: PathBuf,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: PathBuf::from("publish"),
        }
    }
}

impl ChecklistConfig {
    pub fn validate(&self) -> Result<()> {
        if self.source.extension.trim().is_empty() {
            return Err(anyhow!("source.extension must be non-empty"));
        }
        if self.source.extension.starts_with('.') {
            return Err(anyhow!("source.extension must not start with '.'"));
        }
        if self.report.name.trim().is_empty() {
            return Err(anyhow!("report.name must be non-empty"));
        }
        if self.report.name.contains(['/', '\\']) {
            return Err(anyhow!("report.name must be a file stem, not a path"));
        }
        if self.publish.enabled && self.publish.dir.as_os_str().is_empty() {
            return Err(anyhow!("publish.dir must be set when publish.enabled = true"));
        }
        Ok(())
    }

    /// Resolve relative paths against `base` (the config file's directory).
    pub fn resolve_paths(mut self, base: &Path) -> Self {
        self.source.dir = base.join(&self.source.dir);
        self.report.output_dir = base.join(&self.report.output_dir);
        self.publish.dir = base.join(&self.publish.dir);
        self
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `ChecklistConfig::default()`.
pub fn load_config(path: &Path) -> Result<ChecklistConfig> {
    if !path.exists() {
        let cfg = ChecklistConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: ChecklistConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &ChecklistConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

pub(crate) fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let file_name = path
        .file_name()
        .with_context(|| format!("path has no file name {}", path.display()))?;
    let tmp_path = parent.join(format!(".{}.tmp", file_name.to_string_lossy()));
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp file {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace {}", path.display()))?;
    Ok(())
}
