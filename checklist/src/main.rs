//! O Checklist start-list change report.
//!
//! Reads snapshot exports from a drop folder, aggregates what changed at the
//! start and writes a report for officials (`checklist.toml` configures it).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use checklist::core::error::MalformedSnapshotError;
use checklist::exit_codes;
use checklist::io::config::{
    ChecklistConfig, DEFAULT_CONFIG_FILE, ReportFormat, load_config, write_config,
};
use checklist::io::provider::DirectoryProvider;
use checklist::io::publish::publish_report;
use checklist::io::report::{display_name, sink_for};
use checklist::logging;
use checklist::pipeline::{aggregate_from, run_report, statistics_lines, summary_lines};

#[derive(Parser)]
#[command(
    name = "checklist",
    version,
    about = "Start-list change report for O Checklist snapshot exports"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a default `checklist.toml` and create the drop folder.
    Init {
        /// Overwrite an existing config file.
        #[arg(short, long)]
        force: bool,
        #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
    },
    /// Aggregate all snapshots and write the report.
    Report(ReportArgs),
    /// Print per-snapshot statistics.
    Stats(SourceArgs),
    /// Parse every snapshot and report the first malformed one.
    Validate(SourceArgs),
}

#[derive(Args)]
struct SourceArgs {
    /// Config file; relative paths inside it resolve against its directory.
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// Drop folder, overriding `source.dir`.
    #[arg(long)]
    source: Option<PathBuf>,
}

#[derive(Args)]
struct ReportArgs {
    #[command(flatten)]
    source: SourceArgs,
    #[arg(long, value_enum)]
    format: Option<ReportFormat>,
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

fn main() {
    logging::init();
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(exit_code_for(&err));
    }
    std::process::exit(exit_codes::OK);
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Init { force, config } => cmd_init(&config, force),
        Command::Report(args) => cmd_report(&args),
        Command::Stats(args) => cmd_stats(&args),
        Command::Validate(args) => cmd_validate(&args),
    }
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    if err.downcast_ref::<MalformedSnapshotError>().is_some() {
        exit_codes::MALFORMED
    } else {
        exit_codes::INVALID
    }
}

fn cmd_init(config_path: &Path, force: bool) -> Result<()> {
    let cfg = ChecklistConfig::default();
    if force || !config_path.exists() {
        write_config(config_path, &cfg)
            .with_context(|| format!("write {}", config_path.display()))?;
        println!("wrote {}", config_path.display());
    } else {
        println!("{} already exists (use --force to overwrite)", config_path.display());
    }
    let source_dir = cfg.resolve_paths(config_dir(config_path)).source.dir;
    std::fs::create_dir_all(&source_dir)
        .with_context(|| format!("create drop folder {}", source_dir.display()))?;
    Ok(())
}

fn cmd_report(args: &ReportArgs) -> Result<()> {
    let mut cfg = resolve_config(&args.source)?;
    if let Some(format) = args.format {
        cfg.report.format = format;
    }
    if let Some(dir) = &args.output_dir {
        cfg.report.output_dir = dir.clone();
    }

    let provider = DirectoryProvider::new(&cfg.source.dir, &cfg.source.extension);
    let sink = sink_for(&cfg.report, chrono::Local::now().naive_local());
    let outcome = run_report(&provider, sink.as_ref())?;

    for line in summary_lines(&outcome.result) {
        println!("{line}");
    }
    println!("report: {}", outcome.report_path.display());

    if cfg.publish.enabled {
        let target = publish_report(&outcome.report_path, &cfg.publish.dir)
            .with_context(|| format!("publish {}", display_name(&outcome.report_path)))?;
        println!("published: {}", target.display());
    }
    Ok(())
}

fn cmd_stats(args: &SourceArgs) -> Result<()> {
    let cfg = resolve_config(args)?;
    let provider = DirectoryProvider::new(&cfg.source.dir, &cfg.source.extension);
    let result = aggregate_from(&provider)?;
    for line in statistics_lines(&result) {
        println!("{line}");
    }
    println!("unmatched change logs: {}", result.unclassified.len());
    Ok(())
}

fn cmd_validate(args: &SourceArgs) -> Result<()> {
    let cfg = resolve_config(args)?;
    let provider = DirectoryProvider::new(&cfg.source.dir, &cfg.source.extension);
    // Missing change times only surface while aggregating.
    let count = aggregate_from(&provider)?.statistics.len();
    info!(count, "all snapshots valid");
    println!("{count} snapshot(s) ok");
    Ok(())
}

fn resolve_config(args: &SourceArgs) -> Result<ChecklistConfig> {
    let mut cfg = load_config(&args.config)?.resolve_paths(config_dir(&args.config));
    if let Some(dir) = &args.source {
        cfg.source.dir = dir.clone();
    }
    Ok(cfg)
}

fn config_dir(config_path: &Path) -> &Path {
    config_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}
