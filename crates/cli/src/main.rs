use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use blur_audit_core::{
    run_analysis_with_callback, AnalysisConfig, DirectoryOutcome, RunSummary, DEFAULT_THRESHOLD,
    DEFAULT_WORKERS,
};
use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "blur-audit",
    version,
    about = "Score image sharpness per directory and write a CSV report of blurry images."
)]
struct Cli {
    /// Root directory to analyze. Every subdirectory gets its own report.
    #[arg(value_name = "DIR_PATH")]
    dir_path: PathBuf,

    /// Laplacian variance below which an image is reported as blurry.
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    threshold: f64,

    /// Image extensions to analyze (repeatable, case-sensitive, leading dot optional).
    #[arg(long = "ext", value_name = "EXT", action = ArgAction::Append)]
    extensions: Vec<String>,

    /// Keep discovery order instead of sorting blurriest first.
    #[arg(long)]
    no_sort: bool,

    /// Evaluate images without writing CSV reports.
    #[arg(long)]
    no_export: bool,

    /// Concurrent evaluations per directory.
    #[arg(long, default_value_t = DEFAULT_WORKERS)]
    workers: usize,

    /// Maximum traversal depth (root is depth 0).
    #[arg(long)]
    max_depth: Option<usize>,

    /// Exclude glob patterns or path substrings (repeatable).
    #[arg(long = "exclude", value_name = "GLOB", action = ArgAction::Append)]
    exclude: Vec<String>,

    /// Optional JSON run summary output file.
    #[arg(long, value_name = "FILE")]
    summary: Option<PathBuf>,

    /// Emit per-directory progress log events.
    #[arg(long)]
    progress: bool,

    /// Wait for Enter before exiting.
    #[arg(long)]
    wait: bool,
}

impl Cli {
    fn analysis_config(&self) -> AnalysisConfig {
        let config = AnalysisConfig {
            threshold: self.threshold,
            sort_ascending: !self.no_sort,
            export_csv: !self.no_export,
            workers: self.workers,
            max_depth: self.max_depth,
            excludes: self.exclude.clone(),
            progress: self.progress,
            ..AnalysisConfig::default()
        };
        if self.extensions.is_empty() {
            config
        } else {
            config.with_extensions(&self.extensions)
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let result = run_analyze_command(&cli);
    if cli.wait {
        wait_for_enter();
    }
    result
}

fn run_analyze_command(cli: &Cli) -> Result<()> {
    let config = cli.analysis_config();
    let summary = run_analysis_with_callback(&cli.dir_path, &config, print_outcome)
        .with_context(|| format!("analysis of {} failed", cli.dir_path.display()))?;

    println!(
        "Analyzed {} image(s) in {} director(ies): {} blurry, {} failed, {} report(s) written in {} ms.",
        summary.evaluated_images(),
        summary.directories.len(),
        summary.blurry_images(),
        summary.failed_images(),
        summary.reports_written(),
        summary.elapsed_ms
    );
    if !summary.warnings.is_empty() {
        println!("{} warning(s) logged.", summary.warnings.len());
    }

    if let Some(output) = &cli.summary {
        write_summary(&summary, output)?;
        println!("Run summary written to {}", output.display());
    }

    Ok(())
}

fn print_outcome(outcome: &DirectoryOutcome) {
    match &outcome.report_path {
        Some(path) => println!("Data successfully exported to {}", path.display()),
        None => println!(
            "{}: {} image(s) evaluated, {} blurry",
            outcome.directory.display(),
            outcome.records.len(),
            outcome.blurry_count()
        ),
    }
}

fn write_summary(summary: &RunSummary, output: &Path) -> Result<()> {
    let payload = serde_json::to_string_pretty(summary).context("failed to serialize summary")?;
    fs::write(output, payload)
        .with_context(|| format!("failed to write summary to {}", output.display()))
}

fn wait_for_enter() {
    print!("Press Enter to exit...");
    let _ = io::stdout().flush();
    let mut line = String::new();
    let _ = io::stdin().lock().read_line(&mut line);
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}
