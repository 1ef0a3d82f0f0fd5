use std::path::Path;
use std::time::Instant;

use chrono::{SecondsFormat, Utc};
use tracing::{info, warn};

use crate::config::AnalysisConfig;
use crate::error::AuditResult;
use crate::evaluate::evaluate_batch;
use crate::model::{DirectoryOutcome, RunSummary, SUMMARY_VERSION};
use crate::report::{sort_by_variance, write_report};
use crate::scan::enumerate_directories;

pub fn run_analysis(root: &Path, config: &AnalysisConfig) -> AuditResult<RunSummary> {
    run_analysis_with_callback(root, config, |_| {})
}

/// Runs the whole pipeline, one directory at a time.
///
/// `on_directory` is called once per directory that contained at least one
/// matching image, after its evaluations are joined and its report written.
/// Only an invalid config or an unreadable root returns `Err`; every other
/// failure ends up in `RunSummary::warnings`.
pub fn run_analysis_with_callback<F>(
    root: &Path,
    config: &AnalysisConfig,
    mut on_directory: F,
) -> AuditResult<RunSummary>
where
    F: FnMut(&DirectoryOutcome),
{
    config.validate()?;
    let started = Instant::now();
    let started_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

    info!(
        "analyzing {} (threshold {:.2}, {} worker(s))",
        root.display(),
        config.threshold,
        config.workers
    );

    let mut warnings = Vec::new();
    let batches = enumerate_directories(root, config, &mut warnings)?;
    let total = batches.iter().filter(|batch| !batch.images.is_empty()).count();

    let mut directories = Vec::new();
    for batch in batches.into_iter().filter(|batch| !batch.images.is_empty()) {
        let evaluation = evaluate_batch(&batch, config.threshold, config.workers);
        warnings.extend(evaluation.failures.iter().cloned());

        let mut records = evaluation.records;
        let report_path = if config.export_csv {
            match write_report(
                &mut records,
                &batch.directory,
                &config.report_file_name,
                config.sort_ascending,
            ) {
                Ok(path) => path,
                Err(err) => {
                    warn!("{err}");
                    warnings.push(err.to_string());
                    None
                }
            }
        } else {
            if config.sort_ascending {
                sort_by_variance(&mut records);
            }
            None
        };

        let outcome = DirectoryOutcome {
            directory: batch.directory,
            images_found: batch.images.len(),
            records,
            failures: evaluation.failures,
            report_path,
        };

        if config.progress {
            info!(
                "directory {}/{} done: {} ({} evaluated, {} blurry, {} failed)",
                directories.len() + 1,
                total,
                outcome.directory.display(),
                outcome.records.len(),
                outcome.blurry_count(),
                outcome.failures.len()
            );
        }

        on_directory(&outcome);
        directories.push(outcome.summary());
    }

    let summary = RunSummary {
        summary_version: SUMMARY_VERSION.to_string(),
        root: root.to_string_lossy().to_string(),
        started_at,
        elapsed_ms: started.elapsed().as_millis() as u64,
        config: config.clone(),
        directories,
        warnings,
    };
    info!(
        "analysis finished: {} image(s), {} blurry, {} report(s), {} warning(s)",
        summary.evaluated_images(),
        summary.blurry_images(),
        summary.reports_written(),
        summary.warnings.len()
    );
    Ok(summary)
}
