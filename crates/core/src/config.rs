use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AuditError, AuditResult};

pub const DEFAULT_THRESHOLD: f64 = 100.0;
pub const DEFAULT_WORKERS: usize = 8;
pub const DEFAULT_REPORT_FILE_NAME: &str = "image_analysis_results.csv";
pub const DEFAULT_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".tiff", ".NEF"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisConfig {
    /// Extensions with their leading dot. Matching is case-sensitive.
    pub file_extensions: BTreeSet<String>,
    pub threshold: f64,
    pub sort_ascending: bool,
    pub export_csv: bool,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default)]
    pub max_depth: Option<usize>,
    #[serde(default)]
    pub excludes: Vec<String>,
    #[serde(default = "default_report_file_name")]
    pub report_file_name: String,
    #[serde(default)]
    pub progress: bool,
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

fn default_report_file_name() -> String {
    DEFAULT_REPORT_FILE_NAME.to_string()
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            file_extensions: DEFAULT_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            threshold: DEFAULT_THRESHOLD,
            sort_ascending: true,
            export_csv: true,
            workers: default_workers(),
            max_depth: None,
            excludes: Vec::new(),
            report_file_name: default_report_file_name(),
            progress: false,
        }
    }
}

impl AnalysisConfig {
    /// Replaces the extension set. `jpg` and `.jpg` are both accepted.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.file_extensions = extensions
            .into_iter()
            .map(|ext| normalize_extension(ext.as_ref()))
            .filter(|ext| ext.len() > 1)
            .collect();
        self
    }

    pub fn matches_extension(&self, path: &Path) -> bool {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) => self.file_extensions.contains(&format!(".{ext}")),
            None => false,
        }
    }

    pub fn validate(&self) -> AuditResult<()> {
        if !self.threshold.is_finite() {
            return Err(AuditError::InvalidConfig(
                "threshold must be a finite number".to_string(),
            ));
        }
        if self.workers == 0 {
            return Err(AuditError::InvalidConfig(
                "workers must be greater than zero".to_string(),
            ));
        }
        if self.file_extensions.is_empty() {
            return Err(AuditError::InvalidConfig(
                "at least one file extension is required".to_string(),
            ));
        }
        let name = self.report_file_name.trim();
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(AuditError::InvalidConfig(format!(
                "report file name '{}' must be a bare file name",
                self.report_file_name
            )));
        }
        Ok(())
    }
}

fn normalize_extension(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('.') {
        trimmed.to_string()
    } else {
        format!(".{trimmed}")
    }
}
