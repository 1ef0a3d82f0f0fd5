use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;

pub const SUMMARY_VERSION: &str = "1.0.0";

/// One evaluated image, in the shape the report writer emits it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageRecord {
    pub full_path: String,
    pub file_name: String,
    pub is_blurry: bool,
    pub sharpness_variance: f64,
}

impl ImageRecord {
    pub fn new(path: &Path, is_blurry: bool, sharpness_variance: f64) -> Self {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        Self {
            full_path: path.to_string_lossy().to_string(),
            file_name,
            is_blurry,
            sharpness_variance,
        }
    }
}

/// The images found directly inside one directory, in discovery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryBatch {
    pub directory: PathBuf,
    pub images: Vec<PathBuf>,
}

/// Everything the pipeline knows about a directory once its batch is joined
/// and its report (if any) is written.
#[derive(Debug, Clone)]
pub struct DirectoryOutcome {
    pub directory: PathBuf,
    pub images_found: usize,
    pub records: Vec<ImageRecord>,
    pub failures: Vec<String>,
    pub report_path: Option<PathBuf>,
}

impl DirectoryOutcome {
    pub fn blurry_count(&self) -> usize {
        self.records.iter().filter(|record| record.is_blurry).count()
    }

    pub fn summary(&self) -> DirectorySummary {
        DirectorySummary {
            directory: self.directory.to_string_lossy().to_string(),
            images_found: self.images_found,
            evaluated: self.records.len(),
            blurry: self.blurry_count(),
            failed: self.failures.len(),
            report_path: self
                .report_path
                .as_ref()
                .map(|path| path.to_string_lossy().to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DirectorySummary {
    pub directory: String,
    pub images_found: usize,
    pub evaluated: usize,
    pub blurry: usize,
    pub failed: usize,
    #[serde(default)]
    pub report_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    pub summary_version: String,
    pub root: String,
    pub started_at: String,
    pub elapsed_ms: u64,
    pub config: AnalysisConfig,
    pub directories: Vec<DirectorySummary>,
    pub warnings: Vec<String>,
}

impl RunSummary {
    pub fn evaluated_images(&self) -> usize {
        self.directories.iter().map(|dir| dir.evaluated).sum()
    }

    pub fn blurry_images(&self) -> usize {
        self.directories.iter().map(|dir| dir.blurry).sum()
    }

    pub fn failed_images(&self) -> usize {
        self.directories.iter().map(|dir| dir.failed).sum()
    }

    pub fn reports_written(&self) -> usize {
        self.directories
            .iter()
            .filter(|dir| dir.report_path.is_some())
            .count()
    }
}
