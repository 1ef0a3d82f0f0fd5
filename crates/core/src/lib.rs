pub mod analysis;
pub mod config;
pub mod error;
pub mod evaluate;
pub mod model;
pub mod report;
pub mod scan;
pub mod sharpness;

pub use analysis::{run_analysis, run_analysis_with_callback};
pub use config::{
    AnalysisConfig, DEFAULT_EXTENSIONS, DEFAULT_REPORT_FILE_NAME, DEFAULT_THRESHOLD,
    DEFAULT_WORKERS,
};
pub use error::{AuditError, AuditResult};
pub use evaluate::{evaluate_batch, BatchEvaluation};
pub use model::{
    DirectoryBatch, DirectoryOutcome, DirectorySummary, ImageRecord, RunSummary, SUMMARY_VERSION,
};
pub use report::{sort_by_variance, write_csv, write_report, REPORT_HEADERS};
pub use scan::enumerate_directories;
pub use sharpness::{evaluate, evaluate_image, laplacian_variance, Sharpness};
