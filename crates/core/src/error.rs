use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    /// The analysis root could not be listed. Aborts the run.
    #[error("cannot access directory {}: {source}", path.display())]
    DirectoryAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot decode image {}: {reason}", path.display())]
    ImageDecode { path: PathBuf, reason: String },

    #[error("cannot write report {}: {source}", path.display())]
    ReportWrite {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("invalid analysis config: {0}")]
    InvalidConfig(String),
}

pub type AuditResult<T> = std::result::Result<T, AuditError>;
