use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{AuditError, AuditResult};
use crate::model::ImageRecord;

pub const REPORT_HEADERS: [&str; 4] = [
    "Full Path",
    "File Name",
    "Is Blurry",
    "Laplacian Variance",
];

/// Blurriest first. The sort is stable, so equal variances keep discovery order.
pub fn sort_by_variance(records: &mut [ImageRecord]) {
    records.sort_by(|a, b| a.sharpness_variance.total_cmp(&b.sharpness_variance));
}

/// Writes `records` as `<directory>/<file_name>`.
///
/// Returns `Ok(None)` without touching the filesystem when there is nothing
/// to report.
pub fn write_report(
    records: &mut [ImageRecord],
    directory: &Path,
    file_name: &str,
    sort_ascending: bool,
) -> AuditResult<Option<PathBuf>> {
    if records.is_empty() {
        return Ok(None);
    }
    if sort_ascending {
        sort_by_variance(records);
    }

    let path = directory.join(file_name);
    csv::Writer::from_path(&path)
        .and_then(|writer| write_csv(records, writer))
        .map_err(|source| AuditError::ReportWrite {
            path: path.clone(),
            source,
        })?;

    Ok(Some(path))
}

pub fn write_csv<W: Write>(
    records: &[ImageRecord],
    mut writer: csv::Writer<W>,
) -> csv::Result<()> {
    writer.write_record(REPORT_HEADERS)?;
    for record in records {
        let variance = format!("{:.2}", record.sharpness_variance);
        writer.write_record([
            record.full_path.as_str(),
            record.file_name.as_str(),
            if record.is_blurry { "true" } else { "false" },
            variance.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
