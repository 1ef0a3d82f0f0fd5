use std::path::PathBuf;

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::{debug, warn};

use crate::error::AuditResult;
use crate::model::{DirectoryBatch, ImageRecord};
use crate::sharpness::{evaluate, Sharpness};

#[derive(Debug, Default)]
pub struct BatchEvaluation {
    /// Successful evaluations, in the batch's discovery order.
    pub records: Vec<ImageRecord>,
    /// One message per image that could not be evaluated.
    pub failures: Vec<String>,
}

/// Evaluates every image of one directory on a pool of `workers` threads.
///
/// The pool lives only for this call and is joined before returning, so no
/// two directories ever share workers.
pub fn evaluate_batch(batch: &DirectoryBatch, threshold: f64, workers: usize) -> BatchEvaluation {
    if batch.images.is_empty() {
        return BatchEvaluation::default();
    }

    let outcomes = match ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .thread_name(|index| format!("blur-audit-worker-{index}"))
        .build()
    {
        Ok(pool) => pool.install(|| {
            batch
                .images
                .par_iter()
                .map(|path| (path.clone(), evaluate(path, threshold)))
                .collect::<Vec<_>>()
        }),
        Err(err) => {
            warn!(
                "worker pool unavailable for {} ({}); evaluating sequentially",
                batch.directory.display(),
                err
            );
            batch
                .images
                .iter()
                .map(|path| (path.clone(), evaluate(path, threshold)))
                .collect::<Vec<_>>()
        }
    };

    collect_outcomes(outcomes)
}

fn collect_outcomes(outcomes: Vec<(PathBuf, AuditResult<Sharpness>)>) -> BatchEvaluation {
    let mut evaluation = BatchEvaluation::default();
    for (path, outcome) in outcomes {
        match outcome {
            Ok(sharpness) => {
                debug!(
                    "{}: variance {:.2} ({})",
                    path.display(),
                    sharpness.variance,
                    if sharpness.is_blurry { "blurry" } else { "sharp" }
                );
                evaluation.records.push(ImageRecord::new(
                    &path,
                    sharpness.is_blurry,
                    sharpness.variance,
                ));
            }
            Err(err) => {
                warn!("skipping image: {err}");
                evaluation.failures.push(err.to_string());
            }
        }
    }
    evaluation
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use image::{GrayImage, Luma};
    use tempfile::TempDir;

    use super::evaluate_batch;
    use crate::model::DirectoryBatch;

    fn write_board(path: &Path, cell: u32) {
        GrayImage::from_fn(32, 32, |x, y| {
            if (x / cell + y / cell) % 2 == 0 {
                Luma([230])
            } else {
                Luma([20])
            }
        })
        .save(path)
        .expect("save board");
    }

    #[test]
    fn keeps_discovery_order_and_drops_failures() {
        let temp = TempDir::new().expect("tempdir");
        let a = temp.path().join("a.png");
        let b = temp.path().join("b.png");
        let c = temp.path().join("c.jpg");
        write_board(&a, 1);
        write_board(&b, 8);
        fs::write(&c, b"garbage").expect("write corrupt");

        let batch = DirectoryBatch {
            directory: temp.path().to_path_buf(),
            images: vec![a.clone(), c.clone(), b.clone()],
        };
        let evaluation = evaluate_batch(&batch, 100.0, 2);

        let names = evaluation
            .records
            .iter()
            .map(|record| record.file_name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["a.png", "b.png"]);
        assert_eq!(evaluation.failures.len(), 1);
        assert!(evaluation.failures[0].contains("c.jpg"));
        for record in &evaluation.records {
            assert_eq!(record.is_blurry, record.sharpness_variance < 100.0);
        }
    }

    #[test]
    fn empty_batch_spawns_nothing() {
        let batch = DirectoryBatch {
            directory: Path::new("/nowhere").to_path_buf(),
            images: Vec::new(),
        };
        let evaluation = evaluate_batch(&batch, 100.0, 8);
        assert!(evaluation.records.is_empty());
        assert!(evaluation.failures.is_empty());
    }
}
