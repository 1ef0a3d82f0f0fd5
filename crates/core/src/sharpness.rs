//! Laplacian-variance sharpness estimation.
//!
//! The decoded image is reduced to 8-bit luma, convolved with the 4-neighbour
//! Laplacian kernel, and the population variance of the response is the
//! sharpness score. Low variance means little high-frequency detail.
//!
//! Borders are mirrored without repeating the edge pixel (`dcb|abcd|cba`,
//! OpenCV's default `BORDER_REFLECT_101`) before filtering, so scores and
//! thresholds stay comparable with `cv2.Laplacian(img, CV_64F).var()`. On
//! small images the border rows weigh heavily and a clamped border would
//! score very differently.

use std::path::Path;

use image::{DynamicImage, ImageBuffer, ImageReader, Luma};
use imageproc::filter::filter3x3;

use crate::error::{AuditError, AuditResult};

type GrayF32 = ImageBuffer<Luma<f32>, Vec<f32>>;

const LAPLACIAN_KERNEL: [f32; 9] = [0.0, 1.0, 0.0, 1.0, -4.0, 1.0, 0.0, 1.0, 0.0];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sharpness {
    pub is_blurry: bool,
    pub variance: f64,
}

impl Sharpness {
    pub fn classify(variance: f64, threshold: f64) -> Self {
        Self {
            is_blurry: variance < threshold,
            variance,
        }
    }
}

/// Decodes `path` and scores it against `threshold`.
pub fn evaluate(path: &Path, threshold: f64) -> AuditResult<Sharpness> {
    let image = decode(path)?;
    evaluate_image(&image, threshold).ok_or_else(|| AuditError::ImageDecode {
        path: path.to_path_buf(),
        reason: "image has no pixels".to_string(),
    })
}

/// Scores an already decoded image. `None` for an image with no pixels.
pub fn evaluate_image(image: &DynamicImage, threshold: f64) -> Option<Sharpness> {
    laplacian_variance(image).map(|variance| Sharpness::classify(variance, threshold))
}

pub fn laplacian_variance(image: &DynamicImage) -> Option<f64> {
    let luma = image.to_luma8();
    if luma.width() == 0 || luma.height() == 0 {
        return None;
    }

    let (width, height) = luma.dimensions();
    // Keep the 0..255 scale so scores line up with the usual OpenCV thresholds.
    let padded: GrayF32 = ImageBuffer::from_fn(width + 2, height + 2, |x, y| {
        let source_x = reflect_101(i64::from(x) - 1, width);
        let source_y = reflect_101(i64::from(y) - 1, height);
        Luma([f32::from(luma.get_pixel(source_x, source_y)[0])])
    });
    let response: GrayF32 = filter3x3(&padded, &LAPLACIAN_KERNEL);

    // The outer ring of `response` saw filter3x3's own clamped border; drop it.
    let interior = (1..=height)
        .flat_map(|y| (1..=width).map(move |x| (x, y)))
        .map(|(x, y)| response.get_pixel(x, y)[0])
        .collect::<Vec<f32>>();
    Some(variance(&interior))
}

/// Maps a coordinate in `-1..=len` back into `0..len`, mirroring at the edge.
fn reflect_101(index: i64, len: u32) -> u32 {
    let len = i64::from(len);
    if len == 1 {
        return 0;
    }
    let mirrored = if index < 0 {
        -index
    } else if index >= len {
        2 * len - 2 - index
    } else {
        index
    };
    mirrored as u32
}

fn decode(path: &Path) -> AuditResult<DynamicImage> {
    let decode_error = |reason: String| AuditError::ImageDecode {
        path: path.to_path_buf(),
        reason,
    };
    let reader = ImageReader::open(path)
        .map_err(|err| decode_error(err.to_string()))?
        .with_guessed_format()
        .map_err(|err| decode_error(err.to_string()))?;
    reader.decode().map_err(|err| decode_error(err.to_string()))
}

fn variance(values: &[f32]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().map(|v| f64::from(*v)).sum::<f64>() / n;
    values
        .iter()
        .map(|v| {
            let d = f64::from(*v) - mean;
            d * d
        })
        .sum::<f64>()
        / n
}

#[cfg(test)]
mod tests {
    use std::fs;

    use image::{DynamicImage, GrayImage, Luma};
    use tempfile::TempDir;

    use super::{evaluate, evaluate_image, laplacian_variance, reflect_101, Sharpness};
    use crate::error::AuditError;

    fn checkerboard(size: u32) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_fn(size, size, |x, y| {
            if (x + y) % 2 == 0 {
                Luma([255])
            } else {
                Luma([0])
            }
        }))
    }

    fn flat(size: u32) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_pixel(size, size, Luma([128])))
    }

    fn soft_gradient(size: u32) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_fn(size, size, |x, _| Luma([(x * 2) as u8])))
    }

    #[test]
    fn flat_image_has_zero_variance() {
        let variance = laplacian_variance(&flat(16)).expect("variance");
        assert_eq!(variance, 0.0);
    }

    #[test]
    fn borders_are_mirrored_like_opencv() {
        let mut corner = GrayImage::new(4, 4);
        corner.put_pixel(0, 0, Luma([200]));
        let variance = laplacian_variance(&DynamicImage::ImageLuma8(corner)).expect("variance");
        assert!((variance - 44_375.0).abs() < 1e-6, "got {variance}");

        let column = GrayImage::from_fn(1, 3, |_, y| Luma([if y == 1 { 100 } else { 0 }]));
        let variance = laplacian_variance(&DynamicImage::ImageLuma8(column)).expect("variance");
        assert!((variance - 320_000.0 / 9.0).abs() < 1e-6, "got {variance}");
    }

    #[test]
    fn reflect_101_skips_the_edge_pixel() {
        assert_eq!(reflect_101(-1, 4), 1);
        assert_eq!(reflect_101(0, 4), 0);
        assert_eq!(reflect_101(4, 4), 2);
        assert_eq!(reflect_101(-1, 1), 0);
        assert_eq!(reflect_101(1, 1), 0);
    }

    #[test]
    fn checkerboard_is_sharp_and_gradient_is_blurry() {
        let sharp = evaluate_image(&checkerboard(32), 100.0).expect("sharp");
        assert!(!sharp.is_blurry);
        assert!(sharp.variance > 100_000.0);

        let soft = evaluate_image(&soft_gradient(32), 100.0).expect("soft");
        assert!(soft.is_blurry);
    }

    #[test]
    fn classification_is_strictly_below_threshold() {
        assert!(Sharpness::classify(99.99, 100.0).is_blurry);
        assert!(!Sharpness::classify(100.0, 100.0).is_blurry);
        assert!(!Sharpness::classify(250.0, 100.0).is_blurry);
        for threshold in [0.0, 1.0, 50.0, 1e9] {
            let result = evaluate_image(&checkerboard(8), threshold).expect("score");
            assert_eq!(result.is_blurry, result.variance < threshold);
        }
    }

    #[test]
    fn evaluate_is_deterministic_for_identical_bytes() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("board.png");
        checkerboard(24).save(&path).expect("save png");

        let first = evaluate(&path, 100.0).expect("first");
        let second = evaluate(&path, 100.0).expect("second");
        assert_eq!(first, second);
    }

    #[test]
    fn decodes_by_content_not_extension() {
        let temp = TempDir::new().expect("tempdir");
        let png = temp.path().join("board.png");
        checkerboard(24).save(&png).expect("save png");
        let mislabelled = temp.path().join("board.jpg");
        fs::copy(&png, &mislabelled).expect("copy");

        let result = evaluate(&mislabelled, 100.0).expect("guessed format decodes");
        assert!(!result.is_blurry);
    }

    #[test]
    fn corrupt_file_is_an_image_decode_error() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("c.jpg");
        fs::write(&path, b"definitely not a jpeg").expect("write");

        let err = evaluate(&path, 100.0).expect_err("corrupt file must fail");
        assert!(matches!(err, AuditError::ImageDecode { .. }));
        assert!(err.to_string().contains("c.jpg"));
    }

    #[test]
    fn missing_file_is_an_image_decode_error() {
        let temp = TempDir::new().expect("tempdir");
        let err = evaluate(&temp.path().join("gone.png"), 100.0).expect_err("missing");
        assert!(matches!(err, AuditError::ImageDecode { .. }));
    }
}
