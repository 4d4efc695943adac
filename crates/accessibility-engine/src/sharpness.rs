//! Image sharpness scoring via Laplacian variance
//!
//! The image is converted to grayscale and convolved with the 4-neighbour
//! Laplacian kernel `[0 1 0; 1 -4 1; 0 1 0]`. Borders are handled by
//! reflection (without repeating the edge pixel) so every pixel contributes.
//! A low variance of the response means few sharp edges.

use image::{DynamicImage, GrayImage, RgbImage};
use serde::Serialize;
use shared_pdf::{ImageData, RawColor};

use crate::error::AuditError;

pub const DEFAULT_BLUR_THRESHOLD: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SharpnessResult {
    pub is_blurry: bool,
    pub score: f64,
    /// Set when the raster could not be decoded; the result is then
    /// `is_blurry == false, score == 0.0`
    pub decode_error: Option<String>,
}

impl SharpnessResult {
    fn undecodable(reason: String) -> Self {
        Self {
            is_blurry: false,
            score: 0.0,
            decode_error: Some(reason),
        }
    }
}

/// Score an image. Never fails: a raster that cannot be decoded yields a
/// non-blurry result carrying the decode error.
pub fn assess(data: &ImageData, threshold: f64) -> SharpnessResult {
    match decode_raster(data) {
        Ok(image) => score_image(&image, threshold),
        Err(e) => SharpnessResult::undecodable(e.to_string()),
    }
}

pub fn score_image(image: &DynamicImage, threshold: f64) -> SharpnessResult {
    let score = laplacian_variance(&image.to_luma8());
    SharpnessResult {
        is_blurry: score < threshold,
        score,
        decode_error: None,
    }
}

/// Turn the adapter's pixel source into a decoded image
pub fn decode_raster(data: &ImageData) -> Result<DynamicImage, AuditError> {
    match data {
        ImageData::Encoded(bytes) => {
            image::load_from_memory(bytes).map_err(|e| AuditError::ImageDecode(e.to_string()))
        }
        ImageData::Raw {
            width,
            height,
            color,
            samples,
        } => {
            let pixels = *width as usize * *height as usize;
            let needed = pixels * color.channels();
            let samples = samples
                .get(..needed)
                .ok_or_else(|| AuditError::ImageDecode("sample buffer too short".into()))?;
            let image = match color {
                RawColor::Gray => GrayImage::from_raw(*width, *height, samples.to_vec())
                    .map(DynamicImage::ImageLuma8),
                RawColor::Rgb => RgbImage::from_raw(*width, *height, samples.to_vec())
                    .map(DynamicImage::ImageRgb8),
                RawColor::Cmyk => {
                    RgbImage::from_raw(*width, *height, cmyk_to_rgb(samples)).map(DynamicImage::ImageRgb8)
                }
            };
            image.ok_or_else(|| AuditError::ImageDecode("buffer does not match dimensions".into()))
        }
        ImageData::Unsupported(reason) => Err(AuditError::ImageDecode(reason.clone())),
        ImageData::Missing => Err(AuditError::ImageDecode("no image data".into())),
    }
}

fn cmyk_to_rgb(samples: &[u8]) -> Vec<u8> {
    samples
        .chunks_exact(4)
        .flat_map(|px| {
            let k = 255 - px[3] as u16;
            let channel = |c: u8| ((255 - c as u16) * k / 255) as u8;
            [channel(px[0]), channel(px[1]), channel(px[2])]
        })
        .collect()
}

/// Variance of the Laplacian response over all pixels
pub fn laplacian_variance(gray: &GrayImage) -> f64 {
    let (w, h) = gray.dimensions();
    let count = w as usize * h as usize;
    if count == 0 {
        return 0.0;
    }

    let px = |x: i64, y: i64| -> f64 {
        let x = reflect(x, w as i64);
        let y = reflect(y, h as i64);
        gray.get_pixel(x, y).0[0] as f64
    };

    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    for y in 0..h as i64 {
        for x in 0..w as i64 {
            let response =
                px(x, y - 1) + px(x, y + 1) + px(x - 1, y) + px(x + 1, y) - 4.0 * px(x, y);
            sum += response;
            sum_sq += response * response;
        }
    }

    let mean = sum / count as f64;
    (sum_sq / count as f64 - mean * mean).max(0.0)
}

/// Reflect an out-of-range index back into `0..len` without repeating the
/// edge sample (`-1 -> 1`, `len -> len - 2`)
fn reflect(i: i64, len: i64) -> u32 {
    if len == 1 {
        return 0;
    }
    let period = 2 * (len - 1);
    let mut i = i.rem_euclid(period);
    if i >= len {
        i = period - i;
    }
    i as u32
}
