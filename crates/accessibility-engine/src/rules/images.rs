// Per-image checks: alt text presence and sharpness
use shared_pdf::Page;
use tracing::warn;

use crate::sharpness;

/// Findings for one page's images
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageFindings {
    pub alt_text: Vec<String>,
    pub image_quality: Vec<String>,
}

/// Check every image on a page. An image that cannot be decoded is logged
/// and contributes no quality finding.
pub fn check_page_images(page: &Page, blur_threshold: f64) -> ImageFindings {
    let mut findings = ImageFindings::default();

    for image in &page.images {
        if !image.has_alt {
            findings
                .alt_text
                .push(format!("Image '{}' missing alt text", image.name));
        }

        let result = sharpness::assess(&image.data, blur_threshold);
        if let Some(reason) = &result.decode_error {
            warn!(
                "Page {}: could not assess image '{}': {}",
                page.number, image.name, reason
            );
            continue;
        }
        if result.is_blurry {
            findings.image_quality.push(format!(
                "Image '{}' appears blurry (sharpness score: {:.2})",
                image.name, result.score
            ));
        }
    }

    findings
}
