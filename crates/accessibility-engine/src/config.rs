//! Audit tuning parameters
//!
//! Every field has a default matching WCAG 2.x guidance or the heuristics
//! the checks were calibrated with. A TOML file may override any subset:
//!
//! ```toml
//! blur_threshold = 80.0
//! grammar_language = "en-GB"
//! ```

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Laplacian variance below this marks an image blurry
    pub blur_threshold: f64,
    /// Fraction of tagged entries allowed to diverge from visual order
    pub reading_order_tolerance: f64,
    /// Language code sent to the grammar service
    pub grammar_language: String,
    /// Grammar findings shown per page in the rendered report
    pub grammar_display_limit: usize,
    /// Text at or above this size (pt) is "large"
    pub large_text_size: f64,
    /// Bold text at or above this size (pt) is "large"
    pub large_bold_text_size: f64,
    pub normal_text_min_ratio: f64,
    pub large_text_min_ratio: f64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            blur_threshold: 100.0,
            reading_order_tolerance: 0.3,
            grammar_language: "en-US".to_string(),
            grammar_display_limit: 3,
            large_text_size: 18.0,
            large_bold_text_size: 14.0,
            normal_text_min_ratio: 4.5,
            large_text_min_ratio: 3.0,
        }
    }
}

impl AuditConfig {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the TOML is malformed
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Parse configuration from a TOML string; missing keys keep defaults
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let config: AuditConfig = toml::from_str(s).context("Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if !(0.0..=1.0).contains(&self.reading_order_tolerance) {
            anyhow::bail!(
                "reading_order_tolerance must be between 0 and 1, got {}",
                self.reading_order_tolerance
            );
        }
        if self.blur_threshold < 0.0 {
            anyhow::bail!("blur_threshold must not be negative");
        }
        if self.normal_text_min_ratio < 1.0 || self.large_text_min_ratio < 1.0 {
            anyhow::bail!("contrast ratios must be at least 1.0");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = AuditConfig::from_toml_str("").unwrap();
        assert_eq!(config, AuditConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = AuditConfig::from_toml_str(
            r#"
            blur_threshold = 42.5
            grammar_language = "de-DE"
            "#,
        )
        .unwrap();
        assert_eq!(config.blur_threshold, 42.5);
        assert_eq!(config.grammar_language, "de-DE");
        assert_eq!(config.normal_text_min_ratio, 4.5);
    }

    #[test]
    fn test_rejects_out_of_range_tolerance() {
        let err = AuditConfig::from_toml_str("reading_order_tolerance = 1.5").unwrap_err();
        assert!(err.to_string().contains("reading_order_tolerance"));
    }

    #[test]
    fn test_missing_file_has_context() {
        let err = AuditConfig::from_file("/nonexistent/audit.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
