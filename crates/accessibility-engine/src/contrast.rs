//! Text color contrast against a white page background
//!
//! Every non-blank text span is measured. Runs that fall below the WCAG AA
//! minimum for their size class become a [`ContrastIssue`]. The text form of
//! an issue always starts with `Page N:` so it can be spliced into an
//! already rendered report later (see [`crate::merge`]).

use std::fmt;

use serde::Serialize;
use shared_pdf::{PdfDocument, TextSpan};
use tracing::debug;

use crate::color::{contrast_ratio, rgb_from_packed_int, Rgb};
use crate::config::AuditConfig;

/// Returned instead of an empty list when a checked document is clean
pub const NO_CONTRAST_ISSUES: &str = "No color contrast issues found.";

const ISSUE_PREVIEW_CHARS: usize = 30;
const HTML_PREVIEW_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSize {
    Normal,
    Large,
}

impl TextSize {
    pub fn classify(span: &TextSpan, config: &AuditConfig) -> Self {
        if span.font_size >= config.large_text_size
            || (span.font_size >= config.large_bold_text_size && span.bold)
        {
            TextSize::Large
        } else {
            TextSize::Normal
        }
    }

    pub fn min_ratio(&self, config: &AuditConfig) -> f64 {
        match self {
            TextSize::Normal => config.normal_text_min_ratio,
            TextSize::Large => config.large_text_min_ratio,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TextSize::Normal => "normal",
            TextSize::Large => "large",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContrastIssue {
    pub page: u32,
    /// Trimmed span text
    pub text: String,
    pub ratio: f64,
    pub required: f64,
    pub size: TextSize,
    pub color: Rgb,
    pub font_size: f64,
}

impl fmt::Display for ContrastIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Page {}: Text '{}' has low contrast ratio {:.2}:1 (needs {:.1}:1 for {} text, color: {}, size: {:.1}pt)",
            self.page,
            preview(&self.text, ISSUE_PREVIEW_CHARS),
            self.ratio,
            self.required,
            self.size.as_str(),
            self.color.to_hex(),
            self.font_size
        )
    }
}

/// First `max` characters, with `...` appended when anything was cut
pub fn preview(text: &str, max: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

/// Measure one span; `None` for blank text or sufficient contrast
pub fn check_span(page: u32, span: &TextSpan, config: &AuditConfig) -> Option<ContrastIssue> {
    let text = span.text.trim();
    if text.is_empty() {
        return None;
    }

    let color = rgb_from_packed_int(span.color);
    let ratio = contrast_ratio(color, Rgb::WHITE);
    let size = TextSize::classify(span, config);
    let required = size.min_ratio(config);

    (ratio < required).then(|| ContrastIssue {
        page,
        text: text.to_string(),
        ratio,
        required,
        size,
        color,
        font_size: span.font_size,
    })
}

/// Every low-contrast span, in page then content order
pub fn find_contrast_issues(doc: &PdfDocument, config: &AuditConfig) -> Vec<ContrastIssue> {
    let issues: Vec<ContrastIssue> = doc
        .pages()
        .iter()
        .flat_map(|page| {
            page.spans
                .iter()
                .filter_map(move |span| check_span(page.number, span, config))
        })
        .collect();
    debug!("Contrast check found {} low-contrast spans", issues.len());
    issues
}

/// Text findings, or the single clean sentinel
pub fn contrast_messages(issues: &[ContrastIssue]) -> Vec<String> {
    if issues.is_empty() {
        return vec![NO_CONTRAST_ISSUES.to_string()];
    }
    issues.iter().map(ToString::to_string).collect()
}

pub fn check_contrast(doc: &PdfDocument, config: &AuditConfig) -> Vec<String> {
    contrast_messages(&find_contrast_issues(doc, config))
}

/// Standalone HTML contrast report with a colored preview of each run
pub fn render_contrast_html(source_name: &str, issues: &[ContrastIssue]) -> String {
    let mut html = vec![
        "<html><head><title>Color Contrast Report</title>".to_string(),
        "<style>body { font-family: Arial, sans-serif; margin: 20px; }".to_string(),
        ".issue { background-color: #fff3f3; padding: 10px; margin: 5px; border-left: 4px solid #ff6b6b; }".to_string(),
        ".good { background-color: #f3fff3; padding: 10px; margin: 5px; border-left: 4px solid #6bff6b; }".to_string(),
        "</style></head><body>".to_string(),
        format!("<h2>Color Contrast Report for {}</h2>", escape_html(source_name)),
    ];

    for issue in issues {
        let hex = issue.color.to_hex();
        html.push(r#"<div class="issue">"#.to_string());
        html.push(format!("<strong>Page {}:</strong> Low contrast text", issue.page));
        html.push(
            r#"<div style="margin: 5px 0; padding: 5px; background-color: white;">"#.to_string(),
        );
        html.push(format!(
            r#"<span style="color: {}; font-size: {:.1}pt; background-color: white; padding: 2px 5px; border: 1px solid #ccc;">"#,
            hex, issue.font_size
        ));
        html.push(format!(
            "Preview: {}",
            escape_html(&preview(&issue.text, HTML_PREVIEW_CHARS))
        ));
        html.push("</span>".to_string());
        html.push("</div>".to_string());
        html.push(format!(
            "Contrast ratio: {:.2}:1 (needs {:.1}:1 for {} text)",
            issue.ratio,
            issue.required,
            issue.size.as_str()
        ));
        html.push("</div>".to_string());
    }

    if issues.is_empty() {
        html.push(format!(r#"<div class="good">{}</div>"#, NO_CONTRAST_ISSUES));
    }

    html.push("</body></html>".to_string());
    html.join("\n")
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use shared_pdf::Page;

    fn doc(spans: Vec<TextSpan>) -> PdfDocument {
        let page = spans.into_iter().fold(Page::new(1), Page::with_span);
        PdfDocument::new(vec![page])
    }

    #[test]
    fn test_clean_document_returns_sentinel() {
        let doc = doc(vec![TextSpan::new("Black text", 12.0)]);
        assert_eq!(
            check_contrast(&doc, &AuditConfig::default()),
            vec![NO_CONTRAST_ISSUES.to_string()]
        );
    }

    #[test]
    fn test_light_gray_normal_text() {
        let doc = doc(vec![TextSpan::new("Faint footnote", 10.0).with_color(0xAAAAAA)]);
        let issues = find_contrast_issues(&doc, &AuditConfig::default());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].size, TextSize::Normal);
        assert_eq!(
            issues[0].to_string(),
            "Page 1: Text 'Faint footnote' has low contrast ratio 2.32:1 (needs 4.5:1 for normal text, color: #aaaaaa, size: 10.0pt)"
        );
    }

    #[test]
    fn test_size_classes() {
        let config = AuditConfig::default();
        assert_eq!(TextSize::classify(&TextSpan::new("x", 18.0), &config), TextSize::Large);
        assert_eq!(TextSize::classify(&TextSpan::new("x", 14.0), &config), TextSize::Normal);
        assert_eq!(
            TextSize::classify(&TextSpan::new("x", 14.0).with_bold(true), &config),
            TextSize::Large
        );
        assert_eq!(
            TextSize::classify(&TextSpan::new("x", 12.0).with_bold(true), &config),
            TextSize::Normal
        );
    }

    #[test]
    fn test_large_text_has_lower_bar() {
        // #888888 is about 3.54:1 on white
        let doc = doc(vec![
            TextSpan::new("Heading", 20.0).with_color(0x888888),
            TextSpan::new("Body", 11.0).with_color(0x888888),
        ]);
        let issues = find_contrast_issues(&doc, &AuditConfig::default());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].text, "Body");
    }

    #[test]
    fn test_blank_spans_ignored() {
        let doc = doc(vec![TextSpan::new("   ", 10.0).with_color(0xEEEEEE)]);
        assert!(find_contrast_issues(&doc, &AuditConfig::default()).is_empty());
    }

    #[test]
    fn test_preview_truncation() {
        assert_eq!(preview("short", 30), "short");
        assert_eq!(preview(&"a".repeat(30), 30), "a".repeat(30));
        assert_eq!(preview(&"a".repeat(31), 30), format!("{}...", "a".repeat(30)));
        assert_eq!(preview("ééééé", 3), "ééé...");
    }

    #[test]
    fn test_html_report() {
        let doc = doc(vec![TextSpan::new("<b>pale</b>", 10.0).with_color(0xCCCCCC)]);
        let issues = find_contrast_issues(&doc, &AuditConfig::default());
        let html = render_contrast_html("input.pdf", &issues);
        assert!(html.contains("<h2>Color Contrast Report for input.pdf</h2>"));
        assert!(html.contains("Preview: &lt;b&gt;pale&lt;/b&gt;"));
        assert!(html.contains("color: #cccccc"));
        assert!(!html.contains(r#"class="good""#));

        let clean = render_contrast_html("input.pdf", &[]);
        assert!(clean.contains(NO_CONTRAST_ISSUES));
    }
}
