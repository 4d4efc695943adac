//! Text rendering of an [`AccessibilityReport`]
//!
//! The layout is fixed: overview, one section per page with seven numbered
//! subsections, document-level findings, general recommendations and a
//! conclusion. Rendering is a pure function of the report data.

use std::borrow::Cow;
use std::fmt::Write;

use shared_types::{AccessibilityReport, GeneralCategory, PageCategory, PageReport};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

struct Subsection {
    title: &'static str,
    clean: &'static str,
    recommendation: &'static str,
}

fn subsection(category: PageCategory) -> Subsection {
    let (title, clean, recommendation) = match category {
        PageCategory::Tagging => (
            "1. Proper Tagging Structure",
            "No tagging issues detected.",
            "Implement a proper tagging structure with semantic elements.",
        ),
        PageCategory::ReadingOrder => (
            "2. Logical Reading Order",
            "Reading order appears correct.",
            "Establish a logical reading order that follows natural document flow.",
        ),
        PageCategory::AltText => (
            "3. Alt Text for Images",
            "No images or all images have proper alt text.",
            "Provide descriptive alt text for all images.",
        ),
        PageCategory::ImageQuality => (
            "4. Image Quality and Clarity",
            "No image quality issues detected.",
            "Replace blurry images with higher quality versions for better readability.",
        ),
        PageCategory::Contrast => (
            "5. Color Contrast and Font Legibility",
            "No contrast issues detected.",
            "Ensure text contrast meets WCAG standards (4.5:1 for normal text, 3:1 for large text).",
        ),
        PageCategory::FormFields => (
            "6. Form Field Labeling and Navigation",
            "No form fields or all form fields properly labeled.",
            "Label form fields clearly and ensure keyboard accessibility.",
        ),
        PageCategory::Grammar => (
            "7. Grammar and Spelling Checks",
            "No grammatical issues detected.",
            "Use grammar tools to correct language errors.",
        ),
    };
    Subsection {
        title,
        clean,
        recommendation,
    }
}

/// `#### N. Title` line, including the trailing newline
pub fn subsection_header(category: PageCategory) -> String {
    format!("#### {}\n", subsection(category).title)
}

/// `### Page N` header, including the blank line after it
pub fn page_header(page: u32) -> String {
    format!("### Page {}\n\n", page)
}

/// Findings can quote document text; keep each one on a single line so the
/// only lines starting with `#` are headers
fn one_line(issue: &str) -> Cow<'_, str> {
    if issue.contains(['\n', '\r']) {
        Cow::Owned(issue.replace(['\n', '\r'], " "))
    } else {
        Cow::Borrowed(issue)
    }
}

fn join_issues(issues: &[String]) -> String {
    issues
        .iter()
        .map(|issue| one_line(issue))
        .collect::<Vec<_>>()
        .join("; ")
}

/// One subsection: issues joined with `; ` (at most `limit` of them), or
/// the category's clean placeholder
pub fn render_subsection(category: PageCategory, issues: &[String], limit: Option<usize>) -> String {
    let meta = subsection(category);
    let shown = match limit {
        Some(limit) => &issues[..issues.len().min(limit)],
        None => issues,
    };

    if shown.is_empty() {
        format!(
            "#### {}\n- **Issues Detected**: {}\n- **Recommendation**: N/A\n\n",
            meta.title, meta.clean
        )
    } else {
        format!(
            "#### {}\n- **Issues Detected**: {}\n- **Recommendation**: {}\n\n",
            meta.title,
            join_issues(shown),
            meta.recommendation
        )
    }
}

fn render_page(out: &mut String, number: u32, page: &PageReport, grammar_limit: usize) {
    out.push_str(&page_header(number));
    for category in PageCategory::ALL {
        let limit = (category == PageCategory::Grammar).then_some(grammar_limit);
        out.push_str(&render_subsection(category, page.issues(category), limit));
    }
}

fn render_general(out: &mut String, report: &AccessibilityReport) {
    out.push_str("## Document-Level Findings\n\n");
    for category in GeneralCategory::ALL {
        let (title, clean) = match category {
            GeneralCategory::Navigation => ("Navigation", "No navigation issues detected."),
            GeneralCategory::PageNumbers => ("Page Numbers", "Page numbering appears sequential."),
            GeneralCategory::Language => ("Language", "Document language is set."),
        };
        let issues = report.general.issues(category);
        let detected = if issues.is_empty() {
            clean.to_string()
        } else {
            join_issues(issues)
        };
        let _ = writeln!(out, "#### {}\n- **Issues Detected**: {}\n", title, detected);
    }
}

/// Render the full text report. `grammar_limit` caps the grammar findings
/// shown per page.
pub fn render_report(report: &AccessibilityReport, grammar_limit: usize) -> String {
    let mut out = String::new();

    out.push_str("# Accessibility Compliance Report\n\n");
    out.push_str("## Document Overview\n");
    let _ = write!(
        out,
        "This report evaluates the accessibility compliance of a {}-page PDF document ",
        report.page_count()
    );
    out.push_str("based on WCAG and PDF/UA standards. The document is assessed for navigability, ");
    out.push_str(
        "understandability, and usability by all users, including those using assistive technologies.\n\n",
    );
    if !report.source_name.is_empty() {
        let _ = writeln!(out, "Source document: {}\n", report.source_name);
    }
    let _ = writeln!(
        out,
        "Report generated on: {}\n",
        report.generated_at.format(TIMESTAMP_FORMAT)
    );

    out.push_str("## Page-by-Page Analysis\n\n");
    for (number, page) in report.pages() {
        render_page(&mut out, number, page, grammar_limit);
    }

    render_general(&mut out, report);

    out.push_str("## General Recommendations\n\n");
    out.push_str("- **Semantic Structure**: Implement comprehensive tagging throughout the document\n");
    out.push_str("- **Reading Order**: Define logical reading order for all pages\n");
    out.push_str("- **Alt Text**: Ensure descriptive alt text for all images\n");
    out.push_str("- **Image Quality**: Replace blurry or low-quality images\n");
    out.push_str("- **Grammar**: Use grammar tools to correct language errors\n");
    out.push_str("- **Navigation**: Add bookmarks and proper document structure\n");
    out.push_str("- **Page Numbers**: Implement sequential page numbering\n");
    out.push_str("- **Language**: Set document language property\n\n");

    out.push_str("## Conclusion\n");
    if report.issue_count() == 0 {
        out.push_str("No accessibility issues were detected by the automated checks. ");
        out.push_str("A manual review with assistive technologies is still recommended.\n");
    } else {
        out.push_str("The document requires improvements to meet accessibility standards. ");
        out.push_str(
            "Implementing the recommended changes will enhance usability and accessibility for all users.\n",
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn report(pages: u32) -> AccessibilityReport {
        let at = Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
        AccessibilityReport::new("sample.pdf", pages, at)
    }

    #[test]
    fn test_clean_subsection() {
        assert_eq!(
            render_subsection(PageCategory::Contrast, &[], None),
            "#### 5. Color Contrast and Font Legibility\n- **Issues Detected**: No contrast issues detected.\n- **Recommendation**: N/A\n\n"
        );
    }

    #[test]
    fn test_subsection_with_issues() {
        let issues = vec!["a".to_string(), "b".to_string()];
        assert_eq!(
            render_subsection(PageCategory::AltText, &issues, None),
            "#### 3. Alt Text for Images\n- **Issues Detected**: a; b\n- **Recommendation**: Provide descriptive alt text for all images.\n\n"
        );
    }

    #[test]
    fn test_multiline_findings_stay_on_one_line() {
        let issues = vec!["Text 'line one\n#### 6. Fake\r\nline two'".to_string()];
        let rendered = render_subsection(PageCategory::Contrast, &issues, None);
        assert_eq!(
            rendered,
            "#### 5. Color Contrast and Font Legibility\n- **Issues Detected**: Text 'line one #### 6. Fake  line two'\n- **Recommendation**: Ensure text contrast meets WCAG standards (4.5:1 for normal text, 3:1 for large text).\n\n"
        );
        assert_eq!(rendered.lines().filter(|l| l.starts_with('#')).count(), 1);
    }

    #[test]
    fn test_grammar_is_capped() {
        let mut report = report(1);
        let findings: Vec<String> = (1..=5).map(|i| format!("g{}", i)).collect();
        report.broadcast(PageCategory::Grammar, &findings);
        let text = render_report(&report, 3);
        assert!(text.contains("- **Issues Detected**: g1; g2; g3\n"));
        assert!(!text.contains("g4"));
    }

    #[test]
    fn test_layout_order() {
        let text = render_report(&report(2), 3);
        let markers = [
            "# Accessibility Compliance Report",
            "## Document Overview",
            "a 2-page PDF document",
            "Report generated on: 2024-03-05 14:07:09",
            "## Page-by-Page Analysis",
            "### Page 1\n\n#### 1. Proper Tagging Structure",
            "#### 7. Grammar and Spelling Checks",
            "### Page 2\n\n",
            "## Document-Level Findings",
            "## General Recommendations",
            "## Conclusion",
        ];
        let mut from = 0;
        for marker in markers {
            let at = text[from..]
                .find(marker)
                .unwrap_or_else(|| panic!("missing or out of order: {}", marker));
            from += at + marker.len();
        }
        assert!(text.contains("No accessibility issues were detected"));
    }

    #[test]
    fn test_general_findings_rendered() {
        let mut report = report(1);
        report
            .general
            .push(GeneralCategory::Language, "No document language set (/Lang missing).");
        let text = render_report(&report, 3);
        assert!(text.contains(
            "#### Language\n- **Issues Detected**: No document language set (/Lang missing).\n"
        ));
        assert!(text.contains("The document requires improvements"));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let mut report = report(3);
        report.broadcast(PageCategory::Tagging, &["x".to_string()]);
        assert_eq!(render_report(&report, 3), render_report(&report, 3));
    }
}
