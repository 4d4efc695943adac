//! Aggregation context for one audit run

use chrono::{DateTime, Utc};
use shared_types::{AccessibilityReport, GeneralCategory, PageCategory};
use tracing::debug;

/// Collects findings from every check into a fully initialised report.
///
/// Each run owns its own context; nothing is shared between audits.
#[derive(Debug)]
pub struct AuditContext {
    report: AccessibilityReport,
}

impl AuditContext {
    pub fn new(source_name: impl Into<String>, page_count: u32, generated_at: DateTime<Utc>) -> Self {
        Self {
            report: AccessibilityReport::new(source_name, page_count, generated_at),
        }
    }

    pub fn page_count(&self) -> u32 {
        self.report.page_count()
    }

    /// Findings for one page; unknown page numbers are dropped
    pub fn record(&mut self, page: u32, category: PageCategory, findings: Vec<String>) {
        if findings.is_empty() {
            return;
        }
        match self.report.page_mut(page) {
            Some(report) => report.extend(category, findings),
            None => debug!("Dropping {} findings for unknown page {}", category.as_str(), page),
        }
    }

    /// The same findings on every page
    pub fn broadcast(&mut self, category: PageCategory, findings: &[String]) {
        self.report.broadcast(category, findings);
    }

    pub fn record_general(&mut self, category: GeneralCategory, findings: Vec<String>) {
        self.report.general.extend(category, findings);
    }

    pub fn finish(self) -> AccessibilityReport {
        self.report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(pages: u32) -> AuditContext {
        AuditContext::new("ctx.pdf", pages, Utc::now())
    }

    #[test]
    fn test_every_page_has_every_category() {
        let report = context(4).finish();
        assert_eq!(report.page_count(), 4);
        for (_, page) in report.pages() {
            for category in PageCategory::ALL {
                assert!(page.issues(category).is_empty());
            }
        }
    }

    #[test]
    fn test_record_and_broadcast() {
        let mut ctx = context(2);
        ctx.record(2, PageCategory::AltText, vec!["missing".into()]);
        ctx.record(5, PageCategory::AltText, vec!["ghost".into()]);
        ctx.broadcast(PageCategory::Tagging, &["untagged".to_string()]);
        ctx.record_general(GeneralCategory::Language, vec!["no lang".into()]);
        let report = ctx.finish();

        assert!(report.page(1).unwrap().issues(PageCategory::AltText).is_empty());
        assert_eq!(report.page(2).unwrap().issues(PageCategory::AltText), &["missing"]);
        for (_, page) in report.pages() {
            assert_eq!(page.issues(PageCategory::Tagging), &["untagged"]);
        }
        assert_eq!(report.general.issues(GeneralCategory::Language), &["no lang"]);
        assert_eq!(report.issue_count(), 4);
    }
}
