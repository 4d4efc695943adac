pub mod color;
pub mod config;
pub mod context;
pub mod contrast;
pub mod error;
pub mod grammar;
pub mod merge;
pub mod report;
pub mod rules;
pub mod sharpness;

pub use config::AuditConfig;
pub use context::AuditContext;
pub use contrast::{ContrastIssue, NO_CONTRAST_ISSUES};
pub use error::{AuditError, GrammarError};
pub use grammar::{DisabledGrammar, GrammarChecker, GrammarMatch};
pub use merge::{apply_contrast, merge_contrast_section};
pub use report::render_report;

use chrono::Utc;
use shared_pdf::PdfDocument;
use shared_types::{AccessibilityReport, GeneralCategory, PageCategory};
use tracing::{debug, info};

/// AccessibilityEngine entry point
pub struct AccessibilityEngine {
    config: AuditConfig,
}

impl AccessibilityEngine {
    pub fn new() -> Self {
        Self::with_config(AuditConfig::default())
    }

    pub fn with_config(config: AuditConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    /// Parse and audit raw PDF bytes. Only an unreadable document fails.
    pub fn audit_bytes(
        &self,
        bytes: &[u8],
        source_name: &str,
        grammar: &dyn GrammarChecker,
    ) -> Result<AccessibilityReport, AuditError> {
        let document = PdfDocument::from_bytes(bytes)?;
        Ok(self.audit(&document, source_name, grammar))
    }

    /// Run every structural check. Contrast is a separate pass, see
    /// [`AccessibilityEngine::check_contrast`].
    pub fn audit(
        &self,
        document: &PdfDocument,
        source_name: &str,
        grammar: &dyn GrammarChecker,
    ) -> AccessibilityReport {
        let mut ctx = AuditContext::new(source_name, document.page_count(), Utc::now());

        // Whole-document checks, recorded on every page
        let grammar_findings = grammar::check_grammar(
            grammar,
            &document.full_text(),
            &self.config.grammar_language,
        );
        debug!("Grammar: {} findings", grammar_findings.len());
        ctx.broadcast(PageCategory::Grammar, &grammar_findings);

        let tagging = rules::structure::check_structure_tree(document.structure_tree());
        debug!("Tagging: {} findings", tagging.len());
        ctx.broadcast(PageCategory::Tagging, &tagging);

        let reading_order =
            rules::reading_order::check_reading_order(document, self.config.reading_order_tolerance);
        ctx.broadcast(PageCategory::ReadingOrder, &reading_order);

        let form_fields = rules::forms::check_form_fields(document.form_fields());
        ctx.broadcast(PageCategory::FormFields, &form_fields);

        for page in document.pages() {
            let images = rules::images::check_page_images(page, self.config.blur_threshold);
            ctx.record(page.number, PageCategory::AltText, images.alt_text);
            ctx.record(page.number, PageCategory::ImageQuality, images.image_quality);
        }

        let navigation = rules::navigation::check_navigation(document);
        ctx.record_general(GeneralCategory::Navigation, navigation.navigation);
        ctx.record_general(GeneralCategory::Language, navigation.language);
        ctx.record_general(
            GeneralCategory::PageNumbers,
            rules::page_numbers::check_page_numbers(document),
        );

        let report = ctx.finish();
        info!(
            "Audited {} ({} pages): {} findings",
            source_name,
            report.page_count(),
            report.issue_count()
        );
        report
    }

    /// Contrast findings as text, with the clean sentinel when none
    pub fn check_contrast(&self, document: &PdfDocument) -> Vec<String> {
        contrast::check_contrast(document, &self.config)
    }

    pub fn find_contrast_issues(&self, document: &PdfDocument) -> Vec<ContrastIssue> {
        contrast::find_contrast_issues(document, &self.config)
    }

    pub fn render(&self, report: &AccessibilityReport) -> String {
        report::render_report(report, self.config.grammar_display_limit)
    }
}

impl Default for AccessibilityEngine {
    fn default() -> Self {
        Self::new()
    }
}
