// Document-level navigation aids and language
use shared_pdf::PdfDocument;

pub const NO_OUTLINE: &str = "No bookmarks/outline found; navigation aid missing.";
pub const NOT_MARKED: &str = "Document not marked as tagged (MarkInfo missing or false).";
pub const NO_LANGUAGE: &str = "No document language set (/Lang missing).";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavigationFindings {
    pub navigation: Vec<String>,
    pub language: Vec<String>,
}

pub fn check_navigation(doc: &PdfDocument) -> NavigationFindings {
    let mut findings = NavigationFindings::default();

    if !doc.has_outline() {
        findings.navigation.push(NO_OUTLINE.to_string());
    }
    if !doc.is_marked() {
        findings.navigation.push(NOT_MARKED.to_string());
    }
    if doc.language().map_or(true, |lang| lang.trim().is_empty()) {
        findings.language.push(NO_LANGUAGE.to_string());
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_pdf::Page;

    #[test]
    fn test_bare_document() {
        let findings = check_navigation(&PdfDocument::new(vec![Page::new(1)]));
        assert_eq!(
            findings.navigation,
            vec![NO_OUTLINE.to_string(), NOT_MARKED.to_string()]
        );
        assert_eq!(findings.language, vec![NO_LANGUAGE.to_string()]);
    }

    #[test]
    fn test_complete_document() {
        let doc = PdfDocument::new(vec![Page::new(1)])
            .with_outline(true)
            .with_marked(true)
            .with_language("en-US");
        assert_eq!(check_navigation(&doc), NavigationFindings::default());
    }

    #[test]
    fn test_blank_language_counts_as_missing() {
        let doc = PdfDocument::new(vec![]).with_language(" ");
        assert_eq!(check_navigation(&doc).language, vec![NO_LANGUAGE.to_string()]);
    }
}
