//! Report data model shared by the audit engine and the server.
//!
//! A report is built once per audit run. Every page `1..=N` owns a
//! [`PageReport`] holding all seven per-page categories, and the document
//! owns a [`GeneralReport`] with the three document-scoped categories. Both
//! are created fully populated (empty lists) so consumers never need to
//! handle a missing key.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Categories tracked for every page, in report render order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageCategory {
    Tagging,
    ReadingOrder,
    AltText,
    ImageQuality,
    Contrast,
    FormFields,
    Grammar,
}

impl PageCategory {
    pub const ALL: [PageCategory; 7] = [
        PageCategory::Tagging,
        PageCategory::ReadingOrder,
        PageCategory::AltText,
        PageCategory::ImageQuality,
        PageCategory::Contrast,
        PageCategory::FormFields,
        PageCategory::Grammar,
    ];

    pub fn as_str(&self) -> &'static str {
        Category::from(*self).as_str()
    }
}

/// Document-scoped categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneralCategory {
    Navigation,
    PageNumbers,
    Language,
}

impl GeneralCategory {
    pub const ALL: [GeneralCategory; 3] = [
        GeneralCategory::Navigation,
        GeneralCategory::PageNumbers,
        GeneralCategory::Language,
    ];

    pub fn as_str(&self) -> &'static str {
        Category::from(*self).as_str()
    }
}

/// Every category an [`Issue`] can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    AltText,
    Tagging,
    ReadingOrder,
    FormFields,
    Grammar,
    Contrast,
    ImageQuality,
    Navigation,
    PageNumbers,
    Language,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::AltText => "alt_text",
            Category::Tagging => "tagging",
            Category::ReadingOrder => "reading_order",
            Category::FormFields => "form_fields",
            Category::Grammar => "grammar",
            Category::Contrast => "contrast",
            Category::ImageQuality => "image_quality",
            Category::Navigation => "navigation",
            Category::PageNumbers => "page_numbers",
            Category::Language => "language",
        }
    }
}

impl From<PageCategory> for Category {
    fn from(category: PageCategory) -> Self {
        match category {
            PageCategory::Tagging => Category::Tagging,
            PageCategory::ReadingOrder => Category::ReadingOrder,
            PageCategory::AltText => Category::AltText,
            PageCategory::ImageQuality => Category::ImageQuality,
            PageCategory::Contrast => Category::Contrast,
            PageCategory::FormFields => Category::FormFields,
            PageCategory::Grammar => Category::Grammar,
        }
    }
}

impl From<GeneralCategory> for Category {
    fn from(category: GeneralCategory) -> Self {
        match category {
            GeneralCategory::Navigation => Category::Navigation,
            GeneralCategory::PageNumbers => Category::PageNumbers,
            GeneralCategory::Language => Category::Language,
        }
    }
}

/// A single finding, flattened out of a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub category: Category,
    /// `None` for document-level findings
    pub page: Option<u32>,
    pub message: String,
}

/// Per-page issue buckets. All seven categories are always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<PageCategory, Vec<String>>",
    into = "BTreeMap<PageCategory, Vec<String>>"
)]
pub struct PageReport {
    buckets: BTreeMap<PageCategory, Vec<String>>,
}

impl PageReport {
    pub fn new() -> Self {
        Self {
            buckets: PageCategory::ALL
                .iter()
                .map(|category| (*category, Vec::new()))
                .collect(),
        }
    }

    pub fn issues(&self, category: PageCategory) -> &[String] {
        self.buckets
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn push(&mut self, category: PageCategory, message: impl Into<String>) {
        self.buckets.entry(category).or_default().push(message.into());
    }

    pub fn extend<I, S>(&mut self, category: PageCategory, messages: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.buckets
            .entry(category)
            .or_default()
            .extend(messages.into_iter().map(Into::into));
    }

    /// Overwrite one category's findings, leaving the others untouched
    pub fn replace(&mut self, category: PageCategory, messages: Vec<String>) {
        self.buckets.insert(category, messages);
    }

    pub fn is_clean(&self) -> bool {
        self.buckets.values().all(Vec::is_empty)
    }

    pub fn issue_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }
}

impl Default for PageReport {
    fn default() -> Self {
        Self::new()
    }
}

impl From<BTreeMap<PageCategory, Vec<String>>> for PageReport {
    fn from(mut buckets: BTreeMap<PageCategory, Vec<String>>) -> Self {
        for category in PageCategory::ALL {
            buckets.entry(category).or_default();
        }
        Self { buckets }
    }
}

impl From<PageReport> for BTreeMap<PageCategory, Vec<String>> {
    fn from(report: PageReport) -> Self {
        report.buckets
    }
}

/// Document-level issue buckets. All three categories are always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<GeneralCategory, Vec<String>>",
    into = "BTreeMap<GeneralCategory, Vec<String>>"
)]
pub struct GeneralReport {
    buckets: BTreeMap<GeneralCategory, Vec<String>>,
}

impl GeneralReport {
    pub fn new() -> Self {
        Self {
            buckets: GeneralCategory::ALL
                .iter()
                .map(|category| (*category, Vec::new()))
                .collect(),
        }
    }

    pub fn issues(&self, category: GeneralCategory) -> &[String] {
        self.buckets
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn push(&mut self, category: GeneralCategory, message: impl Into<String>) {
        self.buckets.entry(category).or_default().push(message.into());
    }

    pub fn extend<I, S>(&mut self, category: GeneralCategory, messages: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.buckets
            .entry(category)
            .or_default()
            .extend(messages.into_iter().map(Into::into));
    }

    pub fn is_clean(&self) -> bool {
        self.buckets.values().all(Vec::is_empty)
    }
}

impl Default for GeneralReport {
    fn default() -> Self {
        Self::new()
    }
}

impl From<BTreeMap<GeneralCategory, Vec<String>>> for GeneralReport {
    fn from(mut buckets: BTreeMap<GeneralCategory, Vec<String>>) -> Self {
        for category in GeneralCategory::ALL {
            buckets.entry(category).or_default();
        }
        Self { buckets }
    }
}

impl From<GeneralReport> for BTreeMap<GeneralCategory, Vec<String>> {
    fn from(report: GeneralReport) -> Self {
        report.buckets
    }
}

/// The complete structured result of one audit run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessibilityReport {
    /// File name of the audited document
    pub source_name: String,
    pub generated_at: DateTime<Utc>,
    /// Index `i` holds page `i + 1`
    pages: Vec<PageReport>,
    pub general: GeneralReport,
}

impl AccessibilityReport {
    pub fn new(source_name: impl Into<String>, page_count: u32, generated_at: DateTime<Utc>) -> Self {
        Self {
            source_name: source_name.into(),
            generated_at,
            pages: (0..page_count).map(|_| PageReport::new()).collect(),
            general: GeneralReport::new(),
        }
    }

    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Page report for a 1-based page number
    pub fn page(&self, page: u32) -> Option<&PageReport> {
        page.checked_sub(1)
            .and_then(|index| self.pages.get(index as usize))
    }

    pub fn page_mut(&mut self, page: u32) -> Option<&mut PageReport> {
        page.checked_sub(1)
            .and_then(|index| self.pages.get_mut(index as usize))
    }

    /// Iterate `(page_number, report)` in page order
    pub fn pages(&self) -> impl Iterator<Item = (u32, &PageReport)> {
        self.pages
            .iter()
            .enumerate()
            .map(|(index, report)| (index as u32 + 1, report))
    }

    /// Append the same findings to one category of every page
    pub fn broadcast(&mut self, category: PageCategory, messages: &[String]) {
        if messages.is_empty() {
            return;
        }
        for page in &mut self.pages {
            page.extend(category, messages.iter().cloned());
        }
    }

    /// All findings flattened: pages in order, then document-level ones
    pub fn issues(&self) -> Vec<Issue> {
        let mut issues = Vec::new();
        for (page_number, page) in self.pages() {
            for category in PageCategory::ALL {
                issues.extend(page.issues(category).iter().map(|message| Issue {
                    category: category.into(),
                    page: Some(page_number),
                    message: message.clone(),
                }));
            }
        }
        for category in GeneralCategory::ALL {
            issues.extend(self.general.issues(category).iter().map(|message| Issue {
                category: category.into(),
                page: None,
                message: message.clone(),
            }));
        }
        issues
    }

    pub fn issue_count(&self) -> usize {
        let general: usize = GeneralCategory::ALL
            .iter()
            .map(|category| self.general.issues(*category).len())
            .sum();
        self.pages.iter().map(PageReport::issue_count).sum::<usize>() + general
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fixed_time() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default()
    }

    #[test]
    fn test_new_report_has_every_page_and_category() {
        let report = AccessibilityReport::new("doc.pdf", 4, fixed_time());
        assert_eq!(report.page_count(), 4);
        for page in 1..=4 {
            let page_report = report.page(page).unwrap();
            for category in PageCategory::ALL {
                assert!(page_report.issues(category).is_empty());
            }
        }
        assert!(report.page(0).is_none());
        assert!(report.page(5).is_none());
    }

    #[test]
    fn test_broadcast_reaches_all_pages() {
        let mut report = AccessibilityReport::new("doc.pdf", 3, fixed_time());
        report.broadcast(PageCategory::Grammar, &["Typo".to_string()]);
        for (_, page) in report.pages() {
            assert_eq!(page.issues(PageCategory::Grammar), ["Typo".to_string()]);
        }
        assert_eq!(report.issue_count(), 3);
    }

    #[test]
    fn test_replace_only_touches_one_category() {
        let mut page = PageReport::new();
        page.push(PageCategory::Tagging, "a");
        page.push(PageCategory::Contrast, "old");
        page.replace(PageCategory::Contrast, vec!["new".to_string()]);
        assert_eq!(page.issues(PageCategory::Tagging), ["a".to_string()]);
        assert_eq!(page.issues(PageCategory::Contrast), ["new".to_string()]);
    }

    #[test]
    fn test_deserialize_fills_missing_categories() {
        let page: PageReport = serde_json::from_str(r#"{"tagging":["x"]}"#).unwrap();
        assert_eq!(page.issues(PageCategory::Tagging), ["x".to_string()]);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json.as_object().unwrap().len(), 7);
        assert!(json["image_quality"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_issues_flatten_in_page_order() {
        let mut report = AccessibilityReport::new("doc.pdf", 2, fixed_time());
        report.page_mut(2).unwrap().push(PageCategory::AltText, "missing alt");
        report.general.push(GeneralCategory::Language, "no lang");
        let issues = report.issues();
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].page, Some(2));
        assert_eq!(issues[0].category, Category::AltText);
        assert_eq!(issues[1].page, None);
        assert_eq!(issues[1].category.as_str(), "language");
    }
}
