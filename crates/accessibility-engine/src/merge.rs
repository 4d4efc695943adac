//! Splicing late contrast findings into a report
//!
//! Contrast runs after the structural report exists. Two forms are offered:
//! [`apply_contrast`] updates the report data before a single render, and
//! [`merge_contrast_section`] patches text that was already rendered (for
//! example a report persisted by an earlier run). Both take the contrast
//! analyzer's text output and group it by the `Page N:` prefix; entries
//! without one, including the clean sentinel, are ignored.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;
use shared_types::{AccessibilityReport, PageCategory};
use tracing::debug;

use crate::report::{page_header, render_subsection, subsection_header};

lazy_static! {
    static ref PAGE_PREFIX: Regex = Regex::new(r"^Page (\d+):").unwrap();
}

/// Group findings by their `Page N:` prefix, keeping input order per page
pub fn group_by_page(issues: &[String]) -> BTreeMap<u32, Vec<String>> {
    let mut by_page: BTreeMap<u32, Vec<String>> = BTreeMap::new();
    for issue in issues {
        let page = PAGE_PREFIX
            .captures(issue)
            .and_then(|caps| caps[1].parse::<u32>().ok());
        match page {
            Some(page) => by_page.entry(page).or_default().push(issue.clone()),
            None => debug!("Dropping contrast entry without page prefix: {}", issue),
        }
    }
    by_page
}

/// Replace each affected page's contrast bucket. Pages outside the report
/// are skipped. Returns the number of pages updated.
pub fn apply_contrast(report: &mut AccessibilityReport, issues: &[String]) -> usize {
    let mut updated = 0;
    for (page, findings) in group_by_page(issues) {
        match report.page_mut(page) {
            Some(page_report) => {
                page_report.replace(PageCategory::Contrast, findings);
                updated += 1;
            }
            None => debug!("Contrast findings for page {} outside the report", page),
        }
    }
    updated
}

/// First occurrence of `needle` at or after `from` that begins a line.
/// Findings never span lines, so quoted document text cannot match here.
fn find_line_start(text: &str, needle: &str, from: usize) -> Option<usize> {
    text[from..]
        .match_indices(needle)
        .map(|(i, _)| from + i)
        .find(|&at| at == 0 || text.as_bytes()[at - 1] == b'\n')
}

/// End of the page section whose body starts at `body_start`: the next
/// page header or the next top-level section, whichever comes first
fn page_end(text: &str, body_start: usize) -> usize {
    let next_page = find_line_start(text, "### Page ", body_start);
    let next_top = find_line_start(text, "## ", body_start);
    match (next_page, next_top) {
        (Some(a), Some(b)) => a.min(b),
        (Some(a), None) | (None, Some(a)) => a,
        (None, None) => text.len(),
    }
}

/// End of the subsection whose header starts at `at` within `region`
fn subsection_end(region: &str, at: usize, header_len: usize) -> usize {
    find_line_start(region, "#### ", at + header_len).unwrap_or(region.len())
}

fn merge_page(region: &str, section: &str) -> Option<String> {
    let placeholder = render_subsection(PageCategory::Contrast, &[], None);
    if let Some(at) = find_line_start(region, &placeholder, 0) {
        return Some(format!(
            "{}{}{}",
            &region[..at],
            section,
            &region[at + placeholder.len()..]
        ));
    }

    let contrast_header = subsection_header(PageCategory::Contrast);
    if let Some(at) = find_line_start(region, &contrast_header, 0) {
        let end = subsection_end(region, at, contrast_header.len());
        return Some(format!("{}{}{}", &region[..at], section, &region[end..]));
    }

    let quality_header = subsection_header(PageCategory::ImageQuality);
    let at = find_line_start(region, &quality_header, 0)?;
    let end = subsection_end(region, at, quality_header.len());
    Some(format!("{}{}{}", &region[..end], section, &region[end..]))
}

/// Rewrite the contrast subsection of every page that has findings.
///
/// Per page, in order of preference: replace the clean placeholder,
/// replace an existing contrast subsection, or insert after the image
/// quality subsection. Applying the same findings again yields identical
/// text. Pages whose header cannot be found are left alone.
pub fn merge_contrast_section(report_text: &str, issues: &[String]) -> String {
    let mut text = report_text.to_string();

    for (page, findings) in group_by_page(issues) {
        let header = page_header(page);
        let Some(start) = find_line_start(&text, &header, 0) else {
            debug!("Page {} section not found in report", page);
            continue;
        };
        let end = page_end(&text, start + header.len());
        let section = render_subsection(PageCategory::Contrast, &findings, None);

        match merge_page(&text[start..end], &section) {
            Some(region) => text.replace_range(start..end, &region),
            None => debug!("Page {} has no subsection to anchor contrast findings", page),
        }
    }

    text
}
