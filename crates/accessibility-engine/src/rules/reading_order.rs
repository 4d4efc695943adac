// Reading order: tagged (logical) order against visual (positional) order
use std::collections::HashSet;

use serde::Serialize;
use shared_pdf::{PdfDocument, StructureNode};

pub const ORDER_UNAVAILABLE: &str = "No tagged text found; reading order unavailable.";
pub const NO_VISUAL_TEXT: &str = "No visual text extracted.";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReadingOrderOutcome {
    /// Nothing tagged to compare
    Unavailable,
    NoVisualText,
    Consistent { mismatches: usize, tagged: usize },
    Divergent { mismatches: usize, tagged: usize },
}

impl ReadingOrderOutcome {
    /// The finding to record on every page, if any
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Unavailable => Some(ORDER_UNAVAILABLE.to_string()),
            Self::NoVisualText => Some(NO_VISUAL_TEXT.to_string()),
            Self::Consistent { .. } => None,
            Self::Divergent { mismatches, tagged } => Some(format!(
                "Possible reading order issue: tagged order differs from visual order ({} of {} tagged entries out of place).",
                mismatches, tagged
            )),
        }
    }
}

/// Marked-content text in structure-tree order.
///
/// Walks the tree depth first, skipping element nodes and collecting the
/// text behind each content reference. Entries are trimmed and never empty.
pub fn tagged_order(doc: &PdfDocument) -> Vec<String> {
    let Some(tree) = doc.structure_tree() else {
        return Vec::new();
    };

    let mut entries = Vec::new();
    let mut visited = HashSet::new();
    let mut stack: Vec<_> = tree.roots().iter().rev().copied().collect();

    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        match tree.node(id) {
            Some(StructureNode::Element { children, .. }) => {
                stack.extend(children.iter().rev().copied());
            }
            Some(StructureNode::ContentReference {
                mcid: Some(mcid),
                page,
            }) => {
                let page = page.or_else(|| (doc.page_count() == 1).then_some(1));
                let text = page.and_then(|page| doc.marked_content(page, *mcid));
                if let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) {
                    entries.push(text.to_string());
                }
            }
            _ => {}
        }
    }

    entries
}

/// Position-sorted lines of the whole document, trimmed and non-empty
pub fn visual_order(doc: &PdfDocument) -> Vec<String> {
    doc.visual_lines()
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Tagged entries not contained in the visual line at the same index.
/// Tagged entries past the end of the visual sequence all count.
pub fn count_mismatches(tagged: &[String], visual: &[String]) -> usize {
    let compared = tagged
        .iter()
        .zip(visual)
        .filter(|(t, v)| !v.contains(t.as_str()))
        .count();
    compared + tagged.len().saturating_sub(visual.len())
}

pub fn compare_orders(tagged: &[String], visual: &[String], tolerance: f64) -> ReadingOrderOutcome {
    if tagged.is_empty() {
        return ReadingOrderOutcome::Unavailable;
    }
    if visual.is_empty() {
        return ReadingOrderOutcome::NoVisualText;
    }

    let mismatches = count_mismatches(tagged, visual);
    let tagged = tagged.len();
    if mismatches as f64 > tolerance * tagged as f64 {
        ReadingOrderOutcome::Divergent { mismatches, tagged }
    } else {
        ReadingOrderOutcome::Consistent { mismatches, tagged }
    }
}

/// Compares the document's two orders; findings apply to every page
pub fn check_reading_order(doc: &PdfDocument, tolerance: f64) -> Vec<String> {
    let tagged = tagged_order(doc);
    let visual = visual_order(doc);
    compare_orders(&tagged, &visual, tolerance)
        .message()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_pdf::{Page, StructureTree, TextSpan};

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_substring_counts_as_match() {
        let outcome = compare_orders(&strings(&["Hello"]), &strings(&["Hello world"]), 0.3);
        assert_eq!(
            outcome,
            ReadingOrderOutcome::Consistent {
                mismatches: 0,
                tagged: 1
            }
        );
        assert_eq!(outcome.message(), None);
    }

    #[test]
    fn test_full_mismatch_is_divergent() {
        let outcome = compare_orders(&strings(&["Zebra"]), &strings(&["Apple"]), 0.3);
        assert_eq!(
            outcome,
            ReadingOrderOutcome::Divergent {
                mismatches: 1,
                tagged: 1
            }
        );
        assert!(outcome.message().unwrap().starts_with("Possible reading order issue"));
    }

    #[test]
    fn test_extra_tagged_entries_are_mismatches() {
        let tagged = strings(&["A", "B", "C", "D"]);
        let visual = strings(&["A", "B"]);
        assert_eq!(count_mismatches(&tagged, &visual), 2);
    }

    #[test]
    fn test_tolerance_boundary() {
        // 3 of 10 is exactly 30%, not above it
        let tagged = strings(&["a", "b", "c", "d", "e", "f", "g", "x", "y", "z"]);
        let visual = strings(&["a", "b", "c", "d", "e", "f", "g", "1", "2", "3"]);
        assert!(matches!(
            compare_orders(&tagged, &visual, 0.3),
            ReadingOrderOutcome::Consistent { mismatches: 3, .. }
        ));
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(
            compare_orders(&[], &strings(&["x"]), 0.3),
            ReadingOrderOutcome::Unavailable
        );
        assert_eq!(
            compare_orders(&strings(&["x"]), &[], 0.3),
            ReadingOrderOutcome::NoVisualText
        );
    }

    #[test]
    fn test_tagged_order_follows_tree() {
        let page = Page::new(1)
            .with_span(TextSpan::new("Second", 12.0).at(72.0, 600.0))
            .with_span(TextSpan::new("First", 12.0).at(72.0, 700.0))
            .with_marked_content(0, "Second")
            .with_marked_content(1, " First ");

        let mut tree = StructureTree::new();
        let doc_el = tree.add_element("Document");
        let h = tree.add_element("H1");
        let first = tree.add_content(Some(1), Some(1));
        tree.attach(h, first);
        let p = tree.add_element("P");
        let second = tree.add_content(Some(0), Some(1));
        tree.attach(p, second);
        tree.attach(doc_el, h);
        tree.attach(doc_el, p);
        tree.add_root(doc_el);

        let doc = PdfDocument::new(vec![page]).with_structure(tree);
        assert_eq!(tagged_order(&doc), strings(&["First", "Second"]));
        assert_eq!(visual_order(&doc), strings(&["First", "Second"]));
        assert!(check_reading_order(&doc, 0.3).is_empty());
    }

    #[test]
    fn test_untagged_document_is_unavailable() {
        let doc = PdfDocument::new(vec![Page::new(1).with_span(TextSpan::new("Text", 12.0))]);
        assert_eq!(check_reading_order(&doc, 0.3), vec![ORDER_UNAVAILABLE.to_string()]);
    }
}
