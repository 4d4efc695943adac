// Printed page number detection and sequence validation
use shared_pdf::{Page, PdfDocument};
use tracing::debug;

pub const NO_PAGE_NUMBERS: &str = "No page numbers detected in document.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageNumberDetection {
    /// The page has no text at all
    NoText,
    NotFound,
    Found(u64),
}

/// Reads the digits out of the last non-empty line of a page
pub fn detect_page_number(page: &Page) -> PageNumberDetection {
    let lines = page.text_lines();
    let Some(last) = lines.iter().rev().map(|l| l.trim()).find(|l| !l.is_empty()) else {
        return PageNumberDetection::NoText;
    };

    let digits: String = last.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return PageNumberDetection::NotFound;
    }
    match digits.parse() {
        Ok(number) => PageNumberDetection::Found(number),
        Err(e) => {
            debug!("Page {}: ignoring footer digits {:?}: {}", page.number, digits, e);
            PageNumberDetection::NotFound
        }
    }
}

/// Sequence breaks among detected numbers, reported at the page where
/// each break occurs. Pages without a number are skipped over.
pub fn sequence_breaks(detected: &[(u32, u64)]) -> Vec<String> {
    detected
        .windows(2)
        .filter_map(|pair| {
            let (_, previous) = pair[0];
            let (page, found) = pair[1];
            let expected = previous.checked_add(1)?;
            (found != expected)
                .then(|| format!("Page {}: expected {}, found {}", page, expected, found))
        })
        .collect()
}

/// Document-level page number findings
pub fn check_page_numbers(doc: &PdfDocument) -> Vec<String> {
    let mut per_page = Vec::new();
    let mut detected = Vec::new();

    for page in doc.pages() {
        match detect_page_number(page) {
            PageNumberDetection::Found(number) => detected.push((page.number, number)),
            PageNumberDetection::NoText => {
                per_page.push(format!("Page {}: no text found.", page.number))
            }
            PageNumberDetection::NotFound => {
                per_page.push(format!("Page {}: no page number detected.", page.number))
            }
        }
    }

    if detected.is_empty() {
        return vec![NO_PAGE_NUMBERS.to_string()];
    }

    per_page.extend(sequence_breaks(&detected));
    per_page
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use shared_pdf::TextSpan;

    fn page(number: u32, lines: &[&str]) -> Page {
        lines
            .iter()
            .enumerate()
            .fold(Page::new(number), |page, (i, line)| {
                page.with_span(TextSpan::new(*line, 10.0).at(72.0, 700.0 - 20.0 * i as f64))
            })
    }

    #[test]
    fn test_detects_trailing_number() {
        assert_eq!(
            detect_page_number(&page(1, &["Body text", "- 12 -"])),
            PageNumberDetection::Found(12)
        );
        assert_eq!(
            detect_page_number(&page(1, &["Body text", "Footer"])),
            PageNumberDetection::NotFound
        );
        assert_eq!(detect_page_number(&Page::new(1)), PageNumberDetection::NoText);
    }

    #[test]
    fn test_gap_reported_where_it_occurs() {
        let doc = PdfDocument::new(vec![
            page(1, &["Intro", "1"]),
            page(2, &["More", "2"]),
            page(3, &["End", "4"]),
        ]);
        assert_eq!(
            check_page_numbers(&doc),
            vec!["Page 3: expected 3, found 4".to_string()]
        );
    }

    #[test]
    fn test_no_numbers_anywhere_is_one_finding() {
        let doc = PdfDocument::new(vec![page(1, &["Intro"]), page(2, &["Outro"])]);
        assert_eq!(check_page_numbers(&doc), vec![NO_PAGE_NUMBERS.to_string()]);
    }

    #[test]
    fn test_missing_number_and_break() {
        let doc = PdfDocument::new(vec![
            page(1, &["Cover"]),
            page(2, &["Text", "2"]),
            page(3, &["Text", "iii"]),
            page(4, &["Text", "3"]),
            page(5, &["Text", "3"]),
        ]);
        assert_eq!(
            check_page_numbers(&doc),
            vec![
                "Page 1: no page number detected.".to_string(),
                "Page 3: no page number detected.".to_string(),
                "Page 5: expected 4, found 3".to_string(),
            ]
        );
    }

    #[test]
    fn test_oversized_digits_are_skipped() {
        let p = page(1, &["99999999999999999999999999"]);
        assert_eq!(detect_page_number(&p), PageNumberDetection::NotFound);
    }
}
