//! Document model built from lopdf

use std::collections::{BTreeMap, HashMap};

use lopdf::{Dictionary, Document, Object, ObjectId};
use serde::{Deserialize, Serialize};

use crate::content::{interpret, mcid_of, ContentResources, TextSpan};
use crate::error::PdfError;
use crate::image::{page_images, resolve_dict, ImageRef};
use crate::structure::{parse_structure_tree, StructureTree};
use crate::text::text_value;

/// Vertical distance (points) within which spans share a line
const LINE_TOLERANCE: f64 = 2.0;

/// FontDescriptor flag bit 19 (1-based): ForceBold
const FORCE_BOLD: i64 = 1 << 18;

/// A form field's naming attributes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// `/TU`, the tooltip shown to assistive technology
    pub alternate_name: Option<String>,
    /// `/T`
    pub partial_name: Option<String>,
}

impl Field {
    pub fn new(alternate_name: Option<&str>, partial_name: Option<&str>) -> Self {
        Self {
            alternate_name: alternate_name.map(str::to_string),
            partial_name: partial_name.map(str::to_string),
        }
    }

    /// True when either name is present and non-empty
    pub fn has_label(&self) -> bool {
        let present = |name: &Option<String>| name.as_deref().is_some_and(|n| !n.is_empty());
        present(&self.alternate_name) || present(&self.partial_name)
    }
}

/// One page of the document
#[derive(Debug, Clone, Default)]
pub struct Page {
    /// 1-based
    pub number: u32,
    pub spans: Vec<TextSpan>,
    pub images: Vec<ImageRef>,
    /// Text shown inside each marked-content sequence, by MCID
    pub marked_content: BTreeMap<u32, String>,
}

impl Page {
    pub fn new(number: u32) -> Self {
        Self {
            number,
            ..Self::default()
        }
    }

    pub fn with_span(mut self, span: TextSpan) -> Self {
        self.spans.push(span);
        self
    }

    pub fn with_image(mut self, image: ImageRef) -> Self {
        self.images.push(image);
        self
    }

    pub fn with_marked_content(mut self, mcid: u32, text: impl Into<String>) -> Self {
        self.marked_content.insert(mcid, text.into());
        self
    }

    /// Lines in content-stream order. A new line starts whenever the
    /// baseline moves.
    pub fn text_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = Vec::new();
        let mut current_y: Option<f64> = None;

        for span in &self.spans {
            match current_y {
                Some(y) if (y - span.y).abs() <= LINE_TOLERANCE => {
                    if let Some(line) = lines.last_mut() {
                        join_span(line, &span.text);
                    }
                }
                _ => lines.push(span.text.clone()),
            }
            current_y = Some(span.y);
        }

        lines
    }

    /// Page text in content-stream order, one line per baseline
    pub fn text(&self) -> String {
        self.text_lines().join("\n")
    }

    /// Lines sorted by position: top to bottom, then left to right
    pub fn visual_lines(&self) -> Vec<String> {
        let mut spans: Vec<&TextSpan> = self.spans.iter().collect();
        spans.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));

        let mut rows: Vec<(f64, Vec<&TextSpan>)> = Vec::new();
        for span in spans {
            match rows.last_mut() {
                Some((y, row)) if (*y - span.y).abs() <= LINE_TOLERANCE => row.push(span),
                _ => rows.push((span.y, vec![span])),
            }
        }

        rows.into_iter()
            .map(|(_, mut row)| {
                row.sort_by(|a, b| a.x.total_cmp(&b.x));
                let mut line = String::new();
                for span in row {
                    join_span(&mut line, &span.text);
                }
                line
            })
            .collect()
    }
}

fn join_span(line: &mut String, text: &str) {
    if !line.is_empty() && !line.ends_with(char::is_whitespace) && !text.starts_with(char::is_whitespace) {
        line.push(' ');
    }
    line.push_str(text);
}

/// A parsed PDF, read-only once built
#[derive(Debug, Clone, Default)]
pub struct PdfDocument {
    pages: Vec<Page>,
    structure: Option<StructureTree>,
    has_outline: bool,
    language: Option<String>,
    marked: bool,
    form_fields: Option<Vec<Field>>,
}

impl PdfDocument {
    /// Parse PDF bytes and extract everything the audit needs.
    ///
    /// This is the only fallible step: once parsed, a malformed page,
    /// image or structure element degrades to missing data instead of an
    /// error.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PdfError> {
        let doc = Document::load_mem(bytes).map_err(|e| PdfError::ParseError(e.to_string()))?;
        Self::from_lopdf(&doc)
    }

    pub fn from_lopdf(doc: &Document) -> Result<Self, PdfError> {
        let catalog = catalog(doc)?;
        let page_ids = doc.get_pages();
        let page_numbers: HashMap<ObjectId, u32> =
            page_ids.iter().map(|(&num, &id)| (id, num)).collect();

        let pages = page_ids
            .iter()
            .map(|(&number, &page_id)| extract_page(doc, number, page_id))
            .collect();

        let structure = catalog
            .get(b"StructTreeRoot")
            .ok()
            .and_then(|obj| resolve_dict(doc, obj))
            .map(|root| parse_structure_tree(doc, root, &page_numbers));

        let language = catalog
            .get(b"Lang")
            .ok()
            .map(|obj| deref(doc, obj))
            .and_then(text_value);

        let marked = catalog
            .get(b"MarkInfo")
            .ok()
            .and_then(|obj| resolve_dict(doc, obj))
            .and_then(|info| info.get(b"Marked").ok())
            .map(|obj| matches!(deref(doc, obj), Object::Boolean(true)))
            .unwrap_or(false);

        let has_outline = catalog
            .get(b"Outlines")
            .ok()
            .and_then(|obj| resolve_dict(doc, obj))
            .is_some();

        let form_fields = catalog
            .get(b"AcroForm")
            .ok()
            .and_then(|obj| resolve_dict(doc, obj))
            .map(|form| form_fields(doc, form));

        Ok(Self {
            pages,
            structure,
            has_outline,
            language,
            marked,
            form_fields,
        })
    }

    /// Assemble a document directly, without PDF bytes
    pub fn new(pages: Vec<Page>) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }

    pub fn with_structure(mut self, tree: StructureTree) -> Self {
        self.structure = Some(tree);
        self
    }

    pub fn with_outline(mut self, has_outline: bool) -> Self {
        self.has_outline = has_outline;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_marked(mut self, marked: bool) -> Self {
        self.marked = marked;
        self
    }

    pub fn with_form_fields(mut self, fields: Vec<Field>) -> Self {
        self.form_fields = Some(fields);
        self
    }

    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn structure_tree(&self) -> Option<&StructureTree> {
        self.structure.as_ref()
    }

    pub fn has_outline(&self) -> bool {
        self.has_outline
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// `/MarkInfo /Marked true`
    pub fn is_marked(&self) -> bool {
        self.marked
    }

    /// `None` when the document has no AcroForm
    pub fn form_fields(&self) -> Option<&[Field]> {
        self.form_fields.as_deref()
    }

    /// Marked-content text for an MCID on a page
    pub fn marked_content(&self, page: u32, mcid: u32) -> Option<&str> {
        page.checked_sub(1)
            .and_then(|index| self.pages.get(index as usize))
            .and_then(|p| p.marked_content.get(&mcid))
            .map(String::as_str)
    }

    /// Whole-document text, pages separated by newlines
    pub fn full_text(&self) -> String {
        self.pages
            .iter()
            .map(Page::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Whole-document lines in position-sorted order
    pub fn visual_lines(&self) -> Vec<String> {
        self.pages.iter().flat_map(Page::visual_lines).collect()
    }
}

fn catalog(doc: &Document) -> Result<&Dictionary, PdfError> {
    let root = doc
        .trailer
        .get(b"Root")
        .map_err(|_| PdfError::Malformed("No Root in trailer".into()))?;
    resolve_dict(doc, root).ok_or_else(|| PdfError::Malformed("Invalid catalog".into()))
}

fn deref<'a>(doc: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(object),
        other => other,
    }
}

fn extract_page(doc: &Document, number: u32, page_id: ObjectId) -> Page {
    let resources = page_resources(doc, page_id);
    let content_resources = content_resources(doc, resources);

    let operations = doc
        .get_page_content(page_id)
        .ok()
        .and_then(|content| lopdf::content::Content::decode(&content).ok())
        .map(|content| content.operations)
        .unwrap_or_else(|| {
            tracing::debug!("Page {} has no decodable content stream", number);
            Vec::new()
        });
    let text = interpret(&operations, &content_resources);

    Page {
        number,
        spans: text.spans,
        images: page_images(doc, resources),
        marked_content: text.marked_content,
    }
}

/// `/Resources` of a page, inherited through `/Parent` when absent
fn page_resources(doc: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    let mut current = doc.get_object(page_id).ok()?.as_dict().ok()?;
    // Bounded walk up the page tree
    for _ in 0..32 {
        if let Ok(resources) = current.get(b"Resources") {
            return resolve_dict(doc, resources);
        }
        let parent = current.get(b"Parent").ok()?;
        current = resolve_dict(doc, parent)?;
    }
    None
}

fn content_resources(doc: &Document, resources: Option<&Dictionary>) -> ContentResources {
    let mut out = ContentResources::default();
    let Some(resources) = resources else {
        return out;
    };

    if let Some(fonts) = resources.get(b"Font").ok().and_then(|f| resolve_dict(doc, f)) {
        for (name, font) in fonts.iter() {
            let bold = resolve_dict(doc, font)
                .map(|font| is_bold_font(doc, font))
                .unwrap_or(false);
            out.fonts.insert(name.clone(), bold);
        }
    }

    if let Some(properties) = resources
        .get(b"Properties")
        .ok()
        .and_then(|p| resolve_dict(doc, p))
    {
        for (name, props) in properties.iter() {
            let mcid = resolve_dict(doc, props)
                .and_then(|props| props.get(b"MCID").ok())
                .and_then(mcid_of);
            out.properties.insert(name.clone(), mcid);
        }
    }

    out
}

fn is_bold_font(doc: &Document, font: &Dictionary) -> bool {
    if let Ok(Object::Name(base)) = font.get(b"BaseFont") {
        let base = String::from_utf8_lossy(base).to_lowercase();
        if ["bold", "black", "heavy"].iter().any(|w| base.contains(w)) {
            return true;
        }
    }

    let Some(descriptor) = font
        .get(b"FontDescriptor")
        .ok()
        .and_then(|d| resolve_dict(doc, d))
    else {
        return false;
    };

    let weight = match descriptor.get(b"FontWeight") {
        Ok(Object::Integer(w)) => *w as f64,
        Ok(Object::Real(w)) => *w as f64,
        _ => 0.0,
    };
    let flags = match descriptor.get(b"Flags") {
        Ok(Object::Integer(f)) => *f,
        _ => 0,
    };

    weight >= 700.0 || flags & FORCE_BOLD != 0
}

fn form_fields(doc: &Document, form: &Dictionary) -> Vec<Field> {
    let Ok(fields) = form.get(b"Fields") else {
        return Vec::new();
    };
    let Object::Array(fields) = deref(doc, fields) else {
        return Vec::new();
    };

    fields
        .iter()
        .filter_map(|field| resolve_dict(doc, field))
        .map(|field| Field {
            alternate_name: field
                .get(b"TU")
                .ok()
                .map(|obj| deref(doc, obj))
                .and_then(text_value),
            partial_name: field
                .get(b"T")
                .ok()
                .map(|obj| deref(doc, obj))
                .and_then(text_value),
        })
        .collect()
}
