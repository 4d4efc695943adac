//! Read-only PDF document model for accessibility auditing
//!
//! This crate opens PDF bytes with lopdf and exposes the parts an audit
//! needs: pages with positioned text spans and marked content, image
//! XObjects, the logical structure tree, form fields, outline, language and
//! the MarkInfo flag. Everything is extracted up front so the returned
//! [`PdfDocument`] owns no parser state.

pub mod content;
pub mod document;
pub mod error;
pub mod image;
pub mod structure;
pub mod text;

pub use content::TextSpan;
pub use document::{Field, Page, PdfDocument};
pub use error::PdfError;
pub use image::{ImageData, ImageRef, RawColor};
pub use structure::{NodeId, StructureNode, StructureTree};
