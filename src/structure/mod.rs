//! Structural templates built from layout detections.
//!
//! ## Overview
//!
//! A layout model looks at a rendered page and reports labelled regions in
//! image pixels. This module turns those regions into a page-space template
//! that a tagging engine can write into the PDF as a structure tree
//! (ISO 32000-1:2008 Section 14.7):
//!
//! 1. [`RoleClassifier`] maps each detector label to a [`StructRole`]
//! 2. [`PageElementBuilder`] maps boxes into page space, recurses into
//!    nested results and assigns reading order
//! 3. [`DocumentTemplateAssembler`] collects pages in strict order
//! 4. [`TemplateSerializer`] encodes the result as the JSON exchange format
//!
//! ## Example
//!
//! ```
//! use pdf_autotag::geometry::{PageGeometry, PixelBox, Rect, Rotation};
//! use pdf_autotag::structure::{
//!     Detection, DocumentTemplateAssembler, PageElementBuilder, TemplateMetadata,
//!     TemplateSerializer,
//! };
//!
//! # fn main() -> pdf_autotag::Result<()> {
//! let page = PageGeometry::new(Rect::new(0.0, 0.0, 612.0, 792.0), Rotation::Rotate0);
//! let builder = PageElementBuilder::new();
//! let mut assembler = DocumentTemplateAssembler::new(TemplateMetadata::new("PP-DocLayout-L", 2.0));
//!
//! let detections = vec![Detection::new("doc_title", PixelBox::new(100.0, 80.0, 1100.0, 160.0))];
//! assembler.add_page(builder.build_page(&detections, 1, 2.0, &page)?)?;
//!
//! let template = assembler.finalize();
//! let json = TemplateSerializer::serialize(&template)?;
//! assert!(!json.is_empty());
//! # Ok(())
//! # }
//! ```

pub mod assembler;
pub mod builder;
pub mod classifier;
pub mod reading_order;
pub mod serializer;
mod types;

pub use assembler::DocumentTemplateAssembler;
pub use builder::PageElementBuilder;
pub use classifier::{ClassifierRule, MatchKind, RoleClassifier};
pub use serializer::TemplateSerializer;
pub use types::{
    Detection, DocumentTemplate, PageElement, PageTemplate, StructRole, StructType,
    TemplateMetadata,
};
