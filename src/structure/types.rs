//! Types for detections, page templates and the document template.
//!
//! The template types double as the JSON exchange format handed to the tagging
//! engine; see [`crate::structure::serializer`] for the wire layout.

use crate::error::{Error, Result};
use crate::geometry::{PixelBox, Rect};
use serde::{Deserialize, Serialize};

/// One region reported by the layout model for a rendered page.
///
/// Field aliases accept PaddleX layout output (`label`, `coordinate`) as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Detector label, e.g. "doc_title", "table", "formula"
    #[serde(default, alias = "label")]
    pub category: Option<String>,

    /// Bounding box in rendered-image pixels
    #[serde(alias = "coordinate")]
    pub bbox: PixelBox,

    /// Nested detections (table cells, formula parts)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_results: Vec<Detection>,

    /// Recognized payload (formula markup, cell text), passed through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Detection {
    /// Create a detection with a category and a pixel box.
    pub fn new(category: impl Into<String>, bbox: PixelBox) -> Self {
        Self {
            category: Some(category.into()),
            bbox,
            sub_results: Vec::new(),
            content: None,
        }
    }

    /// Attach nested detections.
    pub fn with_sub_results(mut self, sub_results: Vec<Detection>) -> Self {
        self.sub_results = sub_results;
        self
    }

    /// Attach recognized content.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }
}

/// Canonical structural role of a page element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StructRole {
    /// Heading; the level travels in the style hint
    Heading,
    /// Body text
    Paragraph,
    /// Table
    Table,
    /// Figure, image or chart
    Figure,
    /// Mathematical formula
    Formula,
    /// List
    List,
    /// Anything else
    Other,
}

impl StructRole {
    /// All roles, in declaration order.
    pub const ALL: [StructRole; 7] = [
        StructRole::Heading,
        StructRole::Paragraph,
        StructRole::Table,
        StructRole::Figure,
        StructRole::Formula,
        StructRole::List,
        StructRole::Other,
    ];

    /// Role name as written in templates.
    pub fn as_str(&self) -> &'static str {
        match self {
            StructRole::Heading => "Heading",
            StructRole::Paragraph => "Paragraph",
            StructRole::Table => "Table",
            StructRole::Figure => "Figure",
            StructRole::Formula => "Formula",
            StructRole::List => "List",
            StructRole::Other => "Other",
        }
    }
}

/// Standard structure types from ISO 32000-1 §14.8.4 used when writing a
/// structure tree from a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructType {
    /// Document root
    Document,
    /// Division
    Div,
    /// Paragraph
    P,
    /// Heading level 1-6
    H(u8),
    /// Caption
    Caption,
    /// Note
    Note,
    /// List
    L,
    /// Table
    Table,
    /// Table row
    TR,
    /// Table data cell
    TD,
    /// Figure
    Figure,
    /// Formula
    Formula,
}

impl StructType {
    /// Structure type for a template element.
    ///
    /// Heading levels come from hints like `"H2"`; a heading without a usable
    /// hint becomes `H1`.
    pub fn for_element(role: StructRole, style_hint: Option<&str>) -> Self {
        match role {
            StructRole::Heading => StructType::H(style_hint.and_then(heading_level).unwrap_or(1)),
            StructRole::Paragraph => match style_hint {
                Some("Caption") => StructType::Caption,
                Some("Note") => StructType::Note,
                _ => StructType::P,
            },
            StructRole::Table => StructType::Table,
            StructRole::Figure => StructType::Figure,
            StructRole::Formula => StructType::Formula,
            StructRole::List => StructType::L,
            StructRole::Other => StructType::Div,
        }
    }

    /// The `/S` name written into the structure element.
    pub fn as_name(&self) -> String {
        match self {
            StructType::Document => "Document".to_string(),
            StructType::Div => "Div".to_string(),
            StructType::P => "P".to_string(),
            StructType::H(level) => format!("H{}", level),
            StructType::Caption => "Caption".to_string(),
            StructType::Note => "Note".to_string(),
            StructType::L => "L".to_string(),
            StructType::Table => "Table".to_string(),
            StructType::TR => "TR".to_string(),
            StructType::TD => "TD".to_string(),
            StructType::Figure => "Figure".to_string(),
            StructType::Formula => "Formula".to_string(),
        }
    }

    /// Check if this is a heading type
    pub fn is_heading(&self) -> bool {
        matches!(self, StructType::H(_))
    }
}

fn heading_level(hint: &str) -> Option<u8> {
    let digits = hint.strip_prefix('H').or_else(|| hint.strip_prefix('h'))?;
    match digits.parse::<u8>() {
        Ok(level @ 1..=6) => Some(level),
        _ => None,
    }
}

/// One structural element of a page, in page space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageElement {
    /// Structural role
    pub role: StructRole,

    /// Bounding box `[left, bottom, right, top]` in page space
    pub bbox: Rect,

    /// Optional refinement of the role (heading level, caption, artifact)
    #[serde(default)]
    pub style_hint: Option<String>,

    /// Zero-based reading-order position among its siblings
    pub order_index: usize,

    /// Nested elements in reading order (table cells)
    #[serde(default)]
    pub children: Vec<PageElement>,

    /// Opaque recognized payload (formula markup, cell text)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl PageElement {
    /// Number of descendants, at any depth.
    pub fn descendant_count(&self) -> usize {
        self.children
            .iter()
            .map(|c| 1 + c.descendant_count())
            .sum()
    }
}

/// All elements of one page, in reading order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageTemplate {
    /// 1-based page number
    pub page_number: u32,

    /// Elements in reading order
    #[serde(default)]
    pub elements: Vec<PageElement>,

    /// Set when sub-results beyond the per-page cap were dropped
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,
}

impl PageTemplate {
    /// Create an empty page template.
    pub fn new(page_number: u32) -> Self {
        Self {
            page_number,
            elements: Vec::new(),
            truncated: false,
        }
    }

    /// Number of nested sub-elements on this page.
    pub fn sub_element_count(&self) -> usize {
        self.elements.iter().map(PageElement::descendant_count).sum()
    }
}

/// Provenance recorded with every template.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateMetadata {
    /// Layout model identifier
    pub model: String,
    /// Zoom factor pages were rendered at
    pub zoom: f32,
}

impl TemplateMetadata {
    /// Create template metadata.
    pub fn new(model: impl Into<String>, zoom: f32) -> Self {
        Self {
            model: model.into(),
            zoom,
        }
    }
}

/// Document-level structural template: one page template per page, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentTemplate {
    /// Pages, strictly ascending by page number starting at 1
    pub pages: Vec<PageTemplate>,
    /// Provenance
    pub metadata: TemplateMetadata,
}

impl DocumentTemplate {
    /// Create an empty template.
    pub fn new(metadata: TemplateMetadata) -> Self {
        Self {
            pages: Vec::new(),
            metadata,
        }
    }

    /// Total number of top-level elements across pages.
    pub fn element_count(&self) -> usize {
        self.pages.iter().map(|p| p.elements.len()).sum()
    }

    /// Check the template invariants.
    ///
    /// - pages are numbered `1..=n` with no gaps or duplicates
    /// - every sibling list has `order_index` equal to its position
    /// - every bounding box is well formed
    pub fn validate(&self) -> Result<()> {
        for (i, page) in self.pages.iter().enumerate() {
            let expected = i as u32 + 1;
            if page.page_number != expected {
                return Err(Error::InvalidTemplate(format!(
                    "page at position {} has number {}, expected {}",
                    i, page.page_number, expected
                )));
            }
            validate_siblings(page.page_number, &page.elements)?;
        }
        Ok(())
    }
}

fn validate_siblings(page: u32, elements: &[PageElement]) -> Result<()> {
    for (i, element) in elements.iter().enumerate() {
        if element.order_index != i {
            return Err(Error::InvalidTemplate(format!(
                "page {}: element at position {} has order_index {}",
                page, i, element.order_index
            )));
        }
        if !element.bbox.is_well_formed() {
            return Err(Error::InvalidTemplate(format!(
                "page {}: element {} has malformed bbox {:?}",
                page, i, element.bbox
            )));
        }
        validate_siblings(page, &element.children)?;
    }
    Ok(())
}
