//! JSON exchange format for document templates.
//!
//! ```json
//! { "model": "PP-DocLayout-L", "zoom": 2.0,
//!   "pages": [ { "page_number": 1, "elements": [
//!       { "role": "Heading", "bbox": [50.0, 700.0, 550.0, 750.0],
//!         "style_hint": "H1", "order_index": 0, "children": [] } ] } ] }
//! ```
//!
//! Readers are lenient: missing optional fields take their defaults and
//! unknown fields are ignored, so templates written by newer producers still
//! load.

use super::types::{DocumentTemplate, PageTemplate, TemplateMetadata};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;

#[derive(Serialize)]
struct WireRef<'a> {
    model: &'a str,
    zoom: f32,
    pages: &'a [PageTemplate],
}

#[derive(Deserialize)]
struct WireOwned {
    #[serde(default)]
    model: String,
    #[serde(default)]
    zoom: f32,
    #[serde(default)]
    pages: Vec<PageTemplate>,
}

impl<'a> From<&'a DocumentTemplate> for WireRef<'a> {
    fn from(t: &'a DocumentTemplate) -> Self {
        WireRef {
            model: &t.metadata.model,
            zoom: t.metadata.zoom,
            pages: &t.pages,
        }
    }
}

impl From<WireOwned> for DocumentTemplate {
    fn from(w: WireOwned) -> Self {
        DocumentTemplate {
            pages: w.pages,
            metadata: TemplateMetadata::new(w.model, w.zoom),
        }
    }
}

/// Encodes and decodes [`DocumentTemplate`]s.
pub struct TemplateSerializer;

impl TemplateSerializer {
    /// Compact JSON bytes.
    pub fn serialize(template: &DocumentTemplate) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&WireRef::from(template))?)
    }

    /// Indented JSON bytes, for template dumps meant to be read by people.
    pub fn serialize_pretty(template: &DocumentTemplate) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(&WireRef::from(template))?)
    }

    /// Write pretty JSON to `path`, creating parent directories.
    pub fn write_to_file(template: &DocumentTemplate, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let bytes = Self::serialize_pretty(template)?;
        let mut file = fs::File::create(path)?;
        file.write_all(&bytes)?;
        file.flush()?;
        log::debug!("Template written to {}", path.display());
        Ok(())
    }

    /// Decode JSON bytes.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_autotag::structure::TemplateSerializer;
    ///
    /// let t = TemplateSerializer::deserialize(br#"{"pages": []}"#).unwrap();
    /// assert!(t.pages.is_empty());
    /// assert_eq!(t.metadata.model, "");
    /// ```
    pub fn deserialize(bytes: &[u8]) -> Result<DocumentTemplate> {
        let wire: WireOwned = serde_json::from_slice(bytes)?;
        Ok(wire.into())
    }

    /// Read and decode a template file.
    pub fn read_from_file(path: &Path) -> Result<DocumentTemplate> {
        let bytes = fs::read(path)?;
        Self::deserialize(&bytes)
    }
}
