//! Writes a document template into a PDF as a logical structure tree.
//!
//! The tree is `StructTreeRoot → Document → StructElem...` (ISO 32000-1:2008
//! Section 14.7.2). Every element points at its page through `/Pg` and
//! carries its page-space box as a Layout attribute (Section 14.8.5.4.3).
//! No marked content is written, so the tree describes regions rather than
//! owning content streams.

use super::codes;
use crate::error::{Error, Result};
use crate::geometry::{Rect, Rotation};
use crate::structure::{DocumentTemplate, PageElement, StructRole, StructType};
use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat};

/// Cells whose visual top edges differ by at most this (page units) share a row.
const ROW_TOLERANCE: f32 = 2.0;

const ARTIFACT_HINT: &str = "Artifact";

/// Catalog of `doc`, for modification.
pub(crate) fn catalog_mut(doc: &mut Document) -> Result<&mut Dictionary> {
    let root_id = doc
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|e| Error::engine(codes::TEMPLATE, format!("document has no catalog: {}", e)))?;
    doc.get_object_mut(root_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| Error::engine(codes::TEMPLATE, format!("invalid catalog: {}", e)))
}

/// Remove the structure tree and the Marked flag from the catalog.
///
/// Returns true when a tree was present.
pub fn strip(doc: &mut Document) -> Result<bool> {
    let catalog = catalog_mut(doc)?;
    let had_tree = catalog.remove(b"StructTreeRoot").is_some();
    catalog.remove(b"MarkInfo");
    if had_tree {
        // Orphaned StructElem objects
        let pruned = doc.prune_objects();
        log::debug!("Removed existing structure tree ({} objects pruned)", pruned.len());
    }
    Ok(had_tree)
}

/// Write `template` as the structure tree of `doc`.
///
/// `pages` holds the page objects in page order with their `/Rotate`, which
/// decides which page-space edge is the visual top when grouping table rows.
/// Returns the number of structure elements written below `/Document`.
pub fn write(
    doc: &mut Document,
    pages: &[(ObjectId, Rotation)],
    template: &DocumentTemplate,
) -> Result<usize> {
    let root_id = doc.new_object_id();
    let document_id = doc.new_object_id();

    let mut writer = TreeWriter {
        doc: &mut *doc,
        rotation: Rotation::Rotate0,
        count: 0,
    };
    let mut kids = Vec::new();
    for page in &template.pages {
        let (page_id, rotation) = (page.page_number as usize)
            .checked_sub(1)
            .and_then(|index| pages.get(index))
            .copied()
            .ok_or_else(|| {
                Error::engine(
                    codes::TEMPLATE,
                    format!(
                        "template page {} does not exist in a {}-page document",
                        page.page_number,
                        pages.len()
                    ),
                )
            })?;
        writer.rotation = rotation;
        for element in page.elements.iter().filter(|e| !is_artifact(e)) {
            kids.push(Object::Reference(writer.element(document_id, page_id, element)));
        }
    }
    let count = writer.count;

    let mut document = Dictionary::new();
    document.set("Type", Object::Name(b"StructElem".to_vec()));
    document.set("S", name(&StructType::Document.as_name()));
    document.set("P", Object::Reference(root_id));
    document.set("K", Object::Array(kids));
    doc.objects.insert(document_id, Object::Dictionary(document));

    let mut root = Dictionary::new();
    root.set("Type", Object::Name(b"StructTreeRoot".to_vec()));
    root.set("K", Object::Reference(document_id));
    doc.objects.insert(root_id, Object::Dictionary(root));

    let mut mark_info = Dictionary::new();
    mark_info.set("Marked", true);

    let catalog = catalog_mut(doc)?;
    catalog.set("StructTreeRoot", Object::Reference(root_id));
    catalog.set("MarkInfo", Object::Dictionary(mark_info));

    Ok(count)
}

struct TreeWriter<'a> {
    doc: &'a mut Document,
    /// Rotation of the page being written
    rotation: Rotation,
    count: usize,
}

impl TreeWriter<'_> {
    fn element(&mut self, parent: ObjectId, page: ObjectId, element: &PageElement) -> ObjectId {
        let s = StructType::for_element(element.role, element.style_hint.as_deref());
        self.node(parent, page, s, element)
    }

    fn node(&mut self, parent: ObjectId, page: ObjectId, s: StructType, element: &PageElement) -> ObjectId {
        let id = self.doc.new_object_id();
        self.count += 1;

        let kids: Vec<Object> = if element.role == StructRole::Table {
            self.rows(id, page, &element.children)
        } else {
            element
                .children
                .iter()
                .filter(|child| !is_artifact(child))
                .map(|child| Object::Reference(self.element(id, page, child)))
                .collect()
        };

        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name(b"StructElem".to_vec()));
        dict.set("S", name(&s.as_name()));
        dict.set("P", Object::Reference(parent));
        dict.set("Pg", Object::Reference(page));
        dict.set("A", layout_attributes(&element.bbox));
        if !kids.is_empty() {
            dict.set("K", Object::Array(kids));
        }
        if let Some(content) = element.content.as_deref() {
            let key = if s == StructType::Formula { "Alt" } else { "ActualText" };
            dict.set(key, text(content));
        }
        self.doc.objects.insert(id, Object::Dictionary(dict));
        id
    }

    /// TR elements for the cells of a table, grouped by top edge.
    fn rows(&mut self, table: ObjectId, page: ObjectId, cells: &[PageElement]) -> Vec<Object> {
        let mut refs = Vec::new();
        let cells: Vec<&PageElement> = cells.iter().filter(|c| !is_artifact(c)).collect();
        for row in group_rows(&cells, self.rotation) {
            let tr = self.doc.new_object_id();
            self.count += 1;
            let tds: Vec<Object> = row
                .iter()
                .map(|cell| Object::Reference(self.node(tr, page, StructType::TD, cell)))
                .collect();
            let bounds = row_bounds(&row);

            let mut dict = Dictionary::new();
            dict.set("Type", Object::Name(b"StructElem".to_vec()));
            dict.set("S", name(&StructType::TR.as_name()));
            dict.set("P", Object::Reference(table));
            dict.set("Pg", Object::Reference(page));
            dict.set("A", layout_attributes(&bounds));
            dict.set("K", Object::Array(tds));
            self.doc.objects.insert(tr, Object::Dictionary(dict));
            refs.push(Object::Reference(tr));
        }
        refs
    }
}

fn is_artifact(element: &PageElement) -> bool {
    element.style_hint.as_deref() == Some(ARTIFACT_HINT)
}

/// Page-space edge that is the top of `bbox` as the page is displayed.
fn visual_top(bbox: &Rect, rotation: Rotation) -> f32 {
    match rotation {
        Rotation::Rotate0 => bbox.top,
        Rotation::Rotate90 => bbox.left,
        Rotation::Rotate180 => bbox.bottom,
        Rotation::Rotate270 => bbox.right,
    }
}

/// Split cells (already in reading order) into rows of similar visual top.
fn group_rows<'e>(cells: &[&'e PageElement], rotation: Rotation) -> Vec<Vec<&'e PageElement>> {
    let mut rows: Vec<Vec<&PageElement>> = Vec::new();
    for &cell in cells {
        let top = visual_top(&cell.bbox, rotation);
        match rows.last_mut() {
            Some(row) if (visual_top(&row[0].bbox, rotation) - top).abs() <= ROW_TOLERANCE => {
                row.push(cell)
            },
            _ => rows.push(vec![cell]),
        }
    }
    rows
}

fn row_bounds(row: &[&PageElement]) -> Rect {
    row.iter().skip(1).fold(row[0].bbox, |acc, cell| {
        Rect::new(
            acc.left.min(cell.bbox.left),
            acc.bottom.min(cell.bbox.bottom),
            acc.right.max(cell.bbox.right),
            acc.top.max(cell.bbox.top),
        )
    })
}

fn layout_attributes(bbox: &Rect) -> Object {
    let mut attrs = Dictionary::new();
    attrs.set("O", Object::Name(b"Layout".to_vec()));
    attrs.set(
        "BBox",
        Object::Array(vec![
            Object::Real(bbox.left),
            Object::Real(bbox.bottom),
            Object::Real(bbox.right),
            Object::Real(bbox.top),
        ]),
    );
    Object::Dictionary(attrs)
}

fn name(s: &str) -> Object {
    Object::Name(s.as_bytes().to_vec())
}

/// Text string: PDFDocEncoding-compatible ASCII as-is, anything else as
/// UTF-16BE with a byte order mark.
fn text(s: &str) -> Object {
    if s.is_ascii() {
        Object::String(s.as_bytes().to_vec(), StringFormat::Literal)
    } else {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in s.encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        Object::String(bytes, StringFormat::Hexadecimal)
    }
}
