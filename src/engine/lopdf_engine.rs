//! Document engine backed by `lopdf`.
//!
//! Page geometry comes straight from the page tree. Rendering is delegated to
//! an external rasterizer (poppler's `pdftoppm`); without one the engine only
//! reports the size the page would have at the requested zoom, which is all a
//! detector replaying recorded output needs.

use super::{
    codes, struct_tree, DocumentEngine, EngineDocument, EnginePage, PageView, Release,
    RenderedPage,
};
use crate::config::Credentials;
use crate::error::{Error, Result};
use crate::geometry::{PageGeometry, Rect, Rotation};
use crate::structure::{DocumentTemplate, TemplateSerializer};
use lopdf::{Document, Object, ObjectId};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::{NamedTempFile, TempDir};

/// US Letter, used when a page has neither a CropBox nor a MediaBox.
const DEFAULT_PAGE: Rect = Rect {
    left: 0.0,
    bottom: 0.0,
    right: 612.0,
    top: 792.0,
};

/// Page-tree depth at which inherited attribute lookup gives up.
const MAX_TREE_DEPTH: usize = 64;

/// External page rasterizer with a `pdftoppm` command line.
#[derive(Debug, Clone)]
pub struct Rasterizer {
    program: PathBuf,
}

impl Rasterizer {
    /// Use the given `pdftoppm`-compatible program.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// `pdftoppm` from `PATH`.
    pub fn pdftoppm() -> Self {
        Self::new("pdftoppm")
    }

    /// The program invoked.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Render one page to `<out_dir>/page-<n>.png`.
    fn render(&self, source: &Path, page_number: u32, zoom: f32, out_dir: &Path) -> Result<PathBuf> {
        let prefix = out_dir.join(format!("page-{}", page_number));
        let dpi = 72.0 * zoom;

        let output = Command::new(&self.program)
            .arg("-png")
            .arg("-singlefile")
            .arg("-cropbox")
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-f")
            .arg(page_number.to_string())
            .arg("-l")
            .arg(page_number.to_string())
            .arg(source)
            .arg(&prefix)
            .output()
            .map_err(|e| {
                Error::engine(
                    codes::RENDER,
                    format!("failed to invoke {}: {}", self.program.display(), e),
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::engine(
                codes::RENDER,
                format!("{} failed on page {}: {}", self.program.display(), page_number, stderr.trim()),
            ));
        }

        let image = prefix.with_extension("png");
        if !image.exists() {
            return Err(Error::engine(
                codes::RENDER,
                format!("expected rendered image not found: {}", image.display()),
            ));
        }
        Ok(image)
    }
}

/// Document engine built on `lopdf`.
#[derive(Debug, Clone, Default)]
pub struct LopdfEngine {
    rasterizer: Option<Rasterizer>,
}

impl LopdfEngine {
    /// Engine without a rasterizer; views only report dimensions.
    pub fn new() -> Self {
        Self { rasterizer: None }
    }

    /// Rasterize pages with `rasterizer`.
    pub fn with_rasterizer(mut self, rasterizer: Rasterizer) -> Self {
        self.rasterizer = Some(rasterizer);
        self
    }
}

impl DocumentEngine for LopdfEngine {
    type Document = LopdfDocument;

    fn authorize(&mut self, credentials: &Credentials) -> Result<()> {
        // lopdf needs no license; only malformed credentials are refused
        match credentials {
            Credentials::Account { name, key } => {
                if name.trim().is_empty() || key.trim().is_empty() {
                    return Err(Error::Authorization(
                        "account credentials need both a name and a key".to_string(),
                    ));
                }
                log::info!("Using account credentials for '{}'", name);
            },
            Credentials::Activation { key } => {
                if key.trim().is_empty() {
                    return Err(Error::Activation("empty license key".to_string()));
                }
                log::info!("Using license key activation");
            },
            Credentials::Trial => log::info!("No license name or key provided, running as trial"),
        }
        Ok(())
    }

    fn open(&mut self, path: &Path) -> Result<LopdfDocument> {
        let inner = Document::load(path)
            .map_err(|e| Error::engine(codes::OPEN, format!("{}: {}", path.display(), e)))?;
        let page_ids: Vec<ObjectId> = inner.get_pages().values().copied().collect();
        log::debug!("Opened {} ({} pages)", path.display(), page_ids.len());

        Ok(LopdfDocument {
            source: path.to_path_buf(),
            inner,
            page_ids,
            template: None,
            rasterizer: self.rasterizer.clone(),
            released: false,
        })
    }
}

/// An open document.
#[derive(Debug)]
pub struct LopdfDocument {
    source: PathBuf,
    inner: Document,
    page_ids: Vec<ObjectId>,
    template: Option<DocumentTemplate>,
    rasterizer: Option<Rasterizer>,
    released: bool,
}

impl LopdfDocument {
    /// The underlying `lopdf` document.
    pub fn inner(&self) -> &Document {
        &self.inner
    }
}

impl Release for LopdfDocument {
    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.template = None;
            log::debug!("Closed {}", self.source.display());
        }
    }
}

impl EngineDocument for LopdfDocument {
    type Page = LopdfPage;

    fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    fn acquire_page(&self, index: usize) -> Result<LopdfPage> {
        let object_id = *self.page_ids.get(index).ok_or_else(|| {
            Error::engine(
                codes::PAGE,
                format!("page index {} out of range (0..{})", index, self.page_ids.len()),
            )
        })?;
        let geometry = page_geometry(&self.inner, object_id)?;

        Ok(LopdfPage {
            page_number: index as u32 + 1,
            geometry,
            source: self.source.clone(),
            rasterizer: self.rasterizer.clone(),
        })
    }

    fn remove_tags(&mut self) -> Result<()> {
        if struct_tree::strip(&mut self.inner)? {
            log::info!("Removed existing tags from {}", self.source.display());
        }
        Ok(())
    }

    fn load_template(&mut self, template: &[u8]) -> Result<()> {
        let template = TemplateSerializer::deserialize(template)
            .and_then(|t| t.validate().map(|_| t))
            .map_err(|e| Error::engine(codes::TEMPLATE, e.to_string()))?;
        if template.pages.len() > self.page_ids.len() {
            return Err(Error::engine(
                codes::TEMPLATE,
                format!(
                    "template has {} pages, document has {}",
                    template.pages.len(),
                    self.page_ids.len()
                ),
            ));
        }
        self.template = Some(template);
        Ok(())
    }

    fn add_tags(&mut self) -> Result<()> {
        let template = self
            .template
            .as_ref()
            .ok_or_else(|| Error::engine(codes::TEMPLATE, "no template loaded"))?;
        let pages = self
            .page_ids
            .iter()
            .map(|&id| page_geometry(&self.inner, id).map(|g| (id, g.rotation)))
            .collect::<Result<Vec<_>>>()?;
        let count = struct_tree::write(&mut self.inner, &pages, template)?;
        log::debug!("Wrote {} structure elements", count);
        Ok(())
    }

    fn save(&mut self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let save_error = |e: &dyn std::fmt::Display| {
            Error::engine(codes::SAVE, format!("{}: {}", path.display(), e))
        };

        // Write next to the target, then rename into place
        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| save_error(&e))?;
        self.inner
            .save_to(tmp.as_file_mut())
            .map_err(|e| save_error(&e))?;
        tmp.persist(path).map_err(|e| save_error(&e.error))?;
        Ok(())
    }
}

/// A page of a [`LopdfDocument`].
#[derive(Debug)]
pub struct LopdfPage {
    page_number: u32,
    geometry: PageGeometry,
    source: PathBuf,
    rasterizer: Option<Rasterizer>,
}

impl Release for LopdfPage {
    fn release(&mut self) {
        log::trace!("Released page {}", self.page_number);
    }
}

impl EnginePage for LopdfPage {
    type View = LopdfView;

    fn geometry(&self) -> PageGeometry {
        self.geometry
    }

    fn acquire_view(&self, zoom: f32, rotation: Rotation) -> Result<LopdfView> {
        if self.rasterizer.is_some() && rotation != self.geometry.rotation {
            log::warn!(
                "Page {}: rasterizer renders with the page's own rotation ({}°), not {}°",
                self.page_number,
                self.geometry.rotation.degrees(),
                rotation.degrees()
            );
        }
        let dir = match self.rasterizer {
            Some(_) => Some(
                tempfile::Builder::new()
                    .prefix("autotag-")
                    .tempdir()
                    .map_err(|e| Error::engine(codes::RENDER, e.to_string()))?,
            ),
            None => None,
        };

        Ok(LopdfView {
            page_number: self.page_number,
            geometry: PageGeometry::new(self.geometry.crop_box, rotation),
            zoom,
            source: self.source.clone(),
            rasterizer: self.rasterizer.clone(),
            dir,
        })
    }
}

/// A render view; owns the directory its image is written to.
#[derive(Debug)]
pub struct LopdfView {
    page_number: u32,
    geometry: PageGeometry,
    zoom: f32,
    source: PathBuf,
    rasterizer: Option<Rasterizer>,
    dir: Option<TempDir>,
}

impl Release for LopdfView {
    fn release(&mut self) {
        if let Some(dir) = self.dir.take() {
            if let Err(e) = dir.close() {
                log::warn!("Failed to remove render directory for page {}: {}", self.page_number, e);
            }
        }
    }
}

impl PageView for LopdfView {
    fn render(&self) -> Result<RenderedPage> {
        let (expected_w, expected_h) = self.geometry.rendered_size(self.zoom);

        let (Some(rasterizer), Some(dir)) = (&self.rasterizer, &self.dir) else {
            return Ok(RenderedPage {
                width: expected_w,
                height: expected_h,
                image: None,
            });
        };

        let image = rasterizer.render(&self.source, self.page_number, self.zoom, dir.path())?;
        let (width, height) = image::image_dimensions(&image)
            .map_err(|e| Error::engine(codes::RENDER, format!("{}: {}", image.display(), e)))?;
        if width.abs_diff(expected_w) > 1 || height.abs_diff(expected_h) > 1 {
            log::warn!(
                "Page {} rendered at {}x{}, expected {}x{}",
                self.page_number,
                width,
                height,
                expected_w,
                expected_h
            );
        }

        Ok(RenderedPage {
            width,
            height,
            image: Some(image),
        })
    }
}

/// Crop box and rotation of a page, following page-tree inheritance.
fn page_geometry(doc: &Document, page_id: ObjectId) -> Result<PageGeometry> {
    let crop_box = inherited(doc, page_id, b"CropBox")?
        .and_then(|o| rect_from(doc, o))
        .or(inherited(doc, page_id, b"MediaBox")?.and_then(|o| rect_from(doc, o)))
        .unwrap_or_else(|| {
            log::warn!("Page object {:?} has no usable page box, assuming US Letter", page_id);
            DEFAULT_PAGE
        });

    let degrees = inherited(doc, page_id, b"Rotate")?
        .and_then(|o| resolve(doc, o).as_i64().ok())
        .unwrap_or(0);

    Ok(PageGeometry::new(crop_box, Rotation::from_degrees(degrees)))
}

/// Look up `key` on the page, walking up `/Parent` links.
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Result<Option<&'a Object>> {
    let mut current = page_id;
    for _ in 0..MAX_TREE_DEPTH {
        let dict = doc
            .get_object(current)
            .and_then(Object::as_dict)
            .map_err(|e| Error::engine(codes::PAGE, format!("invalid page object {:?}: {}", current, e)))?;

        if let Ok(value) = dict.get(key) {
            return Ok(Some(value));
        }
        match dict.get(b"Parent").and_then(Object::as_reference) {
            Ok(parent) => current = parent,
            Err(_) => return Ok(None),
        }
    }
    log::warn!("Page tree above {:?} is deeper than {} levels", page_id, MAX_TREE_DEPTH);
    Ok(None)
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

fn rect_from(doc: &Document, obj: &Object) -> Option<Rect> {
    let array = resolve(doc, obj).as_array().ok()?;
    if array.len() != 4 {
        return None;
    }
    let mut v = [0.0f32; 4];
    for (slot, item) in v.iter_mut().zip(array) {
        *slot = match resolve(doc, item) {
            Object::Integer(i) => *i as f32,
            Object::Real(r) => *r,
            _ => return None,
        };
    }
    let rect = Rect::from_corners(v[0], v[1], v[2], v[3]);
    rect.is_well_formed().then_some(rect)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    fn document(parent_extra: lopdf::Dictionary, page_extra: lopdf::Dictionary) -> (Document, ObjectId) {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();

        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
        };
        page.extend(&page_extra);
        let page_id = doc.add_object(page);

        let mut pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        };
        pages.extend(&parent_extra);
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        (doc, page_id)
    }

    fn boxed(v: [i64; 4]) -> Object {
        Object::Array(v.iter().map(|&n| Object::Integer(n)).collect())
    }

    #[test]
    fn test_media_box_and_rotation_are_inherited() {
        let (doc, page_id) = document(
            dictionary! { "MediaBox" => boxed([0, 0, 600, 800]), "Rotate" => 90 },
            dictionary! {},
        );
        let geometry = page_geometry(&doc, page_id).unwrap();
        assert_eq!(geometry.crop_box, Rect::new(0.0, 0.0, 600.0, 800.0));
        assert_eq!(geometry.rotation, Rotation::Rotate90);
    }

    #[test]
    fn test_crop_box_wins_over_media_box() {
        let (doc, page_id) = document(
            dictionary! { "MediaBox" => boxed([0, 0, 612, 792]) },
            dictionary! { "CropBox" => boxed([36, 36, 576, 756]), "Rotate" => -90 },
        );
        let geometry = page_geometry(&doc, page_id).unwrap();
        assert_eq!(geometry.crop_box, Rect::new(36.0, 36.0, 576.0, 756.0));
        assert_eq!(geometry.rotation, Rotation::Rotate270);
    }

    #[test]
    fn test_missing_boxes_default_to_letter() {
        let (doc, page_id) = document(dictionary! {}, dictionary! {});
        let geometry = page_geometry(&doc, page_id).unwrap();
        assert_eq!(geometry.crop_box, DEFAULT_PAGE);
        assert_eq!(geometry.rotation, Rotation::Rotate0);
    }

    #[test]
    fn test_degenerate_crop_box_falls_back_to_media_box() {
        let (doc, page_id) = document(
            dictionary! { "MediaBox" => boxed([0, 0, 500, 500]) },
            dictionary! { "CropBox" => boxed([10, 10, 10, 10]) },
        );
        let geometry = page_geometry(&doc, page_id).unwrap();
        assert_eq!(geometry.crop_box, Rect::new(0.0, 0.0, 500.0, 500.0));
    }

    #[test]
    fn test_view_without_rasterizer_reports_dimensions() {
        let page = LopdfPage {
            page_number: 1,
            geometry: PageGeometry::new(Rect::new(0.0, 0.0, 600.0, 800.0), Rotation::Rotate90),
            source: PathBuf::from("unused.pdf"),
            rasterizer: None,
        };
        let mut view = page.acquire_view(2.0, Rotation::Rotate90).unwrap();
        let rendered = view.render().unwrap();
        assert_eq!((rendered.width, rendered.height), (1600, 1200));
        assert!(rendered.image.is_none());
        view.release();
    }

    #[test]
    fn test_missing_rasterizer_program_is_engine_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Rasterizer::new("/nonexistent/pdftoppm")
            .render(Path::new("in.pdf"), 1, 2.0, dir.path())
            .unwrap_err();
        assert!(matches!(err, Error::Engine { code: codes::RENDER, .. }));
    }

    #[test]
    fn test_authorize_refuses_blank_credentials() {
        let mut engine = LopdfEngine::new();
        assert!(engine.authorize(&Credentials::Trial).is_ok());
        assert!(engine
            .authorize(&Credentials::from_parts(Some("me@example.com"), Some("K")))
            .is_ok());

        let blank_key = Credentials::Activation { key: "  ".to_string() };
        assert!(matches!(engine.authorize(&blank_key), Err(Error::Activation(_))));

        let no_name = Credentials::Account {
            name: String::new(),
            key: "K".to_string(),
        };
        assert!(matches!(engine.authorize(&no_name), Err(Error::Authorization(_))));
    }

    #[test]
    fn test_open_missing_file() {
        let err = LopdfEngine::new().open(Path::new("/nonexistent/in.pdf")).unwrap_err();
        assert!(matches!(err, Error::Engine { code: codes::OPEN, .. }));
    }
}
