//! Document engine abstraction.
//!
//! A document engine opens a PDF, hands out per-page handles, renders pages
//! and finally writes a structure tree from a template. Handles that hold
//! engine resources implement [`Release`] and are wrapped in [`Scoped`] by
//! callers, so they are released on every exit path, including `?` and
//! unwinding.
//!
//! [`LopdfEngine`] is the bundled implementation.

pub mod lopdf_engine;
pub mod struct_tree;

pub use lopdf_engine::{LopdfEngine, Rasterizer};

use crate::config::Credentials;
use crate::error::Result;
use crate::geometry::{PageGeometry, Rotation};
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

/// Engine error codes used by [`LopdfEngine`] in [`crate::Error::Engine`].
pub mod codes {
    /// Document could not be opened
    pub const OPEN: i32 = 1;
    /// Page could not be acquired
    pub const PAGE: i32 = 2;
    /// Page could not be rendered
    pub const RENDER: i32 = 3;
    /// Template could not be loaded or applied
    pub const TEMPLATE: i32 = 4;
    /// Document could not be saved
    pub const SAVE: i32 = 5;
}

/// A handle holding engine resources.
pub trait Release {
    /// Give the resources back to the engine.
    ///
    /// Called exactly once by [`Scoped`]; implementations should tolerate a
    /// second call.
    fn release(&mut self);
}

/// Releases the wrapped handle when dropped.
#[derive(Debug)]
pub struct Scoped<T: Release>(T);

impl<T: Release> Scoped<T> {
    /// Take ownership of a handle.
    pub fn new(handle: T) -> Self {
        Scoped(handle)
    }
}

impl<T: Release> Deref for Scoped<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: Release> DerefMut for Scoped<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

impl<T: Release> Drop for Scoped<T> {
    fn drop(&mut self) {
        self.0.release();
    }
}

/// A rendered page image.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPage {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// PNG file, when the engine rasterized the page
    pub image: Option<PathBuf>,
}

/// Entry point of a document engine.
pub trait DocumentEngine {
    /// Open document handle
    type Document: EngineDocument;

    /// License the engine for this process.
    fn authorize(&mut self, credentials: &Credentials) -> Result<()>;

    /// Open a PDF.
    fn open(&mut self, path: &Path) -> Result<Self::Document>;
}

/// An open document.
pub trait EngineDocument: Release {
    /// Page handle
    type Page: EnginePage;

    /// Number of pages.
    fn page_count(&self) -> usize;

    /// Acquire the page at zero-based `index`.
    fn acquire_page(&self, index: usize) -> Result<Self::Page>;

    /// Drop any existing structure tree.
    fn remove_tags(&mut self) -> Result<()>;

    /// Load a serialized template for the next [`add_tags`](Self::add_tags).
    fn load_template(&mut self, template: &[u8]) -> Result<()>;

    /// Write a structure tree from the loaded template.
    fn add_tags(&mut self) -> Result<()>;

    /// Save the document to `path`.
    fn save(&mut self, path: &Path) -> Result<()>;
}

/// A page of an open document.
pub trait EnginePage: Release {
    /// Render view handle
    type View: PageView;

    /// Visible geometry of the page.
    fn geometry(&self) -> PageGeometry;

    /// Acquire a view rendering the page at `zoom` and `rotation`.
    fn acquire_view(&self, zoom: f32, rotation: Rotation) -> Result<Self::View>;
}

/// A render view of one page.
pub trait PageView: Release {
    /// Render the page.
    fn render(&self) -> Result<RenderedPage>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Handle(Rc<Cell<u32>>);

    impl Release for Handle {
        fn release(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn test_scoped_releases_on_drop() {
        let count = Rc::new(Cell::new(0));
        {
            let _h = Scoped::new(Handle(Rc::clone(&count)));
            assert_eq!(count.get(), 0);
        }
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_scoped_releases_on_early_return() {
        fn fails(count: &Rc<Cell<u32>>) -> std::result::Result<(), ()> {
            let _h = Scoped::new(Handle(Rc::clone(count)));
            let step: std::result::Result<(), ()> = Err(());
            step?;
            Ok(())
        }
        let count = Rc::new(Cell::new(0));
        assert!(fails(&count).is_err());
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_scoped_releases_in_reverse_order() {
        let order = Rc::new(std::cell::RefCell::new(Vec::new()));
        struct Named(&'static str, Rc<std::cell::RefCell<Vec<&'static str>>>);
        impl Release for Named {
            fn release(&mut self) {
                self.1.borrow_mut().push(self.0);
            }
        }
        {
            let _page = Scoped::new(Named("page", Rc::clone(&order)));
            let _view = Scoped::new(Named("view", Rc::clone(&order)));
        }
        assert_eq!(*order.borrow(), vec!["view", "page"]);
    }
}
