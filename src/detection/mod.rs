//! Layout detection engines.
//!
//! A [`LayoutDetector`] looks at one rendered page and returns labelled
//! regions in image pixels. Two detectors ship with the crate:
//!
//! - [`ReplayDetector`] replays detections recorded earlier (or produced by
//!   a batch job) from a JSON file
//! - [`CommandDetector`] runs an external model program once per page

pub mod command;
pub mod replay;

pub use command::CommandDetector;
pub use replay::ReplayDetector;

use crate::engine::RenderedPage;
use crate::error::Result;
use crate::structure::Detection;

/// Produces layout detections for rendered pages.
pub trait LayoutDetector {
    /// Detect regions on `page`, which is page `page_number` (1-based).
    fn detect(&mut self, page: &RenderedPage, page_number: u32) -> Result<Vec<Detection>>;

    /// Name used in log messages.
    fn name(&self) -> &str;
}

impl<D: LayoutDetector + ?Sized> LayoutDetector for Box<D> {
    fn detect(&mut self, page: &RenderedPage, page_number: u32) -> Result<Vec<Detection>> {
        (**self).detect(page, page_number)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
