//! Geometric primitives shared by the mapper, the page builder and the engines.
//!
//! Two coordinate systems meet here:
//!
//! - **Pixel space**: the rendered page image. Origin top-left, y grows down.
//!   Detections arrive as [`PixelBox`] values in this space.
//! - **Page space**: the PDF's own user space. Origin bottom-left, y grows up.
//!   Template elements carry [`Rect`] values in this space.

pub mod mapper;
pub mod matrix;

pub use mapper::CoordinateMapper;
pub use matrix::Matrix;

use serde::{Deserialize, Serialize};

/// A 2D point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// X coordinate
    pub x: f32,
    /// Y coordinate
    pub y: f32,
}

impl Point {
    /// Create a new point.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_autotag::geometry::Point;
    ///
    /// let point = Point::new(10.0, 20.0);
    /// assert_eq!(point.x, 10.0);
    /// assert_eq!(point.y, 20.0);
    /// ```
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A rectangle in page space (PDF convention, y grows up).
///
/// Serialized as `[left, bottom, right, top]`, the layout PDF uses for
/// `/MediaBox`, `/CropBox` and `/BBox`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct Rect {
    /// Left edge x-coordinate
    pub left: f32,
    /// Bottom edge y-coordinate
    pub bottom: f32,
    /// Right edge x-coordinate
    pub right: f32,
    /// Top edge y-coordinate
    pub top: f32,
}

impl Rect {
    /// Create a rectangle from its four edges.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_autotag::geometry::Rect;
    ///
    /// let rect = Rect::new(0.0, 0.0, 612.0, 792.0);
    /// assert_eq!(rect.width(), 612.0);
    /// assert_eq!(rect.height(), 792.0);
    /// ```
    pub fn new(left: f32, bottom: f32, right: f32, top: f32) -> Self {
        Self {
            left,
            bottom,
            right,
            top,
        }
    }

    /// Create a rectangle from two arbitrary corners, normalizing edge order.
    pub fn from_corners(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            left: x0.min(x1),
            bottom: y0.min(y1),
            right: x0.max(x1),
            top: y0.max(y1),
        }
    }

    /// Width of the rectangle.
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    /// Height of the rectangle.
    pub fn height(&self) -> f32 {
        self.top - self.bottom
    }

    /// True when `left < right` and `bottom < top`.
    pub fn is_well_formed(&self) -> bool {
        self.left < self.right && self.bottom < self.top
    }

    /// Check whether `other` lies inside this rectangle (edges inclusive).
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_autotag::geometry::Rect;
    ///
    /// let page = Rect::new(0.0, 0.0, 600.0, 800.0);
    /// assert!(page.contains(&Rect::new(50.0, 50.0, 150.0, 100.0)));
    /// assert!(!page.contains(&Rect::new(550.0, 50.0, 650.0, 100.0)));
    /// ```
    pub fn contains(&self, other: &Rect) -> bool {
        other.left >= self.left
            && other.right <= self.right
            && other.bottom >= self.bottom
            && other.top <= self.top
    }
}

impl From<[f32; 4]> for Rect {
    fn from(v: [f32; 4]) -> Self {
        Rect::new(v[0], v[1], v[2], v[3])
    }
}

impl From<Rect> for [f32; 4] {
    fn from(r: Rect) -> Self {
        [r.left, r.bottom, r.right, r.top]
    }
}

/// An axis-aligned box in rendered-image pixels (origin top-left).
///
/// Serialized as `[left, top, right, bottom]`, the order layout models emit
/// (`coordinate: [x1, y1, x2, y2]`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct PixelBox {
    /// Left edge
    pub left: f32,
    /// Top edge
    pub top: f32,
    /// Right edge
    pub right: f32,
    /// Bottom edge
    pub bottom: f32,
}

impl PixelBox {
    /// Create a pixel box from its four edges.
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// The four corners, clockwise from top-left.
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.left, self.top),
            Point::new(self.right, self.top),
            Point::new(self.right, self.bottom),
            Point::new(self.left, self.bottom),
        ]
    }
}

impl From<[f32; 4]> for PixelBox {
    fn from(v: [f32; 4]) -> Self {
        PixelBox::new(v[0], v[1], v[2], v[3])
    }
}

impl From<PixelBox> for [f32; 4] {
    fn from(b: PixelBox) -> Self {
        [b.left, b.top, b.right, b.bottom]
    }
}

/// Page rotation, clockwise, as stored in a page's `/Rotate` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    /// Upright
    #[default]
    Rotate0,
    /// Quarter turn clockwise
    Rotate90,
    /// Half turn
    Rotate180,
    /// Three quarter turns clockwise
    Rotate270,
}

impl Rotation {
    /// Normalize a `/Rotate` value.
    ///
    /// Negative values and multiples of 360 wrap around. Values that are not
    /// a multiple of 90 are invalid per ISO 32000-1 and read as upright.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_autotag::geometry::Rotation;
    ///
    /// assert_eq!(Rotation::from_degrees(-90), Rotation::Rotate270);
    /// assert_eq!(Rotation::from_degrees(450), Rotation::Rotate90);
    /// ```
    pub fn from_degrees(degrees: i64) -> Self {
        match degrees.rem_euclid(360) {
            0 => Rotation::Rotate0,
            90 => Rotation::Rotate90,
            180 => Rotation::Rotate180,
            270 => Rotation::Rotate270,
            other => {
                log::warn!("Ignoring page rotation of {} degrees (not a multiple of 90)", other);
                Rotation::Rotate0
            },
        }
    }

    /// Rotation in degrees.
    pub fn degrees(&self) -> u32 {
        match self {
            Rotation::Rotate0 => 0,
            Rotation::Rotate90 => 90,
            Rotation::Rotate180 => 180,
            Rotation::Rotate270 => 270,
        }
    }

    /// True for 90 and 270, where the rendered image swaps width and height.
    pub fn swaps_axes(&self) -> bool {
        matches!(self, Rotation::Rotate90 | Rotation::Rotate270)
    }
}

/// Visible geometry of one page, as reported by the document engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    /// Visible region in page space
    pub crop_box: Rect,
    /// Page rotation
    pub rotation: Rotation,
}

impl PageGeometry {
    /// Create page geometry.
    pub fn new(crop_box: Rect, rotation: Rotation) -> Self {
        Self { crop_box, rotation }
    }

    /// Pixel dimensions of this page rendered at `zoom`.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_autotag::geometry::{PageGeometry, Rect, Rotation};
    ///
    /// let page = PageGeometry::new(Rect::new(0.0, 0.0, 600.0, 800.0), Rotation::Rotate90);
    /// assert_eq!(page.rendered_size(2.0), (1600, 1200));
    /// ```
    pub fn rendered_size(&self, zoom: f32) -> (u32, u32) {
        let w = (self.crop_box.width() * zoom).round().max(1.0) as u32;
        let h = (self.crop_box.height() * zoom).round().max(1.0) as u32;
        if self.rotation.swaps_axes() {
            (h, w)
        } else {
            (w, h)
        }
    }
}
