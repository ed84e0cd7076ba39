//! Affine transformation matrices in PDF notation `[a b c d e f]`.

use super::{Point, Rect, Rotation};

/// 2D affine transform.
///
/// Maps `(x, y)` to `(a·x + c·y + e, b·x + d·y + f)`, the convention of
/// ISO 32000-1 §8.3.3.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    /// Horizontal scaling component
    pub a: f32,
    /// Rotation/skew component
    pub b: f32,
    /// Rotation/skew component
    pub c: f32,
    /// Vertical scaling component
    pub d: f32,
    /// Horizontal translation
    pub e: f32,
    /// Vertical translation
    pub f: f32,
}

impl Matrix {
    /// Create a matrix from its six components.
    pub fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// Create an identity matrix.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_autotag::geometry::Matrix;
    ///
    /// let m = Matrix::identity();
    /// assert_eq!(m.a, 1.0);
    /// assert_eq!(m.d, 1.0);
    /// assert_eq!(m.e, 0.0);
    /// assert_eq!(m.f, 0.0);
    /// ```
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    /// Page-space to device-pixel transform for a page rendered at `zoom`.
    ///
    /// The device origin is the top-left corner of the rendered image and the
    /// page is shown turned clockwise by `rotation`, the way viewers and
    /// rasterizers display a page carrying `/Rotate`.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_autotag::geometry::{Matrix, Rect, Rotation};
    ///
    /// let crop = Rect::new(0.0, 0.0, 600.0, 800.0);
    /// let m = Matrix::device(2.0, Rotation::Rotate0, &crop);
    /// // Top-left corner of the page lands on pixel (0, 0)
    /// let p = m.transform_point(0.0, 800.0);
    /// assert_eq!((p.x, p.y), (0.0, 0.0));
    /// ```
    pub fn device(zoom: f32, rotation: Rotation, crop_box: &Rect) -> Self {
        let (w, h) = (crop_box.width(), crop_box.height());
        // Unscaled image coordinates relative to the crop origin
        let orient = match rotation {
            // (x, h - y)
            Rotation::Rotate0 => Self::new(1.0, 0.0, 0.0, -1.0, 0.0, h),
            // (y, x)
            Rotation::Rotate90 => Self::new(0.0, 1.0, 1.0, 0.0, 0.0, 0.0),
            // (w - x, y)
            Rotation::Rotate180 => Self::new(-1.0, 0.0, 0.0, 1.0, w, 0.0),
            // (h - y, w - x)
            Rotation::Rotate270 => Self::new(0.0, -1.0, -1.0, 0.0, h, w),
        };
        Self::translation(-crop_box.left, -crop_box.bottom)
            .then(&orient)
            .then(&Self::scaling(zoom, zoom))
    }

    /// Create a translation matrix.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_autotag::geometry::Matrix;
    ///
    /// let m = Matrix::translation(10.0, 20.0);
    /// let p = m.transform_point(5.0, 10.0);
    /// assert_eq!((p.x, p.y), (15.0, 30.0));
    /// ```
    pub fn translation(tx: f32, ty: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// Create a scaling matrix.
    pub fn scaling(sx: f32, sy: f32) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Concatenate: the result applies `self` first, then `other`.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_autotag::geometry::Matrix;
    ///
    /// let m = Matrix::translation(10.0, 0.0).then(&Matrix::scaling(2.0, 2.0));
    /// let p = m.transform_point(5.0, 1.0);
    /// assert_eq!((p.x, p.y), (30.0, 2.0));
    /// ```
    pub fn then(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    /// Transform a point using this matrix.
    pub fn transform_point(&self, x: f32, y: f32) -> Point {
        Point {
            x: self.a * x + self.c * y + self.e,
            y: self.b * x + self.d * y + self.f,
        }
    }

    /// Get the determinant of this matrix.
    pub fn determinant(&self) -> f32 {
        self.a * self.d - self.b * self.c
    }

    /// Check if this matrix is invertible.
    pub fn is_invertible(&self) -> bool {
        let det = self.determinant();
        det.is_finite() && det.abs() > f32::EPSILON
    }

    /// Inverse transform, or `None` for a singular matrix.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_autotag::geometry::Matrix;
    ///
    /// let m = Matrix::new(2.0, 0.0, 0.0, -2.0, 0.0, 1600.0);
    /// let inv = m.invert().unwrap();
    /// let p = inv.transform_point(0.0, 0.0);
    /// assert_eq!((p.x, p.y), (0.0, 800.0));
    /// ```
    pub fn invert(&self) -> Option<Matrix> {
        if !self.is_invertible() {
            return None;
        }
        let det = self.determinant();
        Some(Matrix {
            a: self.d / det,
            b: -self.b / det,
            c: -self.c / det,
            d: self.a / det,
            e: (self.c * self.f - self.d * self.e) / det,
            f: (self.b * self.e - self.a * self.f) / det,
        })
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}
