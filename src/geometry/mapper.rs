//! Pixel-space to page-space mapping for detector output.
//!
//! The mapper inverts the transform used to render the page, so a box drawn on
//! the rendered image lands on the same visual region of the PDF page. It
//! never fails: detection noise (inverted, empty, out-of-page or non-finite
//! boxes) is clamped into a valid rectangle inside the crop box.

use super::{Matrix, PageGeometry, PixelBox, Rect};

/// Smallest width/height, in page units, of a mapped rectangle.
pub const MIN_EXTENT: f32 = 1.0;

/// Maps detection boxes from a rendered page image into page space.
#[derive(Debug, Clone)]
pub struct CoordinateMapper {
    /// Device pixel → page space
    to_page: Matrix,
    crop_box: Rect,
}

impl CoordinateMapper {
    /// Create a mapper for a page rendered at `zoom` with its own rotation.
    ///
    /// A zoom that is not a positive finite number is replaced by `1.0`.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_autotag::geometry::{CoordinateMapper, PageGeometry, PixelBox, Rect, Rotation};
    ///
    /// let page = PageGeometry::new(Rect::new(0.0, 0.0, 600.0, 800.0), Rotation::Rotate0);
    /// let mapper = CoordinateMapper::new(2.0, &page);
    /// let rect = mapper.map(&PixelBox::new(100.0, 100.0, 200.0, 300.0));
    /// assert_eq!(rect, Rect::new(50.0, 650.0, 100.0, 750.0));
    /// ```
    pub fn new(zoom: f32, page: &PageGeometry) -> Self {
        let zoom = if zoom.is_finite() && zoom > 0.0 {
            zoom
        } else {
            log::warn!("Invalid zoom {} for coordinate mapping, using 1.0", zoom);
            1.0
        };
        let device = Matrix::device(zoom, page.rotation, &page.crop_box);
        Self::from_device_matrix(device, page.crop_box)
    }

    /// Create a mapper from an engine-supplied page → device matrix.
    ///
    /// A singular matrix cannot be inverted; the mapper then treats pixels as
    /// page units and logs a warning.
    pub fn from_device_matrix(device: Matrix, crop_box: Rect) -> Self {
        let to_page = device.invert().unwrap_or_else(|| {
            log::warn!("Device matrix {:?} is not invertible, using identity", device);
            Matrix::identity()
        });
        Self {
            to_page,
            crop_box: normalize_crop(crop_box),
        }
    }

    /// The crop box results are clamped into.
    pub fn crop_box(&self) -> &Rect {
        &self.crop_box
    }

    /// Map a pixel box into page space.
    ///
    /// The result always satisfies `left < right` and `bottom < top` and lies
    /// inside the crop box (unless the crop box itself is thinner than
    /// [`MIN_EXTENT`]).
    pub fn map(&self, bbox: &PixelBox) -> Rect {
        let crop = &self.crop_box;
        let mut xs = [0.0f32; 4];
        let mut ys = [0.0f32; 4];
        for (i, corner) in bbox.corners().iter().enumerate() {
            let p = self.to_page.transform_point(corner.x, corner.y);
            xs[i] = finite_or(p.x, crop.left);
            ys[i] = finite_or(p.y, crop.bottom);
        }

        let (left, right) = span(&xs);
        let (bottom, top) = span(&ys);

        let (left, right) = clamp_axis(left, right, crop.left, crop.right);
        let (bottom, top) = clamp_axis(bottom, top, crop.bottom, crop.top);

        Rect::new(left, bottom, right, top)
    }
}

fn normalize_crop(crop: Rect) -> Rect {
    let all_finite = [crop.left, crop.bottom, crop.right, crop.top]
        .iter()
        .all(|v| v.is_finite());
    if !all_finite {
        log::warn!("Non-finite crop box {:?}, using US Letter", crop);
        return Rect::new(0.0, 0.0, 612.0, 792.0);
    }
    Rect::from_corners(crop.left, crop.bottom, crop.right, crop.top)
}

fn finite_or(v: f32, fallback: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        fallback
    }
}

fn span(values: &[f32; 4]) -> (f32, f32) {
    let lo = values.iter().copied().fold(f32::INFINITY, f32::min);
    let hi = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    (lo, hi)
}

/// Clamp `[lo, hi]` into `[min, max]` and widen it to [`MIN_EXTENT`],
/// shifting back inside the bounds when widening crosses the upper edge.
fn clamp_axis(lo: f32, hi: f32, min: f32, max: f32) -> (f32, f32) {
    let mut lo = lo.clamp(min, max);
    let mut hi = hi.clamp(min, max);
    if hi - lo < MIN_EXTENT {
        hi = lo + MIN_EXTENT;
        if hi > max {
            hi = max;
            lo = hi - MIN_EXTENT;
        }
    }
    (lo, hi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rotation;

    fn page(rotation: Rotation) -> PageGeometry {
        PageGeometry::new(Rect::new(0.0, 0.0, 600.0, 800.0), rotation)
    }

    #[test]
    fn test_upright_page_flips_vertical_axis() {
        let mapper = CoordinateMapper::new(1.0, &page(Rotation::Rotate0));
        let rect = mapper.map(&PixelBox::new(10.0, 0.0, 110.0, 50.0));
        assert_eq!(rect, Rect::new(10.0, 750.0, 110.0, 800.0));
    }

    #[test]
    fn test_rotated_page_swaps_axes() {
        // Rendered image is 1600 x 1200 px
        let mapper = CoordinateMapper::new(2.0, &page(Rotation::Rotate90));
        let rect = mapper.map(&PixelBox::new(100.0, 100.0, 200.0, 300.0));
        assert_eq!(rect, Rect::new(50.0, 50.0, 150.0, 100.0));
    }

    #[test]
    fn test_rotate180_maps_image_origin_to_page_top_right_of_bottom() {
        let mapper = CoordinateMapper::new(1.0, &page(Rotation::Rotate180));
        let rect = mapper.map(&PixelBox::new(0.0, 0.0, 100.0, 50.0));
        assert_eq!(rect, Rect::new(500.0, 0.0, 600.0, 50.0));
    }

    #[test]
    fn test_rotate270() {
        let mapper = CoordinateMapper::new(1.0, &page(Rotation::Rotate270));
        let rect = mapper.map(&PixelBox::new(0.0, 0.0, 100.0, 50.0));
        assert_eq!(rect, Rect::new(550.0, 700.0, 600.0, 800.0));
    }

    #[test]
    fn test_crop_box_offset() {
        let cropped = PageGeometry::new(Rect::new(100.0, 100.0, 500.0, 700.0), Rotation::Rotate0);
        let mapper = CoordinateMapper::new(1.0, &cropped);
        let rect = mapper.map(&PixelBox::new(0.0, 0.0, 50.0, 50.0));
        assert_eq!(rect, Rect::new(100.0, 650.0, 150.0, 700.0));
    }

    #[test]
    fn test_degenerate_box_gets_minimum_extent() {
        let mapper = CoordinateMapper::new(2.0, &page(Rotation::Rotate0));
        let rect = mapper.map(&PixelBox::new(100.0, 100.0, 100.0, 100.0));
        assert!(rect.is_well_formed());
        assert_eq!(rect.width(), MIN_EXTENT);
        assert_eq!(rect.height(), MIN_EXTENT);
    }

    #[test]
    fn test_inverted_box_is_normalized() {
        let mapper = CoordinateMapper::new(1.0, &page(Rotation::Rotate0));
        let rect = mapper.map(&PixelBox::new(110.0, 50.0, 10.0, 0.0));
        assert_eq!(rect, Rect::new(10.0, 750.0, 110.0, 800.0));
    }

    #[test]
    fn test_box_outside_page_is_clamped_inside() {
        let mapper = CoordinateMapper::new(1.0, &page(Rotation::Rotate0));
        let rect = mapper.map(&PixelBox::new(700.0, -50.0, 900.0, -10.0));
        assert!(rect.is_well_formed());
        assert!(mapper.crop_box().contains(&rect));
        assert_eq!(rect.right, 600.0);
        assert_eq!(rect.top, 800.0);
    }

    #[test]
    fn test_non_finite_coordinates_are_clamped() {
        let mapper = CoordinateMapper::new(1.0, &page(Rotation::Rotate0));
        let rect = mapper.map(&PixelBox::new(f32::NAN, f32::INFINITY, 10.0, f32::NEG_INFINITY));
        assert!(rect.is_well_formed());
        assert!(mapper.crop_box().contains(&rect));
    }

    #[test]
    fn test_invalid_zoom_falls_back_to_one() {
        let mapper = CoordinateMapper::new(0.0, &page(Rotation::Rotate0));
        let rect = mapper.map(&PixelBox::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(rect, Rect::new(0.0, 790.0, 10.0, 800.0));
    }

    #[test]
    fn test_singular_device_matrix_falls_back_to_identity() {
        let mapper = CoordinateMapper::from_device_matrix(
            Matrix::new(0.0, 0.0, 0.0, 0.0, 0.0, 0.0),
            Rect::new(0.0, 0.0, 600.0, 800.0),
        );
        let rect = mapper.map(&PixelBox::new(10.0, 20.0, 30.0, 40.0));
        assert_eq!(rect, Rect::new(10.0, 20.0, 30.0, 40.0));
    }
}
