//! Top-to-bottom, left-to-right reading order for detected regions.
//!
//! Works on pixel boxes, so "top" is the visual top of the rendered page
//! regardless of the page's `/Rotate`.
//!
//! Regions are first sorted by their top edge. Consecutive regions whose top
//! lies within `tolerance` of the first region of the current band share a
//! band (a visual row); a band is then read left to right. Ties fall back to
//! detection order, which makes the ordering total and deterministic.

use crate::geometry::PixelBox;
use std::cmp::Ordering;

/// Default band tolerance in pixels.
pub const DEFAULT_ROW_TOLERANCE: f32 = 2.0;

/// Compute the reading order of `boxes`.
///
/// Returns indices into `boxes`; position `k` holds the index of the region
/// read `k`-th.
///
/// # Examples
///
/// ```
/// use pdf_autotag::geometry::PixelBox;
/// use pdf_autotag::structure::reading_order::reading_order;
///
/// let boxes = [
///     PixelBox::new(50.0, 10.0, 90.0, 30.0),
///     PixelBox::new(10.0, 10.0, 40.0, 30.0),
///     PixelBox::new(10.0, 100.0, 90.0, 130.0),
/// ];
/// assert_eq!(reading_order(&boxes, 2.0), vec![1, 0, 2]);
/// ```
pub fn reading_order(boxes: &[PixelBox], tolerance: f32) -> Vec<usize> {
    let tolerance = if tolerance.is_finite() && tolerance >= 0.0 {
        tolerance
    } else {
        0.0
    };

    let mut by_top: Vec<usize> = (0..boxes.len()).collect();
    by_top.sort_by(|&a, &b| {
        top_of(&boxes[a])
            .total_cmp(&top_of(&boxes[b]))
            .then(a.cmp(&b))
    });

    let mut order = Vec::with_capacity(boxes.len());
    let mut band: Vec<usize> = Vec::new();
    let mut band_top = 0.0f32;

    for idx in by_top {
        let top = top_of(&boxes[idx]);
        if !band.is_empty() && top - band_top > tolerance {
            flush_band(&mut band, boxes, &mut order);
        }
        if band.is_empty() {
            band_top = top;
        }
        band.push(idx);
    }
    flush_band(&mut band, boxes, &mut order);

    order
}

fn flush_band(band: &mut Vec<usize>, boxes: &[PixelBox], order: &mut Vec<usize>) {
    band.sort_by(|&a, &b| compare_left(&boxes[a], &boxes[b]).then(a.cmp(&b)));
    order.append(band);
}

// Visual top of a possibly inverted box; non-finite edges sort last.
fn top_of(b: &PixelBox) -> f32 {
    let top = b.top.min(b.bottom);
    if top.is_finite() {
        top
    } else {
        f32::MAX
    }
}

fn compare_left(a: &PixelBox, b: &PixelBox) -> Ordering {
    left_of(a).total_cmp(&left_of(b))
}

fn left_of(b: &PixelBox) -> f32 {
    let left = b.left.min(b.right);
    if left.is_finite() {
        left
    } else {
        f32::MAX
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(left: f32, top: f32) -> PixelBox {
        PixelBox::new(left, top, left + 20.0, top + 10.0)
    }

    #[test]
    fn test_top_to_bottom() {
        let boxes = [at(0.0, 300.0), at(0.0, 100.0), at(0.0, 200.0)];
        assert_eq!(reading_order(&boxes, 2.0), vec![1, 2, 0]);
    }

    #[test]
    fn test_same_row_left_to_right() {
        let boxes = [at(50.0, 100.0), at(10.0, 100.0)];
        let order = reading_order(&boxes, 2.0);
        assert_eq!(order, vec![1, 0]);
    }

    #[test]
    fn test_row_tolerance_groups_near_tops() {
        // 1.5 px apart: same row, read by left edge
        let boxes = [at(200.0, 100.0), at(10.0, 101.5)];
        assert_eq!(reading_order(&boxes, 2.0), vec![1, 0]);
        // Zero tolerance separates them
        assert_eq!(reading_order(&boxes, 0.0), vec![0, 1]);
    }

    #[test]
    fn test_band_anchored_on_first_element() {
        // Tops 100, 101.5, 103: the third is 3 px below the band start
        let boxes = [at(300.0, 100.0), at(200.0, 101.5), at(10.0, 103.0)];
        assert_eq!(reading_order(&boxes, 2.0), vec![1, 0, 2]);
    }

    #[test]
    fn test_identical_boxes_keep_detection_order() {
        let boxes = [at(10.0, 10.0), at(10.0, 10.0), at(10.0, 10.0)];
        assert_eq!(reading_order(&boxes, 2.0), vec![0, 1, 2]);
    }

    #[test]
    fn test_non_finite_boxes_sort_last() {
        let boxes = [PixelBox::new(f32::NAN, f32::NAN, 1.0, 1.0), at(0.0, 0.0)];
        assert_eq!(reading_order(&boxes, 2.0), vec![1, 0]);
    }

    #[test]
    fn test_empty_input() {
        assert!(reading_order(&[], 2.0).is_empty());
    }
}
