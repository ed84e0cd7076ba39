//! Page element builder: raw detections → one page template.
//!
//! For every detection the builder classifies the label, maps the pixel box
//! into page space and recurses into nested sub-results. Sibling lists are
//! then put into reading order and numbered.

use super::classifier::RoleClassifier;
use super::reading_order::{reading_order, DEFAULT_ROW_TOLERANCE};
use super::types::{Detection, PageElement, PageTemplate, StructRole};
use crate::config::TaggingConfig;
use crate::error::{Error, Result};
use crate::geometry::{CoordinateMapper, PageGeometry, PixelBox};

/// Default number of sub-elements kept per page.
pub const DEFAULT_MAX_SUB_ELEMENTS: usize = 1000;

/// Category assumed for nested sub-results that carry none.
const NESTED_DEFAULT_CATEGORY: &str = "cell";

/// Builds [`PageTemplate`]s from detector output.
#[derive(Debug, Clone)]
pub struct PageElementBuilder {
    classifier: RoleClassifier,
    max_sub_elements: usize,
    row_tolerance: f32,
}

/// Per-page sub-element budget.
struct Budget {
    remaining: usize,
    dropped: usize,
}

impl Budget {
    fn take(&mut self) -> bool {
        if self.remaining == 0 {
            self.dropped += 1;
            false
        } else {
            self.remaining -= 1;
            true
        }
    }
}

impl PageElementBuilder {
    /// Builder with the default classifier, cap and row tolerance.
    pub fn new() -> Self {
        Self {
            classifier: RoleClassifier::new(),
            max_sub_elements: DEFAULT_MAX_SUB_ELEMENTS,
            row_tolerance: DEFAULT_ROW_TOLERANCE,
        }
    }

    /// Builder configured from a [`TaggingConfig`].
    pub fn from_config(config: &TaggingConfig) -> Self {
        let classifier = match &config.classifier_rules {
            Some(rules) => RoleClassifier::from_rules(rules.clone()),
            None => RoleClassifier::new(),
        };
        Self::new()
            .with_classifier(classifier)
            .with_max_sub_elements(config.max_sub_elements_per_page)
            .with_row_tolerance(config.row_tolerance_px)
    }

    /// Replace the role classifier.
    pub fn with_classifier(mut self, classifier: RoleClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Set the per-page sub-element cap.
    pub fn with_max_sub_elements(mut self, max: usize) -> Self {
        self.max_sub_elements = max;
        self
    }

    /// Set the reading-order row tolerance in pixels.
    pub fn with_row_tolerance(mut self, tolerance: f32) -> Self {
        self.row_tolerance = tolerance;
        self
    }

    /// The role classifier in use.
    pub fn classifier(&self) -> &RoleClassifier {
        &self.classifier
    }

    /// Build the template for one page.
    ///
    /// `zoom` and `page` describe how the image the detections refer to was
    /// rendered.
    ///
    /// # Errors
    ///
    /// [`Error::MissingCategory`] when a top-level detection has no label.
    /// Nested sub-results without a label are treated as table cells.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_autotag::geometry::{PageGeometry, PixelBox, Rect, Rotation};
    /// use pdf_autotag::structure::{Detection, PageElementBuilder, StructRole};
    ///
    /// let page = PageGeometry::new(Rect::new(0.0, 0.0, 600.0, 800.0), Rotation::Rotate0);
    /// let detections = vec![
    ///     Detection::new("text", PixelBox::new(50.0, 10.0, 90.0, 30.0)),
    ///     Detection::new("doc_title", PixelBox::new(10.0, 10.0, 40.0, 30.0)),
    /// ];
    /// let template = PageElementBuilder::new()
    ///     .build_page(&detections, 1, 2.0, &page)
    ///     .unwrap();
    /// assert_eq!(template.elements[0].role, StructRole::Heading);
    /// assert_eq!(template.elements[1].order_index, 1);
    /// ```
    pub fn build_page(
        &self,
        detections: &[Detection],
        page_number: u32,
        zoom: f32,
        page: &PageGeometry,
    ) -> Result<PageTemplate> {
        let mapper = CoordinateMapper::new(zoom, page);
        let mut budget = Budget {
            remaining: self.max_sub_elements,
            dropped: 0,
        };

        let mut built = Vec::with_capacity(detections.len());
        for (index, detection) in detections.iter().enumerate() {
            let category = detection
                .category
                .as_deref()
                .ok_or(Error::MissingCategory {
                    page: page_number,
                    index,
                })?;
            let element = self.build_element(detection, category, false, &mapper, &mut budget);
            built.push((detection.bbox, element));
        }

        if budget.dropped > 0 {
            log::warn!(
                "Page {}: {} sub-elements over the cap of {} were dropped",
                page_number,
                budget.dropped,
                self.max_sub_elements
            );
        }

        Ok(PageTemplate {
            page_number,
            elements: self.in_reading_order(built),
            truncated: budget.dropped > 0,
        })
    }

    fn build_element(
        &self,
        detection: &Detection,
        category: &str,
        nested: bool,
        mapper: &CoordinateMapper,
        budget: &mut Budget,
    ) -> PageElement {
        let (mut role, style_hint) = self.classifier.classify(category);
        let content = detection.content.clone().filter(|c| !c.is_empty());
        if nested && role == StructRole::Other && content.is_some() {
            role = StructRole::Paragraph;
        }

        let mut children = Vec::new();
        for sub in &detection.sub_results {
            // Depth-first: a child and its own descendants are charged before
            // the next sibling, so the last-detected sub-results go first.
            if !budget.take() {
                budget.dropped += count_all(&sub.sub_results);
                continue;
            }
            let category = sub.category.as_deref().unwrap_or(NESTED_DEFAULT_CATEGORY);
            let child = self.build_element(sub, category, true, mapper, budget);
            children.push((sub.bbox, child));
        }

        PageElement {
            role,
            bbox: mapper.map(&detection.bbox),
            style_hint,
            order_index: 0,
            children: self.in_reading_order(children),
            content,
        }
    }

    fn in_reading_order(&self, items: Vec<(PixelBox, PageElement)>) -> Vec<PageElement> {
        let boxes: Vec<PixelBox> = items.iter().map(|(b, _)| *b).collect();
        let order = reading_order(&boxes, self.row_tolerance);

        let mut slots: Vec<Option<PageElement>> = items.into_iter().map(|(_, e)| Some(e)).collect();
        order
            .into_iter()
            .filter_map(|idx| slots[idx].take())
            .enumerate()
            .map(|(position, mut element)| {
                element.order_index = position;
                element
            })
            .collect()
    }
}

impl Default for PageElementBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn count_all(detections: &[Detection]) -> usize {
    detections.iter().map(|d| 1 + count_all(&d.sub_results)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Rect, Rotation};

    fn upright() -> PageGeometry {
        PageGeometry::new(Rect::new(0.0, 0.0, 600.0, 800.0), Rotation::Rotate0)
    }

    fn table_with_cells(n: usize) -> Detection {
        let cells = (0..n)
            .map(|i| {
                let row = (i / 10) as f32;
                let col = (i % 10) as f32;
                Detection {
                    category: None,
                    bbox: PixelBox::new(col * 10.0, row * 5.0, col * 10.0 + 9.0, row * 5.0 + 4.0),
                    sub_results: Vec::new(),
                    content: Some(format!("cell {}", i)),
                }
            })
            .collect();
        Detection::new("table", PixelBox::new(0.0, 0.0, 1000.0, 1000.0)).with_sub_results(cells)
    }

    #[test]
    fn test_mixed_page() {
        let detections = vec![
            Detection::new("table", PixelBox::new(10.0, 400.0, 500.0, 700.0)),
            Detection::new("doc_title", PixelBox::new(10.0, 10.0, 500.0, 60.0)),
            Detection::new("text", PixelBox::new(10.0, 100.0, 500.0, 300.0)),
        ];
        let page = PageElementBuilder::new()
            .build_page(&detections, 1, 1.0, &upright())
            .unwrap();

        let roles: Vec<_> = page.elements.iter().map(|e| e.role).collect();
        assert_eq!(roles, vec![StructRole::Heading, StructRole::Paragraph, StructRole::Table]);
        assert_eq!(page.elements[0].style_hint.as_deref(), Some("H1"));
        assert_eq!(page.elements[0].bbox, Rect::new(10.0, 740.0, 500.0, 790.0));
        for (i, e) in page.elements.iter().enumerate() {
            assert_eq!(e.order_index, i);
        }
        assert!(!page.truncated);
    }

    #[test]
    fn test_same_row_left_first() {
        let detections = vec![
            Detection::new("text", PixelBox::new(50.0, 100.0, 90.0, 120.0)),
            Detection::new("text", PixelBox::new(10.0, 100.0, 40.0, 120.0)),
        ];
        let page = PageElementBuilder::new()
            .build_page(&detections, 1, 1.0, &upright())
            .unwrap();
        assert_eq!(page.elements[0].bbox.left, 10.0);
        assert_eq!(page.elements[1].bbox.left, 50.0);
    }

    #[test]
    fn test_empty_page() {
        let page = PageElementBuilder::new()
            .build_page(&[], 4, 2.0, &upright())
            .unwrap();
        assert_eq!(page.page_number, 4);
        assert!(page.elements.is_empty());
        assert!(!page.truncated);
    }

    #[test]
    fn test_missing_top_level_category_is_an_error() {
        let detections = vec![
            Detection::new("text", PixelBox::new(0.0, 0.0, 10.0, 10.0)),
            Detection {
                category: None,
                bbox: PixelBox::new(0.0, 20.0, 10.0, 30.0),
                sub_results: Vec::new(),
                content: None,
            },
        ];
        let err = PageElementBuilder::new()
            .build_page(&detections, 3, 1.0, &upright())
            .unwrap_err();
        assert!(matches!(err, Error::MissingCategory { page: 3, index: 1 }));
    }

    #[test]
    fn test_cells_with_text_become_paragraphs() {
        let page = PageElementBuilder::new()
            .build_page(&[table_with_cells(3)], 1, 1.0, &upright())
            .unwrap();
        let table = &page.elements[0];
        assert_eq!(table.children.len(), 3);
        assert!(table.children.iter().all(|c| c.role == StructRole::Paragraph));
        assert_eq!(table.children[0].content.as_deref(), Some("cell 0"));
    }

    #[test]
    fn test_nested_without_content_stays_other() {
        let table = Detection::new("table", PixelBox::new(0.0, 0.0, 100.0, 100.0)).with_sub_results(
            vec![Detection {
                category: None,
                bbox: PixelBox::new(0.0, 0.0, 10.0, 10.0),
                sub_results: Vec::new(),
                content: Some(String::new()),
            }],
        );
        let page = PageElementBuilder::new()
            .build_page(&[table], 1, 1.0, &upright())
            .unwrap();
        assert_eq!(page.elements[0].children[0].role, StructRole::Other);
        assert!(page.elements[0].children[0].content.is_none());
    }

    #[test]
    fn test_formula_content_passes_through() {
        let formula = Detection::new("formula", PixelBox::new(0.0, 0.0, 100.0, 20.0))
            .with_content("E = mc^2");
        let page = PageElementBuilder::new()
            .build_page(&[formula], 1, 1.0, &upright())
            .unwrap();
        assert_eq!(page.elements[0].role, StructRole::Formula);
        assert_eq!(page.elements[0].content.as_deref(), Some("E = mc^2"));
    }

    #[test]
    fn test_sub_element_cap() {
        let page = PageElementBuilder::new()
            .build_page(&[table_with_cells(1200)], 1, 1.0, &upright())
            .unwrap();
        assert_eq!(page.elements.len(), 1);
        assert_eq!(page.elements[0].children.len(), 1000);
        assert!(page.truncated);
        // The first-detected cells survive
        assert!(page.elements[0]
            .children
            .iter()
            .any(|c| c.content.as_deref() == Some("cell 999")));
        assert!(!page.elements[0]
            .children
            .iter()
            .any(|c| c.content.as_deref() == Some("cell 1000")));
    }

    #[test]
    fn test_cap_is_shared_across_the_page() {
        let page = PageElementBuilder::new()
            .with_max_sub_elements(10)
            .build_page(
                &[table_with_cells(6), table_with_cells(6)],
                1,
                1.0,
                &upright(),
            )
            .unwrap();
        assert_eq!(page.sub_element_count(), 10);
        assert!(page.truncated);
    }

    #[test]
    fn test_cap_exactly_reached_is_not_truncated() {
        let page = PageElementBuilder::new()
            .with_max_sub_elements(5)
            .build_page(&[table_with_cells(5)], 1, 1.0, &upright())
            .unwrap();
        assert_eq!(page.sub_element_count(), 5);
        assert!(!page.truncated);
    }

    #[test]
    fn test_from_config_uses_custom_rules() {
        let config = TaggingConfig::default().with_classifier_rules(vec![
            crate::structure::ClassifierRule::exact("blurb", StructRole::Paragraph, None),
        ]);
        let builder = PageElementBuilder::from_config(&config);
        assert_eq!(builder.classifier().classify("blurb").0, StructRole::Paragraph);
        assert_eq!(builder.classifier().classify("table").0, StructRole::Other);
    }
}
