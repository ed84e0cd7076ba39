//! Detector replaying recorded layout output.
//!
//! File layout:
//!
//! ```json
//! { "pages": [ { "page_number": 1,
//!                "detections": [ { "label": "doc_title", "coordinate": [10, 20, 500, 80] } ] } ] }
//! ```

use super::LayoutDetector;
use crate::engine::RenderedPage;
use crate::error::{Error, Result};
use crate::structure::Detection;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Recorded detections for one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedPage {
    /// 1-based page number
    pub page_number: u32,
    /// Detections in detector output order
    #[serde(default)]
    pub detections: Vec<Detection>,
}

#[derive(Debug, Deserialize)]
struct Recording {
    #[serde(default)]
    pages: Vec<RecordedPage>,
}

/// Replays detections from a recording.
#[derive(Debug, Clone, Default)]
pub struct ReplayDetector {
    pages: HashMap<u32, Vec<Detection>>,
}

impl ReplayDetector {
    /// Detector over in-memory recordings.
    ///
    /// A page recorded twice keeps its last recording.
    pub fn new(pages: Vec<RecordedPage>) -> Self {
        let pages = pages
            .into_iter()
            .map(|p| (p.page_number, p.detections))
            .collect();
        Self { pages }
    }

    /// Parse a JSON recording.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let recording: Recording = serde_json::from_slice(bytes)?;
        Ok(Self::new(recording.pages))
    }

    /// Load a JSON recording from disk.
    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_json(&bytes).map_err(|e| match e {
            Error::Template(json) => {
                Error::Config(format!("invalid detections file {}: {}", path.display(), json))
            },
            other => other,
        })
    }

    /// Number of recorded pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

impl LayoutDetector for ReplayDetector {
    fn detect(&mut self, page: &RenderedPage, page_number: u32) -> Result<Vec<Detection>> {
        match self.pages.get(&page_number) {
            Some(detections) => {
                log::debug!(
                    "Replaying {} detections for page {} ({}x{} px)",
                    detections.len(),
                    page_number,
                    page.width,
                    page.height
                );
                Ok(detections.clone())
            },
            None => {
                log::warn!("No recorded detections for page {}", page_number);
                Ok(Vec::new())
            },
        }
    }

    fn name(&self) -> &str {
        "replay"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered() -> RenderedPage {
        RenderedPage {
            width: 1224,
            height: 1584,
            image: None,
        }
    }

    #[test]
    fn test_replays_recorded_page() {
        let json = br#"{"pages": [
            {"page_number": 1, "detections": [
                {"label": "doc_title", "coordinate": [10, 20, 500, 80]},
                {"label": "table", "coordinate": [10, 100, 500, 400],
                 "sub_results": [{"bbox": [10, 100, 50, 120], "content": "a"}]}
            ]},
            {"page_number": 3}
        ]}"#;
        let mut detector = ReplayDetector::from_json(json).unwrap();
        assert_eq!(detector.page_count(), 2);

        let page1 = detector.detect(&rendered(), 1).unwrap();
        assert_eq!(page1.len(), 2);
        assert_eq!(page1[0].category.as_deref(), Some("doc_title"));
        assert_eq!(page1[1].sub_results.len(), 1);

        assert!(detector.detect(&rendered(), 3).unwrap().is_empty());
    }

    #[test]
    fn test_missing_page_yields_nothing() {
        let mut detector = ReplayDetector::new(Vec::new());
        assert!(detector.detect(&rendered(), 7).unwrap().is_empty());
    }

    #[test]
    fn test_bad_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("detections.json");
        std::fs::write(&path, "[1, 2").unwrap();
        assert!(matches!(ReplayDetector::from_file(&path), Err(Error::Config(_))));
    }
}
