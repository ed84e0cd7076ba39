//! Detector running an external layout model program.
//!
//! The program is called once per page as
//!
//! ```text
//! <program> [extra args...] --image <page.png> --model <model> --page <n>
//! ```
//!
//! and must print a JSON array of detections on stdout. PaddleX layout output
//! (`label`, `coordinate`, extra fields) is accepted unchanged.

use super::LayoutDetector;
use crate::engine::RenderedPage;
use crate::error::{Error, Result};
use crate::structure::Detection;
use std::path::PathBuf;
use std::process::Command;

/// Runs a model program per page.
#[derive(Debug, Clone)]
pub struct CommandDetector {
    program: PathBuf,
    args: Vec<String>,
    model: String,
}

impl CommandDetector {
    /// Detector invoking `program` with `model`.
    pub fn new(program: impl Into<PathBuf>, model: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            model: model.into(),
        }
    }

    /// Extra arguments placed before the per-page ones.
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }
}

impl LayoutDetector for CommandDetector {
    fn detect(&mut self, page: &RenderedPage, page_number: u32) -> Result<Vec<Detection>> {
        let image = page.image.as_ref().ok_or_else(|| {
            Error::detection(
                page_number,
                "no page image to run the model on; configure a rasterizer",
            )
        })?;

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg("--image")
            .arg(image)
            .arg("--model")
            .arg(&self.model)
            .arg("--page")
            .arg(page_number.to_string())
            .output()
            .map_err(|e| {
                Error::detection(
                    page_number,
                    format!("failed to invoke {}: {}", self.program.display(), e),
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::detection(
                page_number,
                format!("{} exited with {}: {}", self.program.display(), output.status, stderr.trim()),
            ));
        }

        let detections: Vec<Detection> = serde_json::from_slice(&output.stdout).map_err(|e| {
            Error::detection(page_number, format!("unparsable detector output: {}", e))
        })?;
        log::debug!("{} detections on page {}", detections.len(), page_number);
        Ok(detections)
    }

    fn name(&self) -> &str {
        &self.model
    }
}
