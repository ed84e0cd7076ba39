//! Error types for the autotagging pipeline.
//!
//! Geometry problems and unknown detector labels are resolved locally and never
//! show up here. Everything in this module aborts the current document run.

/// Result type alias for autotagging operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while building or applying a tagging template.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Account authorization with the document engine failed
    #[error("Authorization failed: {0}")]
    Authorization(String),

    /// License key activation with the document engine failed
    #[error("License activation failed: {0}")]
    Activation(String),

    /// The document engine reported a failure (open, render, tag, save)
    #[error("Document engine error [{code}]: {message}")]
    Engine {
        /// Engine-specific error code
        code: i32,
        /// Engine-specific error message
        message: String,
    },

    /// The layout detector failed for a page
    #[error("Layout detection failed on page {page}: {message}")]
    Detection {
        /// 1-based page number
        page: u32,
        /// Failure description
        message: String,
    },

    /// A top-level detection came without a category label
    #[error("Detection {index} on page {page} has no category")]
    MissingCategory {
        /// 1-based page number
        page: u32,
        /// Index of the detection in the detector output
        index: usize,
    },

    /// Pages reached the assembler out of order
    #[error("Page sequencing violation: expected page {expected}, got page {found}")]
    SequencingViolation {
        /// Page number the assembler expected next
        expected: u32,
        /// Page number that was supplied
        found: u32,
    },

    /// A page was added after the template was finalized
    #[error("Document template is already finalized")]
    TemplateFinalized,

    /// Template does not satisfy the exchange-format invariants
    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    /// Template JSON could not be encoded or decoded
    #[error("Template serialization error: {0}")]
    Template(#[from] serde_json::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Operation not allowed in the orchestrator's current state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build an engine error from a code and anything printable.
    pub fn engine(code: i32, message: impl std::fmt::Display) -> Self {
        Error::Engine {
            code,
            message: message.to_string(),
        }
    }

    /// Build a detection error for a page.
    pub fn detection(page: u32, message: impl std::fmt::Display) -> Self {
        Error::Detection {
            page,
            message: message.to_string(),
        }
    }
}
