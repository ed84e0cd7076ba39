//! Configuration for tagging runs.

use crate::error::{Error, Result};
use crate::structure::ClassifierRule;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Integration descriptor shipped with the crate, printed by `autotag config`.
pub const INTEGRATION_CONFIG: &str = include_str!("../config.json");

/// Tagging run configuration.
///
/// Every field has a default, so a config file only needs the values it
/// changes:
///
/// ```
/// use pdf_autotag::config::TaggingConfig;
///
/// let config: TaggingConfig = serde_json::from_str(r#"{"zoom": 1.5}"#).unwrap();
/// assert_eq!(config.zoom, 1.5);
/// assert_eq!(config.model, "PP-DocLayout-L");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaggingConfig {
    /// Layout model identifier, recorded in the template
    pub model: String,

    /// Render zoom factor (1.0 = 72 dpi)
    pub zoom: f32,

    /// Maximum nested sub-elements kept per page.
    pub max_sub_elements_per_page: usize,

    /// Reading-order row tolerance, in rendered pixels
    pub row_tolerance_px: f32,

    /// Where to dump the pretty-printed template of each document
    pub template_dir: Option<PathBuf>,

    /// Replacement for the built-in classifier table
    pub classifier_rules: Option<Vec<ClassifierRule>>,
}

impl Default for TaggingConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TaggingConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self {
            model: "PP-DocLayout-L".to_string(),
            zoom: 2.0,
            max_sub_elements_per_page: crate::structure::builder::DEFAULT_MAX_SUB_ELEMENTS,
            row_tolerance_px: crate::structure::reading_order::DEFAULT_ROW_TOLERANCE,
            template_dir: None,
            classifier_rules: None,
        }
    }

    /// Load a JSON configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        serde_json::from_slice(&bytes)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Set the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the render zoom.
    pub fn with_zoom(mut self, zoom: f32) -> Self {
        self.zoom = zoom;
        self
    }

    /// Set the per-page sub-element cap.
    pub fn with_max_sub_elements(mut self, max: usize) -> Self {
        self.max_sub_elements_per_page = max;
        self
    }

    /// Set the reading-order row tolerance.
    pub fn with_row_tolerance(mut self, tolerance: f32) -> Self {
        self.row_tolerance_px = tolerance;
        self
    }

    /// Dump templates into `dir`.
    pub fn with_template_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.template_dir = Some(dir.into());
        self
    }

    /// Replace the classifier table.
    pub fn with_classifier_rules(mut self, rules: Vec<ClassifierRule>) -> Self {
        self.classifier_rules = Some(rules);
        self
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !(self.zoom.is_finite() && self.zoom > 0.0) {
            return Err(Error::Config(format!("zoom must be a positive number, got {}", self.zoom)));
        }
        if self.max_sub_elements_per_page == 0 {
            return Err(Error::Config("max_sub_elements_per_page must be at least 1".to_string()));
        }
        if !(self.row_tolerance_px.is_finite() && self.row_tolerance_px >= 0.0) {
            return Err(Error::Config(format!(
                "row_tolerance_px must be zero or positive, got {}",
                self.row_tolerance_px
            )));
        }
        if self.model.trim().is_empty() {
            return Err(Error::Config("model must not be empty".to_string()));
        }
        Ok(())
    }
}

/// How the document engine is licensed for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Account authorization with name and key
    Account {
        /// Account name (usually an e-mail)
        name: String,
        /// License key
        key: String,
    },
    /// Standalone key activation
    Activation {
        /// License key
        key: String,
    },
    /// No license; the engine runs in trial mode
    Trial,
}

impl Credentials {
    /// Pick the credential kind from optional name and key.
    ///
    /// Empty strings count as absent. A name without a key is a trial.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_autotag::config::Credentials;
    ///
    /// assert_eq!(Credentials::from_parts(None, None), Credentials::Trial);
    /// assert_eq!(
    ///     Credentials::from_parts(None, Some("K")),
    ///     Credentials::Activation { key: "K".to_string() }
    /// );
    /// ```
    pub fn from_parts(name: Option<&str>, key: Option<&str>) -> Self {
        let name = name.map(str::trim).filter(|s| !s.is_empty());
        let key = key.map(str::trim).filter(|s| !s.is_empty());
        match (name, key) {
            (Some(name), Some(key)) => Credentials::Account {
                name: name.to_string(),
                key: key.to_string(),
            },
            (None, Some(key)) => Credentials::Activation {
                key: key.to_string(),
            },
            (_, None) => Credentials::Trial,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TaggingConfig::default();
        assert_eq!(config.model, "PP-DocLayout-L");
        assert_eq!(config.zoom, 2.0);
        assert_eq!(config.max_sub_elements_per_page, 1000);
        assert_eq!(config.row_tolerance_px, 2.0);
        assert!(config.template_dir.is_none());
        assert!(config.classifier_rules.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_methods() {
        let config = TaggingConfig::new()
            .with_model("PP-DocLayout-S")
            .with_zoom(3.0)
            .with_max_sub_elements(10)
            .with_row_tolerance(0.0)
            .with_template_dir("/tmp/templates");
        assert_eq!(config.model, "PP-DocLayout-S");
        assert_eq!(config.zoom, 3.0);
        assert_eq!(config.max_sub_elements_per_page, 10);
        assert_eq!(config.template_dir, Some(PathBuf::from("/tmp/templates")));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(TaggingConfig::new().with_zoom(0.0).validate().is_err());
        assert!(TaggingConfig::new().with_zoom(-1.0).validate().is_err());
        assert!(TaggingConfig::new().with_zoom(f32::NAN).validate().is_err());
        assert!(TaggingConfig::new().with_max_sub_elements(0).validate().is_err());
        assert!(TaggingConfig::new().with_row_tolerance(-0.5).validate().is_err());
        assert!(TaggingConfig::new().with_model("  ").validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("autotag.json");
        std::fs::write(
            &path,
            r#"{"model": "custom", "classifier_rules": [{"pattern": "x", "role": "Figure"}]}"#,
        )
        .unwrap();
        let config = TaggingConfig::from_file(&path).unwrap();
        assert_eq!(config.model, "custom");
        assert_eq!(config.zoom, 2.0);
        assert_eq!(config.classifier_rules.map(|r| r.len()), Some(1));
    }

    #[test]
    fn test_from_file_reports_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{zoom: }").unwrap();
        assert!(matches!(TaggingConfig::from_file(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_credentials_from_parts() {
        assert_eq!(
            Credentials::from_parts(Some("me@example.com"), Some("K")),
            Credentials::Account {
                name: "me@example.com".to_string(),
                key: "K".to_string()
            }
        );
        assert_eq!(Credentials::from_parts(Some(""), Some("K")), Credentials::Activation {
            key: "K".to_string()
        });
        assert_eq!(Credentials::from_parts(Some("me"), None), Credentials::Trial);
        assert_eq!(Credentials::from_parts(Some(""), Some("")), Credentials::Trial);
    }

    #[test]
    fn test_integration_config_is_json() {
        let value: serde_json::Value = serde_json::from_str(INTEGRATION_CONFIG).unwrap();
        assert!(value["actions"].as_array().is_some_and(|a| !a.is_empty()));
    }
}
