//! Detector label → structural role lookup.
//!
//! Layout models each ship their own vocabulary (PP-DocLayout, PicoDet,
//! DocLayNet, ...). The classifier keeps that knowledge in a data table so a
//! new vocabulary is a list of extra [`ClassifierRule`]s, not new branches in
//! the page builder.
//!
//! Matching is case-insensitive on the trimmed label. Exact rules win over
//! substring rules; among substring rules the first one in table order wins.
//! Unknown labels map to [`StructRole::Other`] without a hint.

use super::types::StructRole;
use serde::{Deserialize, Serialize};

/// How a rule's pattern is compared with a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    /// Whole label equals the pattern
    Exact,
    /// Label contains the pattern
    Contains,
}

/// One row of the lookup table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierRule {
    /// Lowercase pattern
    pub pattern: String,
    /// Match mode
    #[serde(rename = "match", default = "default_match_kind")]
    pub kind: MatchKind,
    /// Role assigned on match
    pub role: StructRole,
    /// Style hint assigned on match
    #[serde(default)]
    pub style_hint: Option<String>,
}

fn default_match_kind() -> MatchKind {
    MatchKind::Exact
}

impl ClassifierRule {
    /// Rule matching the whole label.
    pub fn exact(pattern: &str, role: StructRole, style_hint: Option<&str>) -> Self {
        Self {
            pattern: pattern.to_lowercase(),
            kind: MatchKind::Exact,
            role,
            style_hint: style_hint.map(str::to_string),
        }
    }

    /// Rule matching any label containing the pattern.
    pub fn contains(pattern: &str, role: StructRole, style_hint: Option<&str>) -> Self {
        Self {
            pattern: pattern.to_lowercase(),
            kind: MatchKind::Contains,
            role,
            style_hint: style_hint.map(str::to_string),
        }
    }

    fn matches(&self, label: &str) -> bool {
        match self.kind {
            MatchKind::Exact => label == self.pattern,
            MatchKind::Contains => !self.pattern.is_empty() && label.contains(&self.pattern),
        }
    }
}

/// Maps detector labels to `(role, style_hint)`.
#[derive(Debug, Clone)]
pub struct RoleClassifier {
    rules: Vec<ClassifierRule>,
}

impl RoleClassifier {
    /// Classifier with the built-in table covering PP-DocLayout style labels.
    pub fn new() -> Self {
        Self::from_rules(default_rules())
    }

    /// Classifier with a caller-supplied table replacing the built-in one.
    pub fn from_rules(rules: Vec<ClassifierRule>) -> Self {
        let rules = rules
            .into_iter()
            .map(|mut r| {
                r.pattern = r.pattern.trim().to_lowercase();
                r
            })
            .collect();
        Self { rules }
    }

    /// Add a rule. Rules added later have the lowest priority within their
    /// match kind.
    pub fn with_rule(mut self, rule: ClassifierRule) -> Self {
        self.rules.push(ClassifierRule {
            pattern: rule.pattern.trim().to_lowercase(),
            ..rule
        });
        self
    }

    /// The lookup table in priority order.
    pub fn rules(&self) -> &[ClassifierRule] {
        &self.rules
    }

    /// Classify a detector label. Never fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_autotag::structure::{RoleClassifier, StructRole};
    ///
    /// let classifier = RoleClassifier::new();
    /// assert_eq!(classifier.classify("Table"), (StructRole::Table, None));
    /// assert_eq!(
    ///     classifier.classify("doc_title"),
    ///     (StructRole::Heading, Some("H1".to_string()))
    /// );
    /// assert_eq!(classifier.classify("weird_label_123"), (StructRole::Other, None));
    /// ```
    pub fn classify(&self, category: &str) -> (StructRole, Option<String>) {
        let label = category.trim().to_lowercase();

        let hit = self
            .rules
            .iter()
            .filter(|r| r.kind == MatchKind::Exact)
            .find(|r| r.matches(&label))
            .or_else(|| {
                self.rules
                    .iter()
                    .filter(|r| r.kind == MatchKind::Contains)
                    .find(|r| r.matches(&label))
            });

        match hit {
            Some(rule) => (rule.role, rule.style_hint.clone()),
            None => {
                log::debug!("Unrecognized detector label '{}', classified as Other", category);
                (StructRole::Other, None)
            },
        }
    }
}

impl Default for RoleClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// The built-in lookup table.
pub fn default_rules() -> Vec<ClassifierRule> {
    use StructRole::*;

    let mut rules = vec![
        // Titles
        ClassifierRule::exact("doc_title", Heading, Some("H1")),
        ClassifierRule::exact("title", Heading, Some("H1")),
        ClassifierRule::exact("paragraph_title", Heading, Some("H2")),
        // Captions
        ClassifierRule::exact("figure_title", Paragraph, Some("Caption")),
        ClassifierRule::exact("table_title", Paragraph, Some("Caption")),
        ClassifierRule::exact("chart_title", Paragraph, Some("Caption")),
        ClassifierRule::exact("figure_table_chart_title", Paragraph, Some("Caption")),
        ClassifierRule::exact("caption", Paragraph, Some("Caption")),
        // Running page furniture
        ClassifierRule::exact("header", Other, Some("Artifact")),
        ClassifierRule::exact("header_image", Other, Some("Artifact")),
        ClassifierRule::exact("footer", Other, Some("Artifact")),
        ClassifierRule::exact("footer_image", Other, Some("Artifact")),
        ClassifierRule::exact("number", Other, Some("Artifact")),
        ClassifierRule::exact("footnote", Paragraph, Some("Note")),
        ClassifierRule::exact("formula_number", Other, Some("FormulaNumber")),
        ClassifierRule::exact("list", List, None),
        ClassifierRule::exact("seal", Figure, None),
    ];

    for body in [
        "text",
        "paragraph",
        "abstract",
        "content",
        "reference",
        "reference_content",
        "aside_text",
        "algorithm",
    ] {
        rules.push(ClassifierRule::exact(body, Paragraph, None));
    }

    rules.extend([
        ClassifierRule::contains("table", Table, None),
        ClassifierRule::contains("figure", Figure, None),
        ClassifierRule::contains("image", Figure, None),
        ClassifierRule::contains("chart", Figure, None),
        ClassifierRule::contains("picture", Figure, None),
        ClassifierRule::contains("formula", Formula, None),
        ClassifierRule::contains("equation", Formula, None),
        ClassifierRule::contains("title", Heading, Some("H1")),
        ClassifierRule::contains("heading", Heading, Some("H1")),
        ClassifierRule::contains("list", List, None),
        ClassifierRule::contains("text", Paragraph, None),
        ClassifierRule::contains("paragraph", Paragraph, None),
    ]);

    rules
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_vocabulary() {
        let c = RoleClassifier::new();
        assert_eq!(c.classify("table").0, StructRole::Table);
        assert_eq!(c.classify("figure").0, StructRole::Figure);
        assert_eq!(c.classify("image").0, StructRole::Figure);
        assert_eq!(c.classify("formula").0, StructRole::Formula);
        assert_eq!(c.classify("equation").0, StructRole::Formula);
        assert_eq!(c.classify("text").0, StructRole::Paragraph);
        assert_eq!(c.classify("list").0, StructRole::List);
        assert_eq!(c.classify("title"), (StructRole::Heading, Some("H1".to_string())));
    }

    #[test]
    fn test_case_and_whitespace_insensitive() {
        let c = RoleClassifier::new();
        assert_eq!(c.classify("  TABLE "), (StructRole::Table, None));
        assert_eq!(c.classify("Doc_Title"), (StructRole::Heading, Some("H1".to_string())));
    }

    #[test]
    fn test_exact_rules_beat_substring_rules() {
        let c = RoleClassifier::new();
        // "table_title" contains "table", but the exact caption rule wins
        assert_eq!(
            c.classify("table_title"),
            (StructRole::Paragraph, Some("Caption".to_string()))
        );
        assert_eq!(
            c.classify("paragraph_title"),
            (StructRole::Heading, Some("H2".to_string()))
        );
    }

    #[test]
    fn test_substring_fallback() {
        let c = RoleClassifier::new();
        assert_eq!(c.classify("display_equation").0, StructRole::Formula);
        assert_eq!(c.classify("section-heading"), (StructRole::Heading, Some("H1".to_string())));
        assert_eq!(c.classify("bordered_table").0, StructRole::Table);
    }

    #[test]
    fn test_unknown_and_empty_labels() {
        let c = RoleClassifier::new();
        assert_eq!(c.classify("weird_label_123"), (StructRole::Other, None));
        assert_eq!(c.classify(""), (StructRole::Other, None));
        assert_eq!(c.classify("cell"), (StructRole::Other, None));
    }

    #[test]
    fn test_page_furniture_is_artifact() {
        let c = RoleClassifier::new();
        assert_eq!(c.classify("header"), (StructRole::Other, Some("Artifact".to_string())));
        assert_eq!(c.classify("number"), (StructRole::Other, Some("Artifact".to_string())));
    }

    #[test]
    fn test_replaceable_table() {
        let c = RoleClassifier::from_rules(vec![ClassifierRule::exact(
            "Section-Header",
            StructRole::Heading,
            Some("H3"),
        )]);
        assert_eq!(c.classify("section-header"), (StructRole::Heading, Some("H3".to_string())));
        // Built-in vocabulary is gone
        assert_eq!(c.classify("table"), (StructRole::Other, None));
    }

    #[test]
    fn test_with_rule_extends_table() {
        let c = RoleClassifier::new().with_rule(ClassifierRule::exact(
            "Picture",
            StructRole::Figure,
            None,
        ));
        assert_eq!(c.classify("picture").0, StructRole::Figure);
        assert_eq!(c.rules().last().map(|r| r.pattern.as_str()), Some("picture"));
    }

    #[test]
    fn test_rules_deserialize_from_config_json() {
        let json = r#"[
            {"pattern": "section-header", "role": "Heading", "style_hint": "H2"},
            {"pattern": "pic", "match": "contains", "role": "Figure"}
        ]"#;
        let rules: Vec<ClassifierRule> = serde_json::from_str(json).unwrap();
        let c = RoleClassifier::from_rules(rules);
        assert_eq!(c.classify("Section-Header"), (StructRole::Heading, Some("H2".to_string())));
        assert_eq!(c.classify("big_pic_1"), (StructRole::Figure, None));
    }
}
