//! Report template detection and stripping
//!
//! Users often upload the boilerplate report template with their answers
//! typed into it. Detection is a marker-phrase heuristic; stripping removes,
//! one for one, every line of the known template revisions from the upload
//! so that mostly the answers remain.

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::docx::DocxExtractor;
use crate::{IngestionError, Result};

/// Phrases that only appear in the report template
pub const TEMPLATE_MARKERS: [&str; 2] = [
    "Please fill out the following table:",
    "What was your goal or problem being solved in this Activity?",
];

/// Section headings kept in the stripped output to anchor each answer
pub const PRESERVED_HEADINGS: [&str; 9] = [
    "Company name",
    "Company postcode",
    "Project name",
    "Project start date",
    "Estimated end date",
    "1b) Project Objectives:",
    "1c) Project Activities:",
    "Step 2 – Core Activities",
    "Step 3 - Supporting Activities",
];

/// Decides whether extracted text is an instance of the report template
pub trait TemplateDetector: Send + Sync {
    fn matches(&self, text: &str) -> bool;
}

/// Matches when any of a set of phrases occurs verbatim in the text
#[derive(Debug, Clone)]
pub struct MarkerPhraseDetector {
    phrases: Vec<String>,
}

impl MarkerPhraseDetector {
    pub fn new() -> Self {
        Self::with_phrases(TEMPLATE_MARKERS)
    }

    pub fn with_phrases<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            phrases: phrases.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for MarkerPhraseDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateDetector for MarkerPhraseDetector {
    fn matches(&self, text: &str) -> bool {
        self.phrases.iter().any(|phrase| text.contains(phrase.as_str()))
    }
}

/// The removable lines of one template revision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceTemplate {
    name: String,
    lines: Vec<String>,
}

impl ReferenceTemplate {
    /// Build from extracted template text.
    ///
    /// Keeps non-empty lines, drops the second one (it carries the
    /// financial year and differs between copies), then drops one
    /// occurrence of each preserved heading.
    pub fn from_text(name: impl Into<String>, text: &str) -> Self {
        let mut lines: Vec<String> = non_empty_lines(text);

        if lines.len() > 1 {
            lines.remove(1);
        }

        for heading in PRESERVED_HEADINGS {
            remove_first(&mut lines, heading);
        }

        Self {
            name: name.into(),
            lines,
        }
    }

    /// Build from the bytes of a template DOCX
    pub fn from_docx(name: &str, bytes: &[u8]) -> Result<Self> {
        let text = DocxExtractor::new()
            .extract_bytes(name, bytes)
            .map_err(|e| IngestionError::TemplateLoad(e.to_string()))?;
        Ok(Self::from_text(name, &text))
    }

    /// Load a template DOCX from disk
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            IngestionError::TemplateLoad(format!("{}: {}", path.display(), e))
        })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let template = Self::from_docx(&name, &bytes)?;
        info!(template = %name, lines = template.lines.len(), "Loaded reference template");
        Ok(template)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

/// Strips template boilerplate out of uploads recognised by a detector
pub struct TemplateStripper {
    detector: Arc<dyn TemplateDetector>,
    references: Vec<ReferenceTemplate>,
}

impl TemplateStripper {
    /// Create with the marker-phrase detector. References are applied in
    /// order, so pass the newest revision first.
    pub fn new(references: Vec<ReferenceTemplate>) -> Self {
        Self {
            detector: Arc::new(MarkerPhraseDetector::new()),
            references,
        }
    }

    pub fn with_detector(mut self, detector: Arc<dyn TemplateDetector>) -> Self {
        self.detector = detector;
        self
    }

    pub fn matches(&self, text: &str) -> bool {
        self.detector.matches(text)
    }

    /// Remove the first occurrence of every reference line from `text`.
    ///
    /// Lines absent from the upload are skipped silently.
    pub fn strip(&self, text: &str) -> String {
        let mut lines = non_empty_lines(text);
        let before = lines.len();

        for reference in &self.references {
            for line in &reference.lines {
                remove_first(&mut lines, line);
            }
        }

        debug!(before, after = lines.len(), "Stripped template lines");
        lines.join("\n")
    }

    /// Returns the stripped text and `true` on a template match, otherwise
    /// the text unchanged and `false`.
    pub fn process(&self, text: &str) -> (String, bool) {
        if self.matches(text) {
            (self.strip(text), true)
        } else {
            (text.to_string(), false)
        }
    }
}

fn non_empty_lines(text: &str) -> Vec<String> {
    text.split('\n')
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn remove_first(lines: &mut Vec<String>, target: &str) {
    if let Some(index) = lines.iter().position(|line| line == target) {
        lines.remove(index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::test_support::build_docx;
    use pretty_assertions::assert_eq;

    const NEW_TEMPLATE: &str = "RDTI Initial Information\nFY23 Preparation\n\nCompany name\nCompany postcode\n\
        Please fill out the following table:\nProject name\nDescribe the project in plain terms.\n\
        Step 2 – Core Activities\nWhat was your goal or problem being solved in this Activity?";

    const OLD_TEMPLATE: &str = "RDTI Initial Information\nFY22 Preparation\nCompany name\n\
        Please fill out the following table:\nOutline any supporting work.\nStep 3 - Supporting Activities";

    #[test]
    fn test_marker_detection() {
        let detector = MarkerPhraseDetector::new();
        assert!(detector.matches("intro\nPlease fill out the following table:\nmore"));
        assert!(detector.matches("What was your goal or problem being solved in this Activity?"));
        assert!(!detector.matches("please fill out the following table"));
        assert!(!detector.matches(""));
    }

    #[test]
    fn test_reference_drops_year_line_and_headings() {
        let reference = ReferenceTemplate::from_text("new", NEW_TEMPLATE);
        assert_eq!(
            reference.lines(),
            &[
                "RDTI Initial Information",
                "Please fill out the following table:",
                "Describe the project in plain terms.",
                "What was your goal or problem being solved in this Activity?",
            ]
        );
    }

    #[test]
    fn test_strip_keeps_headings_and_answers() {
        let stripper = TemplateStripper::new(vec![
            ReferenceTemplate::from_text("new", NEW_TEMPLATE),
            ReferenceTemplate::from_text("old", OLD_TEMPLATE),
        ]);

        let upload = "RDTI Initial Information\nFY23 Preparation\n\nCompany name\nAcme Robotics\n\
            Please fill out the following table:\nProject name\nAutonomous sorter\n\
            Describe the project in plain terms.\nWe are building a sorter.\n\
            Outline any supporting work.\nStep 3 - Supporting Activities\nProcurement.";

        let (text, matched) = stripper.process(upload);
        assert!(matched);
        assert_eq!(
            text,
            "FY23 Preparation\nCompany name\nAcme Robotics\nProject name\nAutonomous sorter\n\
             We are building a sorter.\nStep 3 - Supporting Activities\nProcurement."
        );
    }

    #[test]
    fn test_removal_is_one_for_one() {
        let reference = ReferenceTemplate::from_text("t", "Title\nYear\nRepeat me");
        let stripper = TemplateStripper::new(vec![reference]);

        assert_eq!(stripper.strip("Repeat me\nanswer\nRepeat me"), "answer\nRepeat me");
    }

    #[test]
    fn test_stripping_template_against_itself_leaves_only_anchors() {
        let stripper = TemplateStripper::new(vec![ReferenceTemplate::from_text("new", NEW_TEMPLATE)]);
        let residual = stripper.strip(NEW_TEMPLATE);

        for line in residual.lines() {
            assert!(
                line == "FY23 Preparation" || PRESERVED_HEADINGS.contains(&line),
                "unexpected residual line: {line}"
            );
        }
    }

    #[test]
    fn test_non_matching_text_is_untouched() {
        let stripper = TemplateStripper::new(vec![ReferenceTemplate::from_text("new", NEW_TEMPLATE)]);
        let text = "RDTI Initial Information\n\nJust some notes";

        assert_eq!(stripper.process(text), (text.to_string(), false));
    }

    #[test]
    fn test_custom_detector() {
        struct Always;
        impl TemplateDetector for Always {
            fn matches(&self, _text: &str) -> bool {
                true
            }
        }

        let stripper = TemplateStripper::new(vec![ReferenceTemplate::from_text("t", "A\nB\nC")])
            .with_detector(Arc::new(Always));
        assert_eq!(stripper.process("A\nC\nD"), ("D".to_string(), true));
    }

    #[tokio::test]
    async fn test_load_template_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("template.docx");
        std::fs::write(&path, build_docx(&["Form", "FY24", "Company name", "Question one"])).unwrap();

        let reference = ReferenceTemplate::load(&path).await.unwrap();
        assert_eq!(reference.name(), "template.docx");
        assert_eq!(reference.lines(), &["Form", "Question one"]);
    }

    #[tokio::test]
    async fn test_load_missing_template() {
        let err = ReferenceTemplate::load("/nonexistent/template.docx").await.unwrap_err();
        assert!(matches!(err, IngestionError::TemplateLoad(_)));
    }
}
