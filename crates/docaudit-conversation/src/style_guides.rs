//! Style-guide library used by the audit flow

use docaudit_core::UploadedFile;
use docaudit_ingestion::{PdfExtractor, TextExtractor};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::{ConversationError, Result};

/// Every known style guide, in audit order
pub const DEFAULT_STYLE_GUIDES: [&str; 14] = [
    "accessible-and-inclusive-content_1",
    "accessible-and-inclusive-content_2",
    "referencing-and-attribution_1",
    "referencing-and-attribution_2",
    "referencing-and-attribution_3",
    "structuring-content_1",
    "structuring-content_2",
    "writing-and-designing-content_1",
    "writing-and-designing-content_2",
    "grammar-punctuation-and-conventions_1",
    "grammar-punctuation-and-conventions_2",
    "grammar-punctuation-and-conventions_3",
    "grammar-punctuation-and-conventions_4",
    "grammar-punctuation-and-conventions_5",
];

/// One loaded style guide
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleGuide {
    pub name: String,
    pub text: String,
}

/// Loads style guides from `<dir>/<name>.pdf`
pub struct StyleGuideLibrary {
    dir: PathBuf,
    extractor: Arc<dyn TextExtractor>,
}

impl StyleGuideLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            extractor: Arc::new(PdfExtractor::new()),
        }
    }

    /// Replace the PDF extractor used to read guide files
    pub fn with_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Split a comma-separated filter, ignoring blank entries
    pub fn parse_filter(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// The filter itself, or every default guide when it is empty
    pub fn resolve(filter: &[String]) -> Vec<String> {
        if filter.is_empty() {
            DEFAULT_STYLE_GUIDES.iter().map(|name| name.to_string()).collect()
        } else {
            filter.to_vec()
        }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.pdf", name))
    }

    /// Load the guides selected by `filter`, in order. Any failure is fatal.
    pub async fn load(&self, filter: &[String]) -> Result<Vec<StyleGuide>> {
        let names = Self::resolve(filter);
        info!(dir = %self.dir.display(), guides = ?names, "Loading style guides");

        let mut guides = Vec::with_capacity(names.len());
        for name in names {
            let path = self.path_for(&name);
            let failed = |reason: String| ConversationError::StyleGuide {
                name: name.clone(),
                reason,
            };

            let bytes = tokio::fs::read(&path)
                .await
                .map_err(|e| failed(format!("{}: {}", path.display(), e)))?;
            let file = UploadedFile::new(format!("{}.pdf", name), bytes);
            let text = self
                .extractor
                .extract(&file)
                .await
                .map_err(|e| failed(e.to_string()))?;

            guides.push(StyleGuide { name, text });
        }

        Ok(guides)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docaudit_ingestion::PlainTextExtractor;

    fn library(dir: &Path) -> StyleGuideLibrary {
        StyleGuideLibrary::new(dir).with_extractor(Arc::new(PlainTextExtractor::new()))
    }

    #[test]
    fn test_parse_filter() {
        assert_eq!(
            StyleGuideLibrary::parse_filter("structuring-content_1, ,referencing-and-attribution_2,"),
            vec!["structuring-content_1", "referencing-and-attribution_2"]
        );
        assert!(StyleGuideLibrary::parse_filter("").is_empty());
        assert!(StyleGuideLibrary::parse_filter(" , ").is_empty());
    }

    #[test]
    fn test_empty_filter_resolves_to_defaults() {
        let names = StyleGuideLibrary::resolve(&[]);
        assert_eq!(names.len(), 14);
        assert_eq!(names[0], "accessible-and-inclusive-content_1");
        assert_eq!(names[13], "grammar-punctuation-and-conventions_5");

        let custom = vec!["b".to_string(), "a".to_string()];
        assert_eq!(StyleGuideLibrary::resolve(&custom), custom);
    }

    #[test]
    fn test_path_for() {
        let library = StyleGuideLibrary::new("data/input");
        assert_eq!(
            library.path_for("structuring-content_1"),
            PathBuf::from("data/input/structuring-content_1.pdf")
        );
    }

    #[tokio::test]
    async fn test_load_in_filter_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.pdf"), "Guide B").unwrap();
        std::fs::write(dir.path().join("a.pdf"), "Guide A").unwrap();

        let guides = library(dir.path())
            .load(&["b".to_string(), "a".to_string()])
            .await
            .unwrap();

        assert_eq!(
            guides,
            vec![
                StyleGuide { name: "b".into(), text: "Guide B".into() },
                StyleGuide { name: "a".into(), text: "Guide A".into() },
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_guide_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.pdf"), "Guide A").unwrap();

        let err = library(dir.path())
            .load(&["a".to_string(), "missing".to_string()])
            .await
            .unwrap_err();

        match err {
            ConversationError::StyleGuide { name, .. } => assert_eq!(name, "missing"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_corrupt_pdf_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.pdf"), "not a pdf").unwrap();

        let err = StyleGuideLibrary::new(dir.path())
            .load(&["broken".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, ConversationError::StyleGuide { .. }));
    }
}
