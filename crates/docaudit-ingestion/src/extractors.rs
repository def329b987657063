//! Document Text Extractors
//!
//! One extractor per supported upload format, selected by the exact file
//! name suffix. Unknown suffixes are not an error: they degrade to the
//! [`UNKNOWN_FILE_TYPE`] text.

use async_trait::async_trait;
use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use docaudit_core::{file_suffix, UploadedFile};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::docx::DocxExtractor;
use crate::rtf::RtfExtractor;
use crate::table::TextTable;
use crate::template::TemplateStripper;
use crate::{IngestionError, Result};

/// Text used in place of content for unsupported file types
pub const UNKNOWN_FILE_TYPE: &str = "Unknown file type";

/// Result of extracting one uploaded file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    pub source_name: String,
    pub text: String,
    /// Whether the file was recognised as the boilerplate report template
    pub is_template_match: bool,
}

impl ExtractedDocument {
    pub fn new(source_name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            text: text.into(),
            is_template_match: false,
        }
    }

    pub fn template_match(mut self, matched: bool) -> Self {
        self.is_template_match = matched;
        self
    }
}

/// Trait for document text extractors
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract plain text from an uploaded file
    async fn extract(&self, file: &UploadedFile) -> Result<String>;

    /// Extract text together with the template-match flag.
    ///
    /// Only extractors that understand the report template override this.
    async fn extract_document(&self, file: &UploadedFile) -> Result<ExtractedDocument> {
        let text = self.extract(file).await?;
        Ok(ExtractedDocument::new(&file.name, text))
    }

    /// File suffix handled by this extractor, including the dot
    fn suffix(&self) -> &'static str;

    /// Get extractor name
    fn name(&self) -> &'static str;
}

/// Decode bytes as strict UTF-8, keeping any byte order mark as text.
pub(crate) fn decode_utf8<'a>(file: &'a UploadedFile) -> Result<std::borrow::Cow<'a, str>> {
    encoding_rs::UTF_8
        .decode_without_bom_handling_and_without_replacement(&file.bytes)
        .ok_or_else(|| IngestionError::format_parse(&file.name, "invalid UTF-8"))
}

/// Plain text extractor (`.txt`)
#[derive(Debug, Default)]
pub struct PlainTextExtractor;

impl PlainTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextExtractor for PlainTextExtractor {
    async fn extract(&self, file: &UploadedFile) -> Result<String> {
        let text = decode_utf8(file)?.into_owned();
        debug!(file = %file.name, size = file.bytes.len(), "Extracted plain text");
        Ok(text)
    }

    fn suffix(&self) -> &'static str {
        ".txt"
    }

    fn name(&self) -> &'static str {
        "plain_text"
    }
}

/// PDF extractor (`.pdf`)
///
/// Page texts are concatenated in page order with no page-break markers.
#[derive(Debug, Default)]
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract text from raw PDF bytes; `filename` is only used in errors.
    pub fn extract_bytes(&self, filename: &str, bytes: &[u8]) -> Result<String> {
        let document = lopdf::Document::load_mem(bytes)
            .map_err(|e| IngestionError::format_parse(filename, e))?;

        let pages = document.get_pages();
        let mut text = String::new();
        let mut unreadable = 0usize;
        for page_number in pages.keys() {
            match document.extract_text(&[*page_number]) {
                Ok(page_text) => text.push_str(&page_text),
                Err(e) => {
                    unreadable += 1;
                    warn!(file = %filename, page = *page_number, error = %e, "Skipping unreadable PDF page");
                }
            }
        }

        debug!(
            file = %filename,
            pages = pages.len(),
            unreadable,
            chars = text.len(),
            "Extracted PDF"
        );
        Ok(text)
    }
}

#[async_trait]
impl TextExtractor for PdfExtractor {
    async fn extract(&self, file: &UploadedFile) -> Result<String> {
        self.extract_bytes(&file.name, &file.bytes)
    }

    fn suffix(&self) -> &'static str {
        ".pdf"
    }

    fn name(&self) -> &'static str {
        "pdf"
    }
}

/// CSV extractor (`.csv`), first record is the header row
#[derive(Debug, Default)]
pub struct CsvExtractor;

impl CsvExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextExtractor for CsvExtractor {
    async fn extract(&self, file: &UploadedFile) -> Result<String> {
        let text = decode_utf8(file)?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| IngestionError::format_parse(&file.name, e))?
            .clone();
        let mut table = TextTable::new(headers.iter());

        for record in reader.records() {
            let record = record.map_err(|e| IngestionError::format_parse(&file.name, e))?;
            table.push_row(record.iter().map(|cell| Some(cell.to_string())));
        }

        debug!(file = %file.name, rows = table.row_count(), "Extracted CSV");
        Ok(table.render())
    }

    fn suffix(&self) -> &'static str {
        ".csv"
    }

    fn name(&self) -> &'static str {
        "csv"
    }
}

/// Spreadsheet extractor (`.xlsx`)
///
/// Every sheet is emitted in workbook order as a header line naming the
/// sheet followed by its table; the first row of each sheet is the header.
#[derive(Debug, Default)]
pub struct XlsxExtractor;

impl XlsxExtractor {
    pub fn new() -> Self {
        Self
    }

    fn cell_text(cell: &Data) -> Option<String> {
        match cell {
            Data::Empty => None,
            other => Some(other.to_string()),
        }
    }
}

#[async_trait]
impl TextExtractor for XlsxExtractor {
    async fn extract(&self, file: &UploadedFile) -> Result<String> {
        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(file.bytes.as_slice()))
            .map_err(|e| IngestionError::format_parse(&file.name, e))?;

        let mut output = String::new();
        for sheet_name in workbook.sheet_names() {
            let range = workbook
                .worksheet_range(&sheet_name)
                .map_err(|e| IngestionError::format_parse(&file.name, e))?;

            let mut rows = range.rows();
            let headers = rows
                .next()
                .map(|row| {
                    row.iter()
                        .map(|cell| Self::cell_text(cell).unwrap_or_default())
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default();

            let mut table = TextTable::new(headers);
            for row in rows {
                table.push_row(row.iter().map(Self::cell_text));
            }

            output.push_str(&format!(
                "\n\nThe Sheet: {} has the following contents:\n",
                sheet_name
            ));
            output.push_str(&table.render());
        }

        debug!(file = %file.name, chars = output.len(), "Extracted spreadsheet");
        Ok(output)
    }

    fn suffix(&self) -> &'static str {
        ".xlsx"
    }

    fn name(&self) -> &'static str {
        "xlsx"
    }
}

/// Registry of extractors keyed by file suffix
pub struct ExtractorRegistry {
    extractors: HashMap<&'static str, Arc<dyn TextExtractor>>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self {
            extractors: HashMap::new(),
        }
    }

    /// Create with the six supported formats; DOCX uploads are never
    /// checked against the report template.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(PdfExtractor::new()));
        registry.register(Arc::new(PlainTextExtractor::new()));
        registry.register(Arc::new(DocxExtractor::new()));
        registry.register(Arc::new(RtfExtractor::new()));
        registry.register(Arc::new(CsvExtractor::new()));
        registry.register(Arc::new(XlsxExtractor::new()));
        registry
    }

    /// Create with the supported formats, stripping report templates out
    /// of DOCX uploads.
    pub fn with_template_stripper(stripper: Arc<TemplateStripper>) -> Self {
        let mut registry = Self::with_defaults();
        registry.register(Arc::new(DocxExtractor::new().with_template_stripper(stripper)));
        registry
    }

    /// Register an extractor, replacing any previous one for its suffix
    pub fn register(&mut self, extractor: Arc<dyn TextExtractor>) {
        self.extractors.insert(extractor.suffix(), extractor);
    }

    /// Get extractor by exact, case-sensitive filename suffix
    pub fn get_by_filename(&self, filename: &str) -> Option<Arc<dyn TextExtractor>> {
        self.extractors.get(file_suffix(filename).as_str()).cloned()
    }

    /// Extract a file with the extractor for its suffix.
    ///
    /// Unsupported suffixes yield [`UNKNOWN_FILE_TYPE`] instead of an error.
    pub async fn extract(&self, file: &UploadedFile) -> Result<ExtractedDocument> {
        match self.get_by_filename(&file.name) {
            Some(extractor) => extractor.extract_document(file).await,
            None => {
                debug!(file = %file.name, "No extractor for file suffix");
                Ok(ExtractedDocument::new(&file.name, UNKNOWN_FILE_TYPE))
            }
        }
    }

    /// List all registered extractors
    pub fn list(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.extractors.values().map(|e| e.name()).collect();
        names.sort_unstable();
        names
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
