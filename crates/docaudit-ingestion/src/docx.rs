//! DOCX text extraction
//!
//! Produces the same layout as the common `docx2txt` approach: every
//! paragraph is preceded by a blank line, tabs and breaks are kept, header
//! parts come before the body and footer parts after it, and the result is
//! trimmed.

use async_trait::async_trait;
use docaudit_core::UploadedFile;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::{Cursor, Read};
use std::sync::Arc;
use tracing::{debug, info};

use crate::extractors::{ExtractedDocument, TextExtractor};
use crate::template::TemplateStripper;
use crate::{IngestionError, Result};

const DOCUMENT_PART: &str = "word/document.xml";

/// Word document extractor (`.docx`)
#[derive(Default)]
pub struct DocxExtractor {
    stripper: Option<Arc<TemplateStripper>>,
}

impl DocxExtractor {
    pub fn new() -> Self {
        Self { stripper: None }
    }

    /// Check extracted text against the report template and strip it on a match.
    pub fn with_template_stripper(mut self, stripper: Arc<TemplateStripper>) -> Self {
        self.stripper = Some(stripper);
        self
    }

    /// Extract text from raw DOCX bytes; `filename` is only used in errors.
    pub fn extract_bytes(&self, filename: &str, bytes: &[u8]) -> Result<String> {
        let parse_err = |e: &dyn std::fmt::Display| IngestionError::format_parse(filename, e);

        let mut archive =
            zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| parse_err(&e))?;

        let mut headers = Vec::new();
        let mut footers = Vec::new();
        for index in 0..archive.len() {
            let entry = archive.by_index(index).map_err(|e| parse_err(&e))?;
            let name = entry.name().to_string();
            if is_numbered_part(&name, "word/header") {
                headers.push(name);
            } else if is_numbered_part(&name, "word/footer") {
                footers.push(name);
            }
        }

        let mut text = String::new();
        for part in headers
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(DOCUMENT_PART))
            .chain(footers.iter().map(String::as_str))
        {
            let mut xml = String::new();
            archive
                .by_name(part)
                .map_err(|e| parse_err(&e))?
                .read_to_string(&mut xml)
                .map_err(|e| parse_err(&e))?;
            xml_to_text(&xml, &mut text).map_err(|e| parse_err(&e))?;
        }

        Ok(text.trim().to_string())
    }
}

/// `word/header.xml`, `word/header1.xml`, ... but not `word/header1.xml.rels`
fn is_numbered_part(name: &str, prefix: &str) -> bool {
    name.strip_prefix(prefix)
        .and_then(|rest| rest.strip_suffix(".xml"))
        .map(|digits| digits.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}

fn is_tag(element: &BytesStart<'_>, tag: &[u8]) -> bool {
    element.name().as_ref() == tag
}

/// Append the text content of one WordprocessingML part to `out`.
fn xml_to_text(xml: &str, out: &mut String) -> std::result::Result<(), quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut in_text_run = false;
    // Tab stop definitions live under <w:tabs> and are not content
    let mut tab_stop_depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if is_tag(&e, b"w:p") {
                    out.push_str("\n\n");
                } else if is_tag(&e, b"w:t") {
                    in_text_run = true;
                } else if is_tag(&e, b"w:tabs") {
                    tab_stop_depth += 1;
                } else if is_tag(&e, b"w:tab") && tab_stop_depth == 0 {
                    out.push('\t');
                } else if is_tag(&e, b"w:br") || is_tag(&e, b"w:cr") {
                    out.push('\n');
                }
            }
            Event::Empty(e) => {
                if is_tag(&e, b"w:p") {
                    out.push_str("\n\n");
                } else if is_tag(&e, b"w:tab") && tab_stop_depth == 0 {
                    out.push('\t');
                } else if is_tag(&e, b"w:br") || is_tag(&e, b"w:cr") {
                    out.push('\n');
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text_run = false,
                b"w:tabs" => tab_stop_depth = tab_stop_depth.saturating_sub(1),
                _ => {}
            },
            Event::Text(t) if in_text_run => out.push_str(&t.unescape()?),
            Event::CData(t) if in_text_run => out.push_str(&String::from_utf8_lossy(&t)),
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(())
}

#[async_trait]
impl TextExtractor for DocxExtractor {
    async fn extract(&self, file: &UploadedFile) -> Result<String> {
        let text = self.extract_bytes(&file.name, &file.bytes)?;
        debug!(file = %file.name, chars = text.len(), "Extracted DOCX");
        Ok(text)
    }

    async fn extract_document(&self, file: &UploadedFile) -> Result<ExtractedDocument> {
        let text = self.extract(file).await?;

        match &self.stripper {
            Some(stripper) => {
                let (text, matched) = stripper.process(&text);
                if matched {
                    info!(file = %file.name, "Upload matches the report template, stripped boilerplate");
                }
                Ok(ExtractedDocument::new(&file.name, text).template_match(matched))
            }
            None => Ok(ExtractedDocument::new(&file.name, text)),
        }
    }

    fn suffix(&self) -> &'static str {
        ".docx"
    }

    fn name(&self) -> &'static str {
        "docx"
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::template::ReferenceTemplate;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_paragraphs_are_separated_by_blank_lines() {
        let extractor = DocxExtractor::new();
        let file = UploadedFile::new("memo.docx", build_docx(&["First", "Second & third"]));

        let text = extractor.extract(&file).await.unwrap();
        assert_eq!(text, "First\n\nSecond & third");
    }

    #[test]
    fn test_tabs_breaks_and_tab_stops() {
        let xml = r#"<w:document xmlns:w="x"><w:body>
            <w:p><w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs></w:pPr>
              <w:r><w:t>Name</w:t><w:tab/><w:t>Value</w:t><w:br/><w:t>Next</w:t></w:r></w:p>
            <w:p/>
        </w:body></w:document>"#;

        let mut out = String::new();
        xml_to_text(xml, &mut out).unwrap();
        assert_eq!(out, "\n\nName\tValue\nNext\n\n");
    }

    #[test]
    fn test_whitespace_between_elements_is_ignored() {
        let xml = "<w:body>\n  <w:p>\n    <w:r><w:t> spaced </w:t></w:r>\n  </w:p>\n</w:body>";
        let mut out = String::new();
        xml_to_text(xml, &mut out).unwrap();
        assert_eq!(out, "\n\n spaced ");
    }

    #[tokio::test]
    async fn test_header_and_footer_parts() {
        let extractor = DocxExtractor::new();
        let bytes = build_parts(&[
            ("word/footer1.xml", body_xml(&["Page footer"])),
            ("word/document.xml", body_xml(&["Body"])),
            ("word/header1.xml", body_xml(&["Page header"])),
            ("word/_rels/header1.xml.rels", "<Relationships/>".to_string()),
        ]);

        let text = extractor.extract(&UploadedFile::new("x.docx", bytes)).await.unwrap();
        assert_eq!(text, "Page header\n\nBody\n\nPage footer");
    }

    #[tokio::test]
    async fn test_not_a_zip_archive() {
        let extractor = DocxExtractor::new();
        let err = extractor
            .extract(&UploadedFile::new("fake.docx", b"plain text".to_vec()))
            .await
            .unwrap_err();
        assert!(matches!(err, IngestionError::FormatParse { ref filename, .. } if filename == "fake.docx"));
    }

    #[tokio::test]
    async fn test_missing_document_part() {
        let extractor = DocxExtractor::new();
        let bytes = build_parts(&[("word/styles.xml", "<w:styles/>".to_string())]);
        assert!(extractor.extract(&UploadedFile::new("empty.docx", bytes)).await.is_err());
    }

    #[tokio::test]
    async fn test_template_flag_follows_stripper() {
        let reference = ReferenceTemplate::from_text(
            "new",
            "Report Form\nFY23\nPlease fill out the following table:\nCompany name\nExplain here.",
        );
        let stripper = Arc::new(TemplateStripper::new(vec![reference]));
        let extractor = DocxExtractor::new().with_template_stripper(stripper);

        let filled = UploadedFile::new(
            "filled.docx",
            build_docx(&["Report Form", "Please fill out the following table:", "Company name", "Acme Pty Ltd"]),
        );
        let document = extractor.extract_document(&filled).await.unwrap();
        assert!(document.is_template_match);
        assert_eq!(document.text, "Company name\nAcme Pty Ltd");

        let plain = UploadedFile::new("plain.docx", build_docx(&["Just a memo"]));
        let document = extractor.extract_document(&plain).await.unwrap();
        assert!(!document.is_template_match);
        assert_eq!(document.text, "Just a memo");
    }
}
