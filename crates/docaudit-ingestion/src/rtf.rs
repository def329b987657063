//! RTF to plain text conversion
//!
//! A single-pass scanner over the RTF token stream. Control words that
//! represent characters (paragraph breaks, tabs, quotes, dashes) are
//! translated; formatting words are dropped; destination groups such as
//! font and colour tables are skipped entirely.

use async_trait::async_trait;
use docaudit_core::UploadedFile;
use tracing::debug;

use crate::extractors::{decode_utf8, TextExtractor};
use crate::Result;

/// Destinations whose content is never document text
const IGNORED_DESTINATIONS: &[&str] = &[
    "annotation", "author", "bkmkend", "bkmkstart", "colortbl", "comment", "company",
    "datafield", "doccomm", "fldinst", "filetbl", "fonttbl", "footer", "footerf",
    "footerl", "footerr", "footnote", "formfield", "generator", "header", "headerf", "headerl",
    "headerr", "info", "keywords", "latentstyles", "listoverridetable", "listtable", "listtext",
    "object", "objdata", "operator", "pict", "pntext", "pntxta", "pntxtb", "private", "revtbl",
    "rsidtbl", "shp", "shpinst", "stylesheet", "subject", "template", "themedata", "title",
    "userprops", "xmlnstbl",
];

/// Text produced by character-like control words
fn special_char(word: &str) -> Option<&'static str> {
    Some(match word {
        "par" | "line" | "row" => "\n",
        "sect" | "page" => "\n\n",
        "tab" => "\t",
        "cell" | "nestcell" => "|",
        "emdash" => "\u{2014}",
        "endash" => "\u{2013}",
        "emspace" => "\u{2003}",
        "enspace" => "\u{2002}",
        "qmspace" => "\u{2005}",
        "bullet" => "\u{2022}",
        "lquote" => "\u{2018}",
        "rquote" => "\u{2019}",
        "ldblquote" => "\u{201C}",
        "rdblquote" => "\u{201D}",
        _ => return None,
    })
}

#[derive(Clone, Copy)]
struct GroupState {
    ignorable: bool,
    /// Fallback characters to skip after each `\u` escape
    unicode_skip: usize,
}

/// Convert an RTF document to plain text.
pub fn rtf_to_text(rtf: &str) -> String {
    let chars: Vec<char> = rtf.chars().collect();
    let mut out = String::new();
    let mut stack: Vec<GroupState> = Vec::new();
    let mut state = GroupState {
        ignorable: false,
        unicode_skip: 1,
    };
    // Pending fallback characters after a `\u` escape
    let mut skip = 0usize;
    let mut i = 0usize;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '{' => {
                skip = 0;
                stack.push(state);
                i += 1;
            }
            '}' => {
                skip = 0;
                state = stack.pop().unwrap_or(state);
                i += 1;
            }
            '\\' => {
                i += 1;
                let Some(&next) = chars.get(i) else { break };

                if next.is_ascii_alphabetic() {
                    let start = i;
                    while i < chars.len() && chars[i].is_ascii_alphabetic() {
                        i += 1;
                    }
                    let word: String = chars[start..i].iter().collect();

                    let arg_start = i;
                    if i < chars.len() && chars[i] == '-' {
                        i += 1;
                    }
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                    let arg: Option<i64> = if i > arg_start {
                        chars[arg_start..i].iter().collect::<String>().parse().ok()
                    } else {
                        None
                    };
                    // A single space delimits the control word
                    if i < chars.len() && chars[i] == ' ' {
                        i += 1;
                    }

                    if word == "uc" {
                        state.unicode_skip = arg.unwrap_or(1).max(0) as usize;
                    } else if IGNORED_DESTINATIONS.contains(&word.as_str()) {
                        state.ignorable = true;
                    } else if state.ignorable {
                        // nothing inside skipped destinations is text
                    } else if skip > 0 {
                        skip -= 1;
                    } else if word == "u" {
                        if let Some(code) = arg {
                            // Negative values encode code points above 32767
                            let code = if code < 0 { code + 0x10000 } else { code };
                            if let Some(ch) = u32::try_from(code).ok().and_then(char::from_u32) {
                                out.push(ch);
                            }
                            skip = state.unicode_skip;
                        }
                    } else if let Some(text) = special_char(&word) {
                        out.push_str(text);
                    }
                } else {
                    i += 1;
                    match next {
                        '*' => state.ignorable = true,
                        '\'' => {
                            let hex: String = chars.iter().skip(i).take(2).collect();
                            i += hex.chars().count();
                            if !state.ignorable {
                                if skip > 0 {
                                    skip -= 1;
                                } else if let Ok(byte) = u8::from_str_radix(&hex, 16) {
                                    let raw = [byte];
                                    let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&raw);
                                    out.push_str(&decoded);
                                }
                            }
                        }
                        '~' if !state.ignorable => out.push('\u{00A0}'),
                        '_' if !state.ignorable => out.push('\u{2011}'),
                        '\\' | '{' | '}' if !state.ignorable => {
                            if skip > 0 {
                                skip -= 1;
                            } else {
                                out.push(next);
                            }
                        }
                        // Escaped newlines are paragraph breaks
                        '\n' | '\r' if !state.ignorable => out.push('\n'),
                        _ => {}
                    }
                }
            }
            '\r' | '\n' => i += 1,
            _ => {
                if !state.ignorable {
                    if skip > 0 {
                        skip -= 1;
                    } else {
                        out.push(c);
                    }
                }
                i += 1;
            }
        }
    }

    out
}

/// Rich text extractor (`.rtf`): strict UTF-8 decode, then markup removal
#[derive(Debug, Default)]
pub struct RtfExtractor;

impl RtfExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextExtractor for RtfExtractor {
    async fn extract(&self, file: &UploadedFile) -> Result<String> {
        let source = decode_utf8(file)?;
        let text = rtf_to_text(&source);
        debug!(file = %file.name, chars = text.len(), "Extracted RTF");
        Ok(text)
    }

    fn suffix(&self) -> &'static str {
        ".rtf"
    }

    fn name(&self) -> &'static str {
        "rtf"
    }
}
