//! Token counting against a fixed BPE vocabulary

use once_cell::sync::OnceCell;
use std::sync::Arc;
use tiktoken_rs::CoreBPE;

use crate::{IngestionError, Result};

/// Encode, decode and count tokens for one vocabulary
pub trait Tokenizer: Send + Sync {
    fn encode(&self, text: &str) -> Vec<usize>;

    /// Decode tokens back to text, failing on sequences that are not valid UTF-8.
    fn decode(&self, tokens: &[usize]) -> Result<String>;

    fn count_tokens(&self, text: &str) -> usize {
        self.encode(text).len()
    }

    /// Vocabulary name, e.g. `cl100k_base`
    fn name(&self) -> &str;
}

static CL100K_BASE: OnceCell<Arc<CoreBPE>> = OnceCell::new();
static P50K_BASE: OnceCell<Arc<CoreBPE>> = OnceCell::new();
static R50K_BASE: OnceCell<Arc<CoreBPE>> = OnceCell::new();

fn shared_bpe(
    cell: &'static OnceCell<Arc<CoreBPE>>,
    init: fn() -> anyhow::Result<CoreBPE>,
) -> Result<Arc<CoreBPE>> {
    cell.get_or_try_init(|| init().map(Arc::new))
        .map(Arc::clone)
        .map_err(|e| IngestionError::TokenizerInit(e.to_string()))
}

/// Byte-pair tokenizer backed by tiktoken vocabularies.
///
/// Vocabulary tables are built once per process and shared read-only
/// between every tokenizer instance.
#[derive(Clone)]
pub struct BpeTokenizer {
    bpe: Arc<CoreBPE>,
    encoding: String,
}

impl BpeTokenizer {
    /// The `cl100k_base` vocabulary used by the inference models
    pub fn cl100k() -> Result<Self> {
        Self::for_encoding("cl100k_base")
    }

    pub fn for_encoding(encoding: &str) -> Result<Self> {
        let bpe = match encoding {
            "cl100k_base" => shared_bpe(&CL100K_BASE, tiktoken_rs::cl100k_base)?,
            "p50k_base" => shared_bpe(&P50K_BASE, tiktoken_rs::p50k_base)?,
            "r50k_base" => shared_bpe(&R50K_BASE, tiktoken_rs::r50k_base)?,
            other => {
                return Err(IngestionError::TokenizerInit(format!(
                    "Unknown encoding: {}",
                    other
                )))
            }
        };

        Ok(Self {
            bpe,
            encoding: encoding.to_string(),
        })
    }
}

impl std::fmt::Debug for BpeTokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BpeTokenizer")
            .field("encoding", &self.encoding)
            .finish()
    }
}

impl Tokenizer for BpeTokenizer {
    fn encode(&self, text: &str) -> Vec<usize> {
        self.bpe
            .encode_ordinary(text)
            .into_iter()
            .map(|rank| rank as usize)
            .collect()
    }

    /// Ids outside the vocabulary fail with [`IngestionError::TokenDecoding`].
    fn decode(&self, tokens: &[usize]) -> Result<String> {
        let ranks = tokens
            .iter()
            .map(|&token| {
                u32::try_from(token).map_err(|_| {
                    IngestionError::TokenDecoding(format!("token id {} is out of range", token))
                })
            })
            .collect::<Result<Vec<u32>>>()?;

        self.bpe
            .decode(ranks)
            .map_err(|e| IngestionError::TokenDecoding(e.to_string()))
    }

    fn name(&self) -> &str {
        &self.encoding
    }
}
