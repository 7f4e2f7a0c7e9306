//! Tokenizer adapter
//!
//! Token ids are only used to measure and cut text, so the adapter exposes
//! nothing but `encode`/`decode`. The BPE tables are loaded once per process
//! and shared read-only between all concurrent steps.

use crate::{LoomError, Result};
use once_cell::sync::OnceCell;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tiktoken_rs::CoreBPE;
use tracing::debug;

/// Opaque token identifier
pub type TokenId = u32;

/// Text <-> token conversion used for window measurement
pub trait Tokenizer: Send + Sync {
    fn encode(&self, text: &str) -> Vec<TokenId>;

    fn decode(&self, tokens: &[TokenId]) -> Result<String>;

    /// Count tokens without keeping them
    fn count(&self, text: &str) -> usize {
        self.encode(text).len()
    }
}

/// Named BPE encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// GPT-2 / r50k_base
    Gpt2,
    P50kBase,
    Cl100kBase,
}

impl Encoding {
    pub fn name(&self) -> &'static str {
        match self {
            Encoding::Gpt2 => "gpt2",
            Encoding::P50kBase => "p50k_base",
            Encoding::Cl100kBase => "cl100k_base",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Encoding {
    type Err = LoomError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "gpt2" | "r50k_base" => Ok(Encoding::Gpt2),
            "p50k_base" => Ok(Encoding::P50kBase),
            "cl100k_base" => Ok(Encoding::Cl100kBase),
            other => Err(LoomError::Config(format!("unknown encoding '{other}'"))),
        }
    }
}

static GPT2: OnceCell<Arc<CoreBPE>> = OnceCell::new();
static P50K: OnceCell<Arc<CoreBPE>> = OnceCell::new();
static CL100K: OnceCell<Arc<CoreBPE>> = OnceCell::new();

/// Tokenizer backed by a tiktoken BPE table
#[derive(Clone)]
pub struct BpeTokenizer {
    encoding: Encoding,
    bpe: Arc<CoreBPE>,
}

impl BpeTokenizer {
    /// Get the process-wide tokenizer for `encoding`, loading it on first use
    pub fn shared(encoding: Encoding) -> Result<Self> {
        let cell = match encoding {
            Encoding::Gpt2 => &GPT2,
            Encoding::P50kBase => &P50K,
            Encoding::Cl100kBase => &CL100K,
        };
        let bpe = cell
            .get_or_try_init(|| {
                debug!("Loading BPE table: {}", encoding);
                let bpe = match encoding {
                    Encoding::Gpt2 => tiktoken_rs::r50k_base(),
                    Encoding::P50kBase => tiktoken_rs::p50k_base(),
                    Encoding::Cl100kBase => tiktoken_rs::cl100k_base(),
                };
                bpe.map(Arc::new)
            })
            .map_err(|e: anyhow::Error| LoomError::Tokenizer(e.to_string()))?;

        Ok(Self {
            encoding,
            bpe: bpe.clone(),
        })
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }
}

impl fmt::Debug for BpeTokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BpeTokenizer")
            .field("encoding", &self.encoding)
            .finish()
    }
}

impl Tokenizer for BpeTokenizer {
    fn encode(&self, text: &str) -> Vec<TokenId> {
        self.bpe.encode_ordinary(text)
    }

    /// Decode tokens to text.
    ///
    /// A window cut from the end of a longer sequence can start inside a
    /// multi-byte character; the dangling leading tokens are dropped.
    fn decode(&self, tokens: &[TokenId]) -> Result<String> {
        let mut last_err = None;
        for skip in 0..=tokens.len() {
            match self.bpe.decode(tokens[skip..].to_vec()) {
                Ok(text) => {
                    if skip > 0 {
                        debug!("Dropped {} split leading token(s) while decoding", skip);
                    }
                    return Ok(text);
                }
                Err(e) => last_err = Some(e),
            }
        }
        Err(LoomError::Tokenizer(
            last_err
                .map(|e| e.to_string())
                .unwrap_or_else(|| "decode failed".to_string()),
        ))
    }
}
