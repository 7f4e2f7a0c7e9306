//! Context module for Chatloom
//!
//! Measures prompts in tokens and trims them to the model's window.

mod tokenizer;
mod window;

pub use tokenizer::{BpeTokenizer, Encoding, TokenId, Tokenizer};
pub use window::{ContextWindow, DEFAULT_CONTEXT_WINDOW};
