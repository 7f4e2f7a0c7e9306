//! Context window assembly
//!
//! Keeps the most recent part of the prompt. For a continuation task the
//! trailing text matters most, so overflow is cut from the front.

use super::tokenizer::Tokenizer;
use crate::Result;
use tracing::debug;

/// Default model context window (in tokens)
pub const DEFAULT_CONTEXT_WINDOW: usize = 8_000;

/// A prompt that fits the token budget
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextWindow {
    /// Text to send to the provider
    pub text: String,
    /// Tokens used by `text` (exactly the budget when truncated)
    pub tokens: usize,
    /// Whether leading text was dropped
    pub truncated: bool,
}

impl ContextWindow {
    /// Token budget left for the prompt once the completion is reserved
    pub fn budget(context_window: usize, max_tokens_per_candidate: usize) -> usize {
        context_window.saturating_sub(max_tokens_per_candidate)
    }

    /// Fit `text` into `budget` tokens, keeping the tail
    pub fn assemble(text: &str, budget: usize, tokenizer: &dyn Tokenizer) -> Result<Self> {
        let tokens = tokenizer.encode(text);
        if tokens.len() <= budget {
            return Ok(Self {
                text: text.to_string(),
                tokens: tokens.len(),
                truncated: false,
            });
        }

        debug!(
            "Truncating prompt from {} to {} tokens",
            tokens.len(),
            budget
        );
        let tail = &tokens[tokens.len() - budget..];
        Ok(Self {
            text: tokenizer.decode(tail)?,
            tokens: budget,
            truncated: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tokenizer::{BpeTokenizer, Encoding, TokenId};

    /// One token per character, so budgets are easy to reason about
    struct CharTokenizer;

    impl Tokenizer for CharTokenizer {
        fn encode(&self, text: &str) -> Vec<TokenId> {
            text.chars().map(|c| c as TokenId).collect()
        }

        fn decode(&self, tokens: &[TokenId]) -> Result<String> {
            Ok(tokens.iter().filter_map(|t| char::from_u32(*t)).collect())
        }
    }

    #[test]
    fn test_budget_shrinks_with_completion_length() {
        assert_eq!(ContextWindow::budget(8000, 50), 7950);
        assert_eq!(ContextWindow::budget(8000, 500), 7500);
        assert_eq!(ContextWindow::budget(100, 500), 0);
    }

    #[test]
    fn test_fits_unchanged() {
        let window = ContextWindow::assemble("hello", 5, &CharTokenizer).unwrap();
        assert_eq!(window.text, "hello");
        assert_eq!(window.tokens, 5);
        assert!(!window.truncated);
    }

    #[test]
    fn test_keeps_tail() {
        let window = ContextWindow::assemble("hello world", 5, &CharTokenizer).unwrap();
        assert_eq!(window.text, "world");
        assert_eq!(window.tokens, 5);
        assert!(window.truncated);
    }

    #[test]
    fn test_zero_budget() {
        let window = ContextWindow::assemble("abc", 0, &CharTokenizer).unwrap();
        assert_eq!(window.text, "");
        assert_eq!(window.tokens, 0);
    }

    #[test]
    fn test_bpe_truncation_reports_budget() {
        let tokenizer = BpeTokenizer::shared(Encoding::Gpt2).unwrap();
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(50);
        let total = tokenizer.count(&text);

        let window = ContextWindow::assemble(&text, 20, &tokenizer).unwrap();
        assert_eq!(window.tokens, 20);
        assert!(text.ends_with(&window.text));

        let whole = ContextWindow::assemble(&text, total, &tokenizer).unwrap();
        assert_eq!(whole.text, text);
        assert_eq!(whole.tokens, total);
    }
}
