//! Completion provider boundary
//!
//! Transport to the model lives outside this crate; implementors map a
//! [`CompletionRequest`] onto their API and return the choices in order.

use crate::state::GenerationConfig;
use crate::{LoomError, Result};
use async_trait::async_trait;
use serde::Serialize;

/// One generation call: `n` completions of the same prompt
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    pub max_tokens: usize,
    pub n: usize,
    pub temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<String>,
}

impl CompletionRequest {
    pub fn new(model: &str, prompt: String, config: &GenerationConfig, stop: Option<String>) -> Self {
        Self {
            model: model.to_string(),
            prompt,
            max_tokens: config.max_tokens_per_candidate,
            n: config.candidate_count,
            temperature: config.temperature,
            stop,
        }
    }
}

/// Something that produces text continuations
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Return exactly `request.n` continuations, in choice order
    async fn complete(&self, request: &CompletionRequest) -> Result<Vec<String>>;
}

/// Reject responses that would leave holes in the menu
pub fn check_candidates(request: &CompletionRequest, candidates: &[String]) -> Result<()> {
    if candidates.len() != request.n {
        return Err(LoomError::ShortResponse {
            expected: request.n,
            got: candidates.len(),
        });
    }
    Ok(())
}
