//! State fragment codec
//!
//! Generation parameters ride along at the end of every rendered message:
//!
//! ```text
//! <visible text>
//! ⟦loom-state:{"--num_children":5,"--max_tokens":50,"--temperature":0.7}⟧
//! ```
//!
//! Decoding never fails. Text without a fragment, or with something that only
//! looks like one, resolves to the full text plus default parameters so that
//! old messages stay resumable.

use super::generation::GenerationConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Opening delimiter of the state fragment
pub const STATE_OPEN: &str = "\u{27e6}loom-state:";
/// Closing delimiter of the state fragment
pub const STATE_CLOSE: &str = "\u{27e7}";

/// Wire form of the fields carried between steps.
///
/// Depth and name exclusion only matter on a trigger, so they are not stored.
#[derive(Debug, Serialize, Deserialize)]
struct StateFragment {
    #[serde(rename = "--num_children", default, skip_serializing_if = "Option::is_none")]
    num_children: Option<usize>,
    #[serde(rename = "--max_tokens", default, skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(rename = "--temperature", default, skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

impl StateFragment {
    fn from_config(config: &GenerationConfig) -> Self {
        Self {
            num_children: Some(config.candidate_count),
            max_tokens: Some(config.max_tokens_per_candidate),
            temperature: Some(config.temperature),
        }
    }

    /// Structural check before the body is trusted
    fn into_config(self) -> Option<GenerationConfig> {
        let defaults = GenerationConfig::default();
        let config = GenerationConfig {
            candidate_count: self.num_children.unwrap_or(defaults.candidate_count),
            max_tokens_per_candidate: self.max_tokens.unwrap_or(defaults.max_tokens_per_candidate),
            temperature: self.temperature.unwrap_or(defaults.temperature),
            ..defaults
        };
        config.is_valid().then_some(config)
    }
}

/// Result of decoding a rendered message
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedState {
    /// Message text with the fragment (and its separator) removed
    pub content: String,
    /// Parameters from the fragment, or defaults
    pub config: GenerationConfig,
    /// Whether a valid fragment was found
    pub found: bool,
}

/// Encoder/decoder for the state fragment
pub struct StateCodec;

impl StateCodec {
    /// Serialize the persisted fields into a delimited fragment
    pub fn fragment(config: &GenerationConfig) -> String {
        // Serializing a struct of plain numbers cannot fail
        let body = serde_json::to_string(&StateFragment::from_config(config)).unwrap_or_default();
        format!("{STATE_OPEN}{body}{STATE_CLOSE}")
    }

    /// Append the fragment to visible text
    pub fn encode(visible_text: &str, config: &GenerationConfig) -> String {
        format!("{}\n{}", visible_text, Self::fragment(config))
    }

    /// Split a message into content and parameters
    pub fn decode(text: &str) -> DecodedState {
        match Self::try_decode(text) {
            Some((content, config)) => DecodedState {
                content,
                config,
                found: true,
            },
            None => DecodedState {
                content: text.to_string(),
                config: GenerationConfig::default(),
                found: false,
            },
        }
    }

    fn try_decode(text: &str) -> Option<(String, GenerationConfig)> {
        let open = text.rfind(STATE_OPEN)?;
        let after_open = &text[open + STATE_OPEN.len()..];

        let Some(close) = after_open.rfind(STATE_CLOSE) else {
            debug!("State delimiter without closing marker; treating as plain text");
            return None;
        };
        if !after_open[close + STATE_CLOSE.len()..].trim().is_empty() {
            debug!("Text follows state fragment; treating as plain text");
            return None;
        }

        let body = after_open[..close].trim();
        if !body.starts_with('{') {
            return None;
        }
        let fragment: StateFragment = match serde_json::from_str(body) {
            Ok(fragment) => fragment,
            Err(e) => {
                warn!("Malformed state fragment, using defaults: {}", e);
                return None;
            }
        };
        let Some(config) = fragment.into_config() else {
            warn!("State fragment out of range, using defaults");
            return None;
        };

        let before = &text[..open];
        let content = before.strip_suffix('\n').unwrap_or(before);
        Some((content.to_string(), config))
    }
}
