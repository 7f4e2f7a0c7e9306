//! Branch state carried between steps
//!
//! Provides the generation parameter value and the codec that embeds it in
//! rendered messages.

mod codec;
mod generation;

pub use codec::{DecodedState, StateCodec, STATE_CLOSE, STATE_OPEN};
pub use generation::{
    ConfigOverrides, GenerationConfig, DEFAULT_CANDIDATE_COUNT, DEFAULT_MAX_TOKENS,
    DEFAULT_TEMPERATURE, TEMPERATURE_RANGE,
};
