//! Generation parameters for one branching step

use serde::Deserialize;

pub const DEFAULT_CANDIDATE_COUNT: usize = 5;
pub const DEFAULT_MAX_TOKENS: usize = 50;
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Inclusive temperature bounds accepted by completion providers
pub const TEMPERATURE_RANGE: std::ops::RangeInclusive<f64> = 0.0..=2.0;

/// Parameters used to produce one set of continuations.
///
/// Built fresh on every trigger; on a selection it is whatever the previous
/// message's state fragment says, or the defaults if it says nothing.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Number of alternative continuations to request
    pub candidate_count: usize,

    /// Token limit for each continuation
    pub max_tokens_per_candidate: usize,

    /// Sampling temperature
    pub temperature: f64,

    /// How many prior channel messages to use as the prompt (0 = message text)
    pub loom_server_depth: usize,

    /// Join history without `speaker:` labels and without a stop sequence
    pub exclude_speaker_names: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            candidate_count: DEFAULT_CANDIDATE_COUNT,
            max_tokens_per_candidate: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            loom_server_depth: 0,
            exclude_speaker_names: false,
        }
    }
}

impl GenerationConfig {
    pub fn with_candidate_count(mut self, count: usize) -> Self {
        self.candidate_count = count;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens_per_candidate = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_loom_server_depth(mut self, depth: usize) -> Self {
        self.loom_server_depth = depth;
        self
    }

    pub fn with_exclude_speaker_names(mut self, exclude: bool) -> Self {
        self.exclude_speaker_names = exclude;
        self
    }

    /// Check every field against its allowed range
    pub fn is_valid(&self) -> bool {
        self.candidate_count >= 1
            && self.max_tokens_per_candidate >= 1
            && TEMPERATURE_RANGE.contains(&self.temperature)
    }

    /// Whether two configs agree on the fields carried between steps
    pub fn same_persisted_fields(&self, other: &GenerationConfig) -> bool {
        self.candidate_count == other.candidate_count
            && self.max_tokens_per_candidate == other.max_tokens_per_candidate
            && self.temperature == other.temperature
    }
}

/// Fields explicitly set on a command line; everything else stays unset.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConfigOverrides {
    pub candidate_count: Option<usize>,
    pub max_tokens_per_candidate: Option<usize>,
    pub temperature: Option<f64>,
    pub loom_server_depth: Option<usize>,
    pub exclude_speaker_names: Option<bool>,
}

impl ConfigOverrides {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Layer the explicit fields on top of `base`
    pub fn apply(&self, base: GenerationConfig) -> GenerationConfig {
        GenerationConfig {
            candidate_count: self.candidate_count.unwrap_or(base.candidate_count),
            max_tokens_per_candidate: self
                .max_tokens_per_candidate
                .unwrap_or(base.max_tokens_per_candidate),
            temperature: self.temperature.unwrap_or(base.temperature),
            loom_server_depth: self.loom_server_depth.unwrap_or(base.loom_server_depth),
            exclude_speaker_names: self
                .exclude_speaker_names
                .unwrap_or(base.exclude_speaker_names),
        }
    }
}
