//! Command-tail argument parsing
//!
//! Flags are only recognized as a prefix of the message:
//! `--num_children 3 -t 1.1 once upon a time` sets two fields and leaves
//! `once upon a time` as content. Scanning stops at the first token that is
//! not a flag, or at a flag whose value is missing or malformed; that token
//! and everything after it is kept verbatim as text.

use crate::state::{ConfigOverrides, TEMPERATURE_RANGE};
use std::fmt;

/// What a flag expects after it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagKind {
    /// Presence alone sets the field
    Switch,
    /// One non-negative integer value
    Integer { min: usize },
    /// One floating point value
    Float,
}

/// Recognized command flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    NumChildren,
    MaxTokens,
    Temperature,
    LoomServer,
    ExcludeNames,
}

impl Flag {
    /// All flags
    pub fn all() -> &'static [Flag] {
        &[
            Flag::NumChildren,
            Flag::MaxTokens,
            Flag::Temperature,
            Flag::LoomServer,
            Flag::ExcludeNames,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Flag::NumChildren => "--num_children",
            Flag::MaxTokens => "--max_tokens",
            Flag::Temperature => "--temperature",
            Flag::LoomServer => "--loom-server",
            Flag::ExcludeNames => "--exclude-names",
        }
    }

    pub fn alias(&self) -> &'static str {
        match self {
            Flag::NumChildren => "-n",
            Flag::MaxTokens => "-m",
            Flag::Temperature => "-t",
            Flag::LoomServer => "-l",
            Flag::ExcludeNames => "-x",
        }
    }

    pub fn kind(&self) -> FlagKind {
        match self {
            Flag::NumChildren | Flag::MaxTokens => FlagKind::Integer { min: 1 },
            Flag::LoomServer => FlagKind::Integer { min: 0 },
            Flag::Temperature => FlagKind::Float,
            Flag::ExcludeNames => FlagKind::Switch,
        }
    }

    pub fn parse(token: &str) -> Option<Flag> {
        Self::all()
            .iter()
            .find(|flag| flag.name() == token || flag.alias() == token)
            .copied()
    }

    /// Parse a value token and set it on `overrides`.
    ///
    /// Returns `false` without touching `overrides` if the value does not fit.
    fn apply(&self, value: Option<&str>, overrides: &mut ConfigOverrides) -> bool {
        match self.kind() {
            FlagKind::Switch => {
                if let Flag::ExcludeNames = self {
                    overrides.exclude_speaker_names = Some(true);
                }
                true
            }
            FlagKind::Integer { min } => {
                let Some(n) = value.and_then(|v| v.parse::<usize>().ok()) else {
                    return false;
                };
                if n < min {
                    return false;
                }
                match self {
                    Flag::NumChildren => overrides.candidate_count = Some(n),
                    Flag::MaxTokens => overrides.max_tokens_per_candidate = Some(n),
                    Flag::LoomServer => overrides.loom_server_depth = Some(n),
                    _ => return false,
                }
                true
            }
            FlagKind::Float => {
                let Some(t) = value.and_then(|v| v.parse::<f64>().ok()) else {
                    return false;
                };
                if !TEMPERATURE_RANGE.contains(&t) {
                    return false;
                }
                overrides.temperature = Some(t);
                true
            }
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Parsed command result
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedCommand {
    /// Fields explicitly set by flags
    pub overrides: ConfigOverrides,
    /// Text that follows the flags, tokens rejoined with single spaces
    pub residual_text: String,
}

/// Split leading flags from free text
pub fn parse_arguments(input: &str) -> ParsedCommand {
    let parts: Vec<&str> = input.split_whitespace().collect();
    let mut overrides = ConfigOverrides::default();

    let mut index = 0;
    while index < parts.len() {
        let Some(flag) = Flag::parse(parts[index]) else {
            break;
        };
        let (value, width) = match flag.kind() {
            FlagKind::Switch => (None, 1),
            _ => (parts.get(index + 1).copied(), 2),
        };
        if !flag.apply(value, &mut overrides) {
            break;
        }
        index += width;
    }

    ParsedCommand {
        overrides,
        residual_text: parts[index..].join(" "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_then_text() {
        let parsed = parse_arguments("--num_children 3 hello world");
        assert_eq!(parsed.overrides.candidate_count, Some(3));
        assert_eq!(parsed.residual_text, "hello world");
    }

    #[test]
    fn test_malformed_value_stops_scan() {
        let parsed = parse_arguments("--num_children abc rest");
        assert_eq!(parsed.overrides.candidate_count, None);
        assert_eq!(parsed.residual_text, "--num_children abc rest");
    }

    #[test]
    fn test_missing_value_stops_scan() {
        let parsed = parse_arguments("-t 0.3 --loom-server");
        assert_eq!(parsed.overrides.temperature, Some(0.3));
        assert_eq!(parsed.overrides.loom_server_depth, None);
        assert_eq!(parsed.residual_text, "--loom-server");
    }

    #[test]
    fn test_mixed_order_and_aliases() {
        let parsed = parse_arguments("-x --max_tokens 80 -n 2 --temperature 1.5 a  b\tc");
        assert_eq!(parsed.overrides.exclude_speaker_names, Some(true));
        assert_eq!(parsed.overrides.max_tokens_per_candidate, Some(80));
        assert_eq!(parsed.overrides.candidate_count, Some(2));
        assert_eq!(parsed.overrides.temperature, Some(1.5));
        assert_eq!(parsed.residual_text, "a b c");
    }

    #[test]
    fn test_last_occurrence_wins() {
        let parsed = parse_arguments("-n 2 --num_children 4 go");
        assert_eq!(parsed.overrides.candidate_count, Some(4));
    }

    #[test]
    fn test_flags_after_text_are_literal() {
        let parsed = parse_arguments("hello --num_children 3");
        assert!(parsed.overrides.is_empty());
        assert_eq!(parsed.residual_text, "hello --num_children 3");
    }

    #[test]
    fn test_scan_stops_before_later_flags() {
        let parsed = parse_arguments("-n 0 -t 1.0 text");
        assert_eq!(parsed.overrides.candidate_count, None);
        assert_eq!(parsed.overrides.temperature, None);
        assert_eq!(parsed.residual_text, "-n 0 -t 1.0 text");
    }

    #[test]
    fn test_out_of_range_temperature() {
        let parsed = parse_arguments("--temperature 3 hi");
        assert_eq!(parsed.overrides.temperature, None);
        assert_eq!(parsed.residual_text, "--temperature 3 hi");
    }

    #[test]
    fn test_loom_server_zero_allowed() {
        let parsed = parse_arguments("--loom-server 0 text");
        assert_eq!(parsed.overrides.loom_server_depth, Some(0));
        assert_eq!(parsed.residual_text, "text");
    }

    #[test]
    fn test_empty_input() {
        let parsed = parse_arguments("   ");
        assert!(parsed.overrides.is_empty());
        assert_eq!(parsed.residual_text, "");
    }
}
