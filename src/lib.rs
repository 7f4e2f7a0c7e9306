//! Chatloom - branching text-continuation controller
//!
//! Seeds a prompt from a chat message, asks a completion provider for several
//! alternative continuations, presents them as a menu and, on selection,
//! appends the chosen branch and generates again.
//! - No server-side memory: every step is rebuilt from the last rendered message
//! - Generation parameters travel inside that message as a state fragment
//! - Prompts are truncated from the front to fit the model's context window

pub mod args;
pub mod context;
pub mod controller;
pub mod dispatch;
pub mod platform;
pub mod presenter;
pub mod provider;
pub mod settings;
pub mod state;

pub use args::{parse_arguments, ParsedCommand};
pub use context::{ContextWindow, Tokenizer};
pub use controller::BranchController;
pub use dispatch::{Dispatcher, LoomEvent};
pub use platform::{ChatMessage, ChatPlatform, Render, SelectionEvent, TriggerEvent};
pub use presenter::{Menu, MenuOption};
pub use provider::{CompletionProvider, CompletionRequest};
pub use settings::LoomSettings;
pub use state::{GenerationConfig, StateCodec};

use tracing_subscriber::EnvFilter;

/// Result type for Chatloom operations
pub type Result<T> = std::result::Result<T, LoomError>;

/// Errors that can occur in Chatloom
#[derive(Debug, thiserror::Error)]
pub enum LoomError {
    #[error("Completion provider error: {0}")]
    Provider(String),

    #[error("Completion provider returned {got} candidates, expected {expected}")]
    ShortResponse { expected: usize, got: usize },

    #[error("Chat platform error: {0}")]
    Platform(String),

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Install a global `tracing` subscriber for embedding binaries.
///
/// `RUST_LOG` takes precedence; otherwise `debug` when verbose, `info` if not.
pub fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
