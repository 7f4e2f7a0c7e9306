//! Settings for Chatloom, read from `config.toml`
//!
//! Resolution of the settings directory:
//!   1. `LOOM_HOME` environment variable
//!   2. `<config dir>/chatloom` (e.g. `~/.config/chatloom`)
//!
//! A missing file means defaults. A file that exists but does not parse is an
//! error, so typos do not silently fall back.

use crate::context::{Encoding, DEFAULT_CONTEXT_WINDOW};
use crate::platform::PLAIN_TEXT_EXTENSION;
use crate::state::GenerationConfig;
use crate::{LoomError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

const DEFAULT_ENCODING: &str = "gpt2";
/// Hard size limit of one rendered message (characters)
const DEFAULT_RENDER_LIMIT: usize = 2000;
const DEFAULT_ATTACHMENT_NAME: &str = "response.txt";
const DEFAULT_MODEL: &str = "code-davinci-002";

/// Settings for the branch controller
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoomSettings {
    /// Model context window in tokens
    pub context_window: usize,

    /// Tokenizer encoding name
    pub encoding: String,

    /// Longest message body the platform accepts
    pub render_limit: usize,

    /// File name used when the text has to go out as an attachment
    pub attachment_name: String,

    /// Model name passed to the completion provider
    pub model: String,

    /// Generation parameters used when a command sets none
    pub defaults: GenerationConfig,
}

impl Default for LoomSettings {
    fn default() -> Self {
        Self {
            context_window: DEFAULT_CONTEXT_WINDOW,
            encoding: DEFAULT_ENCODING.to_string(),
            render_limit: DEFAULT_RENDER_LIMIT,
            attachment_name: DEFAULT_ATTACHMENT_NAME.to_string(),
            model: DEFAULT_MODEL.to_string(),
            defaults: GenerationConfig::default(),
        }
    }
}

impl LoomSettings {
    pub fn with_context_window(mut self, tokens: usize) -> Self {
        self.context_window = tokens;
        self
    }

    pub fn with_render_limit(mut self, chars: usize) -> Self {
        self.render_limit = chars;
        self
    }

    pub fn with_attachment_name(mut self, name: impl Into<String>) -> Self {
        self.attachment_name = name.into();
        self
    }

    /// Parsed tokenizer encoding
    pub fn encoding(&self) -> Result<Encoding> {
        self.encoding.parse()
    }

    /// Parse settings from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let settings: LoomSettings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a file; a missing file yields defaults
    pub async fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No settings at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let content = tokio::fs::read_to_string(path).await?;
        let settings = Self::from_toml(&content)?;
        info!(
            "Settings loaded: context_window={}, encoding={}, model={}",
            settings.context_window, settings.encoding, settings.model
        );
        Ok(settings)
    }

    /// Load `config.toml` from the settings directory
    pub async fn load_default() -> Result<Self> {
        let home = loom_home()?;
        Self::load(&home.join("config.toml")).await
    }

    /// Check values the controller relies on
    pub fn validate(&self) -> Result<()> {
        self.encoding()?;
        if self.context_window == 0 {
            return Err(LoomError::Config("context_window must be positive".to_string()));
        }
        if self.render_limit == 0 {
            return Err(LoomError::Config("render_limit must be positive".to_string()));
        }
        // Selections only read back plain-text attachments
        if !self.attachment_name.to_lowercase().ends_with(PLAIN_TEXT_EXTENSION) {
            return Err(LoomError::Config(format!(
                "attachment_name must end in {}: {}",
                PLAIN_TEXT_EXTENSION, self.attachment_name
            )));
        }
        if !self.defaults.is_valid() {
            return Err(LoomError::Config(format!(
                "invalid generation defaults: {:?}",
                self.defaults
            )));
        }
        Ok(())
    }
}

/// Get the settings directory
pub fn loom_home() -> Result<PathBuf> {
    if let Ok(home) = std::env::var("LOOM_HOME") {
        return Ok(PathBuf::from(home));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| LoomError::Config("Could not find config directory".to_string()))?;
    Ok(config_dir.join("chatloom"))
}
