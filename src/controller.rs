//! Branch controller
//!
//! Drives one step of the loom per inbound event:
//!
//! ```text
//! AwaitingTrigger -> BuildingPrompt -> AwaitingProvider -> PresentingMenu -> AwaitingSelection
//!                         ^                                                        |
//!                         +--------------------- selection ------------------------+
//! ```
//!
//! Nothing is remembered between steps. A trigger builds its prompt from the
//! command text, attachments or channel history; a selection rebuilds it from
//! the menu message and the chosen candidate. Every step makes exactly one
//! provider call and posts exactly one reply.

use crate::args::parse_arguments;
use crate::context::{BpeTokenizer, ContextWindow, Tokenizer};
use crate::platform::{ChatMessage, ChatPlatform, Render, RenderFile, SelectionEvent, TriggerEvent};
use crate::presenter::Menu;
use crate::provider::{check_candidates, CompletionProvider, CompletionRequest};
use crate::settings::LoomSettings;
use crate::state::{GenerationConfig, StateCodec};
use crate::{LoomError, Result};
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Separator between speakers in history prompts; also the stop sequence
pub const HISTORY_SEPARATOR: &str = "\n---\n";

/// Separator between history messages when names are excluded
const UNLABELED_SEPARATOR: &str = "\n\n";

/// Separator between command text and attached file content
const ATTACHMENT_SEPARATOR: &str = "\n\n";

/// Where a step currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingTrigger,
    BuildingPrompt,
    AwaitingProvider,
    PresentingMenu,
    AwaitingSelection,
}

/// Text for one generation call, before window truncation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptMaterial {
    pub text: String,
    pub stop: Option<String>,
}

/// What a completed step produced
#[derive(Debug, Clone)]
pub struct StepReport {
    /// Prompt actually sent, after truncation
    pub window: ContextWindow,
    pub config: GenerationConfig,
    pub stop: Option<String>,
    pub candidates: Vec<String>,
}

/// Orchestrates trigger and selection steps
pub struct BranchController {
    settings: LoomSettings,
    platform: Arc<dyn ChatPlatform>,
    provider: Arc<dyn CompletionProvider>,
    tokenizer: Arc<dyn Tokenizer>,
    mention: Regex,
}

impl BranchController {
    /// Create a controller using the settings' shared BPE tokenizer
    pub fn new(
        settings: LoomSettings,
        platform: Arc<dyn ChatPlatform>,
        provider: Arc<dyn CompletionProvider>,
    ) -> Result<Self> {
        let tokenizer = BpeTokenizer::shared(settings.encoding()?)?;
        Self::with_tokenizer(settings, platform, provider, Arc::new(tokenizer))
    }

    pub fn with_tokenizer(
        settings: LoomSettings,
        platform: Arc<dyn ChatPlatform>,
        provider: Arc<dyn CompletionProvider>,
        tokenizer: Arc<dyn Tokenizer>,
    ) -> Result<Self> {
        settings.validate()?;
        let mention = Regex::new(&format!("<@!?{}>", regex::escape(platform.bot_id())))
            .map_err(|e| LoomError::Config(e.to_string()))?;

        Ok(Self {
            settings,
            platform,
            provider,
            tokenizer,
            mention,
        })
    }

    pub fn settings(&self) -> &LoomSettings {
        &self.settings
    }

    /// Handle a message that mentions the bot.
    ///
    /// Returns `Ok(None)` when the message is the bot's own.
    pub async fn on_trigger(&self, event: TriggerEvent) -> Result<Option<StepReport>> {
        let message = &event.message;
        if message.author_id == self.platform.bot_id() {
            enter(Phase::AwaitingTrigger, message);
            return Ok(None);
        }

        enter(Phase::BuildingPrompt, message);
        let command = self.strip_invocation(&message.content);
        let parsed = parse_arguments(&command);
        let config = parsed.overrides.apply(self.settings.defaults);
        debug!("Trigger config: {:?}", config);

        let material = if config.loom_server_depth > 0 {
            self.history_material(message, &config).await?
        } else {
            PromptMaterial {
                text: self.with_attachments(message, parsed.residual_text).await?,
                stop: None,
            }
        };

        self.generate(message, material, config).await.map(Some)
    }

    /// Handle a click on a menu option
    pub async fn on_selection(&self, event: SelectionEvent) -> Result<StepReport> {
        let message = &event.message;
        enter(Phase::BuildingPrompt, message);

        let menu = message.menu.clone().unwrap_or_default();
        let index = match menu.resolve(&event.custom_id) {
            Ok(index) => index,
            Err(e) => return self.fail(message, e).await,
        };
        let candidate = menu.candidate(index).unwrap_or_default();

        let decoded = StateCodec::decode(&message.content);
        if !decoded.found {
            debug!("No state fragment on {}, resuming with defaults", message.id);
        }
        let content = self.with_attachments(message, decoded.content).await?;

        let material = PromptMaterial {
            text: format!("{content}{candidate}"),
            stop: None,
        };
        self.generate(message, material, decoded.config).await
    }

    /// Remove mentions of the bot from the command text
    fn strip_invocation(&self, content: &str) -> String {
        self.mention.replace_all(content, "").trim().to_string()
    }

    /// Prompt from the last `loom_server_depth` messages before `message`
    async fn history_material(
        &self,
        message: &ChatMessage,
        config: &GenerationConfig,
    ) -> Result<PromptMaterial> {
        let mut history = self
            .platform
            .history_before(message, config.loom_server_depth)
            .await?;
        history.truncate(config.loom_server_depth);
        history.reverse();
        // Earlier loom replies carry a state fragment
        let history: Vec<(String, String)> = history
            .into_iter()
            .map(|m| (m.author_name, StateCodec::decode(&m.content).content))
            .collect();

        Ok(if config.exclude_speaker_names {
            PromptMaterial {
                text: history
                    .iter()
                    .map(|(_, content)| content.as_str())
                    .collect::<Vec<_>>()
                    .join(UNLABELED_SEPARATOR),
                stop: None,
            }
        } else {
            let mut text = history
                .iter()
                .map(|(speaker, content)| format!("{speaker}: {content}"))
                .collect::<Vec<_>>()
                .join(HISTORY_SEPARATOR);
            text.push_str(HISTORY_SEPARATOR);
            PromptMaterial {
                text,
                stop: Some(HISTORY_SEPARATOR.to_string()),
            }
        })
    }

    /// Append the content of plain-text attachments to `content`
    async fn with_attachments(&self, message: &ChatMessage, mut content: String) -> Result<String> {
        for attachment in message.attachments.iter().filter(|a| a.is_plain_text()) {
            let bytes = self.platform.read_attachment(attachment).await?;
            let text = String::from_utf8_lossy(&bytes);
            if content.is_empty() {
                content = text.into_owned();
            } else {
                content.push_str(ATTACHMENT_SEPARATOR);
                content.push_str(&text);
            }
        }
        Ok(content)
    }

    async fn generate(
        &self,
        message: &ChatMessage,
        material: PromptMaterial,
        config: GenerationConfig,
    ) -> Result<StepReport> {
        let budget = ContextWindow::budget(self.settings.context_window, config.max_tokens_per_candidate);
        let window = ContextWindow::assemble(&material.text, budget, self.tokenizer.as_ref())?;
        info!(
            "Number of tokens: {} (budget {}, truncated: {})",
            window.tokens, budget, window.truncated
        );

        enter(Phase::AwaitingProvider, message);
        let request = CompletionRequest::new(
            &self.settings.model,
            window.text.clone(),
            &config,
            material.stop.clone(),
        );
        let candidates = match self.provider.complete(&request).await {
            Ok(candidates) => candidates,
            Err(e) => return self.fail(message, e).await,
        };
        if let Err(e) = check_candidates(&request, &candidates) {
            return self.fail(message, e).await;
        }

        enter(Phase::PresentingMenu, message);
        let render = self.render(&window.text, &config, Menu::from_candidates(&candidates));
        self.platform.reply(message, render).await?;
        enter(Phase::AwaitingSelection, message);

        Ok(StepReport {
            window,
            config,
            stop: material.stop,
            candidates,
        })
    }

    /// Lay out the reply, moving the text to a file when it is too long
    fn render(&self, text: &str, config: &GenerationConfig, menu: Menu) -> Render {
        let inline = StateCodec::encode(text, config);
        if inline.chars().count() <= self.settings.render_limit {
            return Render {
                content: inline,
                file: None,
                menu: Some(menu),
            };
        }

        debug!(
            "Reply exceeds {} characters, sending text as {}",
            self.settings.render_limit, self.settings.attachment_name
        );
        Render {
            content: StateCodec::fragment(config),
            file: Some(RenderFile {
                filename: self.settings.attachment_name.clone(),
                content: text.as_bytes().to_vec(),
            }),
            menu: Some(menu),
        }
    }

    /// Post a failure reply and return the error
    async fn fail<T>(&self, message: &ChatMessage, error: LoomError) -> Result<T> {
        warn!("Step for message {} failed: {}", message.id, error);
        if let Err(e) = self
            .platform
            .reply(message, Render::failure(format!("Generation failed: {error}")))
            .await
        {
            warn!("Could not post failure reply to {}: {}", message.id, e);
        }
        Err(error)
    }
}

fn enter(phase: Phase, message: &ChatMessage) {
    debug!(phase = ?phase, message_id = %message.id, "loom step");
}
