//! Chat platform boundary
//!
//! The controller never talks to a chat service directly. An embedding binary
//! implements [`ChatPlatform`] for its service and feeds events in.

use crate::presenter::Menu;
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Extension of attachments that contribute to prompts
pub const PLAIN_TEXT_EXTENSION: &str = ".txt";

/// File attached to a chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    /// Platform-specific locator (URL, id, ...)
    pub url: String,
}

impl Attachment {
    /// Only plain-text attachments contribute to prompts
    pub fn is_plain_text(&self) -> bool {
        self.filename.to_lowercase().ends_with(PLAIN_TEXT_EXTENSION)
    }
}

/// A message as delivered by the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub channel_id: String,
    pub author_id: String,
    /// Display name used as the speaker label in history prompts
    pub author_name: String,
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    /// Continuation menu, present on messages this system rendered
    #[serde(default)]
    pub menu: Option<Menu>,
}

/// File sent alongside a reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderFile {
    pub filename: String,
    pub content: Vec<u8>,
}

/// One reply: text, optional file, optional menu
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Render {
    pub content: String,
    pub file: Option<RenderFile>,
    pub menu: Option<Menu>,
}

impl Render {
    /// Plain text reply without a menu
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            content: message.into(),
            file: None,
            menu: None,
        }
    }
}

/// A message that addresses the bot
#[derive(Debug, Clone)]
pub struct TriggerEvent {
    pub message: ChatMessage,
}

/// A click on a menu option of a previously rendered message
#[derive(Debug, Clone)]
pub struct SelectionEvent {
    /// The message carrying the menu
    pub message: ChatMessage,
    /// Identifier of the clicked option
    pub custom_id: String,
}

/// Operations the controller needs from the chat service
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// User id of the logged-in bot
    fn bot_id(&self) -> &str;

    /// Up to `limit` messages sent before `message` in its channel, newest first
    async fn history_before(&self, message: &ChatMessage, limit: usize) -> Result<Vec<ChatMessage>>;

    /// Raw bytes of an attachment
    async fn read_attachment(&self, attachment: &Attachment) -> Result<Vec<u8>>;

    /// Post a reply to `message`
    async fn reply(&self, message: &ChatMessage, render: Render) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_attachment() {
        let txt = Attachment {
            filename: "Notes.TXT".to_string(),
            url: "x".to_string(),
        };
        let png = Attachment {
            filename: "image.png".to_string(),
            url: "y".to_string(),
        };
        assert!(txt.is_plain_text());
        assert!(!png.is_plain_text());
    }

    #[test]
    fn test_message_deserializes_without_optional_fields() {
        let json = r#"{"id":"1","channel_id":"c","author_id":"u","author_name":"alice","content":"hi"}"#;
        let message: ChatMessage = serde_json::from_str(json).unwrap();
        assert!(message.attachments.is_empty());
        assert!(message.menu.is_none());
    }
}
