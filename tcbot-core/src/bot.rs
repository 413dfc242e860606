//! Bot abstraction for sending, editing and deleting window messages.
//!
//! [`Bot`] is transport-agnostic; `tcbot-telegram` implements it via teloxide and tests substitute a recording mock.

use crate::error::{BotError, Result};
use crate::types::{Chat, InlineKeyboard};
use async_trait::async_trait;

/// Messaging transport used by the window manager. Message ids are transport-specific strings
/// (Telegram numeric ids).
#[async_trait]
pub trait Bot: Send + Sync {
    /// Sends an HTML text message with an optional inline keyboard and returns its id.
    async fn send_message(
        &self,
        chat: &Chat,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<String>;

    /// Replaces the text and keyboard of an already-sent message.
    async fn edit_message(
        &self,
        chat: &Chat,
        message_id: &str,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<()>;

    async fn delete_message(&self, chat: &Chat, message_id: &str) -> Result<()>;

    /// Acknowledges a callback query so the client stops its loading indicator.
    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()>;
}

/// Parses a message id string into an i32.
pub fn parse_message_id(s: &str) -> Result<i32> {
    s.parse()
        .map_err(|_| BotError::InvalidMessageId(s.to_string()).into())
}
