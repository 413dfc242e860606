//! Core types: user, chat, message, callback query, update, inline keyboard, and the Handler / Middleware traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User identity (id, username, names, client language).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// IETF language tag reported by the client, e.g. "en" or "ru".
    pub language_code: Option<String>,
    pub is_bot: bool,
}

impl User {
    /// First and last name joined, falling back to the username and then the id.
    pub fn full_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => self
                .username
                .clone()
                .unwrap_or_else(|| self.id.to_string()),
        }
    }
}

/// Chat (channel, group or private) identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    pub chat_type: String,
}

impl Chat {
    /// A private chat with the given id; for private chats the chat id equals the user id.
    pub fn private(id: i64) -> Self {
        Self {
            id,
            chat_type: "private".to_string(),
        }
    }

    pub fn is_private(&self) -> bool {
        self.chat_type.eq_ignore_ascii_case("private")
    }
}

/// A single incoming text (or other) message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub user: User,
    pub chat: Chat,
    pub content: String,
    pub message_type: String,
    pub direction: MessageDirection,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Returns the command name without the leading slash and bot mention (`/start@bot` -> `start`).
    pub fn command(&self) -> Option<&str> {
        let first = self.content.split_whitespace().next()?;
        let name = first.strip_prefix('/')?;
        Some(name.split('@').next().unwrap_or(name))
    }
}

/// Direction of the message (from user or from bot).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageDirection {
    Incoming,
    Outgoing,
}

/// A press on an inline keyboard button.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackQuery {
    /// Transport id used to answer the query.
    pub id: String,
    pub user: User,
    pub chat: Chat,
    /// Id of the message that carried the keyboard, if still accessible.
    pub message_id: Option<String>,
    pub data: Option<String>,
}

impl CallbackQuery {
    pub fn data(&self) -> &str {
        self.data.as_deref().unwrap_or("")
    }
}

/// Everything the handler chain can receive.
#[derive(Debug, Clone)]
pub enum Update {
    Message(Message),
    CallbackQuery(CallbackQuery),
}

impl Update {
    pub fn user(&self) -> &User {
        match self {
            Update::Message(m) => &m.user,
            Update::CallbackQuery(q) => &q.user,
        }
    }

    pub fn chat(&self) -> &Chat {
        match self {
            Update::Message(m) => &m.chat,
            Update::CallbackQuery(q) => &q.chat,
        }
    }

    /// Short name used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Update::Message(_) => "message",
            Update::CallbackQuery(_) => "callback_query",
        }
    }

    pub fn as_message(&self) -> Option<&Message> {
        match self {
            Update::Message(m) => Some(m),
            Update::CallbackQuery(_) => None,
        }
    }

    pub fn as_callback_query(&self) -> Option<&CallbackQuery> {
        match self {
            Update::Message(_) => None,
            Update::CallbackQuery(q) => Some(q),
        }
    }
}

/// What a button does when pressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ButtonAction {
    Callback(String),
    Url(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineButton {
    pub text: String,
    pub action: ButtonAction,
}

impl InlineButton {
    pub fn callback(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            action: ButtonAction::Callback(data.into()),
        }
    }

    pub fn url(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            action: ButtonAction::Url(url.into()),
        }
    }
}

/// Rows of inline buttons attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineKeyboard {
    pub rows: Vec<Vec<InlineButton>>,
}

impl InlineKeyboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a row (builder style).
    pub fn row(mut self, row: Vec<InlineButton>) -> Self {
        if !row.is_empty() {
            self.rows.push(row);
        }
        self
    }

    /// Appends `buttons` split into rows of at most `width` buttons.
    pub fn grid(mut self, buttons: Vec<InlineButton>, width: usize) -> Self {
        let width = width.max(1);
        let mut iter = buttons.into_iter().peekable();
        while iter.peek().is_some() {
            let row: Vec<InlineButton> = iter.by_ref().take(width).collect();
            self.rows.push(row);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterates over all callback payloads in the keyboard.
    pub fn callback_data(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().flatten().filter_map(|b| match &b.action {
            ButtonAction::Callback(data) => Some(data.as_str()),
            ButtonAction::Url(_) => None,
        })
    }
}

/// Handler result for the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerResponse {
    /// Pass to next handler.
    Continue,
    /// Stop the chain; the update was consumed.
    Stop,
    /// Not for this handler, try next.
    Ignore,
}

/// Converts a transport-specific user type to core [`User`].
pub trait ToCoreUser: Send + Sync {
    fn to_core(&self) -> User;
}

/// Converts a transport-specific message type to core [`Message`].
pub trait ToCoreMessage: Send + Sync {
    fn to_core(&self) -> Message;
}

/// Converts a transport-specific callback query to core [`CallbackQuery`]. `None` when the query has no chat context.
pub trait ToCoreCallbackQuery: Send + Sync {
    fn to_core(&self) -> Option<CallbackQuery>;
}

/// Single handler concept: optional before / handle / after. Chain runs all before → handle until Stop → all after (reverse).
#[async_trait]
pub trait Handler: Send + Sync {
    /// Runs before the handle phase. Return false to stop the chain.
    async fn before(&self, _update: &Update) -> crate::error::Result<bool> {
        Ok(true)
    }
    /// Processes the update. Return Stop to end the handle phase. Default: Continue.
    async fn handle(&self, _update: &Update) -> crate::error::Result<HandlerResponse> {
        Ok(HandlerResponse::Continue)
    }
    /// Runs after the handle phase (reverse order), with the final response.
    async fn after(
        &self,
        _update: &Update,
        _response: &HandlerResponse,
    ) -> crate::error::Result<()> {
        Ok(())
    }
}

/// Cross-cutting step around the handlers (filtering, session bootstrap, logging).
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Return false to drop the update before any handler sees it.
    async fn before(&self, update: &Update) -> crate::error::Result<bool>;
    async fn after(&self, _update: &Update, _response: &HandlerResponse) -> crate::error::Result<()> {
        Ok(())
    }
}
