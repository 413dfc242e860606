//! Error types for the bot core.
//!
//! [`DbotError`] is the top-level error; [`HandlerError`] is used for handler failures and
//! [`BotError`] classifies transport refusals the window layer recovers from.

use thiserror::Error;

/// Top-level error (session storage, bot transport, handler).
#[derive(Error, Debug)]
pub enum DbotError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Bot error: {0}")]
    Bot(#[from] BotError),

    #[error("Handler error: {0}")]
    Handler(#[from] HandlerError),
}

/// Errors produced by handlers.
#[derive(Error, Debug)]
pub enum HandlerError {
    /// A window flow refused or failed to apply an action.
    #[error("State error: {0}")]
    State(String),
}

/// Transport failures. The message-level variants mirror the Bot API refusals that are expected
/// while juggling one window message per chat.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BotError {
    #[error("message is not modified")]
    MessageNotModified,

    #[error("message can't be edited")]
    MessageCantBeEdited,

    #[error("message to edit not found")]
    MessageToEditNotFound,

    #[error("no text in the message")]
    NoTextInMessage,

    #[error("message can't be deleted")]
    MessageCantBeDeleted,

    #[error("message to delete not found")]
    MessageToDeleteNotFound,

    #[error("invalid message id: {0}")]
    InvalidMessageId(String),

    #[error("api error: {0}")]
    Api(String),
}

impl BotError {
    /// Edit refusals after which sending a fresh message is the right move.
    pub fn is_edit_refusal(&self) -> bool {
        matches!(
            self,
            BotError::MessageNotModified
                | BotError::MessageCantBeEdited
                | BotError::MessageToEditNotFound
                | BotError::NoTextInMessage
                | BotError::InvalidMessageId(_)
        )
    }

    /// Delete refusals (e.g. message older than 48h) after which the message is blanked instead.
    pub fn is_delete_refusal(&self) -> bool {
        matches!(
            self,
            BotError::MessageCantBeDeleted | BotError::MessageToDeleteNotFound
        )
    }
}

/// Result type for core operations; uses [`DbotError`].
pub type Result<T> = std::result::Result<T, DbotError>;
