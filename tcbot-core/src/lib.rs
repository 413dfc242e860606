//! # tcbot-core
//!
//! Core types and traits for the bot: [`Bot`], [`Handler`], [`Middleware`], update, message, callback query
//! and inline keyboard types, errors and tracing initialization. Transport-agnostic; used by handler-chain,
//! window-manager and tcbot-telegram.

pub mod bot;
pub mod error;
pub mod logger;
pub mod types;

pub use bot::{parse_message_id, Bot};
pub use error::{BotError, DbotError, HandlerError, Result};
pub use logger::init_tracing;
pub use types::{
    ButtonAction, CallbackQuery, Chat, Handler, HandlerResponse, InlineButton, InlineKeyboard,
    Message, MessageDirection, Middleware, ToCoreCallbackQuery, ToCoreMessage, ToCoreUser, Update,
    User,
};
