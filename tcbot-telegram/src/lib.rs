//! # tcbot-telegram
//!
//! Telegram transport: adapters from teloxide types, the [`tcbot_core::Bot`] implementation used
//! by the window manager, minimal config and the dispatcher runner. No session or wallet logic.

mod adapters;
mod bot_adapter;
mod config;
mod runner;

pub use adapters::{TelegramCallbackQueryWrapper, TelegramMessageWrapper, TelegramUserWrapper};
pub use bot_adapter::{classify_description, classify_error, to_markup, TelegramBotAdapter};
pub use config::TelegramConfig;
pub use runner::run_dispatcher;
