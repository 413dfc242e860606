//! Wraps teloxide::Bot and implements [`tcbot_core::Bot`]. Window messages are sent as HTML with
//! inline keyboards; Bot API refusals are classified into [`BotError`] so the window manager can
//! recover from them.

use async_trait::async_trait;
use tcbot_core::{
    parse_message_id, Bot as CoreBot, BotError, ButtonAction, Chat, InlineKeyboard, Result,
};
use teloxide::{
    prelude::*,
    types::{
        CallbackQueryId, ChatId, InlineKeyboardButton, InlineKeyboardMarkup, LinkPreviewOptions,
        MessageId, ParseMode,
    },
    ApiError, RequestError,
};
use tracing::debug;

/// Thin wrapper around teloxide::Bot that implements tcbot-core's Bot trait.
#[derive(Clone)]
pub struct TelegramBotAdapter {
    bot: teloxide::Bot,
}

impl TelegramBotAdapter {
    /// Creates an adapter from an existing teloxide Bot.
    pub fn new(bot: teloxide::Bot) -> Self {
        Self { bot }
    }

    /// Returns the underlying teloxide::Bot for direct API use when needed.
    pub fn inner(&self) -> &teloxide::Bot {
        &self.bot
    }
}

/// Converts a core keyboard into Telegram markup. URL buttons must carry absolute URLs.
pub fn to_markup(keyboard: &InlineKeyboard) -> std::result::Result<InlineKeyboardMarkup, BotError> {
    let mut rows = Vec::with_capacity(keyboard.rows.len());
    for row in &keyboard.rows {
        let mut buttons = Vec::with_capacity(row.len());
        for button in row {
            let converted = match &button.action {
                ButtonAction::Callback(data) => {
                    InlineKeyboardButton::callback(button.text.clone(), data.clone())
                }
                ButtonAction::Url(url) => {
                    let parsed = url
                        .parse::<reqwest::Url>()
                        .map_err(|e| BotError::Api(format!("invalid button url {}: {}", url, e)))?;
                    InlineKeyboardButton::url(button.text.clone(), parsed)
                }
            };
            buttons.push(converted);
        }
        rows.push(buttons);
    }
    Ok(InlineKeyboardMarkup::new(rows))
}

fn no_link_preview() -> LinkPreviewOptions {
    LinkPreviewOptions {
        is_disabled: true,
        url: None,
        prefer_small_media: false,
        prefer_large_media: false,
        show_above_text: false,
    }
}

/// Maps a teloxide request error onto the refusals the window layer understands.
pub fn classify_error(error: RequestError) -> BotError {
    match error {
        RequestError::Api(api) => match api {
            ApiError::MessageNotModified => BotError::MessageNotModified,
            ApiError::MessageCantBeEdited => BotError::MessageCantBeEdited,
            ApiError::MessageToEditNotFound => BotError::MessageToEditNotFound,
            ApiError::MessageCantBeDeleted => BotError::MessageCantBeDeleted,
            ApiError::MessageToDeleteNotFound => BotError::MessageToDeleteNotFound,
            other => classify_description(&other.to_string()),
        },
        other => BotError::Api(other.to_string()),
    }
}

/// Fallback on the error description for refusals teloxide has no variant for.
pub fn classify_description(description: &str) -> BotError {
    let lower = description.to_lowercase();
    if lower.contains("there is no text in the message to edit") {
        BotError::NoTextInMessage
    } else if lower.contains("message is not modified") {
        BotError::MessageNotModified
    } else if lower.contains("message can't be edited") {
        BotError::MessageCantBeEdited
    } else if lower.contains("message can't be deleted") {
        BotError::MessageCantBeDeleted
    } else {
        BotError::Api(description.to_string())
    }
}

#[async_trait]
impl CoreBot for TelegramBotAdapter {
    async fn send_message(
        &self,
        chat: &Chat,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<String> {
        let mut request = self
            .bot
            .send_message(ChatId(chat.id), text)
            .parse_mode(ParseMode::Html)
            .link_preview_options(no_link_preview());
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(to_markup(keyboard)?);
        }
        let sent = request.await.map_err(classify_error)?;
        Ok(sent.id.to_string())
    }

    async fn edit_message(
        &self,
        chat: &Chat,
        message_id: &str,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<()> {
        let id = parse_message_id(message_id)?;
        let mut request = self
            .bot
            .edit_message_text(ChatId(chat.id), MessageId(id), text)
            .parse_mode(ParseMode::Html)
            .link_preview_options(no_link_preview());
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(to_markup(keyboard)?);
        }
        request.await.map_err(classify_error)?;
        Ok(())
    }

    async fn delete_message(&self, chat: &Chat, message_id: &str) -> Result<()> {
        let id = parse_message_id(message_id)?;
        self.bot
            .delete_message(ChatId(chat.id), MessageId(id))
            .await
            .map_err(classify_error)?;
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        let mut request = self
            .bot
            .answer_callback_query(CallbackQueryId(callback_id.to_string()));
        if let Some(text) = text {
            request = request.text(text);
        }
        request.await.map_err(|e| {
            debug!(error = %e, callback_id = callback_id, "answerCallbackQuery failed");
            classify_error(e)
        })?;
        Ok(())
    }
}
