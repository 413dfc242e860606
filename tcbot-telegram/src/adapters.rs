//! Adapters from Telegram (teloxide) types to tcbot_core types.
//! Depends only on teloxide and tcbot_core type definitions.

use tcbot_core::{
    CallbackQuery, Chat, Message, MessageDirection, ToCoreCallbackQuery, ToCoreMessage, ToCoreUser,
    User,
};

/// Wraps a teloxide User for conversion to core [`User`].
pub struct TelegramUserWrapper<'a>(pub &'a teloxide::types::User);

impl<'a> ToCoreUser for TelegramUserWrapper<'a> {
    fn to_core(&self) -> User {
        User {
            id: self.0.id.0 as i64,
            username: self.0.username.clone(),
            first_name: Some(self.0.first_name.clone()),
            last_name: self.0.last_name.clone(),
            language_code: self.0.language_code.clone(),
            is_bot: self.0.is_bot,
        }
    }
}

fn core_chat(chat: &teloxide::types::Chat) -> Chat {
    let chat_type = if chat.is_private() {
        "private"
    } else if chat.is_supergroup() {
        "supergroup"
    } else if chat.is_group() {
        "group"
    } else {
        "channel"
    };
    Chat {
        id: chat.id.0,
        chat_type: chat_type.to_string(),
    }
}

fn unknown_user() -> User {
    User {
        id: 0,
        username: None,
        first_name: None,
        last_name: None,
        language_code: None,
        is_bot: false,
    }
}

/// Wraps a teloxide Message for conversion to core [`Message`].
pub struct TelegramMessageWrapper<'a>(pub &'a teloxide::types::Message);

impl<'a> ToCoreMessage for TelegramMessageWrapper<'a> {
    fn to_core(&self) -> Message {
        Message {
            id: self.0.id.to_string(),
            user: self
                .0
                .from
                .as_ref()
                .map(|u| TelegramUserWrapper(u).to_core())
                .unwrap_or_else(unknown_user),
            chat: core_chat(&self.0.chat),
            content: self.0.text().unwrap_or("").to_string(),
            message_type: if self.0.text().is_some() { "text" } else { "other" }.to_string(),
            direction: MessageDirection::Incoming,
            created_at: chrono::Utc::now(),
        }
    }
}

/// Wraps a teloxide CallbackQuery for conversion to core [`CallbackQuery`].
pub struct TelegramCallbackQueryWrapper<'a>(pub &'a teloxide::types::CallbackQuery);

impl<'a> ToCoreCallbackQuery for TelegramCallbackQueryWrapper<'a> {
    fn to_core(&self) -> Option<CallbackQuery> {
        // Inline-mode queries carry no message and therefore no chat.
        let message = self.0.message.as_ref()?;
        Some(CallbackQuery {
            id: self.0.id.to_string(),
            user: TelegramUserWrapper(&self.0.from).to_core(),
            chat: core_chat(message.chat()),
            message_id: Some(message.id().to_string()),
            data: self.0.data.clone(),
        })
    }
}
