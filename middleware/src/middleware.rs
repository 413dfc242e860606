use async_trait::async_trait;
use tcbot_core::{HandlerResponse, Middleware, Result, Update};
use tracing::{debug, info, instrument};

/// Logs each update in before() and the chain's response in after(); always continues.
pub struct LoggingMiddleware;

#[async_trait]
impl Middleware for LoggingMiddleware {
    #[instrument(skip(self, update))]
    async fn before(&self, update: &Update) -> Result<bool> {
        let user = update.user();
        match update {
            Update::Message(message) => info!(
                user_id = user.id,
                chat_id = message.chat.id,
                username = %user.username.as_deref().unwrap_or("unknown"),
                message_content = %message.content,
                "Received message"
            ),
            Update::CallbackQuery(query) => info!(
                user_id = user.id,
                chat_id = query.chat.id,
                username = %user.username.as_deref().unwrap_or("unknown"),
                data = %query.data(),
                "Received callback query"
            ),
        }
        Ok(true)
    }

    #[instrument(skip(self, update, response))]
    async fn after(&self, update: &Update, response: &HandlerResponse) -> Result<()> {
        debug!(
            user_id = update.user().id,
            kind = update.kind(),
            response = ?response,
            "Processed update"
        );
        Ok(())
    }
}

/// Drops updates from groups and channels; windows live in private chats only.
pub struct PrivateChatMiddleware;

#[async_trait]
impl Middleware for PrivateChatMiddleware {
    #[instrument(skip(self, update))]
    async fn before(&self, update: &Update) -> Result<bool> {
        let chat = update.chat();
        if chat.is_private() {
            Ok(true)
        } else {
            debug!(
                chat_id = chat.id,
                chat_type = %chat.chat_type,
                "step: non-private chat, update dropped"
            );
            Ok(false)
        }
    }
}
