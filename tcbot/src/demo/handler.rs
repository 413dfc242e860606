//! Commands, buttons and text input of the demo windows. Library windows are handled by
//! [`window_manager::WindowHandler`], which runs earlier in the chain.

use async_trait::async_trait;
use std::sync::Arc;
use tcbot_core::{CallbackQuery, Handler, HandlerResponse, Message, Result, Update};
use ton_wallet::{format_ton_amount, parse_ton_amount, TransactionRequest};
use tracing::{debug, info, instrument, warn};
use window_manager::{
    FlowContext, TextKey, UserContext, Window, WindowError, WindowManager, BACK_DATA,
};

use super::texts::DemoTexts;
use super::windows::SendAmountWindow;
use super::{
    connect_callbacks, transaction_callbacks, DISCONNECT_DATA, GO_MAIN_DATA, LANGUAGE_PREFIX,
    MAIN_MENU, SELECT_LANGUAGE, SEND_AMOUNT, SEND_TON_DATA,
};

pub struct DemoHandler {
    manager: WindowManager,
    amount_prompt: SendAmountWindow,
}

impl DemoHandler {
    pub fn new(manager: WindowManager) -> Self {
        Self {
            manager,
            amount_prompt: SendAmountWindow::new(Arc::new(DemoTexts)),
        }
    }

    /// `/start`: a fresh window at the bottom of the chat.
    async fn start(&self, ctx: &UserContext) -> window_manager::Result<()> {
        self.manager
            .sessions()
            .update(ctx, |s| s.message_id = None)
            .await?;
        let session = self.manager.session(ctx).await?;
        let first = if session.is_connected() {
            MAIN_MENU
        } else {
            SELECT_LANGUAGE
        };
        self.manager.run_callback(ctx, first).await
    }

    async fn reprompt_amount(&self, ctx: &UserContext) -> window_manager::Result<()> {
        let session = self.manager.session(ctx).await?;
        let flow = FlowContext::new(ctx.clone(), session);
        self.amount_prompt.show(&self.manager, &flow, true).await
    }

    /// Parses the typed amount and sends it to the user's own wallet. Bad input re-prompts and
    /// leaves the session as it was.
    async fn amount_entered(&self, ctx: &UserContext, text: &str) -> window_manager::Result<()> {
        let amount = match parse_ton_amount(text) {
            Ok(amount) => amount,
            Err(e) => {
                debug!(user_id = ctx.user_id, error = %e, "step: amount rejected");
                return self.reprompt_amount(ctx).await;
            }
        };
        let session = self.manager.session(ctx).await?;
        let Some(wallet) = session.account_wallet else {
            self.manager.notify(ctx, TextKey::WalletNotConnected).await?;
            return self.manager.run_callback(ctx, SELECT_LANGUAGE).await;
        };

        let request = TransactionRequest::new(wallet.address, amount);
        match self
            .manager
            .send_transaction(ctx, transaction_callbacks(), request)
            .await
        {
            Ok(()) => {
                info!(user_id = ctx.user_id, amount = %format_ton_amount(amount), "Transfer requested");
                Ok(())
            }
            Err(WindowError::WalletNotConnected) => {
                self.manager.run_callback(ctx, SELECT_LANGUAGE).await
            }
            Err(e) if e.is_user_error() => {
                debug!(user_id = ctx.user_id, error = %e, "step: transfer request rejected");
                self.reprompt_amount(ctx).await
            }
            Err(e) => Err(e),
        }
    }

    async fn on_message(&self, ctx: &UserContext, message: &Message) -> window_manager::Result<bool> {
        if message.command() == Some("start") {
            self.start(ctx).await?;
            return Ok(true);
        }
        let session = self.manager.session(ctx).await?;
        if session.current_window == Window::app(SEND_AMOUNT) && message.message_type == "text" {
            self.amount_entered(ctx, &message.content).await?;
            return Ok(true);
        }
        Ok(false)
    }

    async fn on_button(&self, ctx: &UserContext, query: &CallbackQuery) -> window_manager::Result<bool> {
        let session = self.manager.session(ctx).await?;
        let Window::App(current) = &session.current_window else {
            return Ok(false);
        };

        if let Err(e) = self.manager.bot().answer_callback(&query.id, None).await {
            warn!(user_id = ctx.user_id, error = %e, "Failed to answer callback query");
        }

        let data = query.data();
        match (current.as_str(), data) {
            (SELECT_LANGUAGE, data) if data.starts_with(LANGUAGE_PREFIX) => {
                let language = &data[LANGUAGE_PREFIX.len()..];
                match self.manager.update_language(ctx, language).await {
                    Ok(()) => {}
                    Err(WindowError::LanguageNotSupported(code)) => {
                        warn!(user_id = ctx.user_id, language = %code, "Language button for unsupported language");
                    }
                    Err(e) => return Err(e),
                }
                self.manager
                    .open_connect_wallet(ctx, connect_callbacks())
                    .await?;
            }
            (MAIN_MENU, SEND_TON_DATA) => self.manager.run_callback(ctx, SEND_AMOUNT).await?,
            (MAIN_MENU, DISCONNECT_DATA) => {
                self.manager.disconnect_wallet(ctx).await?;
                self.manager.run_callback(ctx, SELECT_LANGUAGE).await?;
            }
            (SEND_AMOUNT, BACK_DATA) | (_, GO_MAIN_DATA) => {
                self.manager.run_callback(ctx, MAIN_MENU).await?
            }
            _ => {
                debug!(user_id = ctx.user_id, window = %current, data = data, "step: stale or unknown button");
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl Handler for DemoHandler {
    #[instrument(skip(self, update))]
    async fn handle(&self, update: &Update) -> Result<HandlerResponse> {
        let ctx = UserContext::from_update(update);
        let handled = match update {
            Update::Message(message) => self.on_message(&ctx, message).await?,
            Update::CallbackQuery(query) => self.on_button(&ctx, query).await?,
        };
        Ok(if handled {
            HandlerResponse::Stop
        } else {
            HandlerResponse::Ignore
        })
    }
}
