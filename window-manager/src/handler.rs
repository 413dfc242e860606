//! Callback-query handler for the library windows (connect wallet, send transaction and their
//! failure windows). Presses on any other window pass through to the bot's own handlers.

use async_trait::async_trait;
use tcbot_core::{Handler, HandlerResponse, Result, Update};
use tracing::{debug, instrument, warn};

use crate::error::WindowError;
use crate::keyboards::{APP_WALLET_PREFIX, BACK_DATA, RETRY_DATA};
use crate::manager::WindowManager;
use crate::session::{UserContext, Window};

pub struct WindowHandler {
    manager: WindowManager,
}

impl WindowHandler {
    pub fn new(manager: WindowManager) -> Self {
        Self { manager }
    }

    async fn dispatch(&self, ctx: &UserContext, window: &Window, data: &str) -> crate::Result<bool> {
        match window {
            Window::ConnectWallet => {
                if let Some(app_name) = data.strip_prefix(APP_WALLET_PREFIX) {
                    self.manager.select_app_wallet(ctx, app_name).await?;
                } else if data == BACK_DATA {
                    self.manager.connect_wallet_back(ctx).await?;
                } else {
                    return Ok(false);
                }
            }
            Window::ConnectWalletRejected
            | Window::ConnectWalletTimeout
            | Window::ConnectWalletProofWrong => match data {
                RETRY_DATA => self.manager.retry_connect_wallet(ctx).await?,
                BACK_DATA => self.manager.connect_wallet_back(ctx).await?,
                _ => return Ok(false),
            },
            Window::SendTransaction => match data {
                BACK_DATA => self.manager.send_transaction_back(ctx).await?,
                _ => return Ok(false),
            },
            Window::SendTransactionRejected | Window::SendTransactionTimeout => match data {
                RETRY_DATA => self.manager.retry_last_send_transaction(ctx).await?,
                BACK_DATA => self.manager.send_transaction_back(ctx).await?,
                _ => return Ok(false),
            },
            _ => return Ok(false),
        }
        Ok(true)
    }
}

#[async_trait]
impl Handler for WindowHandler {
    #[instrument(skip(self, update))]
    async fn handle(&self, update: &Update) -> Result<HandlerResponse> {
        let Some(query) = update.as_callback_query() else {
            return Ok(HandlerResponse::Ignore);
        };
        let ctx = UserContext::from_update(update);
        let session = self.manager.session(&ctx).await?;
        if !session.current_window.is_library() {
            return Ok(HandlerResponse::Ignore);
        }

        // Stop the client's spinner before the (possibly slow) bridge round trip.
        if let Err(e) = self.manager.bot().answer_callback(&query.id, None).await {
            warn!(user_id = ctx.user_id, error = %e, "Failed to answer callback query");
        }

        let data = query.data();
        match self.dispatch(&ctx, &session.current_window, data).await {
            Ok(true) => Ok(HandlerResponse::Stop),
            Ok(false) => {
                debug!(
                    user_id = ctx.user_id,
                    window = %session.current_window,
                    data = data,
                    "step: unknown button on library window"
                );
                Ok(HandlerResponse::Stop)
            }
            Err(e) => {
                if e.is_user_error() || matches!(e, WindowError::RetryUnavailable(_)) {
                    warn!(user_id = ctx.user_id, error = %e, "Window action refused");
                }
                Err(e.into())
            }
        }
    }
}
