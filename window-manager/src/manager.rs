//! The window manager: drives the connect-wallet and send-transaction flows for each user and
//! renders every window through one tracked message.
//!
//! Each flow stores its callback pair in the session, renders its library window and leaves a
//! wait task in the [`TaskRegistry`]. The task settles the flow: success runs the `after`
//! callback; rejection and timeout either restore the previous window or offer a retry window,
//! depending on [`FailurePolicy`]. Back-navigation cancels the bridge request, aborts the task
//! and runs the `before` callback.

use chrono::Utc;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tcbot_core::{Bot, BotError, Chat, DbotError, InlineKeyboard};
use ton_wallet::{
    proof, BridgeError, ConnectOutcome, TransactionOutcome, TransactionReceipt, TransactionRequest,
    WalletBridge, WalletError, WalletList,
};
use tracing::{debug, error, info, instrument, warn};

use crate::callbacks::{CallbackRegistry, FlowCallbacks, FlowContext};
use crate::error::{Result, WindowError};
use crate::keyboards::{DefaultKeyboards, KeyboardFactory};
use crate::session::{Session, SessionRepository, UserContext, Window};
use crate::tasks::TaskRegistry;
use crate::texts::{DefaultTexts, TextCatalog, TextKey};

/// What happens when the wallet rejects a request or does not answer in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Notify the user and go back to the window the flow started from.
    #[default]
    RestorePrevious,
    /// Show the rejected / timeout window with Retry and Back buttons.
    OfferRetry,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "restore" | "restore_previous" => Ok(FailurePolicy::RestorePrevious),
            "retry" | "offer_retry" => Ok(FailurePolicy::OfferRetry),
            other => Err(format!("unknown failure policy: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ManagerOptions {
    /// Request a ton_proof on connect and verify it.
    pub check_proof: bool,
    pub connect_timeout: Duration,
    pub transaction_timeout: Duration,
    /// Lifetime of a sent transaction (`valid_until = now + ttl`).
    pub transaction_ttl: Duration,
    /// Lifetime of an issued ton_proof payload.
    pub proof_ttl: Duration,
    pub failure_policy: FailurePolicy,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self {
            check_proof: false,
            connect_timeout: Duration::from_secs(180),
            transaction_timeout: Duration::from_secs(300),
            transaction_ttl: Duration::from_secs(300),
            proof_ttl: Duration::from_secs(600),
            failure_policy: FailurePolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Connect,
    Transaction,
}

struct Inner {
    bot: Arc<dyn Bot>,
    bridge: Arc<dyn WalletBridge>,
    wallets: Arc<WalletList>,
    sessions: SessionRepository,
    callbacks: CallbackRegistry,
    texts: Arc<dyn TextCatalog>,
    keyboards: Arc<dyn KeyboardFactory>,
    tasks: TaskRegistry,
    options: ManagerOptions,
}

/// Cheap to clone; clones share sessions, tasks and transports.
#[derive(Clone)]
pub struct WindowManager {
    inner: Arc<Inner>,
}

pub struct WindowManagerBuilder {
    bot: Arc<dyn Bot>,
    bridge: Arc<dyn WalletBridge>,
    wallets: Arc<WalletList>,
    sessions: SessionRepository,
    callbacks: CallbackRegistry,
    texts: Arc<dyn TextCatalog>,
    keyboards: Arc<dyn KeyboardFactory>,
    options: ManagerOptions,
}

impl WindowManagerBuilder {
    pub fn callbacks(mut self, callbacks: CallbackRegistry) -> Self {
        self.callbacks = callbacks;
        self
    }

    pub fn texts(mut self, texts: Arc<dyn TextCatalog>) -> Self {
        self.texts = texts;
        self
    }

    pub fn keyboards(mut self, keyboards: Arc<dyn KeyboardFactory>) -> Self {
        self.keyboards = keyboards;
        self
    }

    pub fn options(mut self, options: ManagerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> WindowManager {
        WindowManager {
            inner: Arc::new(Inner {
                bot: self.bot,
                bridge: self.bridge,
                wallets: self.wallets,
                sessions: self.sessions,
                callbacks: self.callbacks,
                texts: self.texts,
                keyboards: self.keyboards,
                tasks: TaskRegistry::new(),
                options: self.options,
            }),
        }
    }
}

impl WindowManager {
    pub fn builder(
        bot: Arc<dyn Bot>,
        bridge: Arc<dyn WalletBridge>,
        wallets: Arc<WalletList>,
        sessions: SessionRepository,
    ) -> WindowManagerBuilder {
        WindowManagerBuilder {
            bot,
            bridge,
            wallets,
            sessions,
            callbacks: CallbackRegistry::new(),
            texts: Arc::new(DefaultTexts::new()),
            keyboards: Arc::new(DefaultKeyboards::new()),
            options: ManagerOptions::default(),
        }
    }

    pub fn bot(&self) -> &Arc<dyn Bot> {
        &self.inner.bot
    }

    pub fn sessions(&self) -> &SessionRepository {
        &self.inner.sessions
    }

    pub fn texts(&self) -> &dyn TextCatalog {
        self.inner.texts.as_ref()
    }

    pub fn options(&self) -> &ManagerOptions {
        &self.inner.options
    }

    pub fn tasks(&self) -> &TaskRegistry {
        &self.inner.tasks
    }

    pub async fn session(&self, ctx: &UserContext) -> Result<Session> {
        Ok(self.inner.sessions.load(ctx).await?)
    }

    /// Persists the session bound to `ctx` (chat id, first-seen language) and returns it.
    pub async fn ensure_session(&self, ctx: &UserContext) -> Result<Session> {
        Ok(self.inner.sessions.update(ctx, |s| s.clone()).await?)
    }

    // ---------------------------------------------------------------------------------------
    // Connect wallet
    // ---------------------------------------------------------------------------------------

    /// Opens the connect window for the selected (or first) wallet app.
    #[instrument(skip(self, callbacks), fields(user_id = ctx.user_id))]
    pub async fn open_connect_wallet(&self, ctx: &UserContext, callbacks: FlowCallbacks) -> Result<()> {
        self.inner.callbacks.check(&callbacks)?;
        self.inner.tasks.abort(ctx.user_id).await;
        if let Err(e) = self.inner.bridge.cancel_connection(ctx.user_id).await {
            debug!(error = %e, "step: no pending connection to cancel");
        }
        self.disconnect_wallet(ctx).await?;

        let session = self.session(ctx).await?;
        let language = session.language().to_string();
        let loader = self.inner.texts.get(&language, TextKey::LoaderText);
        self.render(ctx, None, &loader, None).await?;

        let wallets = self.inner.wallets.get_wallets().await?;
        let selected = session
            .app_wallet
            .as_ref()
            .and_then(|chosen| wallets.iter().find(|w| w.app_name == chosen.app_name))
            .or_else(|| wallets.first())
            .cloned()
            .ok_or(WalletError::NoWallets)?;

        let proof_payload = self
            .inner
            .options
            .check_proof
            .then(|| proof::generate_payload(self.inner.options.proof_ttl.as_secs() as i64));
        let link = self
            .inner
            .bridge
            .connect(ctx.user_id, &selected, proof_payload.as_deref())
            .await?;

        let stored_wallet = selected.clone();
        self.inner
            .sessions
            .update(ctx, move |s| {
                s.enter_flow();
                s.connect_callbacks = Some(callbacks);
                s.app_wallet = Some(stored_wallet);
                s.proof_payload = proof_payload;
                s.connect_pending = true;
            })
            .await?;

        let text = self
            .inner
            .texts
            .render(&language, TextKey::ConnectWallet, &selected.name);
        let keyboard = self
            .inner
            .keyboards
            .connect_wallet(&language, &wallets, &selected, &link);
        self.show_window(ctx, Window::ConnectWallet, &text, Some(&keyboard))
            .await?;

        let this = self.clone();
        let task_ctx = ctx.clone();
        self.inner
            .tasks
            .spawn(ctx.user_id, move |task_id| async move {
                this.wait_connection(task_ctx, task_id).await
            })
            .await;
        info!(app_name = %selected.app_name, "Connect wallet window opened");
        Ok(())
    }

    /// Reopens the connect window with the stored callbacks.
    pub async fn retry_connect_wallet(&self, ctx: &UserContext) -> Result<()> {
        let callbacks = self
            .session(ctx)
            .await?
            .connect_callbacks
            .ok_or(WindowError::RetryUnavailable("no connect callbacks stored"))?;
        self.open_connect_wallet(ctx, callbacks).await
    }

    /// Switches the wallet app offered in the connect window. Unknown names pick the first app.
    #[instrument(skip(self), fields(user_id = ctx.user_id))]
    pub async fn select_app_wallet(&self, ctx: &UserContext, app_name: &str) -> Result<()> {
        let wallet = self.inner.wallets.find_or_first(Some(app_name)).await?;
        debug!(selected = %wallet.app_name, "step: wallet app selected");
        self.inner
            .sessions
            .update(ctx, move |s| s.app_wallet = Some(wallet))
            .await?;
        self.retry_connect_wallet(ctx).await
    }

    /// Leaves the connect flow: cancels the request and runs the `before` callback.
    #[instrument(skip(self), fields(user_id = ctx.user_id))]
    pub async fn connect_wallet_back(&self, ctx: &UserContext) -> Result<()> {
        let (pending, window) = self
            .inner
            .sessions
            .update(ctx, |s| (std::mem::take(&mut s.connect_pending), s.current_window.clone()))
            .await?;
        if pending {
            self.inner.tasks.abort(ctx.user_id).await;
            if let Err(e) = self.inner.bridge.cancel_connection(ctx.user_id).await {
                warn!(error = %e, "Failed to cancel connection request");
            }
        } else if window == Window::ConnectWallet {
            // The wait task already claimed the wallet's answer and is settling it.
            debug!("step: connect outcome already claimed, back ignored");
            return Ok(());
        }
        self.return_to_origin(ctx, Flow::Connect).await
    }

    /// Disconnects the wallet; not being connected is fine.
    #[instrument(skip(self), fields(user_id = ctx.user_id))]
    pub async fn disconnect_wallet(&self, ctx: &UserContext) -> Result<()> {
        match self.inner.bridge.disconnect(ctx.user_id).await {
            Ok(()) => info!("Wallet disconnected"),
            Err(BridgeError::NotConnected) => debug!("step: no wallet to disconnect"),
            Err(e) => return Err(e.into()),
        }
        self.inner
            .sessions
            .update(ctx, |s| s.account_wallet = None)
            .await?;
        Ok(())
    }

    async fn wait_connection(&self, ctx: UserContext, task_id: u64) {
        let outcome = self
            .inner
            .bridge
            .wait_connection(ctx.user_id, self.inner.options.connect_timeout)
            .await;
        let result = match outcome {
            Ok(outcome) => self.settle_connection(&ctx, task_id, outcome).await,
            Err(BridgeError::Cancelled) => {
                debug!(user_id = ctx.user_id, "step: connection request cancelled");
                Ok(())
            }
            Err(e) => Err(e.into()),
        };
        if let Err(e) = result {
            error!(user_id = ctx.user_id, error = %e, "Connect wallet flow failed");
        }
    }

    async fn settle_connection(
        &self,
        ctx: &UserContext,
        task_id: u64,
        outcome: ConnectOutcome,
    ) -> Result<()> {
        // Claim the outcome under the session lock; Back and app navigation claim the same flag.
        let claimed = self
            .inner
            .sessions
            .update(ctx, |s| {
                let current = s.current_window == Window::ConnectWallet && s.connect_pending;
                if current {
                    s.connect_pending = false;
                }
                current.then(|| s.clone())
            })
            .await?;
        let Some(session) = claimed else {
            debug!(user_id = ctx.user_id, "step: late connect outcome ignored");
            return Ok(());
        };
        // From here on the flow continues in callbacks that may start the next task.
        self.inner.tasks.release(ctx.user_id, task_id).await;

        match outcome {
            ConnectOutcome::Connected(info) => {
                if self.inner.options.check_proof {
                    let verified = match session.proof_payload.as_deref() {
                        Some(payload) => proof::check_payload(payload, &info),
                        None => Err(ton_wallet::ProofError::Missing),
                    };
                    if let Err(e) = verified {
                        warn!(user_id = ctx.user_id, error = %e, "ton_proof rejected");
                        if let Err(e) = self.inner.bridge.disconnect(ctx.user_id).await {
                            debug!(error = %e, "step: disconnect after bad proof failed");
                        }
                        return self
                            .show_failure(ctx, Window::ConnectWalletProofWrong, TextKey::ConnectWalletProofWrong)
                            .await;
                    }
                }

                let account = info.account.clone();
                self.inner
                    .sessions
                    .update(ctx, move |s| {
                        s.account_wallet = Some(account);
                        s.proof_payload = None;
                    })
                    .await?;
                info!(
                    user_id = ctx.user_id,
                    address = %info.account.address,
                    app = %info.device_app_name,
                    "Wallet connected"
                );
                match session.connect_callbacks {
                    Some(callbacks) => self.invoke(ctx, &callbacks.after, None).await,
                    None => Ok(()),
                }
            }
            ConnectOutcome::Rejected => {
                info!(user_id = ctx.user_id, "Connection rejected by wallet");
                self.flow_failed(ctx, Flow::Connect, Window::ConnectWalletRejected, TextKey::ConnectWalletRejected)
                    .await
            }
            ConnectOutcome::Timeout => {
                info!(user_id = ctx.user_id, "Connection timed out");
                self.flow_failed(ctx, Flow::Connect, Window::ConnectWalletTimeout, TextKey::ConnectWalletTimeout)
                    .await
            }
        }
    }

    // ---------------------------------------------------------------------------------------
    // Send transaction
    // ---------------------------------------------------------------------------------------

    /// Validates `request`, sends it to the connected wallet and opens the transaction window.
    ///
    /// Invalid requests and a missing wallet fail before anything in the session changes.
    #[instrument(skip(self, callbacks, request), fields(user_id = ctx.user_id, amount = request.amount))]
    pub async fn send_transaction(
        &self,
        ctx: &UserContext,
        callbacks: FlowCallbacks,
        request: TransactionRequest,
    ) -> Result<()> {
        request.validate()?;
        self.inner.callbacks.check(&callbacks)?;

        let session = self.session(ctx).await?;
        if !session.is_connected() {
            self.notify(ctx, TextKey::WalletNotConnected).await?;
            return Err(WindowError::WalletNotConnected);
        }

        self.inner.tasks.abort(ctx.user_id).await;
        if let Some(previous) = session.rpc_request_id {
            if let Err(e) = self.inner.bridge.cancel_transaction(ctx.user_id, previous).await {
                debug!(error = %e, request_id = previous, "step: previous request not cancelled");
            }
        }

        let valid_until = Utc::now().timestamp() + self.inner.options.transaction_ttl.as_secs() as i64;
        let transaction = request.clone().into_transaction(valid_until)?;
        let request_id = match self
            .inner
            .bridge
            .send_transaction(ctx.user_id, &transaction)
            .await
        {
            Ok(id) => id,
            Err(BridgeError::NotConnected) => {
                self.notify(ctx, TextKey::WalletNotConnected).await?;
                return Err(WindowError::WalletNotConnected);
            }
            Err(e) => return Err(e.into()),
        };

        self.inner
            .sessions
            .update(ctx, move |s| {
                s.enter_flow();
                s.transaction_callbacks = Some(callbacks);
                s.pending_transaction = Some(request);
                s.rpc_request_id = Some(request_id);
            })
            .await?;

        let language = session.language();
        let wallet_name = session.wallet_name();
        let open_url = session
            .app_wallet
            .as_ref()
            .and_then(|w| w.universal_url.as_deref());
        let text = self
            .inner
            .texts
            .render(language, TextKey::SendTransaction, wallet_name);
        let keyboard = self
            .inner
            .keyboards
            .send_transaction(language, wallet_name, open_url);
        self.show_window(ctx, Window::SendTransaction, &text, Some(&keyboard))
            .await?;

        let this = self.clone();
        let task_ctx = ctx.clone();
        self.inner
            .tasks
            .spawn(ctx.user_id, move |task_id| async move {
                this.wait_transaction(task_ctx, request_id, task_id).await
            })
            .await;
        info!(request_id = request_id, valid_until = valid_until, "Transaction sent to wallet");
        Ok(())
    }

    /// Leaves the transaction flow: cancels the request and runs the `before` callback.
    #[instrument(skip(self), fields(user_id = ctx.user_id))]
    pub async fn send_transaction_back(&self, ctx: &UserContext) -> Result<()> {
        let (request_id, window) = self
            .inner
            .sessions
            .update(ctx, |s| (s.rpc_request_id.take(), s.current_window.clone()))
            .await?;
        if request_id.is_none() && window == Window::SendTransaction {
            debug!("step: transaction outcome already claimed, back ignored");
            return Ok(());
        }
        if let Some(request_id) = request_id {
            self.inner.tasks.abort(ctx.user_id).await;
            if let Err(e) = self
                .inner
                .bridge
                .cancel_transaction(ctx.user_id, request_id)
                .await
            {
                warn!(error = %e, request_id = request_id, "Failed to cancel transaction request");
            }
        }
        self.return_to_origin(ctx, Flow::Transaction).await
    }

    /// Resends the stored transaction with a fresh `valid_until`.
    #[instrument(skip(self), fields(user_id = ctx.user_id))]
    pub async fn retry_last_send_transaction(&self, ctx: &UserContext) -> Result<()> {
        let session = self.session(ctx).await?;
        let request = session
            .pending_transaction
            .ok_or(WindowError::RetryUnavailable("no transaction to resend"))?;
        let callbacks = session
            .transaction_callbacks
            .ok_or(WindowError::RetryUnavailable("no transaction callbacks stored"))?;
        self.send_transaction(ctx, callbacks, request).await
    }

    async fn wait_transaction(&self, ctx: UserContext, request_id: u64, task_id: u64) {
        let outcome = self
            .inner
            .bridge
            .wait_transaction(ctx.user_id, request_id, self.inner.options.transaction_timeout)
            .await;
        let result = match outcome {
            Ok(outcome) => self.settle_transaction(&ctx, request_id, task_id, outcome).await,
            Err(BridgeError::Cancelled) => {
                debug!(user_id = ctx.user_id, request_id = request_id, "step: transaction request cancelled");
                Ok(())
            }
            Err(e) => Err(e.into()),
        };
        if let Err(e) = result {
            error!(user_id = ctx.user_id, error = %e, "Send transaction flow failed");
        }
    }

    async fn settle_transaction(
        &self,
        ctx: &UserContext,
        request_id: u64,
        task_id: u64,
        outcome: TransactionOutcome,
    ) -> Result<()> {
        // Claim the outcome atomically: only the request still pending counts. A signed
        // transaction is kept wherever the user is; failures only matter on the transaction window.
        let confirmed = matches!(outcome, TransactionOutcome::Confirmed(_));
        let claimed = self
            .inner
            .sessions
            .update(ctx, move |s| {
                if s.rpc_request_id != Some(request_id) {
                    return false;
                }
                s.rpc_request_id = None;
                confirmed || s.current_window == Window::SendTransaction
            })
            .await?;
        if !claimed {
            debug!(user_id = ctx.user_id, request_id = request_id, "step: late transaction outcome ignored");
            return Ok(());
        }
        self.inner.tasks.release(ctx.user_id, task_id).await;

        match outcome {
            TransactionOutcome::Confirmed(receipt) => {
                let boc = receipt.boc.clone();
                let session = self
                    .inner
                    .sessions
                    .update(ctx, move |s| {
                        s.last_transaction_boc = Some(boc);
                        s.clone()
                    })
                    .await?;
                info!(user_id = ctx.user_id, request_id = request_id, "Transaction confirmed");
                match session.transaction_callbacks {
                    Some(callbacks) => self.invoke(ctx, &callbacks.after, Some(receipt)).await,
                    None => Ok(()),
                }
            }
            TransactionOutcome::Rejected => {
                info!(user_id = ctx.user_id, request_id = request_id, "Transaction rejected by wallet");
                self.flow_failed(
                    ctx,
                    Flow::Transaction,
                    Window::SendTransactionRejected,
                    TextKey::SendTransactionRejected,
                )
                .await
            }
            TransactionOutcome::Timeout => {
                info!(user_id = ctx.user_id, request_id = request_id, "Transaction timed out");
                self.flow_failed(
                    ctx,
                    Flow::Transaction,
                    Window::SendTransactionTimeout,
                    TextKey::SendTransactionTimeout,
                )
                .await
            }
        }
    }

    // ---------------------------------------------------------------------------------------
    // Navigation and rendering
    // ---------------------------------------------------------------------------------------

    /// Switches the interface language of the library windows.
    pub async fn update_language(&self, ctx: &UserContext, language_code: &str) -> Result<()> {
        if !self.inner.texts.supports(language_code) || !self.inner.keyboards.supports(language_code) {
            return Err(WindowError::LanguageNotSupported(language_code.to_string()));
        }
        let code = language_code.to_string();
        self.inner
            .sessions
            .update(ctx, move |s| s.language_code = Some(code))
            .await?;
        debug!(user_id = ctx.user_id, language = language_code, "step: language updated");
        Ok(())
    }

    /// Invokes the window registered as `name`.
    pub async fn run_callback(&self, ctx: &UserContext, name: &str) -> Result<()> {
        self.invoke(ctx, name, None).await
    }

    /// Renders `window` into the tracked message and makes it the current window.
    ///
    /// The tracked message is edited in place; when Telegram refuses the edit a new message is
    /// sent and the old one deleted (or blanked when it can no longer be deleted).
    pub async fn show_window(
        &self,
        ctx: &UserContext,
        window: Window,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<String> {
        if !window.is_library() {
            self.leave_flow(ctx).await?;
        }
        self.render(ctx, Some(window), text, keyboard).await
    }

    /// Cancels the request a library window is still waiting for when the bot's own windows take
    /// over, and stops its wait task.
    async fn leave_flow(&self, ctx: &UserContext) -> Result<()> {
        let (connect_pending, request_id) = self
            .inner
            .sessions
            .update(ctx, |s| (std::mem::take(&mut s.connect_pending), s.rpc_request_id.take()))
            .await?;
        if !connect_pending && request_id.is_none() {
            return Ok(());
        }
        self.inner.tasks.abort(ctx.user_id).await;
        if connect_pending {
            if let Err(e) = self.inner.bridge.cancel_connection(ctx.user_id).await {
                warn!(user_id = ctx.user_id, error = %e, "Failed to cancel connection request");
            }
        }
        if let Some(request_id) = request_id {
            if let Err(e) = self
                .inner
                .bridge
                .cancel_transaction(ctx.user_id, request_id)
                .await
            {
                warn!(user_id = ctx.user_id, error = %e, request_id = request_id, "Failed to cancel transaction request");
            }
        }
        info!(user_id = ctx.user_id, "Pending wallet request cancelled by navigation");
        Ok(())
    }

    /// Sends `key` as a standalone message, leaving the tracked window alone.
    pub async fn notify(&self, ctx: &UserContext, key: TextKey) -> Result<()> {
        let session = self.session(ctx).await?;
        let text = self
            .inner
            .texts
            .render(session.language(), key, session.wallet_name());
        self.inner.bot.send_message(&ctx.chat(), &text, None).await?;
        Ok(())
    }

    async fn render(
        &self,
        ctx: &UserContext,
        window: Option<Window>,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<String> {
        let chat = ctx.chat();
        let session = self.session(ctx).await?;
        let message_id = match session.message_id.as_deref() {
            Some(previous) => {
                match self
                    .inner
                    .bot
                    .edit_message(&chat, previous, text, keyboard)
                    .await
                {
                    Ok(()) | Err(DbotError::Bot(BotError::MessageNotModified)) => previous.to_string(),
                    Err(DbotError::Bot(e)) if e.is_edit_refusal() => {
                        debug!(user_id = ctx.user_id, reason = %e, "step: edit refused, sending new message");
                        let sent = self.inner.bot.send_message(&chat, text, keyboard).await?;
                        self.retire_message(&chat, previous, session.language())
                            .await?;
                        sent
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            None => self.inner.bot.send_message(&chat, text, keyboard).await?,
        };

        let tracked = message_id.clone();
        let shown = window.clone();
        self.inner
            .sessions
            .update(ctx, move |s| {
                s.message_id = Some(tracked);
                if let Some(window) = shown {
                    s.current_window = window;
                }
            })
            .await?;
        if let Some(window) = window {
            debug!(user_id = ctx.user_id, window = %window, message_id = %message_id, "step: window shown");
        }
        Ok(message_id)
    }

    /// Deletes a window message, blanking it with the outdated text when deletion is refused.
    async fn retire_message(&self, chat: &Chat, message_id: &str, language: &str) -> Result<()> {
        match self.inner.bot.delete_message(chat, message_id).await {
            Ok(()) => Ok(()),
            Err(DbotError::Bot(e)) if e.is_delete_refusal() => {
                let outdated = self.inner.texts.get(language, TextKey::OutdatedText);
                match self
                    .inner
                    .bot
                    .edit_message(chat, message_id, &outdated, None)
                    .await
                {
                    Ok(()) => Ok(()),
                    Err(DbotError::Bot(e)) if e.is_edit_refusal() => Ok(()),
                    Err(e) => Err(e.into()),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn show_failure(&self, ctx: &UserContext, window: Window, key: TextKey) -> Result<()> {
        let session = self.session(ctx).await?;
        let language = session.language();
        let text = self.inner.texts.render(language, key, session.wallet_name());
        let keyboard = self.inner.keyboards.retry(language);
        self.show_window(ctx, window, &text, Some(&keyboard)).await?;
        Ok(())
    }

    async fn flow_failed(&self, ctx: &UserContext, flow: Flow, window: Window, key: TextKey) -> Result<()> {
        match self.inner.options.failure_policy {
            FailurePolicy::OfferRetry => self.show_failure(ctx, window, key).await,
            FailurePolicy::RestorePrevious => {
                // Notice first, then a fresh window below it.
                let session = self.session(ctx).await?;
                if let Some(message_id) = session.message_id.as_deref() {
                    self.retire_message(&ctx.chat(), message_id, session.language())
                        .await?;
                    self.inner
                        .sessions
                        .update(ctx, |s| s.message_id = None)
                        .await?;
                }
                self.notify(ctx, key).await?;
                self.return_to_origin(ctx, flow).await
            }
        }
    }

    /// Runs the flow's `before` callback; when it leaves the flow window in place, falls back to
    /// the origin window.
    async fn return_to_origin(&self, ctx: &UserContext, flow: Flow) -> Result<()> {
        let session = self.session(ctx).await?;
        let from = session.current_window.clone();
        let callbacks = match flow {
            Flow::Connect => session.connect_callbacks,
            Flow::Transaction => session.transaction_callbacks,
        };
        if let Some(callbacks) = callbacks {
            self.invoke(ctx, &callbacks.before, None).await?;
        }

        let restored = self
            .inner
            .sessions
            .update(ctx, move |s| {
                if s.current_window == from {
                    s.current_window = s.origin_window.clone().unwrap_or_default();
                }
                s.current_window.clone()
            })
            .await?;
        debug!(user_id = ctx.user_id, window = %restored, flow = ?flow, "step: returned from flow");
        Ok(())
    }

    async fn invoke(
        &self,
        ctx: &UserContext,
        name: &str,
        receipt: Option<TransactionReceipt>,
    ) -> Result<()> {
        let callback = self.inner.callbacks.get(name)?;
        let session = self.session(ctx).await?;
        let mut flow = FlowContext::new(ctx.clone(), session);
        if let Some(receipt) = receipt {
            flow = flow.with_receipt(receipt);
        }
        debug!(user_id = ctx.user_id, callback = name, "step: invoking window callback");
        callback.call(self, flow).await
    }
}
