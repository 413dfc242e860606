//! Per-user session: the current window, the flow being driven and what the wallet told us.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;
use storage::{JsonRepository, KeyValueStore, StorageError};
use tcbot_core::{Chat, Update};
use ton_wallet::{AccountWallet, TransactionRequest, WalletApp};

use crate::callbacks::FlowCallbacks;

pub const DEFAULT_LANGUAGE: &str = "en";
pub const SESSION_COLLECTION: &str = "session";

/// A UI step. Library windows belong to the connect / transaction flows; `App` windows are
/// rendered by the bot's own callbacks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Window {
    #[default]
    Idle,
    ConnectWallet,
    ConnectWalletRejected,
    ConnectWalletTimeout,
    ConnectWalletProofWrong,
    SendTransaction,
    SendTransactionRejected,
    SendTransactionTimeout,
    App(String),
}

impl Window {
    pub fn app(name: impl Into<String>) -> Self {
        Window::App(name.into())
    }

    pub fn is_connect_flow(&self) -> bool {
        matches!(
            self,
            Window::ConnectWallet
                | Window::ConnectWalletRejected
                | Window::ConnectWalletTimeout
                | Window::ConnectWalletProofWrong
        )
    }

    pub fn is_transaction_flow(&self) -> bool {
        matches!(
            self,
            Window::SendTransaction
                | Window::SendTransactionRejected
                | Window::SendTransactionTimeout
        )
    }

    /// Windows owned by the window manager's callback-query handler.
    pub fn is_library(&self) -> bool {
        self.is_connect_flow() || self.is_transaction_flow()
    }

    pub fn as_str(&self) -> &str {
        match self {
            Window::Idle => "idle",
            Window::ConnectWallet => "connect_wallet",
            Window::ConnectWalletRejected => "connect_wallet_rejected",
            Window::ConnectWalletTimeout => "connect_wallet_timeout",
            Window::ConnectWalletProofWrong => "connect_wallet_proof_wrong",
            Window::SendTransaction => "send_transaction",
            Window::SendTransactionRejected => "send_transaction_rejected",
            Window::SendTransactionTimeout => "send_transaction_timeout",
            Window::App(name) => name,
        }
    }

    /// Inverse of the serialized form; `app:<name>` for app windows.
    pub fn parse(s: &str) -> Self {
        match s {
            "" | "idle" => Window::Idle,
            "connect_wallet" => Window::ConnectWallet,
            "connect_wallet_rejected" => Window::ConnectWalletRejected,
            "connect_wallet_timeout" => Window::ConnectWalletTimeout,
            "connect_wallet_proof_wrong" => Window::ConnectWalletProofWrong,
            "send_transaction" => Window::SendTransaction,
            "send_transaction_rejected" => Window::SendTransactionRejected,
            "send_transaction_timeout" => Window::SendTransactionTimeout,
            other => Window::App(other.strip_prefix("app:").unwrap_or(other).to_string()),
        }
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Window::App(name) => write!(f, "app:{}", name),
            other => f.write_str(other.as_str()),
        }
    }
}

impl Serialize for Window {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Window {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Window::parse(&s))
    }
}

/// Who an operation is for. Built from each incoming update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserContext {
    pub user_id: i64,
    pub chat_id: i64,
    pub language_code: Option<String>,
}

impl UserContext {
    pub fn new(user_id: i64, chat_id: i64) -> Self {
        Self {
            user_id,
            chat_id,
            language_code: None,
        }
    }

    pub fn from_update(update: &Update) -> Self {
        let user = update.user();
        Self {
            user_id: user.id,
            chat_id: update.chat().id,
            language_code: user.language_code.clone(),
        }
    }

    pub fn chat(&self) -> Chat {
        Chat::private(self.chat_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Session {
    pub user_id: i64,
    pub chat_id: i64,
    pub language_code: Option<String>,
    pub current_window: Window,
    /// Where back-navigation lands when the flow's `before` callback renders nothing.
    pub origin_window: Option<Window>,
    /// The one tracked window message.
    pub message_id: Option<String>,
    pub app_wallet: Option<WalletApp>,
    pub account_wallet: Option<AccountWallet>,
    pub connect_callbacks: Option<FlowCallbacks>,
    pub transaction_callbacks: Option<FlowCallbacks>,
    /// Kept only for retry.
    pub pending_transaction: Option<TransactionRequest>,
    pub rpc_request_id: Option<u64>,
    /// Set while a connect request waits for the wallet; cleared by whoever settles it.
    pub connect_pending: bool,
    pub proof_payload: Option<String>,
    pub last_transaction_boc: Option<String>,
}

impl Session {
    pub fn language(&self) -> &str {
        self.language_code.as_deref().unwrap_or(DEFAULT_LANGUAGE)
    }

    pub fn is_connected(&self) -> bool {
        self.account_wallet.is_some()
    }

    pub fn wallet_name(&self) -> &str {
        self.app_wallet
            .as_ref()
            .map(|w| w.name.as_str())
            .unwrap_or("Wallet")
    }

    /// Records where a flow started. Re-opening a flow from one of its own windows keeps the
    /// original origin.
    pub fn enter_flow(&mut self) {
        if !self.current_window.is_library() {
            self.origin_window = Some(self.current_window.clone());
        }
    }

    fn attach(&mut self, ctx: &UserContext) {
        self.user_id = ctx.user_id;
        self.chat_id = ctx.chat_id;
        if self.language_code.is_none() {
            self.language_code = ctx.language_code.clone();
        }
    }
}

/// Sessions stored as JSON under `session:{user_id}`.
#[derive(Clone)]
pub struct SessionRepository {
    repo: JsonRepository<Session>,
}

impl SessionRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            repo: JsonRepository::new(store, SESSION_COLLECTION),
        }
    }

    pub fn key(&self, user_id: i64) -> String {
        self.repo.key(user_id)
    }

    /// Stored session or a fresh `Idle` one bound to `ctx` (not persisted).
    pub async fn load(&self, ctx: &UserContext) -> Result<Session, StorageError> {
        let mut session = self.repo.load_or_default(ctx.user_id).await?;
        session.attach(ctx);
        Ok(session)
    }

    pub async fn get(&self, user_id: i64) -> Result<Option<Session>, StorageError> {
        self.repo.load(user_id).await
    }

    /// Atomic read-modify-write of one user's session.
    pub async fn update<F, R>(&self, ctx: &UserContext, f: F) -> Result<R, StorageError>
    where
        F: FnOnce(&mut Session) -> R + Send,
    {
        self.repo
            .update(ctx.user_id, |session| {
                session.attach(ctx);
                f(session)
            })
            .await
    }

    pub async fn delete(&self, user_id: i64) -> Result<bool, StorageError> {
        self.repo.delete(user_id).await
    }
}
