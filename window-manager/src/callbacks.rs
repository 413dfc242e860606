//! Named window callbacks.
//!
//! Sessions outlive the process, closures do not: a flow stores the names of its `before` and
//! `after` windows and the [`CallbackRegistry`] resolves them when the flow needs them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use ton_wallet::{AccountWallet, TransactionReceipt};

use crate::error::{Result, WindowError};
use crate::manager::WindowManager;
use crate::session::{Session, UserContext};

/// The callback pair bracketing a connect or transaction flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowCallbacks {
    /// Renders the window the user goes back to.
    pub before: String,
    /// Renders the window shown once the flow succeeds.
    pub after: String,
}

impl FlowCallbacks {
    pub fn new(before: impl Into<String>, after: impl Into<String>) -> Self {
        Self {
            before: before.into(),
            after: after.into(),
        }
    }
}

/// What a callback gets to work with.
#[derive(Debug, Clone)]
pub struct FlowContext {
    pub user: UserContext,
    /// Session as it was when the callback was invoked.
    pub session: Session,
    /// Set after a successful connect, and for any session with a connected wallet.
    pub wallet: Option<AccountWallet>,
    /// Set after a confirmed transaction.
    pub receipt: Option<TransactionReceipt>,
}

impl FlowContext {
    pub fn new(user: UserContext, session: Session) -> Self {
        let wallet = session.account_wallet.clone();
        Self {
            user,
            session,
            wallet,
            receipt: None,
        }
    }

    pub fn with_receipt(mut self, receipt: TransactionReceipt) -> Self {
        self.receipt = Some(receipt);
        self
    }

    pub fn language(&self) -> &str {
        self.session.language()
    }
}

/// A window the bot renders itself (main menu, amount prompt...).
#[async_trait]
pub trait WindowCallback: Send + Sync {
    async fn call(&self, manager: &WindowManager, flow: FlowContext) -> Result<()>;
}

#[derive(Clone, Default)]
pub struct CallbackRegistry {
    callbacks: HashMap<String, Arc<dyn WindowCallback>>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` under `name`, replacing any previous one.
    pub fn register(mut self, name: impl Into<String>, callback: Arc<dyn WindowCallback>) -> Self {
        self.callbacks.insert(name.into(), callback);
        self
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn WindowCallback>> {
        self.callbacks
            .get(name)
            .cloned()
            .ok_or_else(|| WindowError::UnknownCallback(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.callbacks.contains_key(name)
    }

    /// Fails on the first name that is not registered.
    pub fn check(&self, callbacks: &FlowCallbacks) -> Result<()> {
        for name in [&callbacks.before, &callbacks.after] {
            if !self.contains(name) {
                return Err(WindowError::UnknownCallback(name.clone()));
            }
        }
        Ok(())
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.callbacks.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
