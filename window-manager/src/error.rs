//! Window manager errors.

use storage::StorageError;
use tcbot_core::{DbotError, HandlerError};
use thiserror::Error;
use ton_wallet::{BridgeError, WalletError};

#[derive(Error, Debug)]
pub enum WindowError {
    #[error("Wallet not connected")]
    WalletNotConnected,

    #[error("Nothing to retry: {0}")]
    RetryUnavailable(&'static str),

    #[error("Unknown window callback: {0}")]
    UnknownCallback(String),

    #[error("Language not supported: {0}")]
    LanguageNotSupported(String),

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Transport(#[from] DbotError),
}

impl WindowError {
    /// Caller mistakes the user can recover from by typing or pressing something else.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            WindowError::WalletNotConnected
                | WindowError::Wallet(
                    WalletError::InvalidAddress(_)
                        | WalletError::InvalidAmount(_)
                        | WalletError::NonPositiveAmount
                        | WalletError::CommentTooLong { .. }
                )
        )
    }
}

impl From<WindowError> for DbotError {
    fn from(e: WindowError) -> Self {
        match e {
            WindowError::Transport(inner) => inner,
            WindowError::Storage(inner) => DbotError::Database(inner.to_string()),
            other => DbotError::Handler(HandlerError::State(other.to_string())),
        }
    }
}

pub type Result<T> = std::result::Result<T, WindowError>;
