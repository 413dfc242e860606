//! Error types for the wallet domain and the bridge seam.

use thiserror::Error;

/// Local validation and wallet-list failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Amount must be positive")]
    NonPositiveAmount,

    #[error("Comment too long: {len} bytes (max {max})")]
    CommentTooLong { len: usize, max: usize },

    #[error("Failed to fetch wallets list: {0}")]
    FetchWallets(String),

    #[error("Wallets list is empty")]
    NoWallets,

    #[error("IO error: {0}")]
    Io(String),
}

/// Failures talking to the wallet bridge. Timeouts and rejections are outcomes, not errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("Wallet not connected")]
    NotConnected,

    #[error("Request cancelled")]
    Cancelled,

    #[error("Unknown request: {0}")]
    UnknownRequest(u64),

    #[error("Bridge transport error: {0}")]
    Transport(String),

    #[error("Bridge protocol error: {0}")]
    Protocol(String),
}

/// Why a `ton_proof` was not accepted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProofError {
    #[error("Wallet returned no ton_proof")]
    Missing,

    #[error("Malformed proof payload")]
    MalformedPayload,

    #[error("Proof payload expired")]
    Expired,

    #[error("Proof payload does not match the issued one")]
    PayloadMismatch,

    #[error("Invalid proof key or signature: {0}")]
    InvalidKey(String),

    #[error("Proof signature verification failed")]
    BadSignature,
}
