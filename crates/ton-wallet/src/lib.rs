//! TON wallet domain used by the window manager.
//!
//! ## Modules
//!
//! - [`address`] – raw / user-friendly addresses
//! - [`transaction`] – transfer requests, amount parsing, comment payloads
//! - [`wallet_app`] – wallet apps and connected wallet info
//! - [`wallet_list`] – fetched, cached and filtered wallets list
//! - [`proof`] – ton_proof payloads and signature checks
//! - [`bridge`] – WalletBridge trait and connect links
//! - [`simulated`] – SimulatedBridge

pub mod address;
pub mod bridge;
pub mod error;
pub mod proof;
pub mod simulated;
pub mod transaction;
pub mod wallet_app;
pub mod wallet_list;

pub use address::{Address, FriendlyFormat};
pub use bridge::{universal_link, ConnectOutcome, ConnectRequest, TransactionOutcome, WalletBridge};
pub use error::{BridgeError, ProofError, WalletError};
pub use simulated::{BridgeCall, SimulatedBridge, SimulationMode};
pub use transaction::{
    format_ton_amount, parse_ton_amount, Transaction, TransactionMessage, TransactionReceipt,
    TransactionRequest, NANOTONS,
};
pub use wallet_app::{AccountWallet, TonProof, WalletApp, WalletInfo, WalletListEntry};
pub use wallet_list::{WalletList, WalletListConfig, DEFAULT_WALLETS_SOURCE_URL};
