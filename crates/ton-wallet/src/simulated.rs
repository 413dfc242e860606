//! In-process [`WalletBridge`] for the demo bot and tests.
//!
//! In manual mode every wait blocks until `resolve_*` is called (or the timeout passes). In auto
//! mode pending requests succeed after a fixed delay with a wallet derived from the user id.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use ed25519_dalek::{Signer, SigningKey};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};
use tracing::{debug, info};

use crate::address::Address;
use crate::bridge::{universal_link, ConnectOutcome, ConnectRequest, TransactionOutcome, WalletBridge};
use crate::error::BridgeError;
use crate::proof::signing_digest;
use crate::transaction::{Transaction, TransactionReceipt};
use crate::wallet_app::{AccountWallet, TonProof, WalletApp, WalletInfo};

const SIMULATED_DOMAIN: &str = "simulated.bridge";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationMode {
    Manual,
    Auto { delay: Duration },
}

/// Bridge calls, recorded in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeCall {
    Connect {
        user_id: i64,
        app_name: String,
        proof_payload: Option<String>,
    },
    CancelConnection {
        user_id: i64,
    },
    Disconnect {
        user_id: i64,
    },
    SendTransaction {
        user_id: i64,
        request_id: u64,
        transaction: Transaction,
    },
    CancelTransaction {
        user_id: i64,
        request_id: u64,
    },
}

struct PendingConnection {
    attempt: u64,
    tx: Option<oneshot::Sender<ConnectOutcome>>,
    rx: Option<oneshot::Receiver<ConnectOutcome>>,
    app_name: String,
    proof_payload: Option<String>,
}

struct PendingTransaction {
    user_id: i64,
    tx: Option<oneshot::Sender<TransactionOutcome>>,
    rx: Option<oneshot::Receiver<TransactionOutcome>>,
    transaction: Transaction,
}

#[derive(Default)]
struct State {
    connections: HashMap<i64, PendingConnection>,
    connected: HashMap<i64, WalletInfo>,
    transactions: HashMap<u64, PendingTransaction>,
    calls: Vec<BridgeCall>,
}

pub struct SimulatedBridge {
    mode: SimulationMode,
    manifest_url: String,
    redirect_url: Option<String>,
    next_request_id: AtomicU64,
    state: Mutex<State>,
}

impl SimulatedBridge {
    pub fn manual() -> Self {
        Self::new(SimulationMode::Manual)
    }

    pub fn auto(delay: Duration) -> Self {
        Self::new(SimulationMode::Auto { delay })
    }

    pub fn new(mode: SimulationMode) -> Self {
        Self {
            mode,
            manifest_url: "https://localhost/tonconnect-manifest.json".to_string(),
            redirect_url: None,
            next_request_id: AtomicU64::new(1),
            state: Mutex::new(State::default()),
        }
    }

    pub fn with_manifest_url(mut self, url: impl Into<String>) -> Self {
        self.manifest_url = url.into();
        self
    }

    pub fn with_redirect_url(mut self, url: Option<String>) -> Self {
        self.redirect_url = url;
        self
    }

    pub fn mode(&self) -> SimulationMode {
        self.mode
    }

    /// Delivers the wallet's answer to a pending connection. Returns false when nothing waits.
    pub async fn resolve_connection(&self, user_id: i64, outcome: ConnectOutcome) -> bool {
        let mut state = self.state.lock().await;
        let sender = state
            .connections
            .get_mut(&user_id)
            .and_then(|pending| pending.tx.take());
        match sender {
            Some(sender) => sender.send(outcome).is_ok(),
            None => false,
        }
    }

    /// Delivers the wallet's answer to a pending transaction. Returns false when nothing waits.
    pub async fn resolve_transaction(&self, request_id: u64, outcome: TransactionOutcome) -> bool {
        let mut state = self.state.lock().await;
        let sender = state
            .transactions
            .get_mut(&request_id)
            .and_then(|pending| pending.tx.take());
        match sender {
            Some(sender) => sender.send(outcome).is_ok(),
            None => false,
        }
    }

    /// Marks a user as connected without going through `connect`.
    pub async fn set_connected(&self, user_id: i64, info: Option<WalletInfo>) {
        let mut state = self.state.lock().await;
        match info {
            Some(info) => state.connected.insert(user_id, info),
            None => state.connected.remove(&user_id),
        };
    }

    pub async fn connected_wallet(&self, user_id: i64) -> Option<WalletInfo> {
        self.state.lock().await.connected.get(&user_id).cloned()
    }

    pub async fn calls(&self) -> Vec<BridgeCall> {
        self.state.lock().await.calls.clone()
    }

    /// Request id of the user's newest pending transaction.
    pub async fn pending_request_id(&self, user_id: i64) -> Option<u64> {
        let state = self.state.lock().await;
        state
            .transactions
            .iter()
            .filter(|(_, pending)| pending.user_id == user_id)
            .map(|(id, _)| *id)
            .max()
    }

    pub async fn has_pending_connection(&self, user_id: i64) -> bool {
        self.state.lock().await.connections.contains_key(&user_id)
    }

    /// True once a `wait_connection` call has picked up the user's pending connection.
    pub async fn connection_awaited(&self, user_id: i64) -> bool {
        self.state
            .lock()
            .await
            .connections
            .get(&user_id)
            .is_some_and(|pending| pending.rx.is_none())
    }

    /// Deterministic wallet for `user_id`, signing `proof_payload` when given.
    pub fn simulated_wallet(user_id: i64, app_name: &str, proof_payload: Option<&str>) -> WalletInfo {
        let key = signing_key(user_id);
        let hash: [u8; 32] = Sha256::digest(format!("simulated-wallet:{}", user_id)).into();
        let address = Address::new(0, hash);

        let ton_proof = proof_payload.map(|payload| {
            let timestamp = Utc::now().timestamp().max(0) as u64;
            let digest = signing_digest(&address, SIMULATED_DOMAIN, timestamp, payload);
            TonProof {
                timestamp,
                domain: SIMULATED_DOMAIN.to_string(),
                payload: payload.to_string(),
                signature: hex::encode(key.sign(&digest).to_bytes()),
            }
        });

        WalletInfo {
            device_app_name: app_name.to_string(),
            account: AccountWallet {
                address: address.to_raw(),
                chain: "-239".to_string(),
                public_key: Some(hex::encode(key.verifying_key().to_bytes())),
            },
            ton_proof,
        }
    }
}

fn signing_key(user_id: i64) -> SigningKey {
    let seed: [u8; 32] = Sha256::digest(format!("simulated-key:{}", user_id)).into();
    SigningKey::from_bytes(&seed)
}

fn simulated_receipt(transaction: &Transaction) -> TransactionReceipt {
    let body = serde_json::to_vec(transaction).unwrap_or_default();
    TransactionReceipt {
        boc: STANDARD.encode(Sha256::digest(&body)),
    }
}

#[async_trait]
impl WalletBridge for SimulatedBridge {
    async fn connect(
        &self,
        user_id: i64,
        wallet: &WalletApp,
        proof_payload: Option<&str>,
    ) -> Result<String, BridgeError> {
        let request = ConnectRequest::new(self.manifest_url.clone(), proof_payload);
        let client_id = hex::encode(signing_key(user_id).verifying_key().to_bytes());
        let link = universal_link(wallet, &client_id, &request, self.redirect_url.as_deref())?;

        let (tx, rx) = oneshot::channel();
        let attempt = self.next_request_id.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().await;
        state.connections.insert(
            user_id,
            PendingConnection {
                attempt,
                tx: Some(tx),
                rx: Some(rx),
                app_name: wallet.app_name.clone(),
                proof_payload: proof_payload.map(str::to_string),
            },
        );
        state.calls.push(BridgeCall::Connect {
            user_id,
            app_name: wallet.app_name.clone(),
            proof_payload: proof_payload.map(str::to_string),
        });
        debug!(user_id = user_id, app_name = %wallet.app_name, "Simulated connect started");
        Ok(link)
    }

    async fn wait_connection(
        &self,
        user_id: i64,
        timeout: Duration,
    ) -> Result<ConnectOutcome, BridgeError> {
        let (attempt, rx, app_name, proof_payload) = {
            let mut state = self.state.lock().await;
            let pending = state
                .connections
                .get_mut(&user_id)
                .ok_or_else(|| BridgeError::Protocol("no pending connection".to_string()))?;
            let rx = pending
                .rx
                .take()
                .ok_or_else(|| BridgeError::Protocol("connection already awaited".to_string()))?;
            (
                pending.attempt,
                rx,
                pending.app_name.clone(),
                pending.proof_payload.clone(),
            )
        };

        let answer = async move {
            match self.mode {
                SimulationMode::Manual => rx.await.map_err(|_| BridgeError::Cancelled),
                SimulationMode::Auto { delay } => {
                    tokio::select! {
                        resolved = rx => resolved.map_err(|_| BridgeError::Cancelled),
                        _ = tokio::time::sleep(delay) => Ok(ConnectOutcome::Connected(
                            Self::simulated_wallet(user_id, &app_name, proof_payload.as_deref()),
                        )),
                    }
                }
            }
        };

        let outcome = match tokio::time::timeout(timeout, answer).await {
            Ok(result) => result?,
            Err(_) => ConnectOutcome::Timeout,
        };

        let mut state = self.state.lock().await;
        // A newer `connect` may already have replaced this attempt.
        if state
            .connections
            .get(&user_id)
            .is_some_and(|pending| pending.attempt == attempt)
        {
            state.connections.remove(&user_id);
        }
        if let ConnectOutcome::Connected(info) = &outcome {
            state.connected.insert(user_id, info.clone());
            info!(user_id = user_id, address = %info.account.address, "Simulated wallet connected");
        }
        Ok(outcome)
    }

    async fn cancel_connection(&self, user_id: i64) -> Result<(), BridgeError> {
        let mut state = self.state.lock().await;
        // Dropping the sender wakes the waiter with `Cancelled`.
        state.connections.remove(&user_id);
        state.calls.push(BridgeCall::CancelConnection { user_id });
        Ok(())
    }

    async fn disconnect(&self, user_id: i64) -> Result<(), BridgeError> {
        let mut state = self.state.lock().await;
        state.calls.push(BridgeCall::Disconnect { user_id });
        match state.connected.remove(&user_id) {
            Some(_) => Ok(()),
            None => Err(BridgeError::NotConnected),
        }
    }

    async fn send_transaction(&self, user_id: i64, tx: &Transaction) -> Result<u64, BridgeError> {
        let mut state = self.state.lock().await;
        if !state.connected.contains_key(&user_id) {
            return Err(BridgeError::NotConnected);
        }
        let request_id = self.next_request_id.fetch_add(1, Ordering::SeqCst);
        let (sender, receiver) = oneshot::channel();
        state.transactions.insert(
            request_id,
            PendingTransaction {
                user_id,
                tx: Some(sender),
                rx: Some(receiver),
                transaction: tx.clone(),
            },
        );
        state.calls.push(BridgeCall::SendTransaction {
            user_id,
            request_id,
            transaction: tx.clone(),
        });
        debug!(user_id = user_id, request_id = request_id, "Simulated transaction sent");
        Ok(request_id)
    }

    async fn wait_transaction(
        &self,
        user_id: i64,
        request_id: u64,
        timeout: Duration,
    ) -> Result<TransactionOutcome, BridgeError> {
        let (rx, transaction) = {
            let mut state = self.state.lock().await;
            let pending = state
                .transactions
                .get_mut(&request_id)
                .filter(|pending| pending.user_id == user_id)
                .ok_or(BridgeError::UnknownRequest(request_id))?;
            let rx = pending
                .rx
                .take()
                .ok_or_else(|| BridgeError::Protocol("transaction already awaited".to_string()))?;
            (rx, pending.transaction.clone())
        };

        let answer = async move {
            match self.mode {
                SimulationMode::Manual => rx.await.map_err(|_| BridgeError::Cancelled),
                SimulationMode::Auto { delay } => {
                    tokio::select! {
                        resolved = rx => resolved.map_err(|_| BridgeError::Cancelled),
                        _ = tokio::time::sleep(delay) => Ok(TransactionOutcome::Confirmed(
                            simulated_receipt(&transaction),
                        )),
                    }
                }
            }
        };

        let outcome = match tokio::time::timeout(timeout, answer).await {
            Ok(result) => result?,
            Err(_) => TransactionOutcome::Timeout,
        };
        self.state.lock().await.transactions.remove(&request_id);
        Ok(outcome)
    }

    async fn cancel_transaction(&self, user_id: i64, request_id: u64) -> Result<(), BridgeError> {
        let mut state = self.state.lock().await;
        state.transactions.remove(&request_id);
        state.calls.push(BridgeCall::CancelTransaction {
            user_id,
            request_id,
        });
        Ok(())
    }
}
