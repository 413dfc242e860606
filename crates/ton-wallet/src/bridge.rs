//! The wallet-bridge seam: how the window manager talks to a TON Connect client.
//!
//! Rejection and timeout are outcomes a flow reacts to; [`BridgeError`] is for everything that
//! should not happen in a healthy session.

use async_trait::async_trait;
use reqwest::Url;
use serde::Serialize;
use std::time::Duration;

use crate::error::BridgeError;
use crate::transaction::{Transaction, TransactionReceipt};
use crate::wallet_app::{WalletApp, WalletInfo};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    Connected(WalletInfo),
    Rejected,
    Timeout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionOutcome {
    Confirmed(TransactionReceipt),
    Rejected,
    Timeout,
}

/// A per-user TON Connect client.
///
/// `connect` / `send_transaction` start a request and return immediately; the matching `wait_*`
/// call resolves with the wallet's answer or [`ConnectOutcome::Timeout`]. A `cancel_*` call makes
/// a pending wait return [`BridgeError::Cancelled`].
#[async_trait]
pub trait WalletBridge: Send + Sync {
    /// Starts a connection to `wallet` and returns the universal link the user opens.
    async fn connect(
        &self,
        user_id: i64,
        wallet: &WalletApp,
        proof_payload: Option<&str>,
    ) -> Result<String, BridgeError>;

    async fn wait_connection(
        &self,
        user_id: i64,
        timeout: Duration,
    ) -> Result<ConnectOutcome, BridgeError>;

    async fn cancel_connection(&self, user_id: i64) -> Result<(), BridgeError>;

    /// Errors with [`BridgeError::NotConnected`] when there is nothing to disconnect.
    async fn disconnect(&self, user_id: i64) -> Result<(), BridgeError>;

    /// Sends the request to the connected wallet; returns the RPC request id.
    async fn send_transaction(&self, user_id: i64, tx: &Transaction) -> Result<u64, BridgeError>;

    async fn wait_transaction(
        &self,
        user_id: i64,
        request_id: u64,
        timeout: Duration,
    ) -> Result<TransactionOutcome, BridgeError>;

    async fn cancel_transaction(&self, user_id: i64, request_id: u64) -> Result<(), BridgeError>;
}

/// TON Connect `ConnectRequest`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectRequest {
    #[serde(rename = "manifestUrl")]
    pub manifest_url: String,
    pub items: Vec<ConnectItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum ConnectItem {
    TonAddr,
    TonProof { payload: String },
}

impl ConnectRequest {
    pub fn new(manifest_url: impl Into<String>, proof_payload: Option<&str>) -> Self {
        let mut items = vec![ConnectItem::TonAddr];
        if let Some(payload) = proof_payload {
            items.push(ConnectItem::TonProof {
                payload: payload.to_string(),
            });
        }
        Self {
            manifest_url: manifest_url.into(),
            items,
        }
    }
}

/// Builds `universal_url?v=2&id=<client id>&r=<request json>&ret=<redirect|back>`.
pub fn universal_link(
    wallet: &WalletApp,
    client_id: &str,
    request: &ConnectRequest,
    redirect_url: Option<&str>,
) -> Result<String, BridgeError> {
    let base = wallet.universal_url.as_deref().ok_or_else(|| {
        BridgeError::Protocol(format!("wallet {} has no universal url", wallet.app_name))
    })?;
    let request_json =
        serde_json::to_string(request).map_err(|e| BridgeError::Protocol(e.to_string()))?;
    let url = Url::parse_with_params(
        base,
        &[
            ("v", "2"),
            ("id", client_id),
            ("r", request_json.as_str()),
            ("ret", redirect_url.unwrap_or("back")),
        ],
    )
    .map_err(|e| BridgeError::Protocol(format!("invalid universal url {}: {}", base, e)))?;
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tonkeeper() -> WalletApp {
        WalletApp {
            app_name: "tonkeeper".to_string(),
            name: "Tonkeeper".to_string(),
            image: String::new(),
            about_url: String::new(),
            universal_url: Some("https://app.tonkeeper.com/ton-connect".to_string()),
            bridge_url: "https://bridge.tonapi.io/bridge".to_string(),
        }
    }

    #[test]
    fn test_connect_request_json() {
        let request = ConnectRequest::new("https://bot.example.org/manifest.json", Some("ab"));
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["manifestUrl"], "https://bot.example.org/manifest.json");
        assert_eq!(json["items"][0]["name"], "ton_addr");
        assert_eq!(json["items"][1]["name"], "ton_proof");
        assert_eq!(json["items"][1]["payload"], "ab");
    }

    #[test]
    fn test_universal_link_query() {
        let request = ConnectRequest::new("https://bot.example.org/manifest.json", None);
        let link = universal_link(&tonkeeper(), "c1", &request, None).unwrap();
        let url = Url::parse(&link).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert!(link.starts_with("https://app.tonkeeper.com/ton-connect?v=2&id=c1&r="));
        assert!(pairs.contains(&("ret".to_string(), "back".to_string())));
        let r = &pairs.iter().find(|(k, _)| k == "r").unwrap().1;
        assert!(r.contains("manifestUrl"));
    }

    #[test]
    fn test_universal_link_requires_url() {
        let mut wallet = tonkeeper();
        wallet.universal_url = None;
        let request = ConnectRequest::new("https://bot.example.org/manifest.json", None);
        assert!(matches!(
            universal_link(&wallet, "c1", &request, None),
            Err(BridgeError::Protocol(_))
        ));
    }
}
