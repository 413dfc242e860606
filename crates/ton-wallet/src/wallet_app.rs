//! Wallet apps from the public wallets list and what a connected wallet reports back.

use serde::{Deserialize, Serialize};

/// One `bridge` entry of a wallets-list item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeEntry {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Raw wallets-list item. Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletListEntry {
    pub app_name: String,
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub about_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub universal_url: Option<String>,
    #[serde(default)]
    pub bridge: Vec<BridgeEntry>,
}

impl WalletListEntry {
    /// URL of the first SSE bridge, if the wallet has one.
    pub fn sse_bridge_url(&self) -> Option<&str> {
        self.bridge
            .iter()
            .find(|b| b.kind.contains("sse"))
            .and_then(|b| b.url.as_deref())
    }
}

/// A wallet app the user can pick in the connect window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletApp {
    pub app_name: String,
    pub name: String,
    pub image: String,
    pub about_url: String,
    pub universal_url: Option<String>,
    pub bridge_url: String,
}

impl WalletApp {
    /// Keeps only wallets reachable over an SSE bridge.
    pub fn from_entry(entry: &WalletListEntry) -> Option<Self> {
        let bridge_url = entry.sse_bridge_url()?.to_string();
        Some(Self {
            app_name: entry.app_name.clone(),
            name: entry.name.clone(),
            image: entry.image.clone(),
            about_url: entry.about_url.clone(),
            universal_url: entry.universal_url.clone(),
            bridge_url,
        })
    }
}

/// Connected account as reported by the wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountWallet {
    /// Raw form `wc:hex`.
    pub address: String,
    /// `-239` mainnet, `-3` testnet.
    pub chain: String,
    /// Hex-encoded ed25519 key; wallets may omit it.
    pub public_key: Option<String>,
}

/// `ton_proof` item returned on connect when a payload was requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TonProof {
    pub timestamp: u64,
    pub domain: String,
    pub payload: String,
    /// Hex-encoded ed25519 signature.
    pub signature: String,
}

impl TonProof {
    pub fn domain_len(&self) -> u32 {
        self.domain.len() as u32
    }
}

/// Everything the bridge hands back on a successful connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletInfo {
    pub device_app_name: String,
    pub account: AccountWallet,
    pub ton_proof: Option<TonProof>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_without_sse_bridge_is_dropped() {
        let json = r#"[
            {"app_name": "tonkeeper", "name": "Tonkeeper", "image": "i", "about_url": "a",
             "universal_url": "https://app.tonkeeper.com/ton-connect",
             "bridge": [{"type": "sse", "url": "https://bridge.tonapi.io/bridge"},
                        {"type": "js", "key": "tonkeeper"}],
             "platforms": ["ios"]},
            {"app_name": "injected", "name": "Injected", "bridge": [{"type": "js", "key": "x"}]}
        ]"#;
        let entries: Vec<WalletListEntry> = serde_json::from_str(json).unwrap();
        let apps: Vec<WalletApp> = entries.iter().filter_map(WalletApp::from_entry).collect();

        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].app_name, "tonkeeper");
        assert_eq!(apps[0].bridge_url, "https://bridge.tonapi.io/bridge");
    }
}
