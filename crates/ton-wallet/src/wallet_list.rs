//! Wallet apps offered in the connect window.
//!
//! Source order: in-memory cache (TTL) → remote wallets list → fallback file → built-in list.
//! A successful fetch refreshes both the cache and the fallback file.

use reqwest::Client;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::WalletError;
use crate::wallet_app::{WalletApp, WalletListEntry};

pub const DEFAULT_WALLETS_SOURCE_URL: &str =
    "https://raw.githubusercontent.com/ton-blockchain/wallets-list/main/wallets-v2.json";

const BUILTIN_WALLETS: &str = include_str!("../data/wallets_builtin.json");

#[derive(Debug, Clone)]
pub struct WalletListConfig {
    pub source_url: String,
    pub fallback_path: Option<PathBuf>,
    /// `app_name`s never offered.
    pub exclude: Vec<String>,
    /// `app_name`s moved to the front, in this order.
    pub order: Vec<String>,
    pub cache_ttl: Duration,
    pub request_timeout: Duration,
}

impl Default for WalletListConfig {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_WALLETS_SOURCE_URL.to_string(),
            fallback_path: None,
            exclude: Vec::new(),
            order: Vec::new(),
            cache_ttl: Duration::from_secs(86_400),
            request_timeout: Duration::from_secs(10),
        }
    }
}

struct CachedList {
    fetched_at: Instant,
    entries: Vec<WalletListEntry>,
}

pub struct WalletList {
    client: Client,
    config: WalletListConfig,
    cache: RwLock<Option<CachedList>>,
}

impl WalletList {
    pub fn new(config: WalletListConfig) -> Result<Self, WalletError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| WalletError::FetchWallets(e.to_string()))?;
        Ok(Self {
            client,
            config,
            cache: RwLock::new(None),
        })
    }

    pub fn config(&self) -> &WalletListConfig {
        &self.config
    }

    /// Supported wallet apps, never empty on success.
    pub async fn get_wallets(&self) -> Result<Vec<WalletApp>, WalletError> {
        let entries = self.entries().await;
        let wallets = self.process(&entries);
        if wallets.is_empty() {
            return Err(WalletError::NoWallets);
        }
        Ok(wallets)
    }

    /// The app named `app_name`, or the first wallet when it is unknown or excluded.
    pub async fn find_or_first(&self, app_name: Option<&str>) -> Result<WalletApp, WalletError> {
        let mut wallets = self.get_wallets().await?;
        let index = app_name
            .and_then(|name| wallets.iter().position(|w| w.app_name == name))
            .unwrap_or(0);
        Ok(wallets.swap_remove(index))
    }

    /// Drops the cached list so the next call refetches.
    pub async fn invalidate(&self) {
        *self.cache.write().await = None;
    }

    async fn entries(&self) -> Vec<WalletListEntry> {
        if let Some(cached) = self.cache.read().await.as_ref() {
            if cached.fetched_at.elapsed() < self.config.cache_ttl {
                debug!(count = cached.entries.len(), "Wallets list served from cache");
                return cached.entries.clone();
            }
        }

        let entries = match self.fetch().await {
            Ok(entries) => {
                info!(count = entries.len(), url = %self.config.source_url, "Fetched wallets list");
                self.save_fallback(&entries).await;
                entries
            }
            Err(e) => {
                warn!(error = %e, "Wallets list fetch failed, using fallback");
                self.load_fallback().await
            }
        };

        *self.cache.write().await = Some(CachedList {
            fetched_at: Instant::now(),
            entries: entries.clone(),
        });
        entries
    }

    async fn fetch(&self) -> Result<Vec<WalletListEntry>, WalletError> {
        let response = self
            .client
            .get(&self.config.source_url)
            .send()
            .await
            .map_err(|e| WalletError::FetchWallets(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WalletError::FetchWallets(format!("HTTP {}", status)));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| WalletError::FetchWallets(e.to_string()))?;
        let items = body.as_array().ok_or_else(|| {
            WalletError::FetchWallets("wallets list must be an array".to_string())
        })?;

        // Malformed items are skipped, not fatal.
        Ok(items
            .iter()
            .filter_map(|item| serde_json::from_value(item.clone()).ok())
            .collect())
    }

    async fn load_fallback(&self) -> Vec<WalletListEntry> {
        if let Some(path) = &self.config.fallback_path {
            match tokio::fs::read_to_string(path).await {
                Ok(raw) => match serde_json::from_str::<Vec<WalletListEntry>>(&raw) {
                    Ok(entries) if !entries.is_empty() => {
                        debug!(path = %path.display(), "Loaded wallets fallback file");
                        return entries;
                    }
                    Ok(_) => warn!(path = %path.display(), "Wallets fallback file is empty"),
                    Err(e) => warn!(path = %path.display(), error = %e, "Invalid wallets fallback file"),
                },
                Err(e) => debug!(path = %path.display(), error = %e, "No wallets fallback file"),
            }
        }
        builtin_entries()
    }

    async fn save_fallback(&self, entries: &[WalletListEntry]) {
        let Some(path) = &self.config.fallback_path else {
            return;
        };
        let result = async {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }
            let raw = serde_json::to_string(entries)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
            tokio::fs::write(path, raw).await
        }
        .await;
        if let Err(e) = result {
            warn!(path = %path.display(), error = %e, "Failed to save wallets fallback file");
        }
    }

    fn process(&self, entries: &[WalletListEntry]) -> Vec<WalletApp> {
        let mut wallets: Vec<WalletApp> = entries
            .iter()
            .filter(|e| !self.config.exclude.contains(&e.app_name))
            .filter_map(WalletApp::from_entry)
            .collect();
        order_wallets(&mut wallets, &self.config.order);
        wallets
    }
}

/// Moves the wallets named in `order` to the front; the rest keep their relative order.
pub fn order_wallets(wallets: &mut [WalletApp], order: &[String]) {
    let rank = |w: &WalletApp| {
        order
            .iter()
            .position(|name| *name == w.app_name)
            .unwrap_or(order.len())
    };
    wallets.sort_by_key(rank);
}

fn builtin_entries() -> Vec<WalletListEntry> {
    serde_json::from_str(BUILTIN_WALLETS).unwrap_or_default()
}
