//! TON Connect settings: manifest, wallets list, timeouts, failure policy and bridge.

use anyhow::{anyhow, bail, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use ton_wallet::{WalletListConfig, DEFAULT_WALLETS_SOURCE_URL};
use window_manager::{FailurePolicy, ManagerOptions};

pub const SIMULATED_BRIDGE: &str = "simulated";

#[derive(Debug, Clone)]
pub struct TonConnectConfig {
    /// TC_MANIFEST_URL
    pub manifest_url: String,
    /// TC_REDIRECT_URL: where the wallet sends the user back after approving
    pub redirect_url: Option<String>,
    pub wallets_source_url: String,
    pub wallets_fallback_path: String,
    /// `app_name`s hidden from the connect window
    pub exclude_wallets: Vec<String>,
    pub wallets_cache_ttl_secs: u64,
    pub check_proof: bool,
    pub connect_timeout_secs: u64,
    pub transaction_timeout_secs: u64,
    pub failure_policy: FailurePolicy,
    /// TC_BRIDGE; only the simulated bridge ships with the demo
    pub bridge: String,
    /// TC_SIMULATED_DELAY_SECS: how long the simulated wallet takes to answer
    pub simulated_delay_secs: u64,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T: FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow!("{} is not valid: {}", key, raw)),
        Err(_) => Ok(default),
    }
}

impl TonConnectConfig {
    /// TC_MANIFEST_URL is required; everything else has a default.
    pub fn from_env() -> Result<Self> {
        let manifest_url = env::var("TC_MANIFEST_URL")
            .map_err(|_| anyhow!("TC_MANIFEST_URL not set"))?;
        let redirect_url = env::var("TC_REDIRECT_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());
        let exclude_wallets = env::var("TC_EXCLUDE_WALLETS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let failure_policy = match env::var("TC_FAILURE_POLICY") {
            Ok(raw) => FailurePolicy::from_str(&raw).map_err(|e| anyhow!("TC_FAILURE_POLICY: {}", e))?,
            Err(_) => FailurePolicy::default(),
        };

        Ok(Self {
            manifest_url,
            redirect_url,
            wallets_source_url: var_or("TC_WALLETS_SOURCE_URL", DEFAULT_WALLETS_SOURCE_URL),
            wallets_fallback_path: var_or("TC_WALLETS_FALLBACK_PATH", "./data/wallets_fallback.json"),
            exclude_wallets,
            wallets_cache_ttl_secs: parse_var("TC_WALLETS_CACHE_TTL_SECS", 86_400)?,
            check_proof: parse_var("TC_CHECK_PROOF", false)?,
            connect_timeout_secs: parse_var("TC_CONNECT_TIMEOUT_SECS", 180)?,
            transaction_timeout_secs: parse_var("TC_TRANSACTION_TIMEOUT_SECS", 300)?,
            failure_policy,
            bridge: var_or("TC_BRIDGE", SIMULATED_BRIDGE).trim().to_ascii_lowercase(),
            simulated_delay_secs: parse_var("TC_SIMULATED_DELAY_SECS", 5)?,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if reqwest::Url::parse(&self.manifest_url).is_err() {
            bail!("TC_MANIFEST_URL is not a valid URL: {}", self.manifest_url);
        }
        if let Some(ref url) = self.redirect_url {
            if reqwest::Url::parse(url).is_err() {
                bail!("TC_REDIRECT_URL is not a valid URL: {}", url);
            }
        }
        if reqwest::Url::parse(&self.wallets_source_url).is_err() {
            bail!(
                "TC_WALLETS_SOURCE_URL is not a valid URL: {}",
                self.wallets_source_url
            );
        }
        if self.bridge != SIMULATED_BRIDGE {
            bail!("TC_BRIDGE={} is not supported (use {})", self.bridge, SIMULATED_BRIDGE);
        }
        if self.connect_timeout_secs == 0 || self.transaction_timeout_secs == 0 {
            bail!("TC_CONNECT_TIMEOUT_SECS and TC_TRANSACTION_TIMEOUT_SECS must be positive");
        }
        Ok(())
    }

    pub fn manager_options(&self) -> ManagerOptions {
        ManagerOptions {
            check_proof: self.check_proof,
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            transaction_timeout: Duration::from_secs(self.transaction_timeout_secs),
            failure_policy: self.failure_policy,
            ..ManagerOptions::default()
        }
    }

    pub fn wallet_list_config(&self) -> WalletListConfig {
        WalletListConfig {
            source_url: self.wallets_source_url.clone(),
            fallback_path: Some(PathBuf::from(&self.wallets_fallback_path)),
            exclude: self.exclude_wallets.clone(),
            cache_ttl: Duration::from_secs(self.wallets_cache_ttl_secs),
            ..WalletListConfig::default()
        }
    }
}
