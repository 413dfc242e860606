//! Base config: Telegram Bot connection, logging, session store, throttling. Loaded from env.

use anyhow::{anyhow, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct BaseConfig {
    /// BOT_TOKEN
    pub bot_token: String,
    /// TELEGRAM_API_URL or TELOXIDE_API_URL
    pub telegram_api_url: Option<String>,
    /// LOG_FILE
    pub log_file: String,
    /// SESSION_STORE_URL: `memory`, `sqlite:...` or a `.db` path
    pub session_store_url: String,
    /// THROTTLE_MS: updates from one user closer together than this are dropped; 0 disables
    pub throttle_ms: u64,
}

impl BaseConfig {
    /// Load from environment variables. `token` overrides BOT_TOKEN if provided.
    pub fn load(token: Option<String>) -> Result<Self> {
        let bot_token = match token {
            Some(token) => token,
            None => env::var("BOT_TOKEN").map_err(|_| anyhow!("BOT_TOKEN not set"))?,
        };
        let telegram_api_url = env::var("TELEGRAM_API_URL")
            .or_else(|_| env::var("TELOXIDE_API_URL"))
            .ok();
        let log_file = env::var("LOG_FILE").unwrap_or_else(|_| "logs/tcbot.log".to_string());
        let session_store_url =
            env::var("SESSION_STORE_URL").unwrap_or_else(|_| "memory".to_string());
        let throttle_ms = match env::var("THROTTLE_MS") {
            Ok(raw) => raw
                .trim()
                .parse()
                .map_err(|_| anyhow!("THROTTLE_MS must be a whole number of milliseconds: {}", raw))?,
            Err(_) => 700,
        };

        Ok(Self {
            bot_token,
            telegram_api_url,
            log_file,
            session_store_url,
            throttle_ms,
        })
    }

    /// telegram_api_url must be a valid URL if set.
    pub fn validate(&self) -> Result<()> {
        if let Some(ref url_str) = self.telegram_api_url {
            if reqwest::Url::parse(url_str).is_err() {
                anyhow::bail!(
                    "TELEGRAM_API_URL (or TELOXIDE_API_URL) is set but not a valid URL: {}",
                    url_str
                );
            }
        }
        Ok(())
    }
}
