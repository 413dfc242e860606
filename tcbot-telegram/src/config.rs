//! Minimal transport config: token, optional Bot API URL, log file path.
//! Loaded from BOT_TOKEN, TELEGRAM_API_URL (or TELOXIDE_API_URL) and LOG_FILE.

use anyhow::{bail, Result};
use std::env;
use tracing::info;

/// Telegram connectivity and logging settings.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub telegram_api_url: Option<String>,
    pub log_file: Option<String>,
}

impl TelegramConfig {
    /// BOT_TOKEN is required; TELEGRAM_API_URL and LOG_FILE are optional.
    pub fn from_env() -> Result<Self> {
        let bot_token = env::var("BOT_TOKEN").map_err(|_| anyhow::anyhow!("BOT_TOKEN not set"))?;
        let telegram_api_url = env::var("TELEGRAM_API_URL")
            .or_else(|_| env::var("TELOXIDE_API_URL"))
            .ok()
            .filter(|url| !url.trim().is_empty());
        let log_file = env::var("LOG_FILE").ok();
        Ok(Self {
            bot_token,
            telegram_api_url,
            log_file,
        })
    }

    pub fn with_token(bot_token: String) -> Self {
        Self {
            bot_token,
            telegram_api_url: None,
            log_file: None,
        }
    }

    /// Builds the teloxide Bot, pointing it at a custom Bot API server when one is configured.
    pub fn build_bot(&self) -> Result<teloxide::Bot> {
        let bot = teloxide::Bot::new(&self.bot_token);
        match &self.telegram_api_url {
            Some(raw) => {
                let url = match reqwest::Url::parse(raw) {
                    Ok(url) => url,
                    Err(e) => bail!("invalid TELEGRAM_API_URL {}: {}", raw, e),
                };
                info!(api_url = %url, "Using custom Telegram Bot API server");
                Ok(bot.set_api_url(url))
            }
            None => Ok(bot),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in ["BOT_TOKEN", "TELEGRAM_API_URL", "TELOXIDE_API_URL", "LOG_FILE"] {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_with_token() {
        let config = TelegramConfig::with_token("test_token".to_string());
        assert_eq!(config.bot_token, "test_token");
        assert!(config.telegram_api_url.is_none());
        assert!(config.log_file.is_none());
    }

    #[test]
    #[serial]
    fn test_from_env_requires_token() {
        clear_env();
        assert!(TelegramConfig::from_env().is_err());
    }

    #[test]
    #[serial]
    fn test_from_env_falls_back_to_teloxide_api_url() {
        clear_env();
        env::set_var("BOT_TOKEN", "123:abc");
        env::set_var("TELOXIDE_API_URL", "http://localhost:8081");
        let config = TelegramConfig::from_env().unwrap();
        assert_eq!(
            config.telegram_api_url.as_deref(),
            Some("http://localhost:8081")
        );
        clear_env();
    }

    #[test]
    fn test_build_bot_rejects_invalid_api_url() {
        let mut config = TelegramConfig::with_token("123:abc".to_string());
        config.telegram_api_url = Some("not a url".to_string());
        assert!(config.build_bot().is_err());

        config.telegram_api_url = Some("http://localhost:8081".to_string());
        assert!(config.build_bot().is_ok());
    }
}
