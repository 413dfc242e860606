//! BotConfig: BaseConfig + TonConnectConfig. Use load() for env-based loading.

use anyhow::Result;
use std::time::Duration;

use super::{BaseConfig, TonConnectConfig};

pub struct BotConfig {
    pub base: BaseConfig,
    pub ton_connect: TonConnectConfig,
}

impl BotConfig {
    /// Load full config from environment variables. If `token` is provided it overrides BOT_TOKEN.
    /// Call validate() after load to check config before init.
    pub fn load(token: Option<String>) -> Result<Self> {
        let base = BaseConfig::load(token)?;
        let ton_connect = TonConnectConfig::from_env()?;
        Ok(Self { base, ton_connect })
    }

    /// Validate config. Call after load() to fail fast before init.
    pub fn validate(&self) -> Result<()> {
        self.base.validate()?;
        self.ton_connect.validate()
    }

    pub fn base(&self) -> &BaseConfig {
        &self.base
    }
    pub fn ton_connect(&self) -> &TonConnectConfig {
        &self.ton_connect
    }

    pub fn bot_token(&self) -> &str {
        &self.base.bot_token
    }
    pub fn log_file(&self) -> &str {
        &self.base.log_file
    }
    pub fn session_store_url(&self) -> &str {
        &self.base.session_store_url
    }
    pub fn telegram_api_url(&self) -> Option<&str> {
        self.base.telegram_api_url.as_deref()
    }
    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.base.throttle_ms)
    }
}
