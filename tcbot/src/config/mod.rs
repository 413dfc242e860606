//! Bot configuration: BaseConfig (Telegram + log + session store) + TonConnectConfig.

mod base;
mod bot_config;
mod ton_connect;


pub use base::BaseConfig;
pub use bot_config::BotConfig;
pub use ton_connect::TonConnectConfig;
