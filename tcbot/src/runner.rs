use anyhow::Result;
use std::sync::Arc;
use tcbot_core::{init_tracing, Bot};
use tcbot_telegram::{run_dispatcher, TelegramBotAdapter, TelegramConfig};
use tracing::{info, instrument};

use crate::components::{build_components, build_handler_chain};
use crate::config::BotConfig;

/// Main entry: validate config, init logging (creates the log directory), build components, then run the dispatcher.
#[instrument(skip(config))]
pub async fn run_bot(config: BotConfig) -> Result<()> {
    config.validate()?;
    init_tracing(config.log_file())?;

    info!(
        session_store_url = %config.session_store_url(),
        manifest_url = %config.ton_connect().manifest_url,
        "Initializing bot"
    );

    let telegram = TelegramConfig {
        bot_token: config.bot_token().to_string(),
        telegram_api_url: config.telegram_api_url().map(str::to_string),
        log_file: Some(config.log_file().to_string()),
    };
    let teloxide_bot = telegram.build_bot()?;
    let bot: Arc<dyn Bot> = Arc::new(TelegramBotAdapter::new(teloxide_bot.clone()));

    let components = build_components(&config, bot).await?;
    let handler_chain = build_handler_chain(&components);

    info!("Bot started successfully");

    run_dispatcher(teloxide_bot, handler_chain).await
}
