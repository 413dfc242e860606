//! Component factory: builds BotComponents from config. Isolates assembly logic from runner.

use anyhow::Result;
use handler_chain::HandlerChain;
use middleware::{LoggingMiddleware, PrivateChatMiddleware, SessionMiddleware, ThrottlingMiddleware};
use std::sync::Arc;
use std::time::Duration;
use tcbot_core::Bot;
use ton_wallet::{SimulatedBridge, WalletBridge, WalletList};
use tracing::{error, info, instrument};
use window_manager::{SessionRepository, WindowHandler, WindowManager};

use crate::config::BotConfig;
use crate::demo::{demo_callbacks, DemoHandler};

/// Everything the handler chain needs; produced by the component factory.
#[derive(Clone)]
pub struct BotComponents {
    pub manager: WindowManager,
    pub bridge: Arc<SimulatedBridge>,
    /// Minimum gap between two accepted updates from one user.
    pub throttle: Duration,
}

/// Builds the window manager around `bot`. Tests pass a recording bot; production passes the
/// Telegram adapter.
#[instrument(skip(config, bot))]
pub async fn build_components(config: &BotConfig, bot: Arc<dyn Bot>) -> Result<BotComponents> {
    let store = storage::open_store(config.session_store_url())
        .await
        .map_err(|e| {
            error!(
                error = %e,
                session_store_url = %config.session_store_url(),
                "Failed to open session store"
            );
            anyhow::anyhow!("Failed to open session store: {}", e)
        })?;

    let tc = config.ton_connect();
    let wallets = WalletList::new(tc.wallet_list_config())
        .map_err(|e| anyhow::anyhow!("Failed to build wallets list client: {}", e))?;

    let bridge = Arc::new(
        SimulatedBridge::auto(Duration::from_secs(tc.simulated_delay_secs))
            .with_manifest_url(tc.manifest_url.clone())
            .with_redirect_url(tc.redirect_url.clone()),
    );
    info!(
        bridge = %tc.bridge,
        failure_policy = ?tc.failure_policy,
        check_proof = tc.check_proof,
        "Using simulated wallet bridge"
    );

    let bridge_dyn: Arc<dyn WalletBridge> = bridge.clone();
    let manager = WindowManager::builder(
        bot,
        bridge_dyn,
        Arc::new(wallets),
        SessionRepository::new(store),
    )
    .callbacks(demo_callbacks())
    .options(tc.manager_options())
    .build();

    Ok(BotComponents {
        manager,
        bridge,
        throttle: config.throttle(),
    })
}

/// Builds the handler chain (private chat → throttling → session → logging; library windows →
/// demo windows).
pub fn build_handler_chain(components: &BotComponents) -> HandlerChain {
    HandlerChain::new()
        .add_middleware(Arc::new(PrivateChatMiddleware))
        .add_middleware(Arc::new(ThrottlingMiddleware::new(components.throttle)))
        .add_middleware(Arc::new(SessionMiddleware::new(components.manager.clone())))
        .add_middleware(Arc::new(LoggingMiddleware))
        .add_handler(Arc::new(WindowHandler::new(components.manager.clone())))
        .add_handler(Arc::new(DemoHandler::new(components.manager.clone())))
}
