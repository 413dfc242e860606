//! Dispatcher loop: converts teloxide messages and callback queries into core updates and hands
//! each one to the HandlerChain on its own task.

use anyhow::Result;
use handler_chain::HandlerChain;
use tcbot_core::{ToCoreCallbackQuery, ToCoreMessage, Update as CoreUpdate};
use teloxide::prelude::*;
use tracing::{debug, error, info, instrument};

use super::adapters::{TelegramCallbackQueryWrapper, TelegramMessageWrapper};

fn spawn_chain(chain: HandlerChain, update: CoreUpdate) {
    tokio::spawn(async move {
        let user_id = update.user().id;
        debug!(user_id, kind = update.kind(), "step: handler chain started");
        if let Err(e) = chain.handle(&update).await {
            error!(error = %e, user_id, "Handler chain failed");
        }
    });
}

/// Runs long polling until Ctrl+C. Logs the bot's username first.
#[instrument(skip(bot, handler_chain))]
pub async fn run_dispatcher(bot: teloxide::Bot, handler_chain: HandlerChain) -> Result<()> {
    match bot.get_me().await {
        Ok(me) => info!(
            username = %me.user.username.as_deref().unwrap_or("unknown"),
            "Bot started"
        ),
        Err(e) => error!(error = %e, "get_me failed; continuing with polling"),
    }

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(
            |msg: teloxide::types::Message, chain: HandlerChain| async move {
                let update = CoreUpdate::Message(TelegramMessageWrapper(&msg).to_core());
                spawn_chain(chain, update);
                respond(())
            },
        ))
        .branch(Update::filter_callback_query().endpoint(
            |query: teloxide::types::CallbackQuery, chain: HandlerChain| async move {
                match TelegramCallbackQueryWrapper(&query).to_core() {
                    Some(core_query) => spawn_chain(chain, CoreUpdate::CallbackQuery(core_query)),
                    None => debug!(query_id = %query.id, "Callback query without message skipped"),
                }
                respond(())
            },
        ));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![handler_chain])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
