//! # Handler chain
//!
//! Runs a sequence of middleware (before/after) and handlers for each update. Middleware can drop
//! the update; handler `before` hooks run in order and may stop the chain; the first handler that
//! returns Stop ends the handle phase; `after` hooks run in reverse order.

use std::sync::Arc;
use tcbot_core::{Handler, HandlerResponse, Middleware, Result, Update};
use tracing::{debug, info, instrument};

/// Chain of middleware and handlers.
#[derive(Clone, Default)]
pub struct HandlerChain {
    middleware: Vec<Arc<dyn Middleware>>,
    handlers: Vec<Arc<dyn Handler>>,
}

impl HandlerChain {
    /// Creates an empty chain (no middleware, no handlers).
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a middleware (runs before handlers, after in reverse).
    pub fn add_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Appends a handler (runs in order; first Stop ends the handle phase).
    pub fn add_handler(mut self, handler: Arc<dyn Handler>) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn len(&self) -> usize {
        self.middleware.len() + self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs the chain for one update and returns Stop if anything consumed it, else Continue.
    #[instrument(skip(self, update), fields(kind = update.kind()))]
    pub async fn handle(&self, update: &Update) -> Result<HandlerResponse> {
        let user_id = update.user().id;
        let chat_id = update.chat().id;

        info!(user_id, chat_id, "step: handler_chain started");

        for mw in &self.middleware {
            let mw_name = std::any::type_name_of_val(mw.as_ref());
            if !mw.before(update).await? {
                info!(
                    user_id,
                    middleware = %mw_name,
                    "step: middleware before returned false, update dropped"
                );
                return Ok(HandlerResponse::Stop);
            }
            debug!(user_id, middleware = %mw_name, "step: middleware before done");
        }

        let mut final_response = HandlerResponse::Continue;

        let mut stopped_in_before = false;
        for handler in &self.handlers {
            if !handler.before(update).await? {
                let handler_name = std::any::type_name_of_val(handler.as_ref());
                info!(user_id, handler = %handler_name, "step: handler before returned false, chain stopped");
                final_response = HandlerResponse::Stop;
                stopped_in_before = true;
                break;
            }
        }

        if !stopped_in_before {
            for handler in &self.handlers {
                let handler_name = std::any::type_name_of_val(handler.as_ref());
                let response = handler.handle(update).await?;
                debug!(
                    user_id,
                    handler = %handler_name,
                    response = ?response,
                    "step: handler done"
                );
                match response {
                    HandlerResponse::Stop => {
                        info!(user_id, handler = %handler_name, "step: handler chain stopped by handler");
                        final_response = response;
                        break;
                    }
                    HandlerResponse::Continue | HandlerResponse::Ignore => continue,
                }
            }
        }

        for handler in self.handlers.iter().rev() {
            handler.after(update, &final_response).await?;
        }

        for mw in self.middleware.iter().rev() {
            mw.after(update, &final_response).await?;
        }

        info!(user_id, chat_id, response = ?final_response, "step: handler_chain finished");

        Ok(final_response)
    }
}

// Unit/integration tests live in tests/handler_chain_test.rs
