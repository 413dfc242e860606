use async_trait::async_trait;
use tcbot_core::{Middleware, Result, Update};
use tracing::{debug, instrument};
use window_manager::{UserContext, WindowManager};

/// Makes sure every user reaching the handlers has a stored session bound to their chat and
/// client language.
#[derive(Clone)]
pub struct SessionMiddleware {
    manager: WindowManager,
}

impl SessionMiddleware {
    pub fn new(manager: WindowManager) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl Middleware for SessionMiddleware {
    #[instrument(skip(self, update))]
    async fn before(&self, update: &Update) -> Result<bool> {
        let ctx = UserContext::from_update(update);
        let session = self.manager.ensure_session(&ctx).await?;
        debug!(
            user_id = ctx.user_id,
            window = %session.current_window,
            language = session.language(),
            "step: session ready"
        );
        Ok(true)
    }
}
