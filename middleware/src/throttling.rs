//! Per-user throttling: an update arriving within `ttl` of the last accepted one from the same
//! user is dropped, so a double tap on a window button runs the flow once.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::time::{Duration, Instant};
use tcbot_core::{Middleware, Result, Update};
use tracing::{debug, instrument};

pub const DEFAULT_THROTTLE: Duration = Duration::from_millis(700);

/// Expired entries are swept once the map grows past this many users.
const MAX_TRACKED_USERS: usize = 10_000;

pub struct ThrottlingMiddleware {
    ttl: Duration,
    /// user_id -> when the last accepted update arrived.
    accepted_at: DashMap<i64, Instant>,
}

impl ThrottlingMiddleware {
    /// A zero `ttl` lets every update through.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            accepted_at: DashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Records the update at `now`; false when it falls inside the user's window.
    pub(crate) fn accept(&self, user_id: i64, now: Instant) -> bool {
        let accepted = match self.accepted_at.entry(user_id) {
            Entry::Occupied(mut entry) => {
                if now.saturating_duration_since(*entry.get()) < self.ttl {
                    false
                } else {
                    entry.insert(now);
                    true
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(now);
                true
            }
        };
        if accepted && self.accepted_at.len() > MAX_TRACKED_USERS {
            let ttl = self.ttl;
            self.accepted_at
                .retain(|_, at| now.saturating_duration_since(*at) < ttl);
        }
        accepted
    }
}

impl Default for ThrottlingMiddleware {
    fn default() -> Self {
        Self::new(DEFAULT_THROTTLE)
    }
}

#[async_trait]
impl Middleware for ThrottlingMiddleware {
    #[instrument(skip(self, update))]
    async fn before(&self, update: &Update) -> Result<bool> {
        let user_id = update.user().id;
        if self.accept(user_id, Instant::now()) {
            Ok(true)
        } else {
            debug!(
                user_id = user_id,
                kind = update.kind(),
                ttl_ms = self.ttl.as_millis() as u64,
                "step: update throttled"
            );
            Ok(false)
        }
    }
}
