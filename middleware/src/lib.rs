//! # Middleware crate
//!
//! Middleware run by the handler chain around every update: logging, the private-chat filter,
//! per-user throttling and session bootstrap for the window manager.

mod middleware;
mod session_middleware;
mod throttling;

#[cfg(test)]
mod test;

pub use middleware::{LoggingMiddleware, PrivateChatMiddleware};
pub use session_middleware::SessionMiddleware;
pub use throttling::{ThrottlingMiddleware, DEFAULT_THROTTLE};
