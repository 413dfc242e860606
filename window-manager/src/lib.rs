//! # window-manager
//!
//! Window/session manager for TON Connect flows in a Telegram bot. One tracked message per chat
//! shows the current window; the library owns the connect-wallet and send-transaction windows and
//! hands control back to the bot through named callbacks.
//!
//! ## Modules
//!
//! - [`session`] – Window, UserContext, Session and its repository
//! - [`callbacks`] – FlowCallbacks, WindowCallback and CallbackRegistry
//! - [`manager`] – WindowManager: the flows, back/retry, rendering
//! - [`handler`] – WindowHandler: routes button presses on library windows
//! - [`tasks`] – per-user wait tasks
//! - [`texts`] / [`keyboards`] – localized window texts and inline keyboards

pub mod callbacks;
pub mod error;
pub mod handler;
pub mod keyboards;
pub mod manager;
pub mod session;
pub mod tasks;
pub mod texts;

pub use callbacks::{CallbackRegistry, FlowCallbacks, FlowContext, WindowCallback};
pub use error::{Result, WindowError};
pub use handler::WindowHandler;
pub use keyboards::{DefaultKeyboards, KeyboardFactory, APP_WALLET_PREFIX, BACK_DATA, RETRY_DATA};
pub use manager::{FailurePolicy, ManagerOptions, WindowManager, WindowManagerBuilder};
pub use session::{Session, SessionRepository, UserContext, Window, DEFAULT_LANGUAGE};
pub use tasks::TaskRegistry;
pub use texts::{DefaultTexts, TextCatalog, TextKey};
