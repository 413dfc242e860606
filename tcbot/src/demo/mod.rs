//! The demo bot's own windows and the handler for their buttons and text input.
//!
//! Flow: `/start` → select language → connect wallet → main menu → amount prompt → send TON to
//! the connected wallet → transaction info.

mod handler;
mod texts;
mod windows;

use std::sync::Arc;
use window_manager::{CallbackRegistry, FlowCallbacks};

pub use handler::DemoHandler;
pub use texts::{DemoText, DemoTexts};
pub use windows::{MainMenuWindow, SelectLanguageWindow, SendAmountWindow, TransactionInfoWindow};

pub const SELECT_LANGUAGE: &str = "select_language";
pub const MAIN_MENU: &str = "main_menu";
pub const SEND_AMOUNT: &str = "send_amount";
pub const TRANSACTION_INFO: &str = "transaction_info";

pub const LANGUAGE_PREFIX: &str = "lang:";
pub const SEND_TON_DATA: &str = "send_ton";
pub const DISCONNECT_DATA: &str = "disconnect";
pub const GO_MAIN_DATA: &str = "go_main";

/// Registry with the four demo windows.
pub fn demo_callbacks() -> CallbackRegistry {
    let texts = Arc::new(DemoTexts);
    CallbackRegistry::new()
        .register(SELECT_LANGUAGE, Arc::new(SelectLanguageWindow::new(texts.clone())))
        .register(MAIN_MENU, Arc::new(MainMenuWindow::new(texts.clone())))
        .register(SEND_AMOUNT, Arc::new(SendAmountWindow::new(texts.clone())))
        .register(TRANSACTION_INFO, Arc::new(TransactionInfoWindow::new(texts)))
}

/// Back lands on the language picker, success on the main menu.
pub fn connect_callbacks() -> FlowCallbacks {
    FlowCallbacks::new(SELECT_LANGUAGE, MAIN_MENU)
}

/// Back lands on the amount prompt, success on the transaction info.
pub fn transaction_callbacks() -> FlowCallbacks {
    FlowCallbacks::new(SEND_AMOUNT, TRANSACTION_INFO)
}
