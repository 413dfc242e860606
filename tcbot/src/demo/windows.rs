use async_trait::async_trait;
use std::sync::Arc;
use tcbot_core::{InlineButton, InlineKeyboard};
use ton_wallet::{Address, AccountWallet, FriendlyFormat};
use tracing::debug;
use window_manager::{FlowContext, Result, Window, WindowCallback, WindowManager};

use super::texts::{DemoText, DemoTexts};
use super::{
    DISCONNECT_DATA, GO_MAIN_DATA, LANGUAGE_PREFIX, MAIN_MENU, SELECT_LANGUAGE, SEND_AMOUNT,
    SEND_TON_DATA, TRANSACTION_INFO,
};

const TESTNET_CHAIN: &str = "-3";

/// User-friendly, non-bounceable form; the raw address when it does not parse.
pub fn display_address(wallet: &AccountWallet) -> String {
    match Address::parse(&wallet.address) {
        Ok(address) => address.to_friendly(FriendlyFormat {
            bounceable: false,
            test_only: wallet.chain == TESTNET_CHAIN,
            url_safe: true,
        }),
        Err(_) => wallet.address.clone(),
    }
}

pub struct SelectLanguageWindow {
    texts: Arc<DemoTexts>,
}

impl SelectLanguageWindow {
    pub fn new(texts: Arc<DemoTexts>) -> Self {
        Self { texts }
    }
}

#[async_trait]
impl WindowCallback for SelectLanguageWindow {
    async fn call(&self, manager: &WindowManager, flow: FlowContext) -> Result<()> {
        let keyboard = InlineKeyboard::new().row(vec![
            InlineButton::callback("🇷🇺 Русский", format!("{}ru", LANGUAGE_PREFIX)),
            InlineButton::callback("🇬🇧 English", format!("{}en", LANGUAGE_PREFIX)),
        ]);
        let text = self.texts.get(flow.language(), DemoText::SelectLanguage);
        manager
            .show_window(&flow.user, Window::app(SELECT_LANGUAGE), text, Some(&keyboard))
            .await?;
        Ok(())
    }
}

/// Connected wallet and actions. Without a wallet the user is sent to the language picker.
pub struct MainMenuWindow {
    texts: Arc<DemoTexts>,
}

impl MainMenuWindow {
    pub fn new(texts: Arc<DemoTexts>) -> Self {
        Self { texts }
    }
}

#[async_trait]
impl WindowCallback for MainMenuWindow {
    async fn call(&self, manager: &WindowManager, flow: FlowContext) -> Result<()> {
        let Some(wallet) = flow.wallet.as_ref() else {
            debug!(user_id = flow.user.user_id, "step: no wallet, main menu falls back to language picker");
            return manager.run_callback(&flow.user, SELECT_LANGUAGE).await;
        };
        let language = flow.language();
        let text = self
            .texts
            .get(language, DemoText::MainMenu)
            .replace("{address}", &display_address(wallet));
        let keyboard = InlineKeyboard::new()
            .row(vec![InlineButton::callback(
                self.texts.get(language, DemoText::SendTonButton),
                SEND_TON_DATA,
            )])
            .row(vec![InlineButton::callback(
                self.texts.get(language, DemoText::DisconnectButton),
                DISCONNECT_DATA,
            )]);
        manager
            .show_window(&flow.user, Window::app(MAIN_MENU), &text, Some(&keyboard))
            .await?;
        Ok(())
    }
}

pub struct SendAmountWindow {
    texts: Arc<DemoTexts>,
}

impl SendAmountWindow {
    pub fn new(texts: Arc<DemoTexts>) -> Self {
        Self { texts }
    }

    /// Renders the prompt, optionally headed by a line about the rejected input.
    pub async fn show(&self, manager: &WindowManager, flow: &FlowContext, invalid: bool) -> Result<()> {
        let language = flow.language();
        let prompt = self.texts.get(language, DemoText::SendAmount);
        let text = if invalid {
            format!("{}\n\n{}", self.texts.get(language, DemoText::InvalidAmount), prompt)
        } else {
            prompt.to_string()
        };
        let keyboard = InlineKeyboard::new().row(vec![InlineButton::callback(
            self.texts.get(language, DemoText::BackButton),
            window_manager::BACK_DATA,
        )]);
        manager
            .show_window(&flow.user, Window::app(SEND_AMOUNT), &text, Some(&keyboard))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl WindowCallback for SendAmountWindow {
    async fn call(&self, manager: &WindowManager, flow: FlowContext) -> Result<()> {
        self.show(manager, &flow, false).await
    }
}

pub struct TransactionInfoWindow {
    texts: Arc<DemoTexts>,
}

impl TransactionInfoWindow {
    pub fn new(texts: Arc<DemoTexts>) -> Self {
        Self { texts }
    }
}

#[async_trait]
impl WindowCallback for TransactionInfoWindow {
    async fn call(&self, manager: &WindowManager, flow: FlowContext) -> Result<()> {
        let language = flow.language();
        let boc = flow
            .receipt
            .as_ref()
            .map(|r| r.boc.clone())
            .or_else(|| flow.session.last_transaction_boc.clone())
            .unwrap_or_default();
        let text = self
            .texts
            .get(language, DemoText::TransactionInfo)
            .replace("{boc}", &boc);
        let keyboard = InlineKeyboard::new().row(vec![InlineButton::callback(
            self.texts.get(language, DemoText::GoMainButton),
            GO_MAIN_DATA,
        )]);
        manager
            .show_window(&flow.user, Window::app(TRANSACTION_INFO), &text, Some(&keyboard))
            .await?;
        Ok(())
    }
}
