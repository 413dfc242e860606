//! Inline keyboards of the library windows.

use std::collections::HashMap;
use tcbot_core::{InlineButton, InlineKeyboard};
use ton_wallet::WalletApp;

pub const BACK_DATA: &str = "back";
pub const RETRY_DATA: &str = "retry";
pub const APP_WALLET_PREFIX: &str = "app_wallet:";

/// Wallet buttons per row.
pub const WALLETS_PER_ROW: usize = 2;

pub trait KeyboardFactory: Send + Sync {
    fn supports(&self, language: &str) -> bool;

    /// Open-link button, one button per wallet app (selected one marked), back.
    fn connect_wallet(
        &self,
        language: &str,
        wallets: &[WalletApp],
        selected: &WalletApp,
        universal_link: &str,
    ) -> InlineKeyboard;

    /// Open-wallet button (when there is a link), back.
    fn send_transaction(&self, language: &str, wallet_name: &str, url: Option<&str>)
        -> InlineKeyboard;

    /// Back and retry, for rejected / timed-out / proof-failed windows.
    fn retry(&self, language: &str) -> InlineKeyboard;
}

#[derive(Debug, Clone)]
struct ButtonLabels {
    back: String,
    retry: String,
    connect_wallet: String,
    open_wallet: String,
}

#[derive(Debug, Clone)]
pub struct DefaultKeyboards {
    fallback: ButtonLabels,
    labels: HashMap<String, ButtonLabels>,
}

fn english_labels() -> ButtonLabels {
    ButtonLabels {
        back: "‹ Back".to_string(),
        retry: "↻ Retry".to_string(),
        connect_wallet: "Connect {wallet_name}".to_string(),
        open_wallet: "Go to {wallet_name}".to_string(),
    }
}

impl Default for DefaultKeyboards {
    fn default() -> Self {
        let mut labels = HashMap::new();
        labels.insert("en".to_string(), english_labels());
        labels.insert(
            "ru".to_string(),
            ButtonLabels {
                back: "‹ Назад".to_string(),
                retry: "↻ Повторить".to_string(),
                connect_wallet: "Подключить {wallet_name}".to_string(),
                open_wallet: "Перейти в {wallet_name}".to_string(),
            },
        );
        Self {
            fallback: english_labels(),
            labels,
        }
    }
}

impl DefaultKeyboards {
    pub fn new() -> Self {
        Self::default()
    }

    fn labels(&self, language: &str) -> &ButtonLabels {
        self.labels.get(language).unwrap_or(&self.fallback)
    }

    fn back(&self, language: &str) -> InlineButton {
        InlineButton::callback(&self.labels(language).back, BACK_DATA)
    }
}

impl KeyboardFactory for DefaultKeyboards {
    fn supports(&self, language: &str) -> bool {
        self.labels.contains_key(language)
    }

    fn connect_wallet(
        &self,
        language: &str,
        wallets: &[WalletApp],
        selected: &WalletApp,
        universal_link: &str,
    ) -> InlineKeyboard {
        let labels = self.labels(language);
        let open = InlineButton::url(
            labels.connect_wallet.replace("{wallet_name}", &selected.name),
            universal_link,
        );
        let wallet_buttons = wallets
            .iter()
            .map(|w| {
                let text = if w.app_name == selected.app_name {
                    format!("• {} •", w.name)
                } else {
                    w.name.clone()
                };
                InlineButton::callback(text, format!("{}{}", APP_WALLET_PREFIX, w.app_name))
            })
            .collect();

        InlineKeyboard::new()
            .row(vec![open])
            .grid(wallet_buttons, WALLETS_PER_ROW)
            .row(vec![self.back(language)])
    }

    fn send_transaction(
        &self,
        language: &str,
        wallet_name: &str,
        url: Option<&str>,
    ) -> InlineKeyboard {
        let labels = self.labels(language);
        let mut keyboard = InlineKeyboard::new();
        if let Some(url) = url {
            keyboard = keyboard.row(vec![InlineButton::url(
                labels.open_wallet.replace("{wallet_name}", wallet_name),
                url,
            )]);
        }
        keyboard.row(vec![self.back(language)])
    }

    fn retry(&self, language: &str) -> InlineKeyboard {
        let labels = self.labels(language);
        InlineKeyboard::new().row(vec![
            self.back(language),
            InlineButton::callback(&labels.retry, RETRY_DATA),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tcbot_core::ButtonAction;

    fn wallet(app_name: &str, name: &str) -> WalletApp {
        WalletApp {
            app_name: app_name.to_string(),
            name: name.to_string(),
            image: String::new(),
            about_url: String::new(),
            universal_url: None,
            bridge_url: "https://bridge.example.org".to_string(),
        }
    }

    #[test]
    fn test_connect_wallet_layout() {
        let wallets = vec![
            wallet("telegram-wallet", "Wallet"),
            wallet("tonkeeper", "Tonkeeper"),
            wallet("mytonwallet", "MyTonWallet"),
        ];
        let kb = DefaultKeyboards::new().connect_wallet("en", &wallets, &wallets[1], "https://link");

        // open link, 2 + 1 wallet rows, back
        assert_eq!(kb.rows.len(), 4);
        assert_eq!(kb.rows[0][0].text, "Connect Tonkeeper");
        assert_eq!(kb.rows[0][0].action, ButtonAction::Url("https://link".to_string()));
        assert_eq!(kb.rows[1].len(), 2);
        assert_eq!(kb.rows[1][1].text, "• Tonkeeper •");
        assert_eq!(kb.rows[2].len(), 1);
        let data: Vec<&str> = kb.callback_data().collect();
        assert_eq!(
            data,
            [
                "app_wallet:telegram-wallet",
                "app_wallet:tonkeeper",
                "app_wallet:mytonwallet",
                "back"
            ]
        );
    }

    #[test]
    fn test_retry_and_send_transaction() {
        let keyboards = DefaultKeyboards::new();
        let retry = keyboards.retry("ru");
        assert_eq!(retry.rows[0][0].text, "‹ Назад");
        assert_eq!(retry.callback_data().collect::<Vec<_>>(), ["back", "retry"]);

        let send = keyboards.send_transaction("xx", "Tonkeeper", Some("https://app"));
        assert_eq!(send.rows[0][0].text, "Go to Tonkeeper");
        assert_eq!(send.rows.len(), 2);
        assert_eq!(keyboards.send_transaction("en", "Tonkeeper", None).rows.len(), 1);
    }
}
