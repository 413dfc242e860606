//! Window texts (HTML) per language.

use std::collections::HashMap;

const GET_A_WALLET_URL: &str =
    "https://ton.org/wallets?filters[wallet_features][slug][$in]=dapp-auth&pagination[limit]=-1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextKey {
    /// Placeholder while the connect window is being prepared.
    LoaderText,
    /// Replaces a window message Telegram no longer lets us delete.
    OutdatedText,
    ConnectWallet,
    ConnectWalletProofWrong,
    ConnectWalletTimeout,
    ConnectWalletRejected,
    SendTransaction,
    SendTransactionTimeout,
    SendTransactionRejected,
    WalletNotConnected,
}

impl TextKey {
    pub const ALL: [TextKey; 10] = [
        TextKey::LoaderText,
        TextKey::OutdatedText,
        TextKey::ConnectWallet,
        TextKey::ConnectWalletProofWrong,
        TextKey::ConnectWalletTimeout,
        TextKey::ConnectWalletRejected,
        TextKey::SendTransaction,
        TextKey::SendTransactionTimeout,
        TextKey::SendTransactionRejected,
        TextKey::WalletNotConnected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TextKey::LoaderText => "loader_text",
            TextKey::OutdatedText => "outdated_text",
            TextKey::ConnectWallet => "connect_wallet",
            TextKey::ConnectWalletProofWrong => "connect_wallet_proof_wrong",
            TextKey::ConnectWalletTimeout => "connect_wallet_timeout",
            TextKey::ConnectWalletRejected => "connect_wallet_rejected",
            TextKey::SendTransaction => "send_transaction",
            TextKey::SendTransactionTimeout => "send_transaction_timeout",
            TextKey::SendTransactionRejected => "send_transaction_rejected",
            TextKey::WalletNotConnected => "wallet_not_connected",
        }
    }
}

/// Source of window texts. Unknown languages fall back to English.
pub trait TextCatalog: Send + Sync {
    fn supports(&self, language: &str) -> bool;

    fn get(&self, language: &str, key: TextKey) -> String;

    /// `get` with `{wallet_name}` substituted.
    fn render(&self, language: &str, key: TextKey, wallet_name: &str) -> String {
        self.get(language, key).replace("{wallet_name}", wallet_name)
    }
}

/// Built-in English and Russian texts; extra languages or overrides can be layered on top.
#[derive(Debug, Clone)]
pub struct DefaultTexts {
    texts: HashMap<String, HashMap<TextKey, String>>,
}

impl Default for DefaultTexts {
    fn default() -> Self {
        let mut texts = HashMap::new();
        texts.insert("en".to_string(), english());
        texts.insert("ru".to_string(), russian());
        Self { texts }
    }
}

impl DefaultTexts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides (or adds) one text.
    pub fn with_text(mut self, language: &str, key: TextKey, text: impl Into<String>) -> Self {
        self.texts
            .entry(language.to_string())
            .or_default()
            .insert(key, text.into());
        self
    }
}

impl TextCatalog for DefaultTexts {
    fn supports(&self, language: &str) -> bool {
        self.texts.contains_key(language)
    }

    fn get(&self, language: &str, key: TextKey) -> String {
        self.texts
            .get(language)
            .and_then(|t| t.get(&key))
            .or_else(|| self.texts.get("en").and_then(|t| t.get(&key)))
            .cloned()
            .unwrap_or_else(|| key.as_str().to_string())
    }
}

fn english() -> HashMap<TextKey, String> {
    HashMap::from([
        (TextKey::LoaderText, "⏳".to_string()),
        (TextKey::OutdatedText, "...".to_string()),
        (
            TextKey::ConnectWallet,
            format!(
                "<a href='{}'>Get a Wallet</a>\n\n<b>Connect your {{wallet_name}}!</b>\n\n\
                 Open the link below with your wallet app:",
                GET_A_WALLET_URL
            ),
        ),
        (
            TextKey::ConnectWalletProofWrong,
            "<b>Warning</b>\n\nThe wallet signature is wrong or the connection timeout has expired."
                .to_string(),
        ),
        (
            TextKey::ConnectWalletTimeout,
            "<b>Warning</b>\n\nThe connection timeout has expired.".to_string(),
        ),
        (
            TextKey::ConnectWalletRejected,
            "<b>Warning</b>\n\nYou rejected the connection!".to_string(),
        ),
        (
            TextKey::SendTransaction,
            "<b>Transaction</b>\n\nGo to the {wallet_name} app and confirm the transaction."
                .to_string(),
        ),
        (
            TextKey::SendTransactionTimeout,
            "<b>Warning</b>\n\nThe transaction timeout has expired.".to_string(),
        ),
        (
            TextKey::SendTransactionRejected,
            "<b>Warning</b>\n\nYou rejected the transaction!".to_string(),
        ),
        (
            TextKey::WalletNotConnected,
            "<b>Warning</b>\n\nYour wallet is not connected. Connect it again to continue."
                .to_string(),
        ),
    ])
}

fn russian() -> HashMap<TextKey, String> {
    HashMap::from([
        (TextKey::LoaderText, "⏳".to_string()),
        (TextKey::OutdatedText, "...".to_string()),
        (
            TextKey::ConnectWallet,
            format!(
                "<a href='{}'>Установить кошелек</a>\n\n<b>Подключите свой {{wallet_name}}!</b>\n\n\
                 Откройте ссылку ниже в приложении кошелька:",
                GET_A_WALLET_URL
            ),
        ),
        (
            TextKey::ConnectWalletProofWrong,
            "<b>Предупреждение</b>\n\nПодпись кошелька поддельна или истекло время ожидания подключения."
                .to_string(),
        ),
        (
            TextKey::ConnectWalletTimeout,
            "<b>Предупреждение</b>\n\nВремя ожидания подключения истекло.".to_string(),
        ),
        (
            TextKey::ConnectWalletRejected,
            "<b>Предупреждение</b>\n\nВы отменили подключение!".to_string(),
        ),
        (
            TextKey::SendTransaction,
            "<b>Транзакция</b>\n\nПерейдите в приложение {wallet_name} и подтвердите транзакцию."
                .to_string(),
        ),
        (
            TextKey::SendTransactionTimeout,
            "<b>Предупреждение</b>\n\nВремя ожидания подтверждения транзакции истекло.".to_string(),
        ),
        (
            TextKey::SendTransactionRejected,
            "<b>Предупреждение</b>\n\nВы отменили транзакцию!".to_string(),
        ),
        (
            TextKey::WalletNotConnected,
            "<b>Предупреждение</b>\n\nКошелек не подключен. Подключите его снова, чтобы продолжить."
                .to_string(),
        ),
    ])
}
