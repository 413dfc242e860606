//! Texts of the demo windows (HTML), English and Russian.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoText {
    SelectLanguage,
    /// `{address}` is substituted.
    MainMenu,
    SendAmount,
    InvalidAmount,
    /// `{boc}` is substituted.
    TransactionInfo,
    SendTonButton,
    DisconnectButton,
    BackButton,
    GoMainButton,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DemoTexts;

impl DemoTexts {
    pub fn get(&self, language: &str, key: DemoText) -> &'static str {
        if language == "ru" {
            russian(key)
        } else {
            english(key)
        }
    }
}

fn english(key: DemoText) -> &'static str {
    match key {
        DemoText::SelectLanguage => "<b>Choose your language</b>",
        DemoText::MainMenu => "<b>Wallet connected</b>\n\n<code>{address}</code>",
        DemoText::SendAmount => {
            "<b>How much TON to send?</b>\n\nThe transfer goes to your own wallet. \
             Type an amount, for example <code>0.05</code>."
        }
        DemoText::InvalidAmount => "That is not a valid amount.",
        DemoText::TransactionInfo => "<b>Transaction sent</b>\n\nboc:\n<code>{boc}</code>",
        DemoText::SendTonButton => "Send TON",
        DemoText::DisconnectButton => "Disconnect",
        DemoText::BackButton => "‹ Back",
        DemoText::GoMainButton => "Go to main",
    }
}

fn russian(key: DemoText) -> &'static str {
    match key {
        DemoText::SelectLanguage => "<b>Выберите язык</b>",
        DemoText::MainMenu => "<b>Кошелёк подключён</b>\n\n<code>{address}</code>",
        DemoText::SendAmount => {
            "<b>Сколько TON отправить?</b>\n\nПеревод уйдёт на ваш же кошелёк. \
             Введите сумму, например <code>0.05</code>."
        }
        DemoText::InvalidAmount => "Не получилось разобрать сумму.",
        DemoText::TransactionInfo => "<b>Транзакция отправлена</b>\n\nboc:\n<code>{boc}</code>",
        DemoText::SendTonButton => "Отправить TON",
        DemoText::DisconnectButton => "Отключить",
        DemoText::BackButton => "‹ Назад",
        DemoText::GoMainButton => "На главную",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_language_falls_back_to_english() {
        let texts = DemoTexts;
        assert_eq!(texts.get("de", DemoText::SendTonButton), "Send TON");
        assert_eq!(texts.get("ru", DemoText::SendTonButton), "Отправить TON");
    }
}
