//! Unit tests for SessionMiddleware: the session is stored on the first update.

use crate::SessionMiddleware;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use storage::MemoryStore;
use tcbot_core::{
    Bot, Chat, InlineKeyboard, Message, MessageDirection, Middleware, Result, Update, User,
};
use ton_wallet::{SimulatedBridge, WalletList, WalletListConfig};
use window_manager::{SessionRepository, Window, WindowManager};

/// Transport that accepts everything; the middleware never renders.
struct NoopBot;

#[async_trait]
impl Bot for NoopBot {
    async fn send_message(&self, _: &Chat, _: &str, _: Option<&InlineKeyboard>) -> Result<String> {
        Ok("1".to_string())
    }

    async fn edit_message(
        &self,
        _: &Chat,
        _: &str,
        _: &str,
        _: Option<&InlineKeyboard>,
    ) -> Result<()> {
        Ok(())
    }

    async fn delete_message(&self, _: &Chat, _: &str) -> Result<()> {
        Ok(())
    }

    async fn answer_callback(&self, _: &str, _: Option<&str>) -> Result<()> {
        Ok(())
    }
}

fn manager() -> WindowManager {
    let wallets = WalletList::new(WalletListConfig::default()).unwrap();
    WindowManager::builder(
        Arc::new(NoopBot),
        Arc::new(SimulatedBridge::manual()),
        Arc::new(wallets),
        SessionRepository::new(Arc::new(MemoryStore::new())),
    )
    .build()
}

fn start_command(user_id: i64, language: &str) -> Update {
    Update::Message(Message {
        id: "1".to_string(),
        user: User {
            id: user_id,
            username: None,
            first_name: Some("Test".to_string()),
            last_name: None,
            language_code: Some(language.to_string()),
            is_bot: false,
        },
        chat: Chat::private(user_id),
        content: "/start".to_string(),
        message_type: "text".to_string(),
        direction: MessageDirection::Incoming,
        created_at: Utc::now(),
    })
}

#[tokio::test]
async fn test_session_middleware_creates_session() {
    let manager = manager();
    let mw = SessionMiddleware::new(manager.clone());

    assert!(mw.before(&start_command(77, "ru")).await.unwrap());

    let stored = manager.sessions().get(77).await.unwrap().unwrap();
    assert_eq!(stored.chat_id, 77);
    assert_eq!(stored.language(), "ru");
    assert_eq!(stored.current_window, Window::Idle);
}

/// **Test: A stored language choice is not overwritten by the client language.**
#[tokio::test]
async fn test_session_middleware_keeps_chosen_language() {
    let manager = manager();
    let mw = SessionMiddleware::new(manager.clone());
    mw.before(&start_command(78, "ru")).await.unwrap();
    let ctx = window_manager::UserContext::new(78, 78);
    manager.update_language(&ctx, "en").await.unwrap();

    mw.before(&start_command(78, "ru")).await.unwrap();

    let stored = manager.sessions().get(78).await.unwrap().unwrap();
    assert_eq!(stored.language(), "en");
}
