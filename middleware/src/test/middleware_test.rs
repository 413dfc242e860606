//! Unit tests for LoggingMiddleware and PrivateChatMiddleware.

use crate::{LoggingMiddleware, PrivateChatMiddleware};
use chrono::Utc;
use tcbot_core::{
    CallbackQuery, Chat, HandlerResponse, Message, MessageDirection, Middleware, Update, User,
};

fn sample_user(user_id: i64) -> User {
    User {
        id: user_id,
        username: Some("testuser".to_string()),
        first_name: Some("Test".to_string()),
        last_name: None,
        language_code: Some("en".to_string()),
        is_bot: false,
    }
}

fn sample_message(chat: Chat, content: &str) -> Update {
    Update::Message(Message {
        id: "msg-1".to_string(),
        user: sample_user(123),
        chat,
        content: content.to_string(),
        message_type: "text".to_string(),
        direction: MessageDirection::Incoming,
        created_at: Utc::now(),
    })
}

fn sample_callback(chat: Chat, data: &str) -> Update {
    Update::CallbackQuery(CallbackQuery {
        id: "cb-1".to_string(),
        user: sample_user(123),
        chat,
        message_id: Some("7".to_string()),
        data: Some(data.to_string()),
    })
}

#[tokio::test]
async fn test_logging_middleware_before_continues() {
    let mw = LoggingMiddleware;
    let msg = sample_message(Chat::private(123), "hello");
    let result: tcbot_core::Result<bool> = mw.before(&msg).await;
    assert!(result.unwrap());

    let query = sample_callback(Chat::private(123), "back");
    assert!(mw.before(&query).await.unwrap());
}

#[tokio::test]
async fn test_logging_middleware_after_ok() {
    let mw = LoggingMiddleware;
    let msg = sample_message(Chat::private(123), "hello");
    let result: tcbot_core::Result<()> = mw.after(&msg, &HandlerResponse::Stop).await;
    assert!(result.is_ok());
}

/// **Test: Private chats pass; group updates are dropped without an error.**
#[tokio::test]
async fn test_private_chat_middleware_filters_groups() {
    let mw = PrivateChatMiddleware;
    assert!(mw
        .before(&sample_message(Chat::private(123), "/start"))
        .await
        .unwrap());

    let group = Chat {
        id: -100200,
        chat_type: "group".to_string(),
    };
    assert!(!mw.before(&sample_message(group.clone(), "/start")).await.unwrap());
    assert!(!mw.before(&sample_callback(group, "back")).await.unwrap());
}
