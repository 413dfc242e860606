//! Integration tests for window rendering, language switching and [`WindowHandler`] routing.

mod common;

use chrono::Utc;
use common::{connect_callbacks, BotCall, TestApp, USER_ID};
use tcbot_core::{
    BotError, Chat, Handler, HandlerResponse, Message, MessageDirection, Update, User,
};
use window_manager::{FailurePolicy, TextKey, Window, WindowError, WindowHandler};

/// **Test: The tracked message is edited in place.**
#[tokio::test]
async fn test_window_edits_tracked_message() {
    let app = TestApp::new(FailurePolicy::RestorePrevious);
    app.manager.run_callback(&app.ctx, "select_language").await.unwrap();
    app.manager.run_callback(&app.ctx, "main_menu").await.unwrap();

    assert_eq!(
        app.bot.calls(),
        [
            BotCall::Send {
                message_id: "1".to_string(),
                text: "select_language window".to_string(),
                keyboard: None,
            },
            BotCall::Edit {
                message_id: "1".to_string(),
                text: "main_menu window".to_string(),
                keyboard: None,
            },
        ]
    );
    assert_eq!(app.window().await, Window::app("main_menu"));
}

/// **Test: A refused edit sends a new message and deletes the old one.**
#[tokio::test]
async fn test_refused_edit_sends_new_message() {
    let app = TestApp::new(FailurePolicy::RestorePrevious);
    app.manager.run_callback(&app.ctx, "select_language").await.unwrap();
    app.bot.fail_next_edit(BotError::MessageCantBeEdited);

    app.manager.run_callback(&app.ctx, "main_menu").await.unwrap();

    let session = app.manager.session(&app.ctx).await.unwrap();
    assert_eq!(session.message_id.as_deref(), Some("2"));
    assert_eq!(session.current_window, Window::app("main_menu"));
    assert!(app.bot.calls().contains(&BotCall::Delete {
        message_id: "1".to_string()
    }));
}

/// **Test: When the old message cannot be deleted it is overwritten with the outdated text.**
#[tokio::test]
async fn test_undeletable_message_marked_outdated() {
    let app = TestApp::new(FailurePolicy::RestorePrevious);
    app.manager.run_callback(&app.ctx, "select_language").await.unwrap();
    app.bot.fail_next_edit(BotError::MessageCantBeEdited);
    app.bot.fail_next_delete(BotError::MessageCantBeDeleted);

    app.manager.run_callback(&app.ctx, "main_menu").await.unwrap();

    let outdated = app.manager.texts().get("en", TextKey::OutdatedText);
    assert!(app.bot.calls().contains(&BotCall::Edit {
        message_id: "1".to_string(),
        text: outdated,
        keyboard: None,
    }));
    let session = app.manager.session(&app.ctx).await.unwrap();
    assert_eq!(session.message_id.as_deref(), Some("2"));
}

/// **Test: A missing window message is replaced and the stale id marked outdated in the session's language.**
#[tokio::test]
async fn test_outdated_marker_uses_session_language() {
    let app = TestApp::new(FailurePolicy::RestorePrevious);
    app.manager.update_language(&app.ctx, "ru").await.unwrap();
    app.manager.run_callback(&app.ctx, "select_language").await.unwrap();
    app.bot.fail_next_edit(BotError::MessageToEditNotFound);
    app.bot.fail_next_delete(BotError::MessageToDeleteNotFound);

    let shown = app
        .manager
        .show_window(&app.ctx, Window::app("main_menu"), "main_menu window", None)
        .await
        .unwrap();

    assert_eq!(shown, "2");
    let outdated = app.manager.texts().get("ru", TextKey::OutdatedText);
    assert!(app.bot.calls().contains(&BotCall::Edit {
        message_id: "1".to_string(),
        text: outdated,
        keyboard: None,
    }));
}

/// **Test: "message is not modified" keeps the tracked message.**
#[tokio::test]
async fn test_not_modified_keeps_message() {
    let app = TestApp::new(FailurePolicy::RestorePrevious);
    app.manager.run_callback(&app.ctx, "main_menu").await.unwrap();
    app.bot.fail_next_edit(BotError::MessageNotModified);

    app.manager.run_callback(&app.ctx, "main_menu").await.unwrap();

    assert_eq!(app.bot.sent_texts().len(), 1);
    let session = app.manager.session(&app.ctx).await.unwrap();
    assert_eq!(session.message_id.as_deref(), Some("1"));
}

/// **Test: Notices are standalone messages; the tracked window stays.**
#[tokio::test]
async fn test_notify_does_not_replace_window() {
    let app = TestApp::new(FailurePolicy::RestorePrevious);
    app.manager.run_callback(&app.ctx, "main_menu").await.unwrap();
    app.manager
        .notify(&app.ctx, TextKey::WalletNotConnected)
        .await
        .unwrap();

    assert_eq!(app.bot.sent_texts().len(), 2);
    let session = app.manager.session(&app.ctx).await.unwrap();
    assert_eq!(session.message_id.as_deref(), Some("1"));
}

/// **Test: Supported languages are stored and used for library windows; others are refused.**
#[tokio::test]
async fn test_update_language() {
    let app = TestApp::new(FailurePolicy::RestorePrevious);
    app.manager.update_language(&app.ctx, "ru").await.unwrap();
    assert_eq!(
        app.manager.session(&app.ctx).await.unwrap().language(),
        "ru"
    );

    app.manager.run_callback(&app.ctx, "select_language").await.unwrap();
    app.manager
        .open_connect_wallet(&app.ctx, connect_callbacks())
        .await
        .unwrap();
    let (text, _) = app.bot.last_render().unwrap();
    assert!(text.contains("Подключите свой"));

    let err = app.manager.update_language(&app.ctx, "de").await.unwrap_err();
    assert!(matches!(err, WindowError::LanguageNotSupported(code) if code == "de"));
    assert_eq!(
        app.manager.session(&app.ctx).await.unwrap().language(),
        "ru"
    );
}

/// **Test: ensure_session persists a session bound to the user and chat.**
#[tokio::test]
async fn test_ensure_session_persists() {
    let app = TestApp::new(FailurePolicy::RestorePrevious);
    assert!(app.manager.sessions().get(USER_ID).await.unwrap().is_none());

    let session = app.manager.ensure_session(&app.ctx).await.unwrap();
    assert_eq!(session.chat_id, USER_ID);
    assert_eq!(session.current_window, Window::Idle);

    let stored = app.manager.sessions().get(USER_ID).await.unwrap().unwrap();
    assert_eq!(stored.language_code.as_deref(), Some("en"));
}

/// **Test: The handler leaves text messages and app-window buttons to other handlers.**
#[tokio::test]
async fn test_handler_ignores_non_library_windows() {
    let app = TestApp::new(FailurePolicy::RestorePrevious);
    let handler = WindowHandler::new(app.manager.clone());
    app.manager.run_callback(&app.ctx, "main_menu").await.unwrap();

    let text = Update::Message(Message {
        id: "10".to_string(),
        user: User {
            id: USER_ID,
            username: None,
            first_name: Some("Test".to_string()),
            last_name: None,
            language_code: None,
            is_bot: false,
        },
        chat: Chat::private(USER_ID),
        content: "/start".to_string(),
        message_type: "text".to_string(),
        direction: MessageDirection::Incoming,
        created_at: Utc::now(),
    });
    assert_eq!(handler.handle(&text).await.unwrap(), HandlerResponse::Ignore);
    assert_eq!(
        handler.handle(&app.press("back")).await.unwrap(),
        HandlerResponse::Ignore
    );
    assert!(!app
        .bot
        .calls()
        .iter()
        .any(|c| matches!(c, BotCall::Answer { .. })));
}

/// **Test: Unknown buttons on a library window are answered and swallowed.**
#[tokio::test]
async fn test_handler_swallows_unknown_library_button() {
    let app = TestApp::new(FailurePolicy::RestorePrevious);
    let handler = WindowHandler::new(app.manager.clone());
    app.manager.run_callback(&app.ctx, "select_language").await.unwrap();
    app.manager
        .open_connect_wallet(&app.ctx, connect_callbacks())
        .await
        .unwrap();

    let response = handler.handle(&app.press("retry")).await.unwrap();

    assert_eq!(response, HandlerResponse::Stop);
    assert_eq!(app.window().await, Window::ConnectWallet);
    assert!(app.bot.calls().contains(&BotCall::Answer {
        callback_id: "cb-retry".to_string()
    }));
}
