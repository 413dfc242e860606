//! Unit tests for ThrottlingMiddleware.

use crate::{ThrottlingMiddleware, DEFAULT_THROTTLE};
use std::time::{Duration, Instant};
use tcbot_core::{CallbackQuery, Chat, Middleware, Update, User};

fn press(user_id: i64, data: &str) -> Update {
    Update::CallbackQuery(CallbackQuery {
        id: format!("cb-{}", data),
        user: User {
            id: user_id,
            username: None,
            first_name: Some("Test".to_string()),
            last_name: None,
            language_code: Some("en".to_string()),
            is_bot: false,
        },
        chat: Chat::private(user_id),
        message_id: Some("7".to_string()),
        data: Some(data.to_string()),
    })
}

/// **Test: A second press inside the window is dropped; other users are unaffected.**
#[tokio::test]
async fn test_double_tap_is_dropped() {
    let mw = ThrottlingMiddleware::default();
    assert_eq!(mw.ttl(), DEFAULT_THROTTLE);

    assert!(mw.before(&press(1, "send_ton")).await.unwrap());
    assert!(!mw.before(&press(1, "send_ton")).await.unwrap());
    assert!(mw.before(&press(2, "send_ton")).await.unwrap());
}

/// **Test: Once the window has passed the user is let through again.**
#[test]
fn test_window_expires() {
    let mw = ThrottlingMiddleware::new(Duration::from_millis(700));
    let start = Instant::now();

    assert!(mw.accept(1, start));
    assert!(!mw.accept(1, start + Duration::from_millis(300)));
    // Dropped updates do not extend the window.
    assert!(!mw.accept(1, start + Duration::from_millis(699)));
    assert!(mw.accept(1, start + Duration::from_millis(700)));
    assert!(!mw.accept(1, start + Duration::from_millis(900)));
}

/// **Test: A zero window never throttles.**
#[tokio::test]
async fn test_zero_ttl_lets_everything_through() {
    let mw = ThrottlingMiddleware::new(Duration::ZERO);
    for _ in 0..3 {
        assert!(mw.before(&press(1, "back")).await.unwrap());
    }
}
