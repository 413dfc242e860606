//! Drives the assembled handler chain with fake updates against a recording bot.

#![allow(dead_code)]

use async_trait::async_trait;
use handler_chain::HandlerChain;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tcbot::{build_components, build_handler_chain, BaseConfig, BotComponents, BotConfig, TonConnectConfig};
use tcbot_core::{
    Bot, CallbackQuery, Chat, HandlerResponse, InlineKeyboard, Message, MessageDirection, Result,
    Update, User,
};
use tempfile::TempDir;
use window_manager::{FailurePolicy, Session, UserContext, Window};

pub const USER_ID: i64 = 2002;

#[derive(Debug, Clone, PartialEq)]
pub enum BotCall {
    Send { message_id: String, text: String },
    Edit { message_id: String, text: String },
    Delete { message_id: String },
    Answer { callback_id: String },
}

/// Keeps every call and the keyboard of the last rendered window.
#[derive(Default)]
pub struct RecordingBot {
    calls: Mutex<Vec<BotCall>>,
    last_keyboard: Mutex<Option<InlineKeyboard>>,
    next_id: AtomicI64,
}

impl RecordingBot {
    pub fn calls(&self) -> Vec<BotCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Text of the last send or edit.
    pub fn last_text(&self) -> String {
        self.calls()
            .into_iter()
            .rev()
            .find_map(|c| match c {
                BotCall::Send { text, .. } | BotCall::Edit { text, .. } => Some(text),
                _ => None,
            })
            .unwrap_or_default()
    }

    pub fn last_keyboard_data(&self) -> Vec<String> {
        self.last_keyboard
            .lock()
            .unwrap()
            .as_ref()
            .map(|k| k.callback_data().map(str::to_string).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Bot for RecordingBot {
    async fn send_message(
        &self,
        _chat: &Chat,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<String> {
        let message_id = (self.next_id.fetch_add(1, Ordering::SeqCst) + 1).to_string();
        self.calls.lock().unwrap().push(BotCall::Send {
            message_id: message_id.clone(),
            text: text.to_string(),
        });
        *self.last_keyboard.lock().unwrap() = keyboard.cloned();
        Ok(message_id)
    }

    async fn edit_message(
        &self,
        _chat: &Chat,
        message_id: &str,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<()> {
        self.calls.lock().unwrap().push(BotCall::Edit {
            message_id: message_id.to_string(),
            text: text.to_string(),
        });
        *self.last_keyboard.lock().unwrap() = keyboard.cloned();
        Ok(())
    }

    async fn delete_message(&self, _chat: &Chat, message_id: &str) -> Result<()> {
        self.calls.lock().unwrap().push(BotCall::Delete {
            message_id: message_id.to_string(),
        });
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str, _text: Option<&str>) -> Result<()> {
        self.calls.lock().unwrap().push(BotCall::Answer {
            callback_id: callback_id.to_string(),
        });
        Ok(())
    }
}

pub fn test_config(dir: &TempDir) -> BotConfig {
    BotConfig {
        base: BaseConfig {
            bot_token: "123:test".to_string(),
            telegram_api_url: None,
            log_file: dir.path().join("tcbot.log").to_string_lossy().into_owned(),
            session_store_url: dir.path().join("sessions.db").to_string_lossy().into_owned(),
            // Tests press buttons faster than a person could.
            throttle_ms: 0,
        },
        ton_connect: TonConnectConfig {
            manifest_url: "https://example.com/tonconnect-manifest.json".to_string(),
            redirect_url: None,
            // Nothing listens on port 9, so the built-in wallets list is used.
            wallets_source_url: "http://127.0.0.1:9/wallets.json".to_string(),
            wallets_fallback_path: dir
                .path()
                .join("wallets_fallback.json")
                .to_string_lossy()
                .into_owned(),
            exclude_wallets: Vec::new(),
            wallets_cache_ttl_secs: 86_400,
            check_proof: false,
            connect_timeout_secs: 30,
            transaction_timeout_secs: 30,
            failure_policy: FailurePolicy::RestorePrevious,
            bridge: "simulated".to_string(),
            // The simulated wallet answers right away.
            simulated_delay_secs: 0,
        },
    }
}

pub struct DemoBot {
    pub bot: Arc<RecordingBot>,
    pub components: BotComponents,
    pub chain: HandlerChain,
    pub ctx: UserContext,
    _dir: TempDir,
}

impl DemoBot {
    pub async fn new() -> Self {
        Self::with_throttle(0).await
    }

    /// Same as [`DemoBot::new`] with per-user throttling of `throttle_ms`.
    pub async fn with_throttle(throttle_ms: u64) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(&dir);
        config.base.throttle_ms = throttle_ms;
        let bot = Arc::new(RecordingBot::default());
        let bot_dyn: Arc<dyn Bot> = bot.clone();
        let components = build_components(&config, bot_dyn).await.unwrap();
        let chain = build_handler_chain(&components);
        Self {
            bot,
            components,
            chain,
            ctx: UserContext {
                user_id: USER_ID,
                chat_id: USER_ID,
                language_code: Some("en".to_string()),
            },
            _dir: dir,
        }
    }

    pub async fn session(&self) -> Session {
        self.components.manager.session(&self.ctx).await.unwrap()
    }

    pub async fn window(&self) -> Window {
        self.session().await.current_window
    }

    pub async fn wait_for_window(&self, expected: Window) {
        for _ in 0..300 {
            if self.window().await == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("window never became {}, still {}", expected, self.window().await);
    }

    pub async fn send_text(&self, text: &str) -> HandlerResponse {
        self.chain.handle(&text_update(text, Chat::private(USER_ID))).await.unwrap()
    }

    pub async fn press(&self, data: &str) -> HandlerResponse {
        let update = Update::CallbackQuery(CallbackQuery {
            id: format!("cb-{}", data),
            user: user(),
            chat: Chat::private(USER_ID),
            message_id: self.session().await.message_id,
            data: Some(data.to_string()),
        });
        self.chain.handle(&update).await.unwrap()
    }
}

pub fn user() -> User {
    User {
        id: USER_ID,
        username: Some("demo_user".to_string()),
        first_name: Some("Demo".to_string()),
        last_name: None,
        language_code: Some("en".to_string()),
        is_bot: false,
    }
}

pub fn text_update(text: &str, chat: Chat) -> Update {
    Update::Message(Message {
        id: "100".to_string(),
        user: user(),
        chat,
        content: text.to_string(),
        message_type: "text".to_string(),
        direction: MessageDirection::Incoming,
        created_at: chrono::Utc::now(),
    })
}
