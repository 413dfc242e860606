//! Shared fixtures: a recording [`Bot`], a manual [`SimulatedBridge`] and app windows that log
//! their invocations.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use storage::MemoryStore;
use tcbot_core::{Bot, BotError, CallbackQuery, Chat, InlineKeyboard, Result, Update, User};
use ton_wallet::{
    BridgeCall, ConnectOutcome, SimulatedBridge, WalletBridge, WalletList, WalletListConfig,
};
use window_manager::{
    CallbackRegistry, FailurePolicy, FlowCallbacks, FlowContext, ManagerOptions, SessionRepository,
    UserContext, Window, WindowCallback, WindowManager,
};

pub const USER_ID: i64 = 1001;

/// One recorded transport call.
#[derive(Debug, Clone, PartialEq)]
pub enum BotCall {
    Send {
        message_id: String,
        text: String,
        keyboard: Option<InlineKeyboard>,
    },
    Edit {
        message_id: String,
        text: String,
        keyboard: Option<InlineKeyboard>,
    },
    Delete {
        message_id: String,
    },
    Answer {
        callback_id: String,
    },
}

/// Records every call; edits and deletes can be scripted to fail once.
#[derive(Default)]
pub struct MockBot {
    calls: Mutex<Vec<BotCall>>,
    next_id: AtomicI64,
    edit_failures: Mutex<VecDeque<BotError>>,
    delete_failures: Mutex<VecDeque<BotError>>,
}

impl MockBot {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_next_edit(&self, error: BotError) {
        self.edit_failures.lock().unwrap().push_back(error);
    }

    pub fn fail_next_delete(&self, error: BotError) {
        self.delete_failures.lock().unwrap().push_back(error);
    }

    pub fn calls(&self) -> Vec<BotCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Texts of sent messages, in order.
    pub fn sent_texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                BotCall::Send { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Text and keyboard of the last send or edit.
    pub fn last_render(&self) -> Option<(String, Option<InlineKeyboard>)> {
        self.calls().into_iter().rev().find_map(|c| match c {
            BotCall::Send { text, keyboard, .. } | BotCall::Edit { text, keyboard, .. } => {
                Some((text, keyboard))
            }
            _ => None,
        })
    }

    fn record(&self, call: BotCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Bot for MockBot {
    async fn send_message(
        &self,
        _chat: &Chat,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<String> {
        let message_id = (self.next_id.fetch_add(1, Ordering::SeqCst) + 1).to_string();
        self.record(BotCall::Send {
            message_id: message_id.clone(),
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        });
        Ok(message_id)
    }

    async fn edit_message(
        &self,
        _chat: &Chat,
        message_id: &str,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<()> {
        if let Some(error) = self.edit_failures.lock().unwrap().pop_front() {
            return Err(error.into());
        }
        self.record(BotCall::Edit {
            message_id: message_id.to_string(),
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        });
        Ok(())
    }

    async fn delete_message(&self, _chat: &Chat, message_id: &str) -> Result<()> {
        if let Some(error) = self.delete_failures.lock().unwrap().pop_front() {
            return Err(error.into());
        }
        self.record(BotCall::Delete {
            message_id: message_id.to_string(),
        });
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str, _text: Option<&str>) -> Result<()> {
        self.record(BotCall::Answer {
            callback_id: callback_id.to_string(),
        });
        Ok(())
    }
}

/// What an app window saw when it was invoked.
#[derive(Debug, Clone)]
pub struct CallbackRecord {
    pub name: String,
    pub wallet: Option<String>,
    pub receipt: Option<String>,
}

/// Holds one app window's render until released, so a test can act while a flow settles.
#[derive(Default)]
pub struct Gate {
    held: Mutex<Option<&'static str>>,
    release: tokio::sync::Notify,
}

/// App window that renders `"<name> window"` and logs the call.
pub struct AppWindow {
    name: &'static str,
    log: Arc<Mutex<Vec<CallbackRecord>>>,
    gate: Arc<Gate>,
}

#[async_trait]
impl WindowCallback for AppWindow {
    async fn call(&self, manager: &WindowManager, flow: FlowContext) -> window_manager::Result<()> {
        self.log.lock().unwrap().push(CallbackRecord {
            name: self.name.to_string(),
            wallet: flow.wallet.as_ref().map(|w| w.address.clone()),
            receipt: flow.receipt.as_ref().map(|r| r.boc.clone()),
        });
        let held = *self.gate.held.lock().unwrap() == Some(self.name);
        if held {
            self.gate.release.notified().await;
        }
        manager
            .show_window(
                &flow.user,
                Window::app(self.name),
                &format!("{} window", self.name),
                None,
            )
            .await?;
        Ok(())
    }
}

pub const APP_WINDOWS: [&str; 4] = ["select_language", "main_menu", "send_amount", "transaction_info"];

pub fn connect_callbacks() -> FlowCallbacks {
    FlowCallbacks::new("select_language", "main_menu")
}

pub fn transaction_callbacks() -> FlowCallbacks {
    FlowCallbacks::new("send_amount", "transaction_info")
}

pub struct TestApp {
    pub manager: WindowManager,
    pub bot: Arc<MockBot>,
    pub bridge: Arc<SimulatedBridge>,
    pub log: Arc<Mutex<Vec<CallbackRecord>>>,
    pub gate: Arc<Gate>,
    pub ctx: UserContext,
}

impl TestApp {
    pub fn new(policy: FailurePolicy) -> Self {
        Self::with_options(ManagerOptions {
            failure_policy: policy,
            ..ManagerOptions::default()
        })
    }

    pub fn with_options(options: ManagerOptions) -> Self {
        let bot = MockBot::new();
        let bridge = Arc::new(SimulatedBridge::manual());
        let log = Arc::new(Mutex::new(Vec::new()));
        let gate = Arc::new(Gate::default());

        // Nothing listens on port 9, so the built-in wallets list is used.
        let wallets = WalletList::new(WalletListConfig {
            source_url: "http://127.0.0.1:9/wallets.json".to_string(),
            request_timeout: Duration::from_secs(1),
            ..WalletListConfig::default()
        })
        .unwrap();

        let mut registry = CallbackRegistry::new();
        for name in APP_WINDOWS {
            registry = registry.register(
                name,
                Arc::new(AppWindow {
                    name,
                    log: log.clone(),
                    gate: gate.clone(),
                }),
            );
        }

        let bot_dyn: Arc<dyn Bot> = bot.clone();
        let bridge_dyn: Arc<dyn WalletBridge> = bridge.clone();
        let manager = WindowManager::builder(
            bot_dyn,
            bridge_dyn,
            Arc::new(wallets),
            SessionRepository::new(Arc::new(MemoryStore::new())),
        )
        .callbacks(registry)
        .options(options)
        .build();

        let ctx = UserContext {
            user_id: USER_ID,
            chat_id: USER_ID,
            language_code: Some("en".to_string()),
        };
        Self {
            manager,
            bot,
            bridge,
            log,
            gate,
            ctx,
        }
    }

    /// The next call of app window `name` waits for [`TestApp::release_window`] before rendering.
    pub fn hold_window(&self, name: &'static str) {
        *self.gate.held.lock().unwrap() = Some(name);
    }

    pub fn release_window(&self) {
        *self.gate.held.lock().unwrap() = None;
        self.gate.release.notify_one();
    }

    /// Polls until app window `name` has been invoked.
    pub async fn wait_for_invoked(&self, name: &str) {
        for _ in 0..300 {
            if self.invoked().iter().any(|n| n == name) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("{} was never invoked", name);
    }

    pub async fn bridge_calls_matching(&self, f: impl Fn(&BridgeCall) -> bool) -> usize {
        self.bridge.calls().await.iter().filter(|c| f(c)).count()
    }

    pub async fn window(&self) -> Window {
        self.manager.session(&self.ctx).await.unwrap().current_window
    }

    pub fn invoked(&self) -> Vec<String> {
        self.log.lock().unwrap().iter().map(|r| r.name.clone()).collect()
    }

    pub fn last_record(&self) -> Option<CallbackRecord> {
        self.log.lock().unwrap().last().cloned()
    }

    /// Polls until the session shows `expected`.
    pub async fn wait_for_window(&self, expected: Window) {
        for _ in 0..300 {
            if self.window().await == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("window never became {}, still {}", expected, self.window().await);
    }

    /// Polls until the user has no wait task left.
    pub async fn wait_for_idle_task(&self) {
        for _ in 0..300 {
            if !self.manager.tasks().is_running(USER_ID).await {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("wait task still running");
    }

    pub async fn wait_for_pending_request(&self) -> u64 {
        for _ in 0..300 {
            if let Some(id) = self.bridge.pending_request_id(USER_ID).await {
                return id;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("no pending transaction");
    }

    /// Shows the start window and goes through a successful connect.
    pub async fn connect(&self) {
        self.manager
            .run_callback(&self.ctx, "select_language")
            .await
            .unwrap();
        self.manager
            .open_connect_wallet(&self.ctx, connect_callbacks())
            .await
            .unwrap();
        let wallet = SimulatedBridge::simulated_wallet(USER_ID, "telegram-wallet", None);
        assert!(
            self.bridge
                .resolve_connection(USER_ID, ConnectOutcome::Connected(wallet))
                .await
        );
        self.wait_for_window(Window::app("main_menu")).await;
        self.wait_for_idle_task().await;
    }

    /// A button press on the tracked window.
    pub fn press(&self, data: &str) -> Update {
        Update::CallbackQuery(CallbackQuery {
            id: format!("cb-{}", data),
            user: User {
                id: USER_ID,
                username: Some("tester".to_string()),
                first_name: Some("Test".to_string()),
                last_name: None,
                language_code: Some("en".to_string()),
                is_bot: false,
            },
            chat: Chat::private(USER_ID),
            message_id: None,
            data: Some(data.to_string()),
        })
    }
}
