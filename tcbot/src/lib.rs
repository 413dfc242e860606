//! # tcbot
//!
//! Demo bot on top of the window manager: pick a language, connect a TON wallet, send TON to
//! yourself. Loads config from env, assembles components and runs the Telegram dispatcher.

pub mod cli;
pub mod components;
pub mod config;
pub mod demo;
pub mod runner;

pub use cli::{load_config, Cli, Commands};
pub use components::{build_components, build_handler_chain, BotComponents};
pub use config::{BaseConfig, BotConfig, TonConnectConfig};
pub use demo::{demo_callbacks, DemoHandler};
pub use runner::run_bot;
