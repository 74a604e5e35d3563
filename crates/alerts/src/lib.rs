//! Telegram front-end and storage for the buy alert bot.
//!
//! This crate provides:
//! - SQLite storage for destinations and notified events
//! - Command handling for configuring destinations
//! - Telegram delivery of rendered buy alerts

pub mod commands;
pub mod config;
pub mod db;
pub mod notifier;
pub mod telegram;

pub use commands::{Command, CommandContext, CommandRouter, Registrar};
pub use config::{parse_setup_args, SetupError};
pub use db::{Database, DbError};
pub use notifier::{format_buy_alert, LogSink, TelegramNotifier};
pub use telegram::TelegramBot;
