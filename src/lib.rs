//! # Pony Bot
//!
//! Discord bot with a prefix command engine and a sequential music queue.
//!
//! - [`cmd`]: tokenizer, parameter schemas, registry and dispatcher
//! - [`audio`]: tracks, voice connection, player and queue
//! - [`bot`]: Serenity event handler, chat transport and command handlers
//! - [`sync`]: async mutex and freeze guard shared by both engines

pub mod audio;
pub mod bot;
pub mod cmd;
pub mod config;
pub mod error;
pub mod sources;
pub mod sync;
pub mod ui;
