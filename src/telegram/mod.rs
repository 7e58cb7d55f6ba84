//! Telegram integration: message texts, outgoing sender and the bot front end

pub mod bot;
pub mod format;
pub mod sender;

pub use sender::{ChatSender, TelegramSender};
