//! Outgoing Telegram messages

use async_trait::async_trait;
use teloxide::{prelude::*, types::ChatId};

use crate::error::{AppError, AppResult};

/// Delivers a plain text message to a chat
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatSender: Send + Sync {
    async fn send_message(&self, chat_id: i64, text: &str) -> AppResult<()>;
}

/// [`ChatSender`] backed by the Telegram Bot API
#[derive(Clone)]
pub struct TelegramSender {
    bot: Bot,
}

impl TelegramSender {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ChatSender for TelegramSender {
    async fn send_message(&self, chat_id: i64, text: &str) -> AppResult<()> {
        self.bot
            .send_message(ChatId(chat_id), text)
            .await
            .map_err(|e| AppError::Queue(format!("Failed to send Telegram message: {}", e)))?;
        Ok(())
    }
}
