use anyhow::{Context, Result};
use async_trait::async_trait;
use teloxide::prelude::*;
use tracing::debug;

use crate::config::TelegramConfig;
use crate::dispatch::{Capabilities, ReplySender};
use crate::platform::ReplyTarget;

/// Telegram Bot API sender. Plain text only: the report's `**bold**`
/// markup is not valid Telegram MarkdownV2.
pub struct TelegramSender {
    bot: Bot,
}

impl TelegramSender {
    pub fn new(config: &TelegramConfig) -> Self {
        Self {
            bot: Bot::new(&config.bot_token),
        }
    }
}

#[async_trait]
impl ReplySender for TelegramSender {
    fn capabilities(&self) -> Capabilities {
        Capabilities::PLAIN_ONLY
    }

    async fn send_rich_text(&self, _target: &ReplyTarget, _content: &str) -> Result<()> {
        anyhow::bail!("Telegram sender does not support rich text")
    }

    async fn send_text(&self, target: &ReplyTarget, content: &str) -> Result<()> {
        let chat_id: i64 = target
            .id
            .parse()
            .with_context(|| format!("Invalid Telegram chat id: {}", target.id))?;
        debug!("Sending Telegram message to {}", chat_id);

        self.bot
            .send_message(ChatId(chat_id), content)
            .await
            .context("Failed to send Telegram message")?;
        Ok(())
    }
}
