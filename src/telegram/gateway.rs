use async_trait::async_trait;
use std::path::Path;
use teloxide::prelude::*;
use teloxide::types::{ChatId, InputFile, ReplyParameters};

use crate::core::error::AppError;
use crate::download::relay::ChatGateway;
use crate::telegram::message::IncomingMessage;

/// `ChatGateway` over the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramGateway {
    bot: Bot,
}

impl TelegramGateway {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ChatGateway for TelegramGateway {
    async fn send_video(
        &self,
        chat_id: ChatId,
        video: &Path,
        caption: &str,
        disable_notification: bool,
    ) -> Result<(), AppError> {
        self.bot
            .send_video(chat_id, InputFile::file(video.to_path_buf()))
            .caption(caption)
            .supports_streaming(true)
            .disable_notification(disable_notification)
            .await?;
        Ok(())
    }

    async fn reply_text(&self, message: &IncomingMessage, text: &str) -> Result<(), AppError> {
        self.bot
            .send_message(message.chat_id, text)
            .reply_parameters(ReplyParameters::new(message.message_id))
            .await?;
        Ok(())
    }
}
