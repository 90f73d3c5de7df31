//! Sending the finished video back to the chat.

use async_trait::async_trait;
use std::path::Path;
use teloxide::types::ChatId;

use crate::core::error::AppError;
use crate::core::utils::format_relay_caption;
use crate::download::file::LocalFile;
use crate::telegram::message::IncomingMessage;

/// Shown when the chat layer rejects the upload
pub const SEND_FAILED_MESSAGE: &str = "⚠️ Потужна помилка при надсиланні відео.";

/// The two chat operations the pipeline needs.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Uploads `video` to `chat_id`.
    async fn send_video(
        &self,
        chat_id: ChatId,
        video: &Path,
        caption: &str,
        disable_notification: bool,
    ) -> Result<(), AppError>;

    /// Replies to `message` in its chat.
    async fn reply_text(&self, message: &IncomingMessage, text: &str) -> Result<(), AppError>;
}

/// How a relay attempt ended. The file is deleted in both cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayResult {
    Sent,
    SendFailed,
}

/// Sends `file` to the chat `message` came from, silently, then deletes it.
pub async fn relay(gateway: &dyn ChatGateway, message: &IncomingMessage, file: LocalFile) -> RelayResult {
    let caption = format_relay_caption(&message.sender_display_name);
    let sent = gateway
        .send_video(message.chat_id, file.path(), &caption, true)
        .await;

    let path = file.path().to_path_buf();
    if let Err(e) = file.remove() {
        log::error!("Failed to delete {} after relay: {}", path.display(), e);
    }

    match sent {
        Ok(()) => {
            log::info!("Relayed {} to chat {}", path.display(), message.chat_id);
            RelayResult::Sent
        }
        Err(e) => {
            log::error!("Error sending video to chat {}: {}", message.chat_id, e);
            if let Err(e) = gateway.reply_text(message, SEND_FAILED_MESSAGE).await {
                log::warn!("Could not report send failure to chat {}: {}", message.chat_id, e);
            }
            RelayResult::SendFailed
        }
    }
}
