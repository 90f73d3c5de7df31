use teloxide::types::{ChatId, Message, MessageId};

/// The parts of an inbound Telegram message the relay looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub text: String,
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub sender_display_name: String,
    /// Group or supergroup
    pub is_group: bool,
    /// Replies to another message are never relayed
    pub is_reply: bool,
}

impl IncomingMessage {
    /// Only top-level text messages in group chats are processed.
    pub fn is_relay_candidate(&self) -> bool {
        self.is_group && !self.is_reply
    }
}

/// Converts a teloxide message. Returns `None` for anything without text.
pub fn incoming_from_message(msg: &Message) -> Option<IncomingMessage> {
    let text = msg.text()?;
    let sender_display_name = msg
        .from
        .as_ref()
        .map(|user| user.full_name())
        .or_else(|| msg.sender_chat.as_ref().and_then(|chat| chat.title().map(str::to_string)))
        .unwrap_or_default();

    Some(IncomingMessage {
        text: text.to_string(),
        chat_id: msg.chat.id,
        message_id: msg.id,
        sender_display_name,
        is_group: msg.chat.is_group() || msg.chat.is_supergroup(),
        is_reply: msg.reply_to_message().is_some(),
    })
}
