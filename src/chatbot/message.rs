//! Inbound message type.

use teloxide::types::Message;

/// One inbound text message, created per update and dropped once handled.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub message_id: i64,
    /// Chat ID where this message was sent (negative = group, positive = DM).
    pub chat_id: i64,
    pub username: String,
    pub text: String,
}

impl IncomingMessage {
    /// Build from a Telegram message. Returns `None` for non-text messages.
    pub fn from_telegram(msg: &Message) -> Option<Self> {
        let text = msg.text()?.to_string();
        let user = msg.from.as_ref();
        let username = user
            .and_then(|u| u.username.as_deref())
            .unwrap_or_else(|| user.map(|u| u.first_name.as_str()).unwrap_or("unknown"))
            .to_string();

        Some(Self {
            message_id: msg.id.0 as i64,
            chat_id: msg.chat.id.0,
            username,
            text,
        })
    }

    /// Lowercased text used for intent detection.
    pub fn normalized(&self) -> String {
        self.text.to_lowercase()
    }

    /// First 100 chars of the text, for logs.
    pub fn preview(&self) -> String {
        self.text.chars().take(100).collect()
    }
}
