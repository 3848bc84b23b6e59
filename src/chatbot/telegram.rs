//! Telegram client using teloxide.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{InputFile, MessageId, ReplyParameters};
use tracing::{info, warn};

use crate::chatbot::services::{GeneratedImage, Transport};
use crate::error::Result;

/// Telegram rejects messages longer than this, counted in UTF-16 code units.
pub const MAX_MESSAGE_LEN: usize = 4096;

/// Telegram API client.
pub struct TelegramClient {
    bot: Bot,
}

impl TelegramClient {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

/// Split text into pieces of at most `max_units` UTF-16 code units, never
/// inside a character. Emoji and other astral characters count as two.
pub fn split_message(text: &str, max_units: usize) -> Vec<String> {
    if text.is_empty() {
        return vec![String::new()];
    }

    let mut parts = Vec::new();
    let mut current = String::new();
    let mut units = 0;
    for c in text.chars() {
        let width = c.len_utf16();
        if units + width > max_units && !current.is_empty() {
            parts.push(std::mem::take(&mut current));
            units = 0;
        }
        current.push(c);
        units += width;
    }
    parts.push(current);
    parts
}

#[async_trait]
impl Transport for TelegramClient {
    async fn reply(&self, chat_id: i64, reply_to_message_id: i64, text: &str) -> Result<()> {
        let chat_id = ChatId(chat_id);

        for (i, chunk) in split_message(text, MAX_MESSAGE_LEN).into_iter().enumerate() {
            let mut request = self.bot.send_message(chat_id, chunk);
            // Only the first piece quotes the original message
            if i == 0 {
                let reply_params = ReplyParameters::new(MessageId(reply_to_message_id as i32));
                request = request.reply_parameters(reply_params);
            }

            request.await.map_err(|e| {
                warn!("Failed to send: {e}");
                e
            })?;
        }

        Ok(())
    }

    async fn send_image(&self, chat_id: i64, image: GeneratedImage) -> Result<()> {
        info!("📷 Sending image to chat {} ({} bytes)", chat_id, image.data.len());

        let file_name = image.file_name();
        let input_file = InputFile::memory(image.data).file_name(file_name);

        self.bot
            .send_photo(ChatId(chat_id), input_file)
            .await
            .map_err(|e| {
                warn!("Failed to send image: {e}");
                e
            })?;

        Ok(())
    }
}
