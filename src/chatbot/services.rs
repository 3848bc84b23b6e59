//! Seams to the outside world. Production implementations live in
//! `telegram`, `weather` and `gemini`; tests swap in mocks.

use async_trait::async_trait;

use crate::chatbot::transcript::Turn;
use crate::error::Result;

/// An image produced by the image model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub data: Vec<u8>,
    pub mime_type: String,
}

impl GeneratedImage {
    /// File name to upload under, picked from the mime type.
    pub fn file_name(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" | "image/jpg" => "image.jpg",
            "image/webp" => "image.webp",
            _ => "image.png",
        }
    }
}

/// Current conditions for a city as reported by the weather service.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherReport {
    /// The `cod` field; `None` when it is not a number.
    pub status: Option<u16>,
    pub temp_kelvin: Option<f64>,
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Send text to a chat, quoting the message being answered.
    async fn reply(&self, chat_id: i64, reply_to_message_id: i64, text: &str) -> Result<()>;

    async fn send_image(&self, chat_id: i64, image: GeneratedImage) -> Result<()>;
}

#[async_trait]
pub trait WeatherService: Send + Sync {
    async fn current(&self, city: &str) -> Result<WeatherReport>;
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send `prompt` after the prior `history`. `Ok(None)` means the model
    /// answered without any text.
    async fn send(&self, history: &[Turn], prompt: &str) -> Result<Option<String>>;
}

#[async_trait]
pub trait ImageModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage>;
}
