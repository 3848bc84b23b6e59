//! Chatbot module - intent routing and the responders behind it.

pub mod chat;
pub mod engine;
pub mod gemini;
pub mod image;
pub mod message;
pub mod services;
pub mod telegram;
pub mod transcript;
pub mod weather;


pub use engine::{ChatbotEngine, Services, FAILURE_REPLY};
pub use gemini::GeminiClient;
pub use message::IncomingMessage;
pub use services::{ChatModel, GeneratedImage, ImageModel, Transport, WeatherReport, WeatherService};
pub use telegram::TelegramClient;
pub use weather::OpenWeatherClient;
