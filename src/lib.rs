pub mod chatbot;
pub mod classifier;
pub mod config;
pub mod error;
