use thiserror::Error;

/// Errors raised while handling one message.
#[derive(Error, Debug)]
pub enum BotError {
    #[error("HTTP request error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Telegram error: {0}")]
    Transport(#[from] teloxide::RequestError),
}

impl From<serde_json::Error> for BotError {
    fn from(err: serde_json::Error) -> Self {
        BotError::Parse(err.to_string())
    }
}

impl From<base64::DecodeError> for BotError {
    fn from(err: base64::DecodeError) -> Self {
        BotError::Parse(format!("invalid base64: {err}"))
    }
}

impl BotError {
    /// Short category name, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            BotError::Network(_) => "network",
            BotError::Parse(_) => "parse",
            BotError::Model(_) => "model",
            BotError::Transport(_) => "transport",
        }
    }
}

pub type Result<T> = std::result::Result<T, BotError>;
