//! Keyword-based intent detection.

/// Words that mark a message as an image request.
pub const IMAGE_KEYWORDS: [&str; 7] = ["image", "img", "picture", "photo", "draw", "create", "generate"];

/// Words that mark a message as a weather request.
pub const WEATHER_KEYWORDS: [&str; 3] = ["weather", "temperature", "forecast"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Image,
    Weather,
    Chat,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Image => "image",
            Intent::Weather => "weather",
            Intent::Chat => "chat",
        }
    }
}

/// Classify already-lowercased text.
///
/// Plain substring checks with no word boundaries, so "photograph" is an
/// image request. Image keywords win over weather keywords.
pub fn classify(text: &str) -> Intent {
    if IMAGE_KEYWORDS.iter().any(|k| text.contains(k)) {
        Intent::Image
    } else if WEATHER_KEYWORDS.iter().any(|k| text.contains(k)) {
        Intent::Weather
    } else {
        Intent::Chat
    }
}
