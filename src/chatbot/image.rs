//! Image requests: derive a prompt, generate, send.

use tracing::info;

use crate::chatbot::message::IncomingMessage;
use crate::chatbot::services::{ImageModel, Transport};
use crate::classifier::IMAGE_KEYWORDS;
use crate::error::Result;

pub const DEFAULT_PROMPT: &str = "a beautiful landscape";
pub const ACK_REPLY: &str = "Generating image...";

const ARTICLES: [&str; 3] = ["a", "an", "the"];

/// Remove every image keyword from lowercased text.
///
/// Removal repeats until no keyword is left (removing one can join the
/// halves of another) and whitespace is collapsed. An article is dropped
/// only when the word after it was removed entirely, so "generate a picture
/// of a cat" gives "of a cat" while "draw a cat" keeps "a cat". Applying it
/// twice gives the same result as once.
pub fn strip_keywords(text: &str) -> String {
    let words: Vec<String> = text.split_whitespace().map(remove_keywords).collect();

    words
        .iter()
        .enumerate()
        .filter(|(i, word)| {
            if word.is_empty() {
                return false;
            }
            let orphaned = words.get(i + 1).is_some_and(|next| next.is_empty());
            !(orphaned && ARTICLES.contains(&word.as_str()))
        })
        .map(|(_, word)| word.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

fn remove_keywords(word: &str) -> String {
    let mut word = word.to_string();
    while IMAGE_KEYWORDS.iter().any(|k| word.contains(k)) {
        for keyword in IMAGE_KEYWORDS {
            word = word.replace(keyword, "");
        }
    }
    word
}

/// Prompt for the image model, falling back to a default when nothing is
/// left after stripping keywords.
pub fn derive_prompt(normalized: &str) -> String {
    let prompt = strip_keywords(normalized);
    if prompt.is_empty() {
        DEFAULT_PROMPT.to_string()
    } else {
        prompt
    }
}

/// Acknowledge, generate and send the image to the originating chat.
pub async fn respond(
    msg: &IncomingMessage,
    normalized: &str,
    transport: &dyn Transport,
    model: &dyn ImageModel,
) -> Result<()> {
    let prompt = derive_prompt(normalized);
    info!("🖼️ Image prompt: {}", prompt);

    transport.reply(msg.chat_id, msg.message_id, ACK_REPLY).await?;

    let image = model.generate(&prompt).await?;
    transport.send_image(msg.chat_id, image).await
}
