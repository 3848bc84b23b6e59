//! Conversational fallback backed by a per-chat transcript.

use tracing::{debug, info};

use crate::chatbot::services::ChatModel;
use crate::chatbot::transcript::Sessions;
use crate::error::Result;

pub const NO_REPLY_APOLOGY: &str = "Sorry, I couldn't generate a response.";

/// Appended to every chat prompt. Advisory; replies are not cut.
pub const CONCISE_SUFFIX: &str = "\n\nKeep your response short and concise (under 500 characters if possible).";

pub fn compose_prompt(text: &str) -> String {
    format!("{text}{CONCISE_SUFFIX}")
}

/// Send `text` to the model with the chat's history and return the reply.
///
/// The transcript stays locked for the whole call. It only grows when the
/// model actually answers.
pub async fn respond(chat_id: i64, text: &str, sessions: &Sessions, model: &dyn ChatModel) -> Result<String> {
    let prompt = compose_prompt(text);
    let transcript = sessions.get(chat_id).await;
    debug!("Chat {} ({} open sessions)", chat_id, sessions.len().await);
    let mut transcript = transcript.lock().await;

    let reply = model.send(transcript.turns(), &prompt).await?;

    match reply {
        Some(reply) => {
            let preview: String = reply.chars().take(100).collect();
            match transcript.started_at() {
                Some(since) => info!(
                    "💬 Model reply ({} turns since {}): \"{}\"",
                    transcript.len(),
                    since.format("%H:%M:%S"),
                    preview
                ),
                None => info!("💬 Model reply (new conversation): \"{}\"", preview),
            }
            transcript.push_exchange(prompt, reply.clone());
            Ok(reply)
        }
        None => {
            info!("💬 Model returned no text");
            Ok(NO_REPLY_APOLOGY.to_string())
        }
    }
}
