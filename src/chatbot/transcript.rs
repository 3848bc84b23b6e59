//! Conversation history, one transcript per chat.
//!
//! Transcripts live for the process lifetime and are never pruned.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    pub at: DateTime<Utc>,
}

/// Ordered turns for a single chat.
#[derive(Debug, Default)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// When the first recorded exchange happened.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.turns.first().map(|turn| turn.at)
    }

    /// Record a completed exchange. Both turns are added together so the
    /// history always alternates user/model.
    pub fn push_exchange(&mut self, prompt: String, reply: String) {
        let now = Utc::now();
        self.turns.push(Turn { role: Role::User, text: prompt, at: now });
        self.turns.push(Turn { role: Role::Model, text: reply, at: Utc::now() });
    }
}

/// Per-chat transcripts.
///
/// Each transcript sits behind its own lock; holding it for a whole model
/// call keeps turns of one chat in order while other chats proceed.
#[derive(Default)]
pub struct Sessions {
    chats: Mutex<HashMap<i64, Arc<Mutex<Transcript>>>>,
}

impl Sessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the transcript for a chat, creating an empty one on first use.
    pub async fn get(&self, chat_id: i64) -> Arc<Mutex<Transcript>> {
        let mut chats = self.chats.lock().await;
        chats.entry(chat_id).or_default().clone()
    }

    pub async fn len(&self) -> usize {
        self.chats.lock().await.len()
    }
}
