//! Chatbot engine - routes each message to the responder for its intent.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::chatbot::message::IncomingMessage;
use crate::chatbot::services::{ChatModel, ImageModel, Transport, WeatherService};
use crate::chatbot::transcript::Sessions;
use crate::chatbot::{chat, image, weather};
use crate::classifier::{classify, Intent};
use crate::error::Result;

/// Sent whenever handling a message fails for any reason.
pub const FAILURE_REPLY: &str = "Sorry, I couldn't process your request.";

/// External services the engine talks to.
#[derive(Clone)]
pub struct Services {
    pub transport: Arc<dyn Transport>,
    pub weather: Arc<dyn WeatherService>,
    pub chat_model: Arc<dyn ChatModel>,
    pub image_model: Arc<dyn ImageModel>,
}

/// The chatbot engine.
pub struct ChatbotEngine {
    services: Services,
    sessions: Sessions,
    /// Bounds how many messages are in flight across all chats.
    permits: Semaphore,
}

impl ChatbotEngine {
    pub fn new(services: Services, max_concurrent_requests: usize) -> Self {
        Self {
            services,
            sessions: Sessions::new(),
            permits: Semaphore::new(max_concurrent_requests.max(1)),
        }
    }

    pub fn sessions(&self) -> &Sessions {
        &self.sessions
    }

    /// Handle one inbound message end to end.
    ///
    /// Never fails: any error is logged and answered with [`FAILURE_REPLY`].
    pub async fn handle_message(&self, msg: IncomingMessage) {
        let Ok(_permit) = self.permits.acquire().await else {
            warn!("Semaphore closed, dropping message {}", msg.message_id);
            return;
        };

        let normalized = msg.normalized();
        let intent = classify(&normalized);
        info!(
            "📨 Message from {} in chat {}: \"{}\" → {}",
            msg.username,
            msg.chat_id,
            msg.preview(),
            intent.as_str()
        );

        if let Err(e) = self.dispatch(&msg, &normalized, intent).await {
            error!(kind = e.kind(), "Failed to handle message {} in chat {}: {}", msg.message_id, msg.chat_id, e);
            if let Err(e) = self
                .services
                .transport
                .reply(msg.chat_id, msg.message_id, FAILURE_REPLY)
                .await
            {
                warn!("Failed to send failure reply: {e}");
            }
        }
    }

    async fn dispatch(&self, msg: &IncomingMessage, normalized: &str, intent: Intent) -> Result<()> {
        let services = &self.services;
        let reply = match intent {
            Intent::Image => {
                return image::respond(msg, normalized, services.transport.as_ref(), services.image_model.as_ref())
                    .await;
            }
            Intent::Weather => weather::respond(&msg.text, services.weather.as_ref()).await?,
            Intent::Chat => {
                chat::respond(msg.chat_id, &msg.text, &self.sessions, services.chat_model.as_ref()).await?
            }
        };

        services.transport.reply(msg.chat_id, msg.message_id, &reply).await
    }
}
