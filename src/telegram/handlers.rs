//! Telegram bot handler tree configuration
//!
//! The dispatcher only filters and converts messages; the pipeline itself
//! runs in its own task so a slow download never holds up updates from the
//! same chat.

use std::sync::Arc;

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::Message;
use tokio_util::task::TaskTracker;

use crate::download::pipeline::RelayPipeline;
use crate::telegram::message::{incoming_from_message, IncomingMessage};

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub pipeline: Arc<RelayPipeline>,
    /// Tracks in-flight relays so shutdown can wait for them
    pub tasks: TaskTracker,
}

impl HandlerDeps {
    pub fn new(pipeline: Arc<RelayPipeline>, tasks: TaskTracker) -> Self {
        Self { pipeline, tasks }
    }
}

/// Starts the pipeline for `message` in the background.
pub fn spawn_relay(deps: &HandlerDeps, message: IncomingMessage) {
    let pipeline = Arc::clone(&deps.pipeline);
    deps.tasks.spawn(async move {
        let outcome = pipeline.handle(&message).await;
        log::debug!(
            "Message {} in chat {} finished: {:?}",
            message.message_id.0,
            message.chat_id,
            outcome
        );
    });
}

/// Creates the dispatcher schema: group text messages that are not replies.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter_map(|msg: Message| incoming_from_message(&msg))
        .filter(|message: IncomingMessage| message.is_relay_candidate())
        .endpoint(move |message: IncomingMessage| {
            let deps = deps.clone();
            async move {
                log::info!("Received message in chat {}: {}", message.chat_id, message.text);
                spawn_relay(&deps, message);
                Ok::<(), HandlerError>(())
            }
        })
}
