//! Per-message relay pipeline.
//!
//! match → resolve (TikTok short links) → download on the worker pool →
//! size gate → relay. Every stage either hands its result to the next one or
//! ends the request with silence (nothing to do) or one short reply. Nothing
//! is retried and nothing escapes as an error, so one broken link cannot
//! disturb other requests.

use std::sync::Arc;

use crate::download::dispatcher::DownloadDispatcher;
use crate::download::matcher::UrlMatcher;
use crate::download::redirect::UrlResolver;
use crate::download::relay::{relay, ChatGateway, RelayResult};
use crate::download::size_gate;
use crate::telegram::message::IncomingMessage;

/// Shown when yt-dlp could not produce a file
pub const DOWNLOAD_FAILED_MESSAGE: &str = "⚠️ Потужне посилання не підтримується, або не вдалося потужно завантажити.";

/// Where a message ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Not a top-level group message
    Ignored,
    /// No supported link in the text
    NoMatch,
    Relayed,
    DownloadFailed,
    Oversize { size_bytes: u64 },
    SendFailed,
}

pub struct RelayPipeline {
    matcher: UrlMatcher,
    resolver: Arc<dyn UrlResolver>,
    dispatcher: Arc<DownloadDispatcher>,
    gateway: Arc<dyn ChatGateway>,
    max_file_size: u64,
}

impl RelayPipeline {
    pub fn new(
        matcher: UrlMatcher,
        resolver: Arc<dyn UrlResolver>,
        dispatcher: Arc<DownloadDispatcher>,
        gateway: Arc<dyn ChatGateway>,
        max_file_size: u64,
    ) -> Self {
        Self {
            matcher,
            resolver,
            dispatcher,
            gateway,
            max_file_size,
        }
    }

    pub fn dispatcher(&self) -> &DownloadDispatcher {
        &self.dispatcher
    }

    /// Runs one message through the whole pipeline.
    pub async fn handle(&self, message: &IncomingMessage) -> Outcome {
        if !message.is_relay_candidate() {
            return Outcome::Ignored;
        }

        let Some(matched) = self.matcher.find(&message.text) else {
            return Outcome::NoMatch;
        };
        log::info!("Matched {} URL in chat {}: {}", matched.platform, message.chat_id, matched.url);

        let url = self.resolver.resolve(&matched).await;
        log::info!("Using URL for download: {}", url);

        let job = self.dispatcher.build_job(&url);
        let job_id = job.id;
        let file = match self.dispatcher.dispatch(job).await {
            Ok(file) => file,
            Err(e) => {
                log::error!("yt-dlp error for {} (job {}, {}): {}", url, job_id, e.subcategory(), e);
                self.reply(message, DOWNLOAD_FAILED_MESSAGE).await;
                return Outcome::DownloadFailed;
            }
        };

        let file = match size_gate::enforce(file, self.max_file_size) {
            Ok(file) => file,
            Err(oversize) => {
                self.reply(message, &oversize.user_message()).await;
                return Outcome::Oversize {
                    size_bytes: oversize.size_bytes,
                };
            }
        };

        match relay(self.gateway.as_ref(), message, file).await {
            RelayResult::Sent => Outcome::Relayed,
            RelayResult::SendFailed => Outcome::SendFailed,
        }
    }

    /// Best-effort reply; a failure here is only logged.
    async fn reply(&self, message: &IncomingMessage, text: &str) {
        if let Err(e) = self.gateway.reply_text(message, text).await {
            log::warn!("Failed to reply in chat {}: {}", message.chat_id, e);
        }
    }
}
