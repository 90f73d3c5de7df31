//! Common test utilities
//!
//! Mock collaborators for the relay pipeline: an extractor that writes sparse
//! files instead of running yt-dlp, a chat gateway that records calls, and a
//! resolver that counts lookups.

#![allow(dead_code)]

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use teloxide::types::{ChatId, MessageId};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use reel_relay::core::{AppError, RelayConfig};
use reel_relay::download::matcher::MatchedUrl;
use reel_relay::download::redirect::{needs_resolution, UrlResolver};
use reel_relay::download::relay::ChatGateway;
use reel_relay::download::{DownloadDispatcher, DownloadError, DownloadJob, Extractor, RelayPipeline, UrlMatcher};
use reel_relay::telegram::IncomingMessage;

pub const MIB: u64 = 1024 * 1024;
pub const RESOLVED_TIKTOK_URL: &str = "https://www.tiktok.com/@user/video/7234567890123456789";

/// What the mock extractor does for every job
#[derive(Debug, Clone, Copy)]
pub enum MockBehavior {
    /// Writes a sparse file of the given size and reports it
    File { size: u64 },
    /// Fails like yt-dlp does on an unsupported link
    Fail,
}

pub struct MockExtractor {
    behavior: MockBehavior,
    delay: Duration,
    calls: AtomicUsize,
    running: AtomicUsize,
    max_running: AtomicUsize,
    urls: Mutex<Vec<String>>,
}

impl MockExtractor {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            running: AtomicUsize::new(0),
            max_running: AtomicUsize::new(0),
            urls: Mutex::new(Vec::new()),
        }
    }

    /// Blocks the worker thread this long before producing a result.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_running(&self) -> usize {
        self.max_running.load(Ordering::SeqCst)
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

impl Extractor for MockExtractor {
    fn extract(&self, job: &DownloadJob, _timeout: Duration) -> Result<PathBuf, DownloadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().unwrap().push(job.source_url.clone());
        let now_running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_running.fetch_max(now_running, Ordering::SeqCst);

        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }

        let result = match self.behavior {
            MockBehavior::File { size } => {
                let path = job.download_dir.join(format!("{}mock.mp4", job.file_prefix()));
                std::fs::File::create(&path)
                    .and_then(|file| file.set_len(size))
                    .map(|_| path)
                    .map_err(|e| DownloadError::Process(e.to_string()))
            }
            MockBehavior::Fail => Err(DownloadError::YtDlp("ERROR: Unsupported URL".to_string())),
        };

        self.running.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// A recorded `send_video` call
#[derive(Debug, Clone)]
pub struct SentVideo {
    pub chat_id: ChatId,
    pub path: PathBuf,
    pub caption: String,
    pub disable_notification: bool,
    /// Whether the file was still on disk while it was being sent
    pub file_existed: bool,
}

#[derive(Default)]
pub struct MockGateway {
    pub fail_send: bool,
    sent: Mutex<Vec<SentVideo>>,
    replies: Mutex<Vec<String>>,
}

impl MockGateway {
    pub fn failing() -> Self {
        Self {
            fail_send: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<SentVideo> {
        self.sent.lock().unwrap().clone()
    }

    pub fn replies(&self) -> Vec<String> {
        self.replies.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatGateway for MockGateway {
    async fn send_video(
        &self,
        chat_id: ChatId,
        video: &Path,
        caption: &str,
        disable_notification: bool,
    ) -> Result<(), AppError> {
        self.sent.lock().unwrap().push(SentVideo {
            chat_id,
            path: video.to_path_buf(),
            caption: caption.to_string(),
            disable_notification,
            file_existed: video.exists(),
        });
        if self.fail_send {
            return Err(AppError::Config("Bad Request: not enough rights to send videos".to_string()));
        }
        Ok(())
    }

    async fn reply_text(&self, _message: &IncomingMessage, text: &str) -> Result<(), AppError> {
        self.replies.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Resolves TikTok short links to a fixed canonical URL without the network.
#[derive(Default)]
pub struct MockResolver {
    calls: AtomicUsize,
}

impl MockResolver {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UrlResolver for MockResolver {
    async fn resolve(&self, matched: &MatchedUrl) -> String {
        if !needs_resolution(matched) {
            return matched.url.clone();
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        RESOLVED_TIKTOK_URL.to_string()
    }
}

/// A pipeline wired to mocks, with a scratch download directory.
pub struct Harness {
    pub pipeline: RelayPipeline,
    pub extractor: Arc<MockExtractor>,
    pub gateway: Arc<MockGateway>,
    pub resolver: Arc<MockResolver>,
    pub dir: TempDir,
}

impl Harness {
    pub fn new(extractor: MockExtractor, gateway: MockGateway, max_file_size: u64) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path(), 4);
        let extractor = Arc::new(extractor);
        let gateway = Arc::new(gateway);
        let resolver = Arc::new(MockResolver::default());

        let dispatcher = DownloadDispatcher::new(
            Arc::clone(&extractor) as Arc<dyn Extractor>,
            &config,
            CancellationToken::new(),
        );
        let pipeline = RelayPipeline::new(
            UrlMatcher::default(),
            Arc::clone(&resolver) as Arc<dyn UrlResolver>,
            Arc::new(dispatcher),
            Arc::clone(&gateway) as Arc<dyn ChatGateway>,
            max_file_size,
        );

        Self {
            pipeline,
            extractor,
            gateway,
            resolver,
            dir,
        }
    }

    /// Files left in the download directory.
    pub fn leftover_files(&self) -> Vec<PathBuf> {
        leftover_files(self.dir.path())
    }
}

pub fn test_config(download_dir: &Path, worker_pool_size: usize) -> RelayConfig {
    RelayConfig {
        worker_pool_size,
        download_dir: download_dir.to_path_buf(),
        instagram_cookies_file: None,
        download_timeout: Duration::from_secs(10),
        ..RelayConfig::default()
    }
}

pub fn leftover_files(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect()
}

/// A top-level text message in a group chat.
pub fn group_message(text: &str) -> IncomingMessage {
    IncomingMessage {
        text: text.to_string(),
        chat_id: ChatId(-1001234567890),
        message_id: MessageId(42),
        sender_display_name: "Olena Petrenko".to_string(),
        is_group: true,
        is_reply: false,
    }
}
