//! Media resolution and relay pipeline

pub mod dispatcher;
pub mod error;
pub mod file;
pub mod matcher;
pub mod pipeline;
pub mod redirect;
pub mod relay;
pub mod session;
pub mod size_gate;
pub mod ytdlp;

// Re-exports for convenience
pub use dispatcher::DownloadDispatcher;
pub use error::DownloadError;
pub use file::LocalFile;
pub use matcher::{MatchedUrl, Platform, UrlMatcher};
pub use pipeline::{Outcome, RelayPipeline};
pub use redirect::{RedirectResolver, UrlResolver};
pub use relay::ChatGateway;
pub use session::HttpSession;
pub use ytdlp::{DownloadJob, Extractor, YtDlpExtractor};
