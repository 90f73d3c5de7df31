//! Short-link resolution for TikTok share links.
//!
//! `vm.tiktok.com` / `vt.tiktok.com` links only redirect to the real video
//! page. Everything else is passed through untouched. Resolution failures are
//! never fatal: the original URL is returned and yt-dlp gets a chance anyway.

use async_trait::async_trait;
use std::sync::Arc;

use crate::core::error::AppError;
use crate::core::utils::url_host;
use crate::download::matcher::{MatchedUrl, Platform};
use crate::download::session::HttpSession;

/// Hosts that serve TikTok share redirects
const TIKTOK_SHORT_HOSTS: &[&str] = &["vm.tiktok.com", "vt.tiktok.com"];

/// Turns a matched link into the URL handed to the downloader.
#[async_trait]
pub trait UrlResolver: Send + Sync {
    async fn resolve(&self, matched: &MatchedUrl) -> String;
}

/// True only for TikTok short-link hosts.
pub fn needs_resolution(matched: &MatchedUrl) -> bool {
    if matched.platform != Platform::TikTok {
        return false;
    }
    url_host(&matched.url)
        .map(|host| TIKTOK_SHORT_HOSTS.contains(&host.as_str()))
        .unwrap_or(false)
}

/// Issues one GET with redirects followed and returns where it ended up.
///
/// Server errors count as failures so a broken redirector does not hand an
/// error page URL to the downloader.
pub async fn follow_redirects(client: &reqwest::Client, url: &str) -> Result<String, AppError> {
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response.url().to_string())
}

/// Resolver backed by the shared HTTP session.
pub struct RedirectResolver {
    session: Arc<HttpSession>,
}

impl RedirectResolver {
    pub fn new(session: Arc<HttpSession>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl UrlResolver for RedirectResolver {
    async fn resolve(&self, matched: &MatchedUrl) -> String {
        if !needs_resolution(matched) {
            return matched.url.clone();
        }

        let client = match self.session.client().await {
            Ok(client) => client,
            Err(e) => {
                log::error!("Error resolving redirect (no HTTP session): {}", e);
                return matched.url.clone();
            }
        };

        match follow_redirects(&client, &matched.url).await {
            Ok(final_url) => {
                log::info!("Resolved redirect: {} -> {}", matched.url, final_url);
                final_url
            }
            Err(e) => {
                log::error!("Error resolving redirect for {}: {}", matched.url, e);
                matched.url.clone()
            }
        }
    }
}
