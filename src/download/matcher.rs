//! Platform URL detection in free-form message text.
//!
//! Patterns are kept in an ordered list rather than a map: when a message
//! carries links to several platforms, the first pattern in the list wins,
//! regardless of where its link appears in the text.

use once_cell::sync::Lazy;
use regex::Regex;
use strum::Display;

/// Supported short-form video platforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Platform {
    #[strum(to_string = "TikTok")]
    TikTok,
    #[strum(to_string = "Instagram")]
    Instagram,
    #[strum(to_string = "YouTube Shorts")]
    YouTubeShorts,
}

/// A compiled pattern tagged with the platform it identifies.
#[derive(Debug, Clone)]
pub struct PlatformPattern {
    pub platform: Platform,
    pub regex: Regex,
}

/// A platform link found in a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedUrl {
    pub platform: Platform,
    pub url: String,
}

/// Base pattern set, compiled once at startup.
static PLATFORM_PATTERNS: Lazy<Vec<PlatformPattern>> = Lazy::new(|| {
    [
        (Platform::TikTok, r"https?://(www\.|vm\.|vt\.)?tiktok\.com/[^\s)]+"),
        (Platform::Instagram, r"https?://(?:www\.)?instagram\.com/reel/[^\s)]+"),
        (Platform::YouTubeShorts, r"https?://(?:www\.)?youtube\.com/shorts/[^\s)]+"),
    ]
    .into_iter()
    .map(|(platform, pattern)| PlatformPattern {
        platform,
        regex: Regex::new(pattern).expect("Failed to compile platform regex"),
    })
    .collect()
});

/// Scans message text for supported platform links.
#[derive(Debug, Clone)]
pub struct UrlMatcher {
    patterns: Vec<PlatformPattern>,
}

impl Default for UrlMatcher {
    fn default() -> Self {
        Self::new(PLATFORM_PATTERNS.clone())
    }
}

impl UrlMatcher {
    /// Creates a matcher that evaluates `patterns` in the given order.
    pub fn new(patterns: Vec<PlatformPattern>) -> Self {
        Self { patterns }
    }

    pub fn patterns(&self) -> &[PlatformPattern] {
        &self.patterns
    }

    /// Returns the first occurrence of the first pattern that matches, if any.
    pub fn find(&self, text: &str) -> Option<MatchedUrl> {
        self.patterns.iter().find_map(|pattern| {
            pattern.regex.find(text).map(|m| MatchedUrl {
                platform: pattern.platform,
                url: m.as_str().to_string(),
            })
        })
    }
}
