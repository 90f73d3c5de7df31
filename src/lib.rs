//! reel-relay - Telegram group bot that relays short-form videos
//!
//! Watches group chats for TikTok, Instagram Reel and YouTube Shorts links,
//! downloads the video with yt-dlp on a bounded worker pool and sends it back
//! into the chat, deleting the local file on every outcome.
//!
//! # Module Structure
//!
//! - `core`: configuration, errors, logging, small helpers
//! - `download`: matcher, redirect resolver, worker pool, size gate, relay, pipeline
//! - `telegram`: bot creation, dispatcher schema, Bot API gateway

pub mod cli;
pub mod core;
pub mod download;
pub mod telegram;

// Re-export commonly used types for convenience
pub use core::{AppError, AppResult, RelayConfig};
pub use download::{DownloadDispatcher, HttpSession, Outcome, RelayPipeline};
pub use telegram::{create_bot, schema, HandlerDeps, IncomingMessage};
