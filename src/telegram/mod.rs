//! Telegram bot integration and handlers

pub mod bot;
pub mod gateway;
pub mod handlers;
pub mod message;

// Re-exports for convenience
pub use bot::create_bot;
pub use gateway::TelegramGateway;
pub use handlers::{schema, HandlerDeps};
pub use message::{incoming_from_message, IncomingMessage};
