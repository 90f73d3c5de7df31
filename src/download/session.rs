//! Shared HTTP client used for short-link resolution.
//!
//! One `HttpSession` lives for the whole process. The underlying
//! `reqwest::Client` is built on first use and dropped by `shutdown()`;
//! a later `client()` call builds a fresh one.

use std::time::Duration;
use tokio::sync::Mutex;

use crate::core::config::BROWSER_USER_AGENT;
use crate::core::error::AppError;

#[derive(Default)]
struct SessionState {
    client: Option<reqwest::Client>,
    closed_once: bool,
}

pub struct HttpSession {
    state: Mutex<SessionState>,
    timeout: Duration,
}

impl HttpSession {
    /// Creates the manager without building a client yet.
    pub fn new(timeout: Duration) -> Self {
        Self {
            state: Mutex::new(SessionState::default()),
            timeout,
        }
    }

    /// Returns the shared client, building it if none exists or it was shut down.
    ///
    /// `reqwest::Client` is reference counted, so the returned handle shares
    /// its connection pool with every other caller.
    pub async fn client(&self) -> Result<reqwest::Client, AppError> {
        let mut state = self.state.lock().await;
        if let Some(client) = &state.client {
            return Ok(client.clone());
        }

        let client = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(self.timeout)
            .build()?;
        log::debug!("HTTP session created (timeout {}s)", self.timeout.as_secs());
        state.client = Some(client.clone());
        Ok(client)
    }

    pub async fn is_open(&self) -> bool {
        self.state.lock().await.client.is_some()
    }

    /// Closes the session if open. Meant to run once during teardown.
    pub async fn shutdown(&self) {
        let mut state = self.state.lock().await;
        match state.client.take() {
            Some(_client) => {
                state.closed_once = true;
                log::info!("HTTP session closed");
            }
            None if state.closed_once => {
                log::warn!("HTTP session shutdown requested again, already closed");
            }
            None => {
                log::debug!("HTTP session was never opened, nothing to close");
            }
        }
    }
}
