//! Chat message transport.
//!
//! The monitor and the command bot talk to operators through the same two
//! seams: [`Notifier`] for outbound text and [`UpdateSource`] for inbound
//! commands. [`TelegramClient`] implements both against the Bot API.

mod telegram;

pub use telegram::{TelegramClient, DEFAULT_API_BASE};

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("connection error: {0}")]
    Connection(String),
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("failed to decode response: {0}")]
    Decode(String),
    #[error("API rejected request: {0}")]
    Rejected(String),
    #[error("transport error: {0}")]
    Unknown(String),
}

impl TransportError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status(code) => Some(*code),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return Self::Timeout;
        }
        let connect = e.is_connect();
        let decode = e.is_decode();
        // The request URL carries the bot token.
        let message = e.without_url().to_string();
        if connect {
            Self::Connection(message)
        } else if decode {
            Self::Decode(message)
        } else {
            Self::Unknown(message)
        }
    }
}

/// Identifier of a chat messages are delivered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ChatId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(ChatId)
    }
}

/// One inbound update. `message` is `None` for updates that carry no text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    pub id: i64,
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub chat: ChatId,
    pub text: String,
}

/// Sends text to a chat. One attempt, bounded by a timeout, no retry.
///
/// `Ok(())` means the transport confirmed delivery.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, chat: ChatId, text: &str) -> Result<(), TransportError>;
}

/// Long-polls for inbound updates with id >= `offset`.
#[async_trait]
pub trait UpdateSource: Send + Sync {
    async fn fetch_updates(
        &self,
        offset: Option<i64>,
        poll_timeout: Duration,
    ) -> Result<Vec<Update>, TransportError>;
}
