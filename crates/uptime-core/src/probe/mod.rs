mod http;

pub use http::HttpProber;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Why a probe did not count as a success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "code", rename_all = "snake_case")]
pub enum ProbeFailure {
    /// The target answered with something other than 200.
    Status(u16),
    Timeout,
    Connection,
    Unknown,
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(code) => match reqwest::StatusCode::from_u16(*code)
                .ok()
                .and_then(|s| s.canonical_reason())
            {
                Some(reason) => write!(f, "HTTP {} {}", code, reason),
                None => write!(f, "HTTP {}", code),
            },
            Self::Timeout => write!(f, "Timeout"),
            Self::Connection => write!(f, "Connection error"),
            Self::Unknown => write!(f, "Unknown error"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ProbeOutcome {
    Up { status: u16 },
    Down { failure: ProbeFailure },
}

impl ProbeOutcome {
    pub fn is_up(&self) -> bool {
        matches!(self, Self::Up { .. })
    }

    pub fn failure(&self) -> Option<ProbeFailure> {
        match self {
            Self::Up { .. } => None,
            Self::Down { failure } => Some(*failure),
        }
    }
}

/// Result of one check against the target. Never stored beyond the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeResult {
    pub outcome: ProbeOutcome,
    pub elapsed: Duration,
}

impl ProbeResult {
    pub fn up(elapsed: Duration) -> Self {
        Self {
            outcome: ProbeOutcome::Up { status: 200 },
            elapsed,
        }
    }

    pub fn down(failure: ProbeFailure, elapsed: Duration) -> Self {
        Self {
            outcome: ProbeOutcome::Down { failure },
            elapsed,
        }
    }

    pub fn is_up(&self) -> bool {
        self.outcome.is_up()
    }
}

/// Performs a single availability check.
///
/// Implementations make exactly one attempt and fold every transport error
/// into a [`ProbeFailure`]; nothing escapes as an `Err`.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, target: &str) -> ProbeResult;
}
