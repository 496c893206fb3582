use std::fmt;

/// Operator command understood by the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Probe the target right now.
    Ping,
    /// Report what the monitor last saw.
    Status,
    /// Usage text. Also answers `/start`.
    Help,
}

impl Command {
    /// Matches trimmed, lowercased message text. Anything unrecognised is `None`.
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "/ping" => Some(Self::Ping),
            "/status" => Some(Self::Status),
            "/help" | "/start" => Some(Self::Help),
            _ => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ping => write!(f, "/ping"),
            Self::Status => write!(f, "/status"),
            Self::Help => write!(f, "/help"),
        }
    }
}
