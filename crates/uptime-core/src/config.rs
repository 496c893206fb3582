use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::transport::ChatId;

/// Configuration for the availability monitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// URL probed on every check.
    pub target_url: String,
    /// Chat that receives down/recovery alerts.
    pub alert_chat: ChatId,
    /// Pause between two probes (default: 1 hour).
    pub check_interval: Duration,
    /// Minimum time between two alerts once escalation no longer forces one (default: 1 hour).
    pub alert_interval: Duration,
    /// HTTP timeout for a single probe.
    pub probe_timeout: Duration,
    /// Maximum number of events to retain (ring buffer capacity).
    pub event_limit: usize,
}

impl MonitorConfig {
    pub fn new(target_url: impl Into<String>, alert_chat: ChatId) -> Self {
        Self {
            target_url: target_url.into(),
            alert_chat,
            check_interval: Duration::from_secs(3600),
            alert_interval: Duration::from_secs(3600),
            probe_timeout: Duration::from_secs(20),
            event_limit: 100,
        }
    }

    pub fn with_check_interval(mut self, interval: Duration) -> Self {
        self.check_interval = interval;
        self
    }

    pub fn with_alert_interval(mut self, interval: Duration) -> Self {
        self.alert_interval = interval;
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn with_event_limit(mut self, limit: usize) -> Self {
        self.event_limit = limit.max(1);
        self
    }
}

/// Configuration for the command bot's long-poll loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// How long the transport may hold a fetch open waiting for messages.
    pub poll_timeout: Duration,
    /// Pause after a failed fetch before trying again.
    pub error_backoff: Duration,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            poll_timeout: Duration::from_secs(30),
            error_backoff: Duration::from_secs(5),
        }
    }
}

impl BotConfig {
    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    pub fn with_error_backoff(mut self, backoff: Duration) -> Self {
        self.error_backoff = backoff;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monitor_defaults_match_hourly_schedule() {
        let c = MonitorConfig::new("https://example.com/", ChatId(1));
        assert_eq!(c.check_interval, Duration::from_secs(3600));
        assert_eq!(c.alert_interval, Duration::from_secs(3600));
        assert_eq!(c.probe_timeout, Duration::from_secs(20));
    }

    #[test]
    fn event_limit_is_at_least_one() {
        let c = MonitorConfig::new("https://example.com/", ChatId(1)).with_event_limit(0);
        assert_eq!(c.event_limit, 1);
    }
}
