use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::probe::{ProbeFailure, ProbeOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkStatus {
    /// No probe has completed yet.
    Unknown,
    Up,
    Down,
}

impl std::fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
        }
    }
}

/// What the monitor has to do after recording one probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Up after up (or after the first probe). Nothing to report.
    StillUp,
    /// Target came back after `streak` failed probes.
    Recovered {
        streak: u32,
        down_since: Option<DateTime<Utc>>,
    },
    /// Failure that should be reported to the operator.
    Alert { streak: u32, failure: ProbeFailure },
    /// Failure inside the cooldown window.
    Suppressed { streak: u32, failure: ProbeFailure },
}

/// Shared availability record. Written only by the monitor loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorState {
    pub last_status: LinkStatus,
    pub consecutive_failures: u32,
    pub last_alert_time: Option<DateTime<Utc>>,
    pub last_checked: Option<DateTime<Utc>>,
    pub last_outcome: Option<ProbeOutcome>,
    pub down_since: Option<DateTime<Utc>>,
}

impl Default for MonitorState {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitorState {
    pub fn new() -> Self {
        Self {
            last_status: LinkStatus::Unknown,
            consecutive_failures: 0,
            last_alert_time: None,
            last_checked: None,
            last_outcome: None,
            down_since: None,
        }
    }

    /// Applies one completed probe and decides whether anything must be sent.
    pub fn record_probe(
        &mut self,
        outcome: ProbeOutcome,
        now: DateTime<Utc>,
        alert_interval: Duration,
    ) -> Transition {
        self.last_checked = Some(now);
        self.last_outcome = Some(outcome);

        match outcome {
            ProbeOutcome::Up { .. } => {
                let transition = if self.consecutive_failures > 0 {
                    Transition::Recovered {
                        streak: self.consecutive_failures,
                        down_since: self.down_since,
                    }
                } else {
                    Transition::StillUp
                };
                self.consecutive_failures = 0;
                self.last_alert_time = None;
                self.down_since = None;
                self.last_status = LinkStatus::Up;
                transition
            }
            ProbeOutcome::Down { failure } => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                if self.consecutive_failures == 1 {
                    self.down_since = Some(now);
                }
                self.last_status = LinkStatus::Down;

                let streak = self.consecutive_failures;
                if alert_eligible(streak, self.last_alert_time, now, alert_interval) {
                    Transition::Alert { streak, failure }
                } else {
                    Transition::Suppressed { streak, failure }
                }
            }
        }
    }

    /// Must only be called once the alert transport confirmed delivery.
    pub fn mark_alert_sent(&mut self, at: DateTime<Utc>) {
        self.last_alert_time = Some(at);
    }
}

/// Alert policy for the `streak`-th failure in a row.
///
/// First failure always alerts, then anything past the cooldown, then the
/// second failure even inside the cooldown.
///
/// With no delivered alert in the current outage (every send so far failed)
/// any streak stays eligible, so an undelivered alert is retried on the next
/// failed probe instead of waiting for a cooldown that never started. See
/// "Undelivered alerts" under the open question decisions in DESIGN.md.
pub fn alert_eligible(
    streak: u32,
    last_alert_time: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    alert_interval: Duration,
) -> bool {
    if streak == 1 {
        return true;
    }
    match last_alert_time {
        Some(last) => {
            let cooled_down = (now - last)
                .to_std()
                .map(|elapsed| elapsed >= alert_interval)
                .unwrap_or(false);
            cooled_down || streak == 2
        }
        None => streak >= 2,
    }
}
