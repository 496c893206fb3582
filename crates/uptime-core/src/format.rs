//! Operator-facing message text.
//!
//! Everything that ends up in a chat is built here so alerts and command
//! replies share wording. No internal error details leak into these strings,
//! only the failure category.

use chrono::{DateTime, Utc};

use crate::monitor::{LinkStatus, MonitorState};
use crate::probe::{ProbeFailure, ProbeOutcome, ProbeResult};

const FULL_TIME: &str = "%Y-%m-%d %H:%M:%S UTC";
const SHORT_TIME: &str = "%H:%M:%S UTC";

pub fn alert_message(url: &str, failure: ProbeFailure, streak: u32, at: DateTime<Utc>) -> String {
    format!(
        "🚨 Site is down\nURL: {}\nError: {}\nFailed checks in a row: {}\nTime: {}",
        url,
        failure,
        streak,
        at.format(FULL_TIME)
    )
}

pub fn recovery_message(
    url: &str,
    streak: u32,
    down_since: Option<DateTime<Utc>>,
    at: DateTime<Utc>,
) -> String {
    let mut text = format!(
        "✅ Site is back up\nURL: {}\nRecovered after {} failed check{}",
        url,
        streak,
        if streak == 1 { "" } else { "s" }
    );
    if let Some(since) = down_since {
        text.push_str(&format!("\nDowntime: {}", format_duration(at - since)));
    }
    text.push_str(&format!("\nTime: {}", at.format(FULL_TIME)));
    text
}

pub fn ping_reply(url: &str, result: &ProbeResult, at: DateTime<Utc>) -> String {
    match result.outcome {
        ProbeOutcome::Up { status } => format!(
            "✅ Site is up\nURL: {}\nStatus: {} OK\nResponse time: {} ms\nTime: {}",
            url,
            status,
            result.elapsed.as_millis(),
            at.format(SHORT_TIME)
        ),
        ProbeOutcome::Down { failure } => format!(
            "❌ Site is unreachable\nURL: {}\nError: {}\nTime: {}",
            url,
            failure,
            at.format(SHORT_TIME)
        ),
    }
}

pub fn status_reply(url: &str, state: &MonitorState) -> String {
    let headline = match state.last_status {
        LinkStatus::Unknown => return format!("Status: not checked yet\nURL: {}", url),
        LinkStatus::Up => "🟢 up",
        LinkStatus::Down => "🔴 down",
    };

    let mut text = format!(
        "Status: {}\nURL: {}\nFailed checks in a row: {}",
        headline, url, state.consecutive_failures
    );
    if let Some(ProbeOutcome::Down { failure }) = state.last_outcome {
        text.push_str(&format!("\nLast error: {}", failure));
    }
    if let Some(checked) = state.last_checked {
        text.push_str(&format!("\nLast check: {}", checked.format(FULL_TIME)));
    }
    text
}

pub fn help_reply(url: &str) -> String {
    format!(
        "Website monitor\nURL: {}\n\nCommands:\n/ping - check the site now\n/status - last known status\n/help - this message",
        url
    )
}

/// Renders a duration as `2h 5m`, `5m 3s` or `42s`.
pub fn format_duration(d: chrono::Duration) -> String {
    let secs = d.num_seconds().max(0);
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{}h {}m", h, m)
    } else if m > 0 {
        format!("{}m {}s", m, s)
    } else {
        format!("{}s", s)
    }
}
