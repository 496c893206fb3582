use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::MonitorConfig;
use crate::format;
use crate::monitor::event::{EventKind, EventRing, MonitorEvent};
use crate::monitor::state::{MonitorState, Transition};
use crate::probe::{ProbeResult, Prober};
use crate::transport::Notifier;

/// Read-only view of the monitor's state, handed to the command bot and the API.
#[derive(Clone)]
pub struct StatusHandle {
    state: Arc<RwLock<MonitorState>>,
    events: Arc<RwLock<EventRing>>,
}

impl StatusHandle {
    /// A copy of the state as of the last completed probe.
    pub async fn snapshot(&self) -> MonitorState {
        self.state.read().await.clone()
    }

    /// Recent events, newest first.
    pub async fn events(&self) -> Vec<MonitorEvent> {
        self.events.read().await.list()
    }
}

/// Periodically probes the target and alerts on state changes.
///
/// The monitor is the only writer of [`MonitorState`]. The lock is never held
/// across a network call.
pub struct Monitor {
    config: MonitorConfig,
    prober: Arc<dyn Prober>,
    notifier: Arc<dyn Notifier>,
    state: Arc<RwLock<MonitorState>>,
    events: Arc<RwLock<EventRing>>,
}

impl Monitor {
    pub fn new(
        config: MonitorConfig,
        prober: Arc<dyn Prober>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let events = EventRing::new(config.event_limit);
        Self {
            config,
            prober,
            notifier,
            state: Arc::new(RwLock::new(MonitorState::new())),
            events: Arc::new(RwLock::new(events)),
        }
    }

    pub fn status_handle(&self) -> StatusHandle {
        StatusHandle {
            state: Arc::clone(&self.state),
            events: Arc::clone(&self.events),
        }
    }

    /// Probes once and applies the result.
    pub async fn poll_once(&self) -> Transition {
        let result = self.prober.probe(&self.config.target_url).await;
        self.handle_result(result, Utc::now()).await
    }

    /// Records a probe result taken at `now` and sends whatever it calls for.
    pub async fn handle_result(&self, result: ProbeResult, now: DateTime<Utc>) -> Transition {
        let transition = self.state.write().await.record_probe(
            result.outcome,
            now,
            self.config.alert_interval,
        );
        let url = self.config.target_url.as_str();

        match transition {
            Transition::StillUp => {
                info!(url, elapsed_ms = result.elapsed.as_millis(), "Target is up");
            }
            Transition::Recovered { streak, down_since } => {
                info!(url, streak, "Target recovered");
                let text = format::recovery_message(url, streak, down_since, now);
                match self.notifier.notify(self.config.alert_chat, &text).await {
                    Ok(()) => {
                        self.record_event(EventKind::Recovered, streak, "Recovery notice sent", now)
                            .await;
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to deliver recovery notice");
                        self.record_event(EventKind::RecoveryFailed, streak, e.to_string(), now)
                            .await;
                    }
                }
            }
            Transition::Alert { streak, failure } => {
                error!(url, streak, %failure, "Target is down");
                if streak == 1 {
                    self.record_event(EventKind::WentDown, streak, failure.to_string(), now)
                        .await;
                }

                let text = format::alert_message(url, failure, streak, now);
                match self.notifier.notify(self.config.alert_chat, &text).await {
                    Ok(()) => {
                        self.state.write().await.mark_alert_sent(now);
                        info!(streak, "Alert delivered");
                        self.record_event(EventKind::AlertSent, streak, failure.to_string(), now)
                            .await;
                    }
                    Err(e) => {
                        warn!(streak, error = %e, "Failed to deliver alert");
                        self.record_event(EventKind::AlertFailed, streak, e.to_string(), now)
                            .await;
                    }
                }
            }
            Transition::Suppressed { streak, failure } => {
                error!(url, streak, %failure, "Target is still down");
                debug!(streak, "Alert suppressed by cooldown");
                self.record_event(EventKind::AlertSuppressed, streak, failure.to_string(), now)
                    .await;
            }
        }

        transition
    }

    /// Runs forever, probing every `check_interval`.
    ///
    /// A panic inside one iteration is logged and the loop carries on after
    /// the normal sleep.
    pub async fn run(&self) {
        info!(
            url = %self.config.target_url,
            check_interval_secs = self.config.check_interval.as_secs(),
            alert_interval_secs = self.config.alert_interval.as_secs(),
            "Starting availability monitor"
        );

        loop {
            if let Err(panic) = AssertUnwindSafe(self.poll_once()).catch_unwind().await {
                error!(reason = panic_message(&*panic), "Monitor iteration panicked");
            }
            tokio::time::sleep(self.config.check_interval).await;
        }
    }

    /// Moves the monitor onto its own task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }

    async fn record_event(
        &self,
        kind: EventKind,
        streak: u32,
        details: impl Into<String>,
        at: DateTime<Utc>,
    ) {
        self.events
            .write()
            .await
            .push(MonitorEvent::new(kind, streak, details).at(at));
    }
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
