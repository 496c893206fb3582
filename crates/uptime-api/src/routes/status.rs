use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use uptime_core::{MonitorEvent, MonitorState, ProbeOutcome};

use crate::state::AppState;

#[derive(Serialize)]
pub struct StatusResponse {
    pub url: String,
    #[serde(flatten)]
    pub state: MonitorState,
}

#[derive(Serialize)]
pub struct EventsResponse {
    pub url: String,
    pub events: Vec<MonitorEvent>,
}

#[derive(Serialize)]
pub struct PingResponse {
    pub url: String,
    pub up: bool,
    pub outcome: ProbeOutcome,
    pub elapsed_ms: u64,
    pub checked_at: DateTime<Utc>,
}

pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        url: state.target_url.clone(),
        state: state.status.snapshot().await,
    })
}

pub async fn get_events(State(state): State<AppState>) -> Json<EventsResponse> {
    Json(EventsResponse {
        url: state.target_url.clone(),
        events: state.status.events().await,
    })
}

/// Runs a fresh probe. Does not touch the monitor's state.
pub async fn ping(State(state): State<AppState>) -> Json<PingResponse> {
    let result = state.prober.probe(&state.target_url).await;
    Json(PingResponse {
        url: state.target_url.clone(),
        up: result.is_up(),
        outcome: result.outcome,
        elapsed_ms: u64::try_from(result.elapsed.as_millis()).unwrap_or(u64::MAX),
        checked_at: Utc::now(),
    })
}
