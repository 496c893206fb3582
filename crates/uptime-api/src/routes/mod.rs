pub mod status;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/status", get(status::get_status))
        .route("/events", get(status::get_events))
        .route("/ping", post(status::ping))
}
