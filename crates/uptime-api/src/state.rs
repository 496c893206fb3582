use std::sync::Arc;

use uptime_core::{Prober, StatusHandle};

#[derive(Clone)]
pub struct AppState {
    pub status: StatusHandle,
    pub prober: Arc<dyn Prober>,
    pub target_url: String,
}

impl AppState {
    pub fn new(status: StatusHandle, prober: Arc<dyn Prober>, target_url: impl Into<String>) -> Self {
        Self {
            status,
            prober,
            target_url: target_url.into(),
        }
    }
}
