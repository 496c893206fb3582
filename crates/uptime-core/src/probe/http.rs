use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use super::{ProbeFailure, ProbeResult, Prober};

/// Probes a URL with a plain GET. Only a 200 response counts as up.
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: Client,
}

impl HttpProber {
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        Ok(Self {
            client: Self::build_client(timeout)?,
        })
    }

    pub fn from_config(config: &crate::config::MonitorConfig) -> reqwest::Result<Self> {
        Self::new(config.probe_timeout)
    }

    pub fn build_client(timeout: Duration) -> reqwest::Result<Client> {
        Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .user_agent(concat!("uptime-bot/", env!("CARGO_PKG_VERSION")))
            .gzip(true)
            .build()
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, url: &str) -> ProbeResult {
        let started = Instant::now();

        match self.client.get(url).send().await {
            Ok(response) if response.status() == StatusCode::OK => {
                debug!(url, elapsed_ms = started.elapsed().as_millis(), "Probe succeeded");
                ProbeResult::up(started.elapsed())
            }
            Ok(response) => {
                let status = response.status().as_u16();
                warn!(url, status, "Probe returned non-200 status");
                ProbeResult::down(ProbeFailure::Status(status), started.elapsed())
            }
            Err(e) => {
                let failure = classify(&e);
                let e = e.without_url();
                warn!(url, ?failure, error = %e, "Probe failed");
                ProbeResult::down(failure, started.elapsed())
            }
        }
    }
}

fn classify(e: &reqwest::Error) -> ProbeFailure {
    if e.is_timeout() {
        ProbeFailure::Timeout
    } else if e.is_connect() {
        ProbeFailure::Connection
    } else {
        ProbeFailure::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn probe_is_up_on_200() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
            .expect(1)
            .mount(&server)
            .await;

        let prober = HttpProber::new(Duration::from_secs(5)).unwrap();
        let result = prober.probe(&format!("{}/", server.uri())).await;
        assert!(result.is_up());
    }

    #[tokio::test]
    async fn probe_is_down_on_non_200_success_code() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let prober = HttpProber::new(Duration::from_secs(5)).unwrap();
        let result = prober.probe(&server.uri()).await;
        assert_eq!(result.outcome.failure(), Some(ProbeFailure::Status(204)));
    }

    #[tokio::test]
    async fn probe_reports_server_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let prober = HttpProber::new(Duration::from_secs(5)).unwrap();
        let result = prober.probe(&server.uri()).await;
        assert_eq!(result.outcome.failure(), Some(ProbeFailure::Status(503)));
    }

    #[tokio::test]
    async fn probe_times_out_on_slow_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let prober = HttpProber::new(Duration::from_millis(200)).unwrap();
        let result = prober.probe(&server.uri()).await;
        assert_eq!(result.outcome.failure(), Some(ProbeFailure::Timeout));
    }

    #[tokio::test]
    async fn probe_reports_connection_error_when_nothing_listens() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let uri = format!("http://{}/", listener.local_addr().unwrap());
        drop(listener);

        let prober = HttpProber::new(Duration::from_secs(2)).unwrap();
        let result = prober.probe(&uri).await;
        assert_eq!(result.outcome.failure(), Some(ProbeFailure::Connection));
    }

    #[tokio::test]
    async fn probe_does_not_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let prober = HttpProber::new(Duration::from_secs(5)).unwrap();
        let result = prober.probe(&server.uri()).await;
        assert!(!result.is_up());
    }
}
