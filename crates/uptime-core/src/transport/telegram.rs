use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{ChatId, IncomingMessage, Notifier, TransportError, Update, UpdateSource};

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Extra time allowed on top of the long-poll window before a fetch is abandoned.
const FETCH_GRACE: Duration = Duration::from_secs(5);

/// Telegram Bot API client used both for sending messages and polling updates.
#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    api_base: String,
    token: String,
    send_timeout: Duration,
}

impl fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramClient")
            .field("api_base", &self.api_base)
            .field("token", &"<redacted>")
            .field("send_timeout", &self.send_timeout)
            .finish()
    }
}

impl TelegramClient {
    pub fn new(token: impl Into<String>, send_timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self::with_client(client, token, send_timeout))
    }

    pub fn with_client(client: Client, token: impl Into<String>, send_timeout: Duration) -> Self {
        Self {
            client,
            api_base: DEFAULT_API_BASE.to_string(),
            token: token.into(),
            send_timeout,
        }
    }

    /// Points the client at a different Bot API server (self-hosted or a test double).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct RawUpdate {
    update_id: i64,
    #[serde(default)]
    message: Option<RawMessage>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    chat: RawChat,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawChat {
    id: i64,
}

impl From<RawUpdate> for Update {
    fn from(raw: RawUpdate) -> Self {
        let message = raw.message.and_then(|m| {
            m.text.map(|text| IncomingMessage {
                chat: ChatId(m.chat.id),
                text,
            })
        });
        Update {
            id: raw.update_id,
            message,
        }
    }
}

async fn read_envelope<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, TransportError> {
    let status = response.status();
    if !status.is_success() {
        return Err(TransportError::Status(status.as_u16()));
    }

    let body: ApiResponse<T> = response.json().await?;
    if !body.ok {
        return Err(TransportError::Rejected(
            body.description.unwrap_or_else(|| "no description".to_string()),
        ));
    }
    body.result
        .ok_or_else(|| TransportError::Decode("response has no result".to_string()))
}

#[async_trait]
impl Notifier for TelegramClient {
    async fn notify(&self, chat: ChatId, text: &str) -> Result<(), TransportError> {
        let payload = serde_json::json!({
            "chat_id": chat,
            "text": text,
            "disable_web_page_preview": true,
        });

        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .timeout(self.send_timeout)
            .json(&payload)
            .send()
            .await?;

        read_envelope::<serde_json::Value>(response).await?;
        debug!(%chat, "Message delivered");
        Ok(())
    }
}

#[async_trait]
impl UpdateSource for TelegramClient {
    async fn fetch_updates(
        &self,
        offset: Option<i64>,
        poll_timeout: Duration,
    ) -> Result<Vec<Update>, TransportError> {
        let mut query = vec![("timeout", poll_timeout.as_secs().to_string())];
        if let Some(offset) = offset {
            query.push(("offset", offset.to_string()));
        }

        let response = self
            .client
            .get(self.method_url("getUpdates"))
            .timeout(poll_timeout.saturating_add(FETCH_GRACE))
            .query(&query)
            .send()
            .await?;

        let raw: Vec<RawUpdate> = read_envelope(response).await.inspect_err(|e| {
            warn!(error = %e, "getUpdates failed");
        })?;
        Ok(raw.into_iter().map(Update::from).collect())
    }
}
