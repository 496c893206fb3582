use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::Utc;
use futures::FutureExt;
use tracing::{debug, error, info, warn};

use crate::bot::command::Command;
use crate::config::BotConfig;
use crate::format;
use crate::monitor::engine::panic_message;
use crate::monitor::StatusHandle;
use crate::probe::Prober;
use crate::transport::{ChatId, Notifier, TransportError, Update, UpdateSource};

/// Long-polls the transport for operator commands and answers them.
///
/// `offset` is the lowest update id not yet processed. It only moves forward,
/// so an update is handled at most once for the lifetime of the bot.
pub struct CommandBot {
    config: BotConfig,
    target_url: String,
    source: Arc<dyn UpdateSource>,
    notifier: Arc<dyn Notifier>,
    prober: Arc<dyn Prober>,
    status: StatusHandle,
    offset: Option<i64>,
}

impl CommandBot {
    pub fn new(
        config: BotConfig,
        target_url: impl Into<String>,
        source: Arc<dyn UpdateSource>,
        notifier: Arc<dyn Notifier>,
        prober: Arc<dyn Prober>,
        status: StatusHandle,
    ) -> Self {
        Self {
            config,
            target_url: target_url.into(),
            source,
            notifier,
            prober,
            status,
            offset: None,
        }
    }

    pub fn offset(&self) -> Option<i64> {
        self.offset
    }

    /// Fetches one batch and handles it. Returns how many commands were answered.
    pub async fn poll_once(&mut self) -> Result<usize, TransportError> {
        let updates = self
            .source
            .fetch_updates(self.offset, self.config.poll_timeout)
            .await?;
        Ok(self.process(updates).await)
    }

    /// Runs forever. Fetch failures and panics back off and retry.
    pub async fn run(mut self) {
        info!(
            poll_timeout_secs = self.config.poll_timeout.as_secs(),
            "Starting command bot"
        );

        loop {
            match AssertUnwindSafe(self.poll_once()).catch_unwind().await {
                Ok(Ok(handled)) => {
                    if handled > 0 {
                        debug!(handled, offset = ?self.offset, "Processed command batch");
                    }
                }
                Ok(Err(e)) => {
                    warn!(
                        error = %e,
                        backoff_secs = self.config.error_backoff.as_secs(),
                        "Failed to fetch updates"
                    );
                    tokio::time::sleep(self.config.error_backoff).await;
                }
                Err(panic) => {
                    error!(reason = panic_message(&*panic), "Command bot iteration panicked");
                    tokio::time::sleep(self.config.error_backoff).await;
                }
            }
        }
    }

    async fn process(&mut self, updates: Vec<Update>) -> usize {
        let mut handled = 0;

        for update in updates {
            if self.offset.is_some_and(|offset| update.id < offset) {
                debug!(update_id = update.id, "Skipping already processed update");
                continue;
            }
            self.offset = Some(update.id + 1);

            let Some(message) = update.message else {
                continue;
            };
            let Some(command) = Command::parse(&message.text) else {
                debug!(chat = %message.chat, "Ignoring non-command message");
                continue;
            };

            self.dispatch(command, message.chat).await;
            handled += 1;
        }

        handled
    }

    async fn dispatch(&self, command: Command, chat: ChatId) {
        debug!(%command, %chat, "Handling command");
        let reply = self.reply_for(command).await;
        if let Err(e) = self.notifier.notify(chat, &reply).await {
            warn!(%command, %chat, error = %e, "Failed to send reply");
        }
    }

    /// Builds the reply text for `command`.
    pub async fn reply_for(&self, command: Command) -> String {
        match command {
            Command::Ping => {
                let result = self.prober.probe(&self.target_url).await;
                format::ping_reply(&self.target_url, &result, Utc::now())
            }
            Command::Status => {
                let state = self.status.snapshot().await;
                format::status_reply(&self.target_url, &state)
            }
            Command::Help => format::help_reply(&self.target_url),
        }
    }
}
