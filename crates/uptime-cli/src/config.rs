//! TOML configuration file schema, environment overrides and validation.
//!
//! Every value can come from the file, the environment or a flag; flags and
//! environment win over the file. Example config file:
//!
//! ```toml
//! [server]
//! listen = "127.0.0.1:8080"
//! log_format = "json"
//!
//! [monitor]
//! url = "https://example.com/"
//! chat_id = 207417689
//! check_interval_secs = 3600
//! alert_interval_secs = 3600
//! probe_timeout_secs = 20
//!
//! [telegram]
//! send_timeout_secs = 10
//! poll_timeout_secs = 30
//! ```
//!
//! The bot token is normally supplied through `BOT_TOKEN` rather than the file.

use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use uptime_core::transport::ChatId;
use uptime_core::{BotConfig, MonitorConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("bot token is missing; set BOT_TOKEN")]
    MissingToken,
    #[error("target URL is missing; set TARGET_URL or monitor.url")]
    MissingUrl,
    #[error("destination chat is missing; set CHAT_ID or monitor.chat_id")]
    MissingChatId,
    #[error("invalid target URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),
    #[error("invalid log_format '{0}': must be 'pretty' or 'json'")]
    InvalidLogFormat(String),
    #[error("poll_timeout_secs is {0}; Telegram allows at most 50")]
    PollTimeoutTooLong(u64),
}

/// Upper bound Telegram puts on a getUpdates long poll.
pub const MAX_POLL_TIMEOUT_SECS: u64 = 50;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub monitor: MonitorSection,

    #[serde(default)]
    pub telegram: TelegramSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Status API address. The API is not started when absent.
    #[serde(default)]
    pub listen: Option<SocketAddr>,

    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: None,
            log_format: default_log_format(),
        }
    }
}

fn default_log_format() -> String {
    "pretty".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitorSection {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub chat_id: Option<i64>,

    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,

    #[serde(default = "default_alert_interval_secs")]
    pub alert_interval_secs: u64,

    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,

    #[serde(default = "default_event_limit")]
    pub event_limit: usize,
}

impl Default for MonitorSection {
    fn default() -> Self {
        Self {
            url: None,
            chat_id: None,
            check_interval_secs: default_check_interval_secs(),
            alert_interval_secs: default_alert_interval_secs(),
            probe_timeout_secs: default_probe_timeout_secs(),
            event_limit: default_event_limit(),
        }
    }
}

fn default_check_interval_secs() -> u64 {
    3600
}

fn default_alert_interval_secs() -> u64 {
    3600
}

fn default_probe_timeout_secs() -> u64 {
    20
}

fn default_event_limit() -> usize {
    100
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramSection {
    #[serde(default)]
    pub token: Option<String>,

    #[serde(default = "default_api_base")]
    pub api_base: String,

    #[serde(default = "default_send_timeout_secs")]
    pub send_timeout_secs: u64,

    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,

    #[serde(default = "default_error_backoff_secs")]
    pub error_backoff_secs: u64,
}

impl Default for TelegramSection {
    fn default() -> Self {
        Self {
            token: None,
            api_base: default_api_base(),
            send_timeout_secs: default_send_timeout_secs(),
            poll_timeout_secs: default_poll_timeout_secs(),
            error_backoff_secs: default_error_backoff_secs(),
        }
    }
}

fn default_api_base() -> String {
    uptime_core::transport::DEFAULT_API_BASE.to_string()
}

fn default_send_timeout_secs() -> u64 {
    10
}

fn default_poll_timeout_secs() -> u64 {
    30
}

fn default_error_backoff_secs() -> u64 {
    5
}

/// Values taken from flags or the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub url: Option<String>,
    pub chat_id: Option<i64>,
    pub token: Option<String>,
    pub check_interval_secs: Option<u64>,
    pub alert_interval_secs: Option<u64>,
    pub probe_timeout_secs: Option<u64>,
    pub listen: Option<SocketAddr>,
    pub log_format: Option<String>,
}

/// Fully validated settings, ready to build the runtime from.
#[derive(Clone)]
pub struct Settings {
    pub monitor: MonitorConfig,
    pub bot: BotConfig,
    pub token: String,
    pub api_base: String,
    pub send_timeout: Duration,
    pub listen: Option<SocketAddr>,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("monitor", &self.monitor)
            .field("bot", &self.bot)
            .field("token", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("send_timeout", &self.send_timeout)
            .field("listen", &self.listen)
            .finish()
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(url) = overrides.url {
            self.monitor.url = Some(url);
        }
        if let Some(chat_id) = overrides.chat_id {
            self.monitor.chat_id = Some(chat_id);
        }
        if let Some(token) = overrides.token {
            self.telegram.token = Some(token);
        }
        if let Some(v) = overrides.check_interval_secs {
            self.monitor.check_interval_secs = v;
        }
        if let Some(v) = overrides.alert_interval_secs {
            self.monitor.alert_interval_secs = v;
        }
        if let Some(v) = overrides.probe_timeout_secs {
            self.monitor.probe_timeout_secs = v;
        }
        if let Some(listen) = overrides.listen {
            self.server.listen = Some(listen);
        }
        if let Some(log_format) = overrides.log_format {
            self.server.log_format = log_format;
        }
    }

    /// Validates and turns the merged configuration into runtime settings.
    ///
    /// A missing token is checked first: without it neither loop may start.
    pub fn resolve(&self) -> Result<Settings, ConfigError> {
        let token = self
            .telegram
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingToken)?
            .to_string();

        let url = self.monitor.url.clone().ok_or(ConfigError::MissingUrl)?;
        validate_url(&url)?;

        let chat_id = self.monitor.chat_id.ok_or(ConfigError::MissingChatId)?;

        validate_log_format(&self.server.log_format)?;

        let secs = |name: &'static str, v: u64| {
            if v == 0 {
                Err(ConfigError::ZeroInterval(name))
            } else {
                Ok(Duration::from_secs(v))
            }
        };

        let monitor = MonitorConfig::new(url, ChatId(chat_id))
            .with_check_interval(secs("check_interval_secs", self.monitor.check_interval_secs)?)
            .with_alert_interval(secs("alert_interval_secs", self.monitor.alert_interval_secs)?)
            .with_probe_timeout(secs("probe_timeout_secs", self.monitor.probe_timeout_secs)?)
            .with_event_limit(self.monitor.event_limit);

        if self.telegram.poll_timeout_secs > MAX_POLL_TIMEOUT_SECS {
            return Err(ConfigError::PollTimeoutTooLong(
                self.telegram.poll_timeout_secs,
            ));
        }
        let bot = BotConfig::default()
            .with_poll_timeout(secs("poll_timeout_secs", self.telegram.poll_timeout_secs)?)
            .with_error_backoff(secs("error_backoff_secs", self.telegram.error_backoff_secs)?);

        Ok(Settings {
            monitor,
            bot,
            token,
            api_base: self.telegram.api_base.clone(),
            send_timeout: secs("send_timeout_secs", self.telegram.send_timeout_secs)?,
            listen: self.server.listen,
        })
    }
}

fn validate_url(url: &str) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(url).map_err(|e| ConfigError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ConfigError::InvalidUrl {
            url: url.to_string(),
            reason: "scheme must be http or https".to_string(),
        });
    }
    Ok(())
}

pub fn validate_log_format(log_format: &str) -> Result<(), ConfigError> {
    match log_format {
        "pretty" | "json" => Ok(()),
        other => Err(ConfigError::InvalidLogFormat(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_overrides() -> Overrides {
        Overrides {
            url: Some("https://example.com/".into()),
            chat_id: Some(207417689),
            token: Some("123:abc".into()),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_follow_hourly_schedule() {
        let mut config = AppConfig::default();
        config.apply(base_overrides());
        let settings = config.resolve().unwrap();

        assert_eq!(settings.monitor.check_interval, Duration::from_secs(3600));
        assert_eq!(settings.monitor.alert_interval, Duration::from_secs(3600));
        assert_eq!(settings.monitor.probe_timeout, Duration::from_secs(20));
        assert_eq!(settings.bot.poll_timeout, Duration::from_secs(30));
        assert_eq!(settings.bot.error_backoff, Duration::from_secs(5));
        assert_eq!(settings.send_timeout, Duration::from_secs(10));
        assert_eq!(settings.api_base, "https://api.telegram.org");
        assert_eq!(settings.monitor.alert_chat, ChatId(207417689));
        assert!(settings.listen.is_none());
        assert_eq!(config.server.log_format, "pretty");
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[server]
listen = "127.0.0.1:9090"
log_format = "json"

[monitor]
url = "https://status.example.org/health"
chat_id = -100123
check_interval_secs = 60
alert_interval_secs = 900
probe_timeout_secs = 5
event_limit = 10

[telegram]
token = "from-file"
api_base = "http://localhost:8081"
poll_timeout_secs = 25
"#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        let settings = config.resolve().unwrap();

        assert_eq!(settings.listen.unwrap().port(), 9090);
        assert_eq!(config.server.log_format, "json");
        assert_eq!(settings.monitor.target_url, "https://status.example.org/health");
        assert_eq!(settings.monitor.alert_chat, ChatId(-100123));
        assert_eq!(settings.monitor.check_interval, Duration::from_secs(60));
        assert_eq!(settings.monitor.alert_interval, Duration::from_secs(900));
        assert_eq!(settings.monitor.event_limit, 10);
        assert_eq!(settings.token, "from-file");
        assert_eq!(settings.api_base, "http://localhost:8081");
        assert_eq!(settings.bot.poll_timeout, Duration::from_secs(25));
    }

    #[test]
    fn overrides_win_over_file() {
        let toml = r#"
[monitor]
url = "https://file.example/"
chat_id = 1
check_interval_secs = 60
"#;
        let mut config: AppConfig = toml::from_str(toml).unwrap();
        config.apply(Overrides {
            url: Some("https://env.example/".into()),
            token: Some("t".into()),
            check_interval_secs: Some(30),
            ..Default::default()
        });
        let settings = config.resolve().unwrap();
        assert_eq!(settings.monitor.target_url, "https://env.example/");
        assert_eq!(settings.monitor.check_interval, Duration::from_secs(30));
        assert_eq!(settings.monitor.alert_chat, ChatId(1));
    }

    #[test]
    fn missing_token_is_reported_first() {
        let config = AppConfig::default();
        assert!(matches!(config.resolve(), Err(ConfigError::MissingToken)));

        let mut config = AppConfig::default();
        config.apply(Overrides {
            token: Some("   ".into()),
            ..base_overrides()
        });
        assert!(matches!(config.resolve(), Err(ConfigError::MissingToken)));
    }

    #[test]
    fn missing_url_and_chat_are_rejected() {
        let mut config = AppConfig::default();
        config.apply(Overrides {
            url: None,
            ..base_overrides()
        });
        assert!(matches!(config.resolve(), Err(ConfigError::MissingUrl)));

        let mut config = AppConfig::default();
        config.apply(Overrides {
            chat_id: None,
            ..base_overrides()
        });
        assert!(matches!(config.resolve(), Err(ConfigError::MissingChatId)));
    }

    #[test]
    fn rejects_non_http_url() {
        let mut config = AppConfig::default();
        config.apply(Overrides {
            url: Some("ftp://example.com/".into()),
            ..base_overrides()
        });
        let err = config.resolve().unwrap_err();
        assert!(err.to_string().contains("http or https"), "{}", err);

        config.apply(Overrides {
            url: Some("not-a-url".into()),
            ..Default::default()
        });
        assert!(matches!(config.resolve(), Err(ConfigError::InvalidUrl { .. })));
    }

    #[test]
    fn rejects_zero_interval() {
        let mut config = AppConfig::default();
        config.apply(Overrides {
            check_interval_secs: Some(0),
            ..base_overrides()
        });
        let err = config.resolve().unwrap_err();
        assert!(matches!(err, ConfigError::ZeroInterval("check_interval_secs")));
    }

    #[test]
    fn rejects_invalid_log_format() {
        let mut config = AppConfig::default();
        config.apply(Overrides {
            log_format: Some("xml".into()),
            ..base_overrides()
        });
        let err = config.resolve().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLogFormat(ref f) if f == "xml"));
    }

    #[test]
    fn rejects_poll_timeout_above_telegram_cap() {
        let mut config = AppConfig::default();
        config.apply(base_overrides());
        config.telegram.poll_timeout_secs = u64::MAX;
        let err = config.resolve().unwrap_err();
        assert!(matches!(err, ConfigError::PollTimeoutTooLong(u64::MAX)));

        config.telegram.poll_timeout_secs = MAX_POLL_TIMEOUT_SECS;
        let settings = config.resolve().unwrap();
        assert_eq!(settings.bot.poll_timeout, Duration::from_secs(50));
    }

    #[test]
    fn settings_debug_hides_token() {
        let mut config = AppConfig::default();
        config.apply(Overrides {
            token: Some("123456:secret-token".into()),
            ..base_overrides()
        });
        let printed = format!("{:?}", config.resolve().unwrap());
        assert!(!printed.contains("secret-token"), "{}", printed);
        assert!(printed.contains("<redacted>"));
    }
}
