#![forbid(unsafe_code)]

pub mod bot;
pub mod config;
pub mod format;
pub mod monitor;
pub mod probe;
pub mod transport;

pub use bot::{Command, CommandBot};
pub use config::{BotConfig, MonitorConfig};
pub use monitor::{
    EventKind, EventRing, LinkStatus, Monitor, MonitorEvent, MonitorState, StatusHandle,
    Transition,
};
pub use probe::{HttpProber, ProbeFailure, ProbeOutcome, ProbeResult, Prober};
pub use transport::{
    ChatId, IncomingMessage, Notifier, TelegramClient, TransportError, Update, UpdateSource,
};
