mod config;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use console::style;
use tracing_subscriber::{fmt, EnvFilter};

use uptime_core::{CommandBot, HttpProber, Monitor, ProbeOutcome, Prober, TelegramClient};

use crate::config::{AppConfig, Overrides};

/// Website uptime monitor with a Telegram command bot.
#[derive(Parser)]
#[command(name = "uptime-bot", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the availability monitor and the command bot.
    Run(RunArgs),
    /// Probe a URL once and print the result.
    Probe {
        /// URL to check.
        url: String,

        /// Request timeout in seconds.
        #[arg(long, default_value_t = 20)]
        timeout_secs: u64,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Path to TOML config file.
    #[arg(short, long, env = "UPTIME_CONFIG")]
    config: Option<PathBuf>,

    /// URL to monitor.
    #[arg(long, env = "TARGET_URL")]
    url: Option<String>,

    /// Chat that receives alerts.
    #[arg(long, env = "CHAT_ID", allow_negative_numbers = true)]
    chat_id: Option<i64>,

    /// Telegram bot token.
    #[arg(long, env = "BOT_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Seconds between two probes.
    #[arg(long, env = "CHECK_INTERVAL_SECS")]
    check_interval_secs: Option<u64>,

    /// Minimum seconds between repeated alerts.
    #[arg(long, env = "ALERT_INTERVAL_SECS")]
    alert_interval_secs: Option<u64>,

    /// Probe timeout in seconds.
    #[arg(long, env = "PROBE_TIMEOUT_SECS")]
    probe_timeout_secs: Option<u64>,

    /// Serve the status API on this address (e.g. 127.0.0.1:8080).
    #[arg(short, long, env = "LISTEN_ADDR")]
    listen: Option<SocketAddr>,

    /// Log output format: pretty or json.
    #[arg(long, env = "LOG_FORMAT")]
    log_format: Option<String>,
}

impl RunArgs {
    fn overrides(&self) -> Overrides {
        Overrides {
            url: self.url.clone(),
            chat_id: self.chat_id,
            token: self.token.clone(),
            check_interval_secs: self.check_interval_secs,
            alert_interval_secs: self.alert_interval_secs,
            probe_timeout_secs: self.probe_timeout_secs,
            listen: self.listen,
            log_format: self.log_format.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run(args).await,
        Commands::Probe { url, timeout_secs } => {
            fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
                )
                .init();
            run_probe(url, timeout_secs).await
        }
    }
}

async fn run(args: RunArgs) -> ExitCode {
    let mut app_config = match args.config.as_deref().map(AppConfig::load).transpose() {
        Ok(c) => c.unwrap_or_default(),
        Err(e) => {
            init_tracing("pretty");
            tracing::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    app_config.apply(args.overrides());

    let log_format = match config::validate_log_format(&app_config.server.log_format) {
        Ok(()) => app_config.server.log_format.as_str(),
        Err(_) => "pretty",
    };
    init_tracing(log_format);
    if let Some(ref path) = args.config {
        tracing::info!(path = %path.display(), "Loaded config file");
    }

    let settings = match app_config.resolve() {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let prober = match HttpProber::from_config(&settings.monitor) {
        Ok(p) => Arc::new(p),
        Err(e) => {
            tracing::error!(error = %e, "Failed to build HTTP client");
            return ExitCode::FAILURE;
        }
    };
    let telegram = match TelegramClient::new(settings.token.clone(), settings.send_timeout) {
        Ok(t) => Arc::new(t.with_api_base(settings.api_base.clone())),
        Err(e) => {
            tracing::error!(error = %e, "Failed to build Telegram client");
            return ExitCode::FAILURE;
        }
    };

    let target_url = settings.monitor.target_url.clone();
    let monitor = Monitor::new(settings.monitor.clone(), prober.clone(), telegram.clone());
    let status = monitor.status_handle();

    if let Some(listen) = settings.listen {
        let state = uptime_api::state::AppState::new(
            status.clone(),
            prober.clone() as Arc<dyn Prober>,
            target_url.clone(),
        );
        tokio::spawn(async move {
            if let Err(e) =
                uptime_api::serve_with_state(listen, state, uptime_api::shutdown_signal()).await
            {
                tracing::error!(error = %e, "Status API failed");
            }
        });
    }

    let monitor_task = monitor.spawn();
    let bot = CommandBot::new(
        settings.bot.clone(),
        target_url.clone(),
        telegram.clone(),
        telegram,
        prober,
        status,
    );

    tracing::info!(url = %target_url, chat = %settings.monitor.alert_chat, "Uptime monitor started");

    tokio::select! {
        _ = bot.run() => {}
        _ = uptime_api::shutdown_signal() => {
            tracing::info!("Shutdown signal received");
        }
    }

    monitor_task.abort();
    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}

async fn run_probe(url: String, timeout_secs: u64) -> ExitCode {
    let prober = match HttpProber::new(Duration::from_secs(timeout_secs.max(1))) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("{} {}", style("error:").red().bold(), e);
            return ExitCode::FAILURE;
        }
    };

    let result = prober.probe(&url).await;
    let elapsed = format!("{}ms", result.elapsed.as_millis());

    match result.outcome {
        ProbeOutcome::Up { status } => {
            println!(
                "{}  {}  {}  {}",
                style("UP  ").green().bold(),
                style(&url).bold(),
                status,
                style(elapsed).dim()
            );
            ExitCode::SUCCESS
        }
        ProbeOutcome::Down { failure } => {
            println!(
                "{}  {}  {}  {}",
                style("DOWN").red().bold(),
                style(&url).bold(),
                style(failure).red(),
                style(elapsed).dim()
            );
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(log_format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_format {
        "json" => {
            fmt().with_env_filter(filter).json().init();
        }
        _ => {
            fmt().with_env_filter(filter).init();
        }
    }
}
