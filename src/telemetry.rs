//! Logging setup
//!
//! JSON logs always go to a daily rolling file in the log directory. Verbose
//! mode adds a compact console layer on stderr so every agent step and tool
//! call is visible while a request runs.

use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable overriding the data directory (logs, REPL history)
pub const DATA_DIR_ENV: &str = "EMAIL_AGENT_DATA_DIR";

const LOG_FILE_PREFIX: &str = "email_agent.log";

/// `$EMAIL_AGENT_DATA_DIR`, else the platform data dir, else `./.email-agent`
pub fn default_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }

    dirs::data_dir()
        .map(|d| d.join("email-agent"))
        .unwrap_or_else(|| PathBuf::from(".email-agent"))
}

fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug,hyper=info,reqwest=info,h2=info,rustls=info,rustyline=info")
        } else {
            EnvFilter::new("info,hyper=warn,reqwest=warn,h2=warn,rustls=warn,rustyline=warn")
        }
    })
}

/// Keeps the background log writer alive; drop flushes it
pub struct Telemetry {
    log_dir: PathBuf,
    _file_guard: WorkerGuard,
}

impl Telemetry {
    /// Install the global subscriber
    pub fn init(log_dir: PathBuf, verbose: bool) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&log_dir)?;

        let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX);
        let (non_blocking, file_guard) = tracing_appender::non_blocking(file_appender);

        if verbose {
            // Verbose mode: console + file
            tracing_subscriber::registry()
                .with(env_filter(verbose))
                .with(
                    fmt::layer()
                        .with_target(false)
                        .compact()
                        .with_writer(std::io::stderr),
                )
                .with(fmt::layer().json().with_writer(non_blocking))
                .try_init()
                .ok();
        } else {
            // Normal mode: file only (no console noise)
            tracing_subscriber::registry()
                .with(env_filter(verbose))
                .with(fmt::layer().json().with_writer(non_blocking))
                .try_init()
                .ok();
        }

        tracing::info!(log_dir = %log_dir.display(), verbose, "Logging initialized");

        Ok(Self {
            log_dir,
            _file_guard: file_guard,
        })
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }
}
