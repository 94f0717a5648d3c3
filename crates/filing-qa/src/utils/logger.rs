use anyhow::Result;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info,filing_qa=debug";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    /// Reads `LOG_FORMAT`; anything other than `json` means pretty output.
    pub fn from_env() -> Self {
        match std::env::var("LOG_FORMAT") {
            Ok(value) if value.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Installs the global subscriber: stderr plus a daily rolling file under `log_dir`.
///
/// The returned guard flushes the file writer on drop, so keep it alive for
/// the lifetime of the process.
pub fn init_logger(log_dir: &Path) -> Result<WorkerGuard> {
    let filter = match std::env::var("RUST_LOG") {
        Ok(directives) => EnvFilter::try_new(directives)?,
        Err(_) => EnvFilter::try_new(DEFAULT_FILTER)?,
    };

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("filing-qa")
        .filename_suffix("log")
        .build(log_dir)?;
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    match LogFormat::from_env() {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_level(true),
                )
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(file_writer)
                        .with_target(true)
                        .with_level(true),
                )
                .try_init()?;
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .compact()
                        .with_writer(std::io::stderr)
                        .with_target(false)
                        .with_level(true),
                )
                .with(
                    fmt::layer()
                        .with_writer(file_writer)
                        .with_target(true)
                        .with_level(true)
                        .with_ansi(false),
                )
                .try_init()?;
        }
    }

    Ok(guard)
}
