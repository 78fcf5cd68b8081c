use std::fs;
use std::path::Path;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the structured logging system.
///
/// Sets up:
/// - Console output (stderr): compact, no ANSI. Stdout carries the protocol
///   and must never receive log lines.
/// - File output (only when `log_dir` is set): daily rolling files
///   `gerschel-db-mcp.<date>.log`, keeping the latest 5.
/// - Environment filter: defaults to `info`, configurable via `RUST_LOG`.
///
/// Returns an error if the log directory cannot be prepared or a global
/// subscriber is already installed.
pub fn init(log_dir: Option<&Path>) -> anyhow::Result<()> {
    // Suppress HTTP client internals that log every connection.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper=warn,hyper_util=warn"));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(true)
        .compact();

    let file_layer = match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("gerschel-db-mcp")
                .filename_suffix("log")
                .max_log_files(5)
                .build(dir)?;
            Some(
                fmt::layer()
                    .with_writer(file_appender)
                    .with_ansi(false)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    match log_dir {
        Some(dir) => tracing::info!(log_dir = %dir.display(), "Logger initialized"),
        None => tracing::info!("Logger initialized (stderr only)"),
    }
    Ok(())
}
