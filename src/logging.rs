//! Logging setup
//!
//! File-based tracing under the config directory. Stdout is the wire
//! protocol and stderr belongs to the calling agent's terminal, so
//! nothing is ever logged to either.

use std::path::Path;

use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Initialize tracing with a daily-rotated log file
///
/// The returned guard must be held for the life of the process so
/// buffered records are flushed on exit.
pub fn init(config_dir: &Path) -> Result<WorkerGuard> {
    let appender = tracing_appender::rolling::daily(config_dir.join("logs"), "toolwarden.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to install tracing subscriber: {}", err))?;

    Ok(guard)
}
