use std::path::Path;

use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// File the run log is written to inside the output directory
pub const LOG_FILE: &str = "scraper.log";

/// Installs console and file logging.
///
/// The returned guard flushes buffered log lines when dropped, so the caller
/// keeps it alive for the whole run.
pub fn init(output_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(output_dir)?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_appender = tracing_appender::rolling::never(output_dir, LOG_FILE);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .try_init()?;

    Ok(guard)
}
