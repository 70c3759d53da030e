//! Logging bootstrap shared by eduflow binaries.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// How [`init_logging`] sets up the subscriber.
#[derive(Debug, Clone, Default)]
pub struct LoggingOptions {
    /// Overrides `RUST_LOG` when set.
    pub filter: Option<String>,
    /// Directory for a daily-rolling copy of the log.
    pub log_dir: Option<PathBuf>,
    /// File name prefix inside `log_dir`.
    pub file_prefix: Option<String>,
}

impl LoggingOptions {
    fn env_filter(&self) -> EnvFilter {
        match self.filter.as_deref() {
            Some(filter) => EnvFilter::new(filter),
            None => EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        }
    }
}

/// Installs the global subscriber. Console output goes to stderr.
///
/// Returns the file appender guard when file logging is enabled; drop it only
/// at process exit or buffered lines are lost. A second call leaves the first
/// subscriber in place and returns `Ok(None)`.
pub fn init_logging(options: &LoggingOptions) -> Result<Option<WorkerGuard>> {
    let filter = options.env_filter();

    let Some(dir) = options.log_dir.as_ref() else {
        let installed = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init();
        if installed.is_err() {
            tracing::debug!("global subscriber already installed");
        }
        return Ok(None);
    };

    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create log directory {}", dir.display()))?;
    let prefix = options.file_prefix.as_deref().unwrap_or("eduflow.log");
    let appender = tracing_appender::rolling::daily(dir, prefix);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .try_init();
    if installed.is_err() {
        tracing::debug!("global subscriber already installed");
        return Ok(None);
    }
    Ok(Some(guard))
}
