/// Process-wide log setup
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{ConfigError, LogFormat, LoggingConfig};

/// Log file name prefix inside `logging.directory`
const LOG_FILE_PREFIX: &str = "rs_webterm.log";

/// Initialize logging.
///
/// `RUST_LOG` wins over `logging.level`. When a log directory is configured a
/// second, ANSI-free layer writes daily-rotated files; keep the returned guard
/// alive for as long as those writes should be flushed.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>, ConfigError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| ConfigError::Logging(format!("invalid log filter: {}", e)))?;

    let (file_layer, guard) = match &config.directory {
        Some(directory) => {
            std::fs::create_dir_all(directory).map_err(|e| {
                ConfigError::Logging(format!("cannot create {:?}: {}", directory, e))
            })?;
            let appender = tracing_appender::rolling::daily(directory, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);

    let result = match config.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(false))
            .try_init(),
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_thread_names(true)
                    .with_target(true)
                    .with_line_number(true),
            )
            .try_init(),
    };
    result.map_err(|e| ConfigError::Logging(e.to_string()))?;

    tracing::info!(
        "Logging initialized (level: {}, format: {:?})",
        config.level,
        config.format
    );
    Ok(guard)
}
