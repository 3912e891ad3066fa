use std::path::PathBuf;

use directories::ProjectDirs;
use readdon_core::Error;
use tracing::level_filters::LevelFilter;
use tracing::subscriber::set_global_default;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_log::LogTracer;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Layer, Registry};

/// Directory holding the rolling diagnostic logs
pub fn log_directory() -> PathBuf {
    ProjectDirs::from("com", "readdon", "readdon")
        .map(|d| d.data_local_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

/// Install the global tracing subscriber.
///
/// Everything passing `env_filter` (or `RUST_LOG`) goes to a daily file under
/// [`log_directory`]; only warnings and errors reach stderr, since stdout
/// already carries the action log.
pub fn init_subscriber(name: &str, env_filter: &str) -> Result<WorkerGuard, Error> {
    LogTracer::init().map_err(|e| Error::Other(format!("failed to bridge log records: {}", e)))?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(env_filter));

    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(LevelFilter::WARN);

    let file_appender = tracing_appender::rolling::daily(log_directory(), format!("{}.log", name));
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer().with_ansi(false).with_writer(non_blocking);

    let subscriber = Registry::default()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer);

    set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("failed to set global tracing subscriber: {}", e)))?;

    Ok(guard)
}
