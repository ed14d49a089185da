use std::fs;
use std::path::Path;
use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_DIRECTIVE: &str = "survey_merge=info";

/// Initializes logging on stderr, plus a daily-rotated JSON file when `log_dir` is set.
///
/// The returned guard must be held until exit so buffered file logs are flushed.
pub fn init_logging(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    // Console goes to stderr so stdout stays a clean run summary
    let console_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    let mut dir_error = None;
    let (file_layer, guard) = match log_dir.map(|dir| (dir, fs::create_dir_all(dir))) {
        Some((dir, Ok(()))) => {
            let file_appender = tracing_appender::rolling::daily(dir, "survey_merge.log");
            let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer().json().with_writer(non_blocking_writer);
            (Some(layer), Some(guard))
        }
        Some((dir, Err(e))) => {
            dir_error = Some((dir, e));
            (None, None)
        }
        None => (None, None),
    };

    // try_init so repeated initialization (tests) is harmless
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init();

    if let Some((dir, e)) = dir_error {
        warn!(
            log_dir = %dir.display(),
            error = %e,
            "Cannot create log directory, logging to console only"
        );
    }

    guard
}
