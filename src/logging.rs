use std::fs;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;

/// File logging for diagnostics; the terminal UI owns stdout. Hold the guard for
/// the life of the process or buffered lines are lost.
pub fn init_logging(logs_dir: &Path) -> Option<WorkerGuard> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    fs::create_dir_all(logs_dir).ok()?;

    let file_appender = tracing_appender::rolling::daily(logs_dir, "matscore_terminal.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,matscore_terminal=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .try_init()
        .ok()?;

    Some(guard)
}
