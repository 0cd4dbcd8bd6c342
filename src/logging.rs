use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_DIR: &str = "logs";

/// Routes `tracing` output to a daily rolling file; the terminal is owned by the UI.
/// Keep the returned guard alive until exit or buffered lines are lost.
pub fn initialize_logging() -> WorkerGuard {
    let _ = std::fs::create_dir_all(LOG_DIR);

    let file_appender = tracing_appender::rolling::daily(LOG_DIR, "airglass.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false).with_target(true))
        .init();

    tracing::info!("Logging initialized successfully.");
    guard
}
