// Logging setup: daily rolling file plus a console layer on stderr

use crate::config::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub const LOG_FILE_NAME: &str = "fridata.log";

/// Where console output goes and how much of it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleMode {
    /// Full-screen terminal UI: only errors, never on stdout
    Tui,
    /// Headless commands; `verbose` lifts the console filter to the configured one
    Headless { verbose: bool },
}

impl ConsoleMode {
    fn filter(&self, configured: &str) -> EnvFilter {
        match self {
            ConsoleMode::Tui => EnvFilter::new("error"),
            ConsoleMode::Headless { verbose: true } => env_filter(configured),
            ConsoleMode::Headless { verbose: false } => EnvFilter::new("warn"),
        }
    }
}

fn env_filter(configured: &str) -> EnvFilter {
    EnvFilter::try_new(configured).unwrap_or_else(|_| EnvFilter::new("fridata=info"))
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop; keep it alive for the
/// whole process. No guard is returned when the log directory can't be created,
/// in which case only the console layer is installed.
pub fn init_logging(config: &LoggingConfig, mode: ConsoleMode) -> Option<WorkerGuard> {
    let mut guard = None;
    let file_layer = match std::fs::create_dir_all(&config.dir) {
        Ok(()) => {
            let appender = tracing_appender::rolling::daily(&config.dir, LOG_FILE_NAME);
            let (writer, worker_guard) = tracing_appender::non_blocking(appender);
            guard = Some(worker_guard);
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_filter(env_filter(&config.filter)),
            )
        }
        Err(err) => {
            eprintln!(
                "Warning: failed to create log directory {}: {}",
                config.dir.display(),
                err
            );
            None
        }
    };

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(BoxMakeWriter::new(std::io::stderr))
        .with_target(false)
        .with_filter(mode.filter(&config.filter));

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .init();

    guard
}
