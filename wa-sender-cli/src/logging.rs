use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

static FILE_GUARD: OnceLock<Option<WorkerGuard>> = OnceLock::new();

/// Where the rolling log files go. `WA_SENDER_LOG_DIR` overrides the default.
pub fn log_dir() -> PathBuf {
    if let Ok(custom_dir) = env::var("WA_SENDER_LOG_DIR") {
        return PathBuf::from(custom_dir);
    }
    dirs::data_local_dir()
        .unwrap_or_else(env::temp_dir)
        .join("wa-sender")
        .join("logs")
}

/// Installs the global subscriber: stderr plus a daily log file.
///
/// Safe to call more than once; only the first call has any effect.
pub fn init() {
    FILE_GUARD.get_or_init(|| {
        let log_dir = log_dir();
        let file = std::fs::create_dir_all(&log_dir)
            .ok()
            .map(|_| tracing_appender::non_blocking(rolling::daily(&log_dir, "wa-sender.log")));
        let (file_writer, guard) = match file {
            Some((writer, guard)) => (Some(writer), Some(guard)),
            None => (None, None),
        };

        let _ = tracing_subscriber::registry()
            .with(
                // Respect RUST_LOG if provided, else default to info
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "info".into()),
            )
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .with(file_writer.map(|writer| {
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
            }))
            .try_init();

        guard
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_dir_ends_in_app_folder() {
        if env::var("WA_SENDER_LOG_DIR").is_err() {
            assert!(log_dir().ends_with("wa-sender/logs"));
        }
    }

    #[test]
    fn init_twice_is_harmless() {
        init();
        init();
        assert!(FILE_GUARD.get().is_some());
    }
}
