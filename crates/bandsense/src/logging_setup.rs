use anyhow::{anyhow, Context, Result};
use bandsense_core::LogConfig;
use std::fs::File;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{
    filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer,
};

/// Handle to keep the logging worker threads alive
pub struct LogGuard {
    // Flushed on drop
    _guards: Vec<WorkerGuard>,
}

/// Writers for the enabled outputs. Every write is handed to a worker thread
/// so the audio callback never blocks on stderr or disk.
struct LogWriters {
    console: Option<NonBlocking>,
    file: Option<NonBlocking>,
    guards: Vec<WorkerGuard>,
}

fn open_writers(config: &LogConfig) -> Result<LogWriters> {
    let mut guards = Vec::new();

    // stderr for logs, stdout carries the event stream
    let console = if config.console_output {
        let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());
        guards.push(guard);
        Some(writer)
    } else {
        None
    };

    let file = if config.file_output {
        config
            .ensure_log_directory()
            .context("Failed to create log directory")?;
        if let Err(e) = config.cleanup_old_logs() {
            eprintln!("Warning: Failed to cleanup old log files: {}", e);
        }

        let log_path = config.current_log_path();
        let file = File::options()
            .create(true)
            .append(true)
            .open(&log_path)
            .with_context(|| format!("Failed to open log file: {:?}", log_path))?;
        eprintln!("Logging to file: {:?}", log_path);

        let (writer, guard) = tracing_appender::non_blocking(file);
        guards.push(guard);
        Some(writer)
    } else {
        None
    };

    Ok(LogWriters {
        console,
        file,
        guards,
    })
}

/// Initialize the logging system
pub fn init(config: &LogConfig) -> Result<LogGuard> {
    // RUST_LOG takes precedence over the configured level
    let config_filter = EnvFilter::builder()
        .with_default_directive(config.parse_level().into())
        .from_env_lossy();

    let writers = open_writers(config)?;

    let console_layer = writers.console.map(|writer| {
        fmt::layer()
            .with_writer(writer)
            .with_ansi(true)
            .with_target(false)
            .with_filter(config_filter.clone())
    });

    let file_layer = writers.file.map(|writer| {
        fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_filter(config_filter)
    });

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("Failed to install log subscriber: {}", e))?;

    tracing::info!("Logging initialized at level: {}", config.level);

    Ok(LogGuard {
        _guards: writers.guards,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_output_gets_a_worker() {
        let dir = tempfile::tempdir().unwrap();
        let config = LogConfig {
            console_output: true,
            file_output: true,
            log_directory: dir.path().join("logs"),
            ..Default::default()
        };

        let writers = open_writers(&config).unwrap();
        assert!(writers.console.is_some());
        assert!(writers.file.is_some());
        assert_eq!(writers.guards.len(), 2);
        assert!(config.current_log_path().exists());
    }

    #[test]
    fn test_disabled_outputs_spawn_nothing() {
        let config = LogConfig {
            console_output: false,
            file_output: false,
            ..Default::default()
        };

        let writers = open_writers(&config).unwrap();
        assert!(writers.console.is_none());
        assert!(writers.file.is_none());
        assert!(writers.guards.is_empty());
    }
}
