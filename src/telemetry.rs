//! Tracing initialisation for the command line tool.
//!
//! Call [`init_tracing`] once at program start. Logs go to stderr, or to a
//! file through a non-blocking writer when a log file is given; keep the
//! returned guard alive until exit so buffered lines get flushed.

use std::io;
use std::path::Path;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Initialise the global tracing subscriber.
///
/// * `json` - emit newline-delimited JSON log lines
/// * `level` - default verbosity when `RUST_LOG` is not set
/// * `log_file` - append to this file instead of stderr
///
/// Fails when a global subscriber is already installed.
pub fn init_tracing(
    json: bool,
    level: Level,
    log_file: Option<&Path>,
) -> io::Result<Option<WorkerGuard>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let (writer, guard) = match log_file {
        Some(path) => {
            let file_name = path.file_name().ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("log file has no file name: {}", path.display()),
                )
            })?;
            let dir = path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            std::fs::create_dir_all(dir)?;

            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(writer), Some(guard))
        }
        None => (BoxMakeWriter::new(io::stderr), None),
    };

    let layer = fmt::layer()
        .with_target(false)
        .with_ansi(log_file.is_none())
        .with_writer(writer);

    let installed = if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(layer.json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(layer)
            .try_init()
    };
    installed.map_err(io::Error::other)?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn init_tracing_fails_once_a_subscriber_is_installed() {
        let temp_dir = TempDir::new().unwrap();
        let log_file = temp_dir.path().join("logs").join("run.log");

        let guard = init_tracing(false, Level::INFO, Some(&log_file)).unwrap();
        assert!(guard.is_some());
        assert!(temp_dir.path().join("logs").is_dir());

        let second = init_tracing(true, Level::DEBUG, None);
        assert!(second.is_err());
    }
}
