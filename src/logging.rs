//! Scan log: console plus append-only file.
//!
//! The log is an ordinary value built once at start-up and handed by
//! reference to every component that reports progress. It owns its own
//! `tracing` dispatcher, so nothing is installed as the process-wide default.

use std::fmt::Display;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing::Dispatch;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

use crate::error::BatchIOError;

pub struct ScanLog {
    dispatch: Dispatch,
}

impl ScanLog {
    /// Opens `log_file` for appending (creating parent directories) and
    /// mirrors every event to stdout.
    pub fn open(log_file: &Path, level: &str) -> Result<ScanLog, BatchIOError> {
        let to_log_error = |source: io::Error| BatchIOError::Log {
            path: log_file.to_path_buf(),
            source,
        };

        if let Some(parent) = log_file.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(to_log_error)?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)
            .map_err(to_log_error)?;

        let console = tracing_subscriber::fmt::layer()
            .with_writer(io::stdout)
            .with_target(false);
        let file = tracing_subscriber::fmt::layer()
            .with_writer(Mutex::new(file))
            .with_target(false)
            .with_ansi(false);

        let subscriber = tracing_subscriber::registry()
            .with(level_filter(level))
            .with(console)
            .with(file);

        Ok(ScanLog {
            dispatch: Dispatch::new(subscriber),
        })
    }

    /// A log writing plain lines to `writer` only.
    pub fn from_writer<W>(writer: W, level: &str) -> ScanLog
    where
        W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_target(false)
            .with_ansi(false)
            .without_time();
        let subscriber = tracing_subscriber::registry()
            .with(level_filter(level))
            .with(layer);

        ScanLog {
            dispatch: Dispatch::new(subscriber),
        }
    }

    /// A log that discards everything.
    pub fn silent() -> ScanLog {
        ScanLog {
            dispatch: Dispatch::none(),
        }
    }

    pub fn info(&self, message: impl Display) {
        tracing::dispatcher::with_default(&self.dispatch, || {
            tracing::info!("{}", message);
        });
    }

    /// Logs `"<context>: <error>"`.
    pub fn error(&self, context: impl Display, error: impl Display) {
        tracing::dispatcher::with_default(&self.dispatch, || {
            tracing::error!("{}: {}", context, error);
        });
    }
}

fn level_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}
