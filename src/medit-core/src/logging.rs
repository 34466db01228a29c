use crate::config::LoggingConfig;
use crate::paths::AppDirs;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::{fmt, EnvFilter};

/// Keeps the file appender's worker alive for the life of the process.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

pub fn init_logging(config: &LoggingConfig, dirs: &AppDirs) -> Result<LoggingGuard, LoggingError> {
    let env_filter = EnvFilter::try_new(config.level.as_filter_directive()).map_err(|source| {
        LoggingError::ParseLevel {
            level: config.level.as_filter_directive().to_string(),
            source,
        }
    })?;

    // stdout carries the interactive session, so log output goes to stderr.
    let mut file_guard = None;
    let writer: BoxMakeWriter = match &config.file_name {
        Some(file_name) => {
            let log_dir = dirs.log_dir().to_path_buf();
            fs::create_dir_all(&log_dir).map_err(|source| LoggingError::CreateDirectory {
                path: log_dir.clone(),
                source,
            })?;
            let appender = tracing_appender::rolling::daily(&log_dir, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            file_guard = Some(guard);
            BoxMakeWriter::new(
                std::io::stderr
                    .with_max_level(tracing::Level::TRACE)
                    .and(non_blocking),
            )
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(writer)
        .try_init()
        .map_err(LoggingError::SubscriberInstall)?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to create log directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse log level {level}: {source}")]
    ParseLevel {
        level: String,
        source: tracing_subscriber::filter::ParseError,
    },
    #[error("failed to install tracing subscriber: {0}")]
    SubscriberInstall(Box<dyn std::error::Error + Send + Sync>),
}
