//! Tracing setup for the workbench binary.
//!
//! Events go to stdout and to `learnonauts_<timestamp>.log` in the app logs
//! directory. Only the newest log files are kept.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::OnceLock,
    time::SystemTime,
};

use time::{OffsetDateTime, UtcOffset, format_description::FormatItem, macros::format_description};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::app_dirs::{self, AppDirError};

const KEEP_LOG_FILES: usize = 10;
const LOG_FILE_PREFIX: &str = "learnonauts";
const FILE_STAMP: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]_[hour]-[minute]-[second]");
const LINE_STAMP: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

static FILE_WRITER_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Log directory unavailable: {0}")]
    LogDir(#[from] AppDirError),
    #[error("Failed to format log file timestamp: {0}")]
    Timestamp(#[from] time::error::Format),
    #[error("Failed to prune log directory {path}: {source}")]
    Prune {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("A global tracing subscriber is already installed: {0}")]
    SetGlobal(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Install the global subscriber. Calls after the first succeed without effect.
///
/// `RUST_LOG` overrides the default `info` filter.
pub fn init() -> Result<(), LoggingError> {
    if FILE_WRITER_GUARD.get().is_some() {
        return Ok(());
    }
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    let log_dir = app_dirs::logs_dir()?;
    prune_old_logs(&log_dir, KEEP_LOG_FILES.saturating_sub(1))?;
    let file_name = log_file_name(OffsetDateTime::now_utc().to_offset(offset))?;

    let appender = tracing_appender::rolling::never(&log_dir, &file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(appender);
    let timer = fmt::time::OffsetTime::new(offset, LINE_STAMP);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_timer(timer.clone()))
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_timer(timer)
                .with_writer(file_writer),
        );
    tracing::subscriber::set_global_default(subscriber)?;
    let _ = FILE_WRITER_GUARD.set(guard);

    tracing::info!("Logging to {}", log_dir.join(&file_name).display());
    Ok(())
}

fn log_file_name(now: OffsetDateTime) -> Result<String, LoggingError> {
    Ok(format!("{LOG_FILE_PREFIX}_{}.log", now.format(FILE_STAMP)?))
}

/// Delete the oldest `.log` files in `dir` until at most `keep` remain.
fn prune_old_logs(dir: &Path, keep: usize) -> Result<(), LoggingError> {
    let prune_err = |source| LoggingError::Prune {
        path: dir.to_path_buf(),
        source,
    };
    let mut logs = Vec::new();
    for entry in fs::read_dir(dir).map_err(prune_err)?.flatten() {
        let path = entry.path();
        if !path.is_file() || path.extension().is_none_or(|ext| ext != "log") {
            continue;
        }
        let modified = entry
            .metadata()
            .and_then(|meta| meta.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        logs.push((modified, path));
    }
    if logs.len() <= keep {
        return Ok(());
    }
    logs.sort();
    let excess = logs.len() - keep;
    for (_, path) in logs.into_iter().take(excess) {
        fs::remove_file(&path).map_err(prune_err)?;
    }
    Ok(())
}
