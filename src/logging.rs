//! Tracing setup writing to stdout and a per-launch log file.
//!
//! Log files live under `.clustermap/logs` in the OS config directory (or
//! under `CLUSTERMAP_CONFIG_HOME` when set), one file per launch, pruned so
//! at most [`MAX_LOG_FILES`] remain on disk.

use std::{
    fs::{self, File},
    io,
    path::{Path, PathBuf},
    sync::OnceLock,
    time::SystemTime,
};

use directories::BaseDirs;
use time::{
    OffsetDateTime, UtcOffset, format_description::BorrowedFormatItem,
    macros::format_description,
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*};

/// Directory under the OS config root holding all app files.
pub const APP_DIR_NAME: &str = ".clustermap";

/// Log files kept on disk, counting the one for the current launch.
const MAX_LOG_FILES: usize = 10;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Errors that may occur while initializing logging.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// No home directory to anchor the log directory to.
    #[error("No home directory available for log files")]
    NoHomeDir,
    /// The log directory or this launch's log file could not be created.
    #[error("Could not prepare {path}: {source}")]
    Prepare {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// The launch timestamp could not be formatted into a filename.
    #[error("Could not format log timestamp: {0}")]
    Timestamp(#[from] time::error::Format),
    /// Another tracing subscriber is already installed.
    #[error("Could not install tracing subscriber: {0}")]
    Install(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Initialize tracing to stdout plus a fresh log file for this launch.
///
/// Later calls are no-ops. Errors are returned so the caller can keep
/// running with stderr only.
pub fn init() -> Result<(), LoggingError> {
    if LOG_GUARD.get().is_some() {
        return Ok(());
    }

    let dir = logs_dir()?;
    fs::create_dir_all(&dir).map_err(|source| LoggingError::Prepare {
        path: dir.clone(),
        source,
    })?;
    // Make room for this launch's file before creating it.
    prune_logs(&dir, MAX_LOG_FILES.saturating_sub(1));

    let path = dir.join(log_file_name(now_local_or_utc())?);
    let file = File::create(&path).map_err(|source| LoggingError::Prepare {
        path: path.clone(),
        source,
    })?;
    let (file_writer, guard) = tracing_appender::non_blocking(file);

    let timer = launch_timer();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = Registry::default()
        .with(filter)
        .with(
            fmt::layer()
                .with_timer(timer.clone())
                .with_writer(std::io::stdout),
        )
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_timer(timer)
                .with_writer(file_writer),
        );
    tracing::subscriber::set_global_default(subscriber)?;
    let _ = LOG_GUARD.set(guard);

    tracing::info!("Logging to {}", path.display());
    Ok(())
}

/// Resolve the log directory without creating it.
pub fn logs_dir() -> Result<PathBuf, LoggingError> {
    if let Ok(home) = std::env::var("CLUSTERMAP_CONFIG_HOME") {
        return Ok(logs_dir_under(Path::new(&home)));
    }
    let dirs = BaseDirs::new().ok_or(LoggingError::NoHomeDir)?;
    Ok(logs_dir_under(dirs.config_dir()))
}

fn logs_dir_under(base: &Path) -> PathBuf {
    base.join(APP_DIR_NAME).join("logs")
}

/// Delete the oldest `.log` files until at most `keep` remain. Best effort;
/// a launch never fails over an old file that would not delete.
fn prune_logs(dir: &Path, keep: usize) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    let mut logs: Vec<(SystemTime, PathBuf)> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file() && path.extension().and_then(|ext| ext.to_str()) == Some("log")
        })
        .map(|path| {
            let modified = fs::metadata(&path)
                .and_then(|meta| meta.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            (modified, path)
        })
        .collect();
    logs.sort_by(|a, b| b.0.cmp(&a.0));
    for (_, path) in logs.into_iter().skip(keep) {
        let _ = fs::remove_file(path);
    }
}

fn log_file_name(now: OffsetDateTime) -> Result<String, time::error::Format> {
    const STAMP: &[BorrowedFormatItem<'_>] =
        format_description!("[year][month][day]-[hour][minute][second]");
    Ok(format!("clustermap-{}.log", now.format(STAMP)?))
}

fn launch_timer() -> fmt::time::OffsetTime<&'static [BorrowedFormatItem<'static>]> {
    const DISPLAY: &[BorrowedFormatItem<'static>] =
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    fmt::time::OffsetTime::new(offset, DISPLAY)
}

fn now_local_or_utc() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{thread, time::Duration};
    use tempfile::tempdir;

    #[test]
    fn log_filename_embeds_the_launch_timestamp() {
        let at = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        assert_eq!(log_file_name(at).unwrap(), "clustermap-20231114-221320.log");
    }

    #[test]
    fn logs_dir_nests_under_the_app_home() {
        let dir = logs_dir_under(Path::new("/tmp/home"));
        assert_eq!(dir, Path::new("/tmp/home/.clustermap/logs"));
    }

    #[test]
    fn prune_keeps_only_the_newest_files() {
        let dir = tempdir().unwrap();
        for idx in 0..5 {
            fs::write(dir.path().join(format!("run-{idx}.log")), b"x").unwrap();
            thread::sleep(Duration::from_millis(10));
        }
        prune_logs(dir.path(), 2);
        assert!(!dir.path().join("run-0.log").exists());
        assert!(!dir.path().join("run-2.log").exists());
        assert!(dir.path().join("run-3.log").exists());
        assert!(dir.path().join("run-4.log").exists());
    }

    #[test]
    fn prune_leaves_other_files_alone() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), b"keep").unwrap();
        prune_logs(dir.path(), 0);
        assert!(dir.path().join("notes.txt").exists());
    }
}
