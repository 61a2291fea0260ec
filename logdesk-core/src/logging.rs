//! File logging for logdesk
//!
//! Both binaries log to a daily file under `$XDG_STATE_HOME/logdesk/`
//! (`logdesk.YYYY-MM-DD.log`). Nothing goes to stdout: the TUI owns the
//! terminal and the CLI's stdout is for command output.

use std::path::{Path, PathBuf};

use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::{Config, LoggingConfig};
use crate::error::{Error, Result};

const FILE_PREFIX: &str = "logdesk";
const FILE_SUFFIX: &str = "log";

/// Keeps the background writer alive; pending lines are flushed on drop.
pub struct LoggingGuard {
    log_dir: PathBuf,
    _worker: WorkerGuard,
}

impl LoggingGuard {
    /// Directory the rolling log files are written to.
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }
}

/// Install the global subscriber writing to the state directory.
///
/// `RUST_LOG` takes precedence over `config.level`. An invalid configured
/// level is a configuration error rather than a silently empty filter.
pub fn init(config: &LoggingConfig) -> Result<LoggingGuard> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => level_filter(&config.level)?,
    };

    let log_dir = Config::state_dir();
    std::fs::create_dir_all(&log_dir)?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(FILE_PREFIX)
        .filename_suffix(FILE_SUFFIX)
        .max_log_files(config.max_files.max(1))
        .build(&log_dir)
        .map_err(|e| Error::Config(format!("failed to create log file: {}", e)))?;
    let (writer, worker) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true),
        )
        .try_init()
        .map_err(|e| Error::Config(format!("logging already initialized: {}", e)))?;

    tracing::info!(
        log_dir = %log_dir.display(),
        level = %config.level,
        max_files = config.max_files,
        "logging initialized"
    );

    Ok(LoggingGuard {
        log_dir,
        _worker: worker,
    })
}

/// Build the filter for a configured level.
///
/// A bare level (`debug`, `WARN`, `off`) applies to everything; anything
/// with `=` or `,` is parsed as an `EnvFilter` directive list such as
/// `info,logdesk_core::api=debug`.
pub fn level_filter(level: &str) -> Result<EnvFilter> {
    let level = level.trim();
    if level.contains('=') || level.contains(',') {
        return EnvFilter::try_new(level)
            .map_err(|e| Error::Config(format!("invalid logging.level {:?}: {}", level, e)));
    }
    let parsed: LevelFilter = level
        .parse()
        .map_err(|_| Error::Config(format!("invalid logging.level {:?}", level)))?;
    Ok(EnvFilter::default().add_directive(parsed.into()))
}

/// Route tracing output to the test harness; safe to call repeatedly.
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .with_span_events(FmtSpan::CLOSE)
        .try_init();
}
