//! Rolling file logs for the engine.
//!
//! # Responsibility
//! - Start the `flexi_logger` backend from a [`LoggingConfig`], once per
//!   process.
//! - Route panics through the log before the previous hook runs.
//!
//! # Invariants
//! - Repeating `init_logging` with an equivalent config succeeds silently.
//! - A config without `log_dir` leaves file logging off.
//! - A second config with another level or directory is refused.
//! - Nothing here panics; failures surface as [`LoggingError`].
//! - Log lines carry ids and counts only, never manuscript text.

use crate::config::LoggingConfig;
use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const FILE_STEM: &str = "storyloom";
/// Rotate at 10 MiB, keep 5 rotated files.
const ROTATE_AT_BYTES: u64 = 10 * 1024 * 1024;
const ROTATED_FILES_KEPT: usize = 5;
const PANIC_TEXT_LIMIT: usize = 200;

static ACTIVE: OnceCell<ActiveLogger> = OnceCell::new();
static PANIC_HOOK: OnceCell<()> = OnceCell::new();

struct ActiveLogger {
    level: LogLevel,
    dir: PathBuf,
    _handle: LoggerHandle,
}

/// Verbosity accepted in [`LoggingConfig::level`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Case-insensitive; `warning` is accepted for `warn`.
    pub(crate) fn parse(value: &str) -> Result<Self, LoggingError> {
        let level = match value.trim().to_ascii_lowercase().as_str() {
            "trace" => Self::Trace,
            "debug" => Self::Debug,
            "info" => Self::Info,
            "warn" | "warning" => Self::Warn,
            "error" => Self::Error,
            _ => return Err(LoggingError::UnsupportedLevel(value.trim().to_string())),
        };
        Ok(level)
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Logging bootstrap failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoggingError {
    UnsupportedLevel(String),
    /// `log_dir` is set to an empty path.
    MissingLogDir,
    RelativeLogDir(PathBuf),
    CreateDir { path: PathBuf, message: String },
    Backend(String),
    LevelConflict {
        active: &'static str,
        requested: &'static str,
    },
    DirConflict { active: PathBuf, requested: PathBuf },
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedLevel(level) => {
                write!(f, "unknown log level `{level}` (use trace, debug, info, warn or error)")
            }
            Self::MissingLogDir => write!(f, "logging.log_dir is empty"),
            Self::RelativeLogDir(path) => {
                write!(f, "logging.log_dir is not absolute: `{}`", path.display())
            }
            Self::CreateDir { path, message } => {
                write!(f, "cannot create log directory `{}`: {message}", path.display())
            }
            Self::Backend(message) => write!(f, "logger backend failed to start: {message}"),
            Self::LevelConflict { active, requested } => write!(
                f,
                "logger already running at level `{active}`, cannot change to `{requested}`"
            ),
            Self::DirConflict { active, requested } => write!(
                f,
                "logger already writing to `{}`, cannot move to `{}`",
                active.display(),
                requested.display()
            ),
        }
    }
}

impl Error for LoggingError {}

/// Starts file logging for this process.
///
/// Returns `Ok(false)` without touching the backend when `log_dir` is unset.
///
/// # Errors
/// - `UnsupportedLevel`, `MissingLogDir`, `RelativeLogDir` for a bad config.
/// - `CreateDir`, `Backend` when the directory or backend cannot start.
/// - `LevelConflict`, `DirConflict` when a different config already runs.
pub fn init_logging(config: &LoggingConfig) -> Result<bool, LoggingError> {
    let level = LogLevel::parse(&config.level)?;
    let Some(dir) = config.log_dir.as_deref() else {
        return Ok(false);
    };
    let dir = absolute_log_dir(dir)?;

    let active = ACTIVE.get_or_try_init(|| start_backend(level, &dir))?;
    ensure_same(active, level, &dir)?;
    Ok(true)
}

/// Level and directory of the running logger, if any.
pub fn logging_status() -> Option<(&'static str, PathBuf)> {
    ACTIVE
        .get()
        .map(|active| (active.level.as_str(), active.dir.clone()))
}

/// `debug` for debug builds, `info` otherwise.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        LogLevel::Debug.as_str()
    } else {
        LogLevel::Info.as_str()
    }
}

fn start_backend(level: LogLevel, dir: &Path) -> Result<ActiveLogger, LoggingError> {
    std::fs::create_dir_all(dir).map_err(|err| LoggingError::CreateDir {
        path: dir.to_path_buf(),
        message: err.to_string(),
    })?;

    let handle = Logger::try_with_str(level.as_str())
        .map_err(|err| LoggingError::Backend(err.to_string()))?
        .log_to_file(FileSpec::default().directory(dir).basename(FILE_STEM))
        .rotate(
            Criterion::Size(ROTATE_AT_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(ROTATED_FILES_KEPT),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .map_err(|err| LoggingError::Backend(err.to_string()))?;

    PANIC_HOOK.get_or_init(route_panics_to_log);
    info!(
        "event=logging_start module=logging status=ok level={} dir={} os={} version={}",
        level.as_str(),
        dir.display(),
        std::env::consts::OS,
        env!("CARGO_PKG_VERSION")
    );

    Ok(ActiveLogger {
        level,
        dir: dir.to_path_buf(),
        _handle: handle,
    })
}

fn absolute_log_dir(dir: &Path) -> Result<PathBuf, LoggingError> {
    if dir.as_os_str().is_empty() {
        return Err(LoggingError::MissingLogDir);
    }
    if !dir.is_absolute() {
        return Err(LoggingError::RelativeLogDir(dir.to_path_buf()));
    }
    Ok(dir.to_path_buf())
}

fn ensure_same(active: &ActiveLogger, level: LogLevel, dir: &Path) -> Result<(), LoggingError> {
    if active.dir != dir {
        return Err(LoggingError::DirConflict {
            active: active.dir.clone(),
            requested: dir.to_path_buf(),
        });
    }
    if active.level != level {
        return Err(LoggingError::LevelConflict {
            active: active.level.as_str(),
            requested: level.as_str(),
        });
    }
    Ok(())
}

fn route_panics_to_log() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let at = info
            .location()
            .map(|location| format!("{}:{}", location.file(), location.line()))
            .unwrap_or_else(|| "?".to_string());
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .map(|text| (*text).to_string())
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_default();
        error!(
            "event=panic module=runtime status=error at={} payload={}",
            at,
            one_line(&payload, PANIC_TEXT_LIMIT)
        );
        previous(info);
    }));
}

/// Flattens line breaks and caps the text at `limit` characters.
fn one_line(text: &str, limit: usize) -> String {
    let mut flat: String = text
        .chars()
        .map(|ch| if ch == '\n' || ch == '\r' { ' ' } else { ch })
        .take(limit)
        .collect();
    if text.chars().nth(limit).is_some() {
        flat.push('…');
    }
    flat
}

#[cfg(test)]
mod tests {
    use super::{absolute_log_dir, init_logging, logging_status, one_line, LogLevel, LoggingError};
    use crate::config::LoggingConfig;
    use std::path::Path;

    #[test]
    fn levels_parse_case_insensitively() {
        assert_eq!(LogLevel::parse(" Warning ").expect("alias"), LogLevel::Warn);
        assert_eq!(LogLevel::parse("TRACE").expect("upper case"), LogLevel::Trace);
        assert_eq!(
            LogLevel::parse("loud"),
            Err(LoggingError::UnsupportedLevel("loud".to_string()))
        );
    }

    #[test]
    fn log_dir_must_be_non_empty_and_absolute() {
        assert_eq!(absolute_log_dir(Path::new("")), Err(LoggingError::MissingLogDir));
        assert!(matches!(
            absolute_log_dir(Path::new("var/log")),
            Err(LoggingError::RelativeLogDir(_))
        ));
    }

    #[test]
    fn unset_log_dir_leaves_file_logging_off() {
        let config = LoggingConfig {
            level: "warn".to_string(),
            log_dir: None,
        };
        assert_eq!(init_logging(&config), Ok(false));

        let bad_level = LoggingConfig {
            level: "loud".to_string(),
            log_dir: None,
        };
        assert_eq!(
            init_logging(&bad_level),
            Err(LoggingError::UnsupportedLevel("loud".to_string()))
        );
    }

    #[test]
    fn panic_text_is_kept_on_one_line() {
        assert_eq!(one_line("a\nb\rc", 10), "a b c");
        assert_eq!(one_line("abcdef", 3), "abc…");
    }

    #[test]
    fn second_init_must_match_the_running_logger() {
        let dir = tempfile::tempdir().expect("temp dir");
        let other = tempfile::tempdir().expect("temp dir");
        let config = LoggingConfig {
            level: "info".to_string(),
            log_dir: Some(dir.path().to_path_buf()),
        };

        assert_eq!(init_logging(&config), Ok(true));
        assert_eq!(init_logging(&config), Ok(true));

        let err = init_logging(&LoggingConfig {
            level: "error".to_string(),
            ..config.clone()
        })
        .expect_err("level change refused");
        assert_eq!(
            err,
            LoggingError::LevelConflict {
                active: "info",
                requested: "error",
            }
        );

        let err = init_logging(&LoggingConfig {
            log_dir: Some(other.path().to_path_buf()),
            ..config.clone()
        })
        .expect_err("directory change refused");
        assert!(matches!(err, LoggingError::DirConflict { .. }));

        let (level, active_dir) = logging_status().expect("logger running");
        assert_eq!(level, "info");
        assert_eq!(active_dir, dir.path());
    }
}
