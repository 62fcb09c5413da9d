//! Rolling file logging bootstrap.
//!
//! # Responsibility
//! - Initialize size-rotated file logs exactly once per process.
//! - Capture panics as sanitized `event=panic_captured` lines.
//!
//! # Invariants
//! - Repeating `init_logging` with the same level and directory is a no-op.
//! - Switching level or directory after initialization is rejected.
//! - Initialization never panics.

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "datarepo";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
const MAX_LOG_FILES: usize = 5;
const MAX_PANIC_PAYLOAD_CHARS: usize = 160;

static ACTIVE: OnceCell<ActiveLogging> = OnceCell::new();
static PANIC_HOOK: OnceCell<()> = OnceCell::new();

struct ActiveLogging {
    level: &'static str,
    log_dir: PathBuf,
    _handle: LoggerHandle,
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("unsupported log level `{0}`; expected trace|debug|info|warn|error")]
    UnsupportedLevel(String),
    #[error("log_dir must be a non-empty absolute path, got `{0}`")]
    InvalidDirectory(String),
    #[error("failed to create log directory `{}`: {source}", path.display())]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to start logger: {0}")]
    Backend(#[from] flexi_logger::FlexiLoggerError),
    #[error("logging already initialized with {active}; refusing to switch to {requested}")]
    Conflict { active: String, requested: String },
}

/// Initializes logging at `level`, writing rotated files under `log_dir`.
///
/// # Errors
/// - `UnsupportedLevel` / `InvalidDirectory` for bad input.
/// - `Conflict` when already initialized with different settings.
pub fn init_logging(level: &str, log_dir: &str) -> Result<(), LoggingError> {
    let level = normalize_level(level)?;
    let log_dir = normalize_log_dir(log_dir)?;

    let active = ACTIVE.get_or_try_init(|| start_logger(level, &log_dir))?;
    if active.log_dir != log_dir {
        return Err(LoggingError::Conflict {
            active: format!("directory `{}`", active.log_dir.display()),
            requested: format!("`{}`", log_dir.display()),
        });
    }
    if active.level != level {
        return Err(LoggingError::Conflict {
            active: format!("level `{}`", active.level),
            requested: format!("`{level}`"),
        });
    }
    Ok(())
}

/// Returns `(level, log_dir)` once logging is active.
pub fn logging_status() -> Option<(&'static str, PathBuf)> {
    ACTIVE
        .get()
        .map(|active| (active.level, active.log_dir.clone()))
}

/// `debug` for debug builds, `info` otherwise.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn start_logger(level: &'static str, log_dir: &Path) -> Result<ActiveLogging, LoggingError> {
    std::fs::create_dir_all(log_dir).map_err(|source| LoggingError::CreateDirectory {
        path: log_dir.to_path_buf(),
        source,
    })?;

    let handle = Logger::try_with_str(level)?
        .log_to_file(
            FileSpec::default()
                .directory(log_dir)
                .basename(LOG_FILE_BASENAME),
        )
        .rotate(
            Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(MAX_LOG_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()?;

    install_panic_hook_once();

    info!(
        "event=logging_init module=logging status=ok level={} log_dir={} version={}",
        level,
        log_dir.display(),
        env!("CARGO_PKG_VERSION")
    );

    Ok(ActiveLogging {
        level,
        log_dir: log_dir.to_path_buf(),
        _handle: handle,
    })
}

fn normalize_level(level: &str) -> Result<&'static str, LoggingError> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(LoggingError::UnsupportedLevel(other.to_string())),
    }
}

fn normalize_log_dir(log_dir: &str) -> Result<PathBuf, LoggingError> {
    let trimmed = log_dir.trim();
    let path = Path::new(trimmed);
    if trimmed.is_empty() || !path.is_absolute() {
        return Err(LoggingError::InvalidDirectory(trimmed.to_string()));
    }
    Ok(path.to_path_buf())
}

fn install_panic_hook_once() {
    PANIC_HOOK.get_or_init(|| {
        let previous_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |panic_info| {
            let location = panic_info
                .location()
                .map(|loc| format!("{}:{}", loc.file(), loc.line()))
                .unwrap_or_else(|| "unknown".to_string());
            error!(
                "event=panic_captured module=logging status=error location={} payload={}",
                location,
                panic_payload_summary(panic_info)
            );
            previous_hook(panic_info);
        }));
    });
}

fn panic_payload_summary(info: &std::panic::PanicHookInfo<'_>) -> String {
    let payload = info
        .payload()
        .downcast_ref::<&str>()
        .map(|message| (*message).to_string())
        .or_else(|| info.payload().downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());
    sanitize_message(&payload, MAX_PANIC_PAYLOAD_CHARS)
}

fn sanitize_message(value: &str, max_chars: usize) -> String {
    let normalized = value.replace(['\n', '\r'], " ");
    let mut truncated = normalized.chars().take(max_chars).collect::<String>();
    if normalized.chars().count() > max_chars {
        truncated.push_str("...");
    }
    truncated
}

#[cfg(test)]
mod tests {
    use super::{
        init_logging, logging_status, normalize_level, normalize_log_dir, sanitize_message,
        LoggingError,
    };

    #[test]
    fn normalize_level_accepts_known_values() {
        assert_eq!(normalize_level("INFO").unwrap(), "info");
        assert_eq!(normalize_level(" warning ").unwrap(), "warn");
        assert!(matches!(
            normalize_level("verbose"),
            Err(LoggingError::UnsupportedLevel(level)) if level == "verbose"
        ));
    }

    #[test]
    fn normalize_log_dir_rejects_relative_and_empty_paths() {
        assert!(matches!(
            normalize_log_dir("logs/dev"),
            Err(LoggingError::InvalidDirectory(_))
        ));
        assert!(matches!(
            normalize_log_dir("   "),
            Err(LoggingError::InvalidDirectory(_))
        ));
    }

    #[test]
    fn sanitize_message_removes_newlines_and_truncates() {
        let sanitized = sanitize_message("line1\nline2\rline3", 8);
        assert!(!sanitized.contains('\n'));
        assert!(!sanitized.contains('\r'));
        assert!(sanitized.ends_with("..."));
    }

    #[test]
    fn init_logging_is_idempotent_and_rejects_conflicts() {
        let log_dir = tempfile::tempdir().unwrap();
        let other_dir = tempfile::tempdir().unwrap();
        let log_dir_str = log_dir.path().to_str().unwrap().to_string();
        let other_dir_str = other_dir.path().to_str().unwrap().to_string();

        init_logging("info", &log_dir_str).unwrap();
        init_logging("info", &log_dir_str).unwrap();

        assert!(matches!(
            init_logging("debug", &log_dir_str),
            Err(LoggingError::Conflict { .. })
        ));
        assert!(matches!(
            init_logging("info", &other_dir_str),
            Err(LoggingError::Conflict { .. })
        ));

        let (active_level, active_dir) = logging_status().unwrap();
        assert_eq!(active_level, "info");
        assert_eq!(active_dir, log_dir.path());
    }
}
