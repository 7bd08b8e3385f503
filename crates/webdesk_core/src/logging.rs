//! Core logging bootstrap and safety policy.
//!
//! # Responsibility
//! - Initialize file-based rolling logs exactly once per process.
//! - Emit stable, metadata-only diagnostic events from core.
//!
//! # Invariants
//! - Logging init is idempotent for the same directory and level.
//! - Logging initialization must not panic.
//! - Re-initialization with a different directory or level is rejected.

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "webdesk";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
const MAX_LOG_FILES: usize = 5;
const MAX_PANIC_PAYLOAD_CHARS: usize = 160;

static LOGGING_STATE: OnceCell<LoggingState> = OnceCell::new();
static PANIC_HOOK_INSTALLED: OnceCell<()> = OnceCell::new();

struct LoggingState {
    level: &'static str,
    log_dir: PathBuf,
    _logger: LoggerHandle,
}

impl LoggingState {
    fn matches(&self, level: &str, log_dir: &Path) -> Result<(), String> {
        if self.log_dir != log_dir {
            return Err(format!(
                "logging already initialized at `{}`; refusing to switch to `{}`",
                self.log_dir.display(),
                log_dir.display()
            ));
        }
        if self.level != level {
            return Err(format!(
                "logging already initialized with level `{}`; refusing to switch to `{}`",
                self.level, level
            ));
        }
        Ok(())
    }
}

/// Initializes core logging with level and directory.
///
/// Returns `Ok(())` when logging is active, or a human-readable error string
/// when initialization fails.
///
/// # Errors
/// - Returns an error when `level` is unsupported.
/// - Returns an error when `log_dir` is empty, non-absolute, or cannot be
///   created.
/// - Returns an error when logger backend setup fails.
pub fn init_logging(level: &str, log_dir: &str) -> Result<(), String> {
    let level = normalize_level(level)?;
    let log_dir = normalize_log_dir(log_dir)?;

    if let Some(state) = LOGGING_STATE.get() {
        return state.matches(level, &log_dir);
    }

    let init_dir = log_dir.clone();
    let state = LOGGING_STATE.get_or_try_init(|| -> Result<LoggingState, String> {
        std::fs::create_dir_all(&init_dir).map_err(|err| {
            format!(
                "failed to create log directory `{}`: {err}",
                init_dir.display()
            )
        })?;

        let logger = Logger::try_with_str(level)
            .map_err(|err| format!("invalid log level `{level}`: {err}"))?
            .log_to_file(
                FileSpec::default()
                    .directory(init_dir.as_path())
                    .basename(LOG_FILE_BASENAME),
            )
            .rotate(
                Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
                Naming::Numbers,
                Cleanup::KeepLogFiles(MAX_LOG_FILES),
            )
            .write_mode(WriteMode::BufferAndFlush)
            .append()
            // Format: [YYYY-MM-DD HH:MM:SS.ffffff TZ] LEVEL [module] file:line: message
            .format_for_files(flexi_logger::detailed_format)
            .start()
            .map_err(|err| format!("failed to start logger: {err}"))?;

        install_panic_hook_once();

        info!(
            "event=app_start module=core status=ok platform={} build_mode={} version={}",
            std::env::consts::OS,
            build_mode(),
            env!("CARGO_PKG_VERSION")
        );
        info!(
            "event=core_init module=core status=ok level={level} log_dir={}",
            init_dir.display()
        );

        Ok(LoggingState {
            level,
            log_dir: init_dir,
            _logger: logger,
        })
    })?;

    state.matches(level, &log_dir)
}

/// Returns `(level, log_dir)` when logging is active, `None` otherwise.
pub fn logging_status() -> Option<(&'static str, PathBuf)> {
    LOGGING_STATE
        .get()
        .map(|state| (state.level, state.log_dir.clone()))
}

/// Returns the default log level for the current build mode.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn normalize_level(level: &str) -> Result<&'static str, String> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(format!(
            "unsupported log level `{other}`; expected trace|debug|info|warn|error"
        )),
    }
}

fn normalize_log_dir(log_dir: &str) -> Result<PathBuf, String> {
    let trimmed = log_dir.trim();
    if trimmed.is_empty() {
        return Err("log_dir cannot be empty".to_string());
    }
    let path = Path::new(trimmed);
    if !path.is_absolute() {
        return Err(format!("log_dir must be an absolute path, got `{trimmed}`"));
    }
    Ok(path.to_path_buf())
}

fn build_mode() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "release"
    }
}

fn install_panic_hook_once() {
    if PANIC_HOOK_INSTALLED.get().is_some() {
        return;
    }

    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        // Panic payloads can carry user text; cap and strip newlines first.
        let payload = panic_payload_summary(panic_info);
        error!(
            "event=panic_captured module=core status=error location={location} payload={payload}"
        );
        previous_hook(panic_info);
    }));

    let _ = PANIC_HOOK_INSTALLED.set(());
}

fn panic_payload_summary(info: &std::panic::PanicHookInfo<'_>) -> String {
    let payload = if let Some(message) = info.payload().downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = info.payload().downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    };

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
        default_log_level, init_logging, logging_status, normalize_level, normalize_log_dir,
        sanitize_message,
    };
    use std::path::PathBuf;
    use uuid::Uuid;

    // Not tempfile: the global logger handle keeps its file open for the
    // whole process, so the directory must outlive every test.
    fn fresh_log_dir() -> PathBuf {
        std::env::temp_dir().join(format!("webdesk-log-test-{}", Uuid::new_v4()))
    }

    #[test]
    fn level_names_normalize_case_whitespace_and_aliases() {
        for (given, want) in [
            ("TRACE", "trace"),
            ("Debug", "debug"),
            ("  info  ", "info"),
            ("warning", "warn"),
            ("warn", "warn"),
            ("error", "error"),
        ] {
            assert_eq!(
                normalize_level(given).expect("known level should normalize"),
                want,
                "input {given:?}"
            );
        }
        assert!(normalize_level("verbose").is_err());
        assert!(normalize_level("").is_err());
    }

    #[test]
    fn log_dir_must_be_a_non_empty_absolute_path() {
        assert!(normalize_log_dir("   ").is_err());
        assert!(normalize_log_dir("relative/logs").is_err());

        let absolute = fresh_log_dir();
        let parsed = normalize_log_dir(absolute.to_str().expect("utf-8 temp path"))
            .expect("absolute path should be accepted");
        assert_eq!(parsed, absolute);
    }

    #[test]
    fn sanitize_flattens_linebreaks_and_caps_length() {
        let long = sanitize_message("first\nsecond\rthird", 7);
        assert_eq!(long, "first s...");

        let short = sanitize_message("ok", 7);
        assert_eq!(short, "ok");
    }

    #[test]
    fn default_level_tracks_build_mode() {
        let expected = if cfg!(debug_assertions) { "debug" } else { "info" };
        assert_eq!(default_log_level(), expected);
    }

    // One test owns the process-global init: OnceCell state leaks across
    // #[test] functions, so re-init and conflict cases must share a setup.
    #[test]
    fn repeated_init_keeps_first_config_and_refuses_changes() {
        let chosen = fresh_log_dir();
        let chosen_str = chosen.to_str().expect("utf-8 temp path");

        init_logging("info", chosen_str).expect("initial setup should succeed");
        init_logging("INFO", chosen_str).expect("re-init with equivalent config should pass");

        assert!(init_logging("error", chosen_str).is_err());

        let other = fresh_log_dir();
        assert!(init_logging("info", other.to_str().expect("utf-8 temp path")).is_err());

        let (level, dir) = logging_status().expect("logging should report active state");
        assert_eq!((level, dir), ("info", chosen));
    }
}
