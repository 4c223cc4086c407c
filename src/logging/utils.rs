//! Log file location, timestamps and ANSI stripping for the file log.
use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::LazyLock;

use chrono::{SecondsFormat, Utc};
use regex::Regex;

/// Name of the log file inside the cache directory.
const LOG_FILE_NAME: &str = "gitemplate.log";

/// CSI sequences (`ESC [ params final`) and two-byte `ESC X` escapes.
static ANSI_ESCAPE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\x1b(?:\[[0-?]*[ -/]*[@-~]|[@-_])").ok());

/// Remove terminal escape sequences so the file log stays plain text.
pub(super) fn strip_ansi(s: &str) -> String {
    ANSI_ESCAPE
        .as_ref()
        .map_or_else(|| s.to_string(), |re| re.replace_all(s, "").into_owned())
}

/// Path of `gitemplate.log`, creating its directory on demand.
///
/// The directory is `$XDG_CACHE_HOME/gitemplate`, then
/// `$HOME/.cache/gitemplate`, then `gitemplate` under the system temp dir.
pub(super) fn log_file_path() -> Option<PathBuf> {
    let base = env::var_os("XDG_CACHE_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| {
            env::var_os("HOME")
                .filter(|v| !v.is_empty())
                .map(|home| PathBuf::from(home).join(".cache"))
        })
        .unwrap_or_else(env::temp_dir);
    let dir = base.join("gitemplate");
    fs::create_dir_all(&dir).ok()?;
    Some(dir.join(LOG_FILE_NAME))
}

/// RFC 3339 UTC timestamp for the run header, e.g. `2024-05-01T09:30:00Z`.
pub(super) fn run_stamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// `HH:MM:SS` UTC prefix for each log line.
pub(super) fn clock() -> String {
    Utc::now().format("%H:%M:%S").to_string()
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn strip_ansi_removes_colours() {
        assert_eq!(strip_ansi("\x1b[31mERROR\x1b[0m clone"), "ERROR clone");
        assert_eq!(
            strip_ansi("\x1b[1;34m==>\x1b[0m \x1b[1mReplacing macros\x1b[0m"),
            "==> Replacing macros"
        );
    }

    #[test]
    fn strip_ansi_removes_git_progress_codes() {
        assert_eq!(strip_ansi("Cloning\x1b[K done"), "Cloning done");
        assert_eq!(strip_ansi("\x1b[2Jtop"), "top");
        assert_eq!(strip_ansi("\x1bMup"), "up");
    }

    #[test]
    fn strip_ansi_leaves_plain_text() {
        assert_eq!(strip_ansi(""), "");
        assert_eq!(strip_ansi("gitemplate_name [x]"), "gitemplate_name [x]");
    }

    #[test]
    fn log_file_lives_under_xdg_cache_home() {
        let tmp = tempfile::tempdir().unwrap();
        let _lock = crate::logging::TEST_ENV_MUTEX
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        // SAFETY: Protected by TEST_ENV_MUTEX; removed before the lock is released.
        #[allow(unsafe_code)]
        unsafe {
            env::set_var("XDG_CACHE_HOME", tmp.path());
        }
        let path = log_file_path();
        #[allow(unsafe_code)]
        unsafe {
            env::remove_var("XDG_CACHE_HOME");
        }

        assert_eq!(path, Some(tmp.path().join("gitemplate").join("gitemplate.log")));
        assert!(tmp.path().join("gitemplate").is_dir());
    }

    #[test]
    fn run_stamp_is_rfc3339_utc() {
        let s = run_stamp();
        assert_eq!(s.len(), 20, "{s}");
        assert_eq!(&s[10..11], "T");
        assert!(s.ends_with('Z'), "{s}");
    }

    #[test]
    fn clock_is_hours_minutes_seconds() {
        let s = clock();
        assert_eq!(s.len(), 8, "{s}");
        assert_eq!(s.matches(':').count(), 2, "{s}");
    }
}
