//! Windows-to-WSL path translation
//!
//! When the configured rsync binary is invoked through a WSL shim
//! (e.g. `wsl rsync` or `C:\Windows\System32\wsl.exe`), every local
//! filesystem path handed to rsync must be a WSL mount path, not a
//! Windows drive-letter path. `C:\Users\sam` becomes `/mnt/c/Users/sam`.

use regex::Regex;
use std::sync::LazyLock;

/// Matches a drive-letter absolute path: `C:\...` or `C:/...`.
#[allow(clippy::unwrap_used)] // the pattern is a compile-time constant
static WINDOWS_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z]):[/\\]").unwrap());

/// True when the resolved rsync binary goes through a WSL shim,
/// detected by a case-insensitive substring match on the name.
pub fn is_wsl_binary(binary: &str) -> bool {
    binary.to_lowercase().contains("wsl")
}

/// Rewrite a drive-letter absolute path to its WSL mount equivalent.
///
/// `<Letter>:\...` and `<Letter>:/...` become `/mnt/<letter>/...` with
/// backslashes converted to forward slashes. Anything else — including
/// a path that has already been translated — passes through unchanged,
/// so the rewrite is idempotent.
pub fn translate_windows_path(path: &str) -> String {
    let Some(caps) = WINDOWS_PATH.captures(path) else {
        return path.to_string();
    };
    let drive = caps[1].to_lowercase();
    // Keep the separator after the colon so `/mnt/c` + `/Users/...`
    let rest = path[2..].replace('\\', "/");
    format!("/mnt/{drive}{rest}")
}
