//! Platform-specific helpers
//!
//! Shell selection for `shell` context variables and `setup` commands, and
//! path normalization for lockfile keys.

use std::path::{Path, PathBuf};

/// Checks if the current platform is Windows.
#[must_use]
pub const fn is_windows() -> bool {
    cfg!(windows)
}

/// Returns the platform shell and the flag that executes a command string.
///
/// - Windows: `("cmd", "/C")`
/// - Unix-like: `("sh", "-c")`
///
/// ```rust,no_run
/// use etch::utils::platform::get_shell_command;
/// use std::process::Command;
///
/// # fn example() -> anyhow::Result<()> {
/// let (shell, flag) = get_shell_command();
/// let output = Command::new(shell).arg(flag).arg("git rev-parse HEAD").output()?;
/// # Ok(())
/// # }
/// ```
#[must_use]
pub const fn get_shell_command() -> (&'static str, &'static str) {
    if is_windows() {
        ("cmd", "/C")
    } else {
        ("sh", "-c")
    }
}

/// Normalizes a path for storage in the lockfile.
///
/// Separators always become `/` so a lockfile written on Windows matches one
/// written on Unix. Extended-length prefixes produced by `canonicalize()` on
/// Windows are stripped.
///
/// ```rust,no_run
/// use etch::utils::platform::normalize_path_for_storage;
/// use std::path::Path;
///
/// assert_eq!(normalize_path_for_storage(Path::new("docs\\README.md")), "docs/README.md");
/// ```
#[must_use]
pub fn normalize_path_for_storage<P: AsRef<Path>>(path: P) -> String {
    let path_str = path.as_ref().to_string_lossy();

    let cleaned = if let Some(stripped) = path_str.strip_prefix(r"\\?\UNC\") {
        format!("//{stripped}")
    } else if let Some(stripped) = path_str.strip_prefix(r"\\?\") {
        stripped.to_string()
    } else {
        path_str.to_string()
    };

    cleaned.replace('\\', "/")
}

/// Resolves `path` against `base` unless it is already absolute.
#[must_use]
pub fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
