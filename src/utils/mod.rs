//! Cross-platform utilities
//!
//! - [`fs`] - atomic writes for the lockfile and in-place output writes
//! - [`platform`] - shell selection and path normalization

pub mod fs;
pub mod platform;

pub use fs::{atomic_write, ensure_dir, write_output};
pub use platform::{get_shell_command, is_windows, normalize_path_for_storage};
