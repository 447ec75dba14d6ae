//! Global constants used throughout etch.
//!
//! Defaults for the configuration document, the lockfile name and the
//! progress cadence of the processor live here so the CLI, config loader and
//! processor agree on them.

/// Name of the lockfile written at the processed root.
pub const LOCKFILE_NAME: &str = ".etch.lock";

/// Default configuration path, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "./etch.config.yml";

/// Default template marker. Matched as a dot-delimited filename component.
pub const DEFAULT_TEMPLATE_MATCHER: &str = "etch";

/// Default first-line flag identifying a child file.
pub const DEFAULT_CHILD_FLAG: &str = "!etch:child";

/// The processor prints a progress line every this many inspected files.
pub const PROGRESS_INTERVAL: usize = 100;

/// Raw values longer than this are truncated in coercion error messages.
pub const MAX_VALUE_IN_ERROR: usize = 60;

/// Maximum edit distance for "did you mean" suggestions on unknown config keys.
pub const MAX_KEY_SUGGESTION_DISTANCE: usize = 3;
