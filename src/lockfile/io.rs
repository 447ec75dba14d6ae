//! Loading and saving the lockfile document.
//!
//! Loading never fails: a missing file, unreadable bytes, malformed JSON, the
//! wrong shape or a foreign version string all come back as a [`LoadOutcome`]
//! the caller can report and then ignore.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::utils::fs::atomic_write;

use super::Lockfile;

/// Result of reading a lockfile from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A well-formed lockfile written by this version.
    Valid(Lockfile),
    /// No lockfile exists yet.
    Missing,
    /// The file exists but cannot be trusted.
    Invalid {
        /// Why it was discarded
        reason: String,
    },
}

impl Lockfile {
    /// Reads and validates the lockfile at `path`.
    ///
    /// The document must be a JSON object with exactly the `version` and
    /// `files` keys, every fingerprint must be an unsigned 32-bit integer, and
    /// `version` must equal the running tool's version.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use etch::lockfile::{LoadOutcome, Lockfile};
    /// use std::path::Path;
    ///
    /// match Lockfile::load(Path::new(".etch.lock")) {
    ///     LoadOutcome::Valid(lock) => println!("{} entries", lock.files.len()),
    ///     LoadOutcome::Missing => println!("first run"),
    ///     LoadOutcome::Invalid { reason } => println!("resetting: {reason}"),
    /// }
    /// ```
    #[must_use]
    pub fn load(path: &Path) -> LoadOutcome {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return LoadOutcome::Missing,
            Err(e) => {
                return LoadOutcome::Invalid {
                    reason: format!("could not read {}: {e}", path.display()),
                };
            }
        };

        let lockfile: Self = match serde_json::from_slice(&bytes) {
            Ok(lockfile) => lockfile,
            Err(e) => {
                return LoadOutcome::Invalid {
                    reason: format!("could not parse {}: {e}", path.display()),
                };
            }
        };

        if lockfile.version != Self::current_version() {
            return LoadOutcome::Invalid {
                reason: format!(
                    "lockfile version {} does not match etch version {}",
                    lockfile.version,
                    Self::current_version()
                ),
            };
        }

        debug!("Loaded lockfile {} with {} entries", path.display(), lockfile.files.len());
        LoadOutcome::Valid(lockfile)
    }

    /// Serializes the lockfile with 4-space indentation and a trailing newline.
    ///
    /// Keys are sorted because `files` is a `BTreeMap`, so equal lockfiles
    /// always produce byte-identical documents.
    ///
    /// # Errors
    ///
    /// Fails only if serialization itself fails.
    pub fn to_json(&self) -> Result<String> {
        let mut buffer = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        self.serialize(&mut serializer).context("Failed to serialize lockfile")?;

        let mut text = String::from_utf8(buffer).context("Lockfile serialized to invalid UTF-8")?;
        text.push('\n');
        Ok(text)
    }

    /// Writes the lockfile to `path` atomically.
    ///
    /// # Errors
    ///
    /// Fails if serialization or the atomic write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = self.to_json()?;
        atomic_write(path, text.as_bytes())
            .with_context(|| format!("Failed to write lockfile: {}", path.display()))
    }
}
