//! Lockfile management for change detection.
//!
//! The lockfile (`.etch.lock`, at the processed root) maps each root
//! template's root-relative path to the fingerprint of its last emitted
//! render:
//!
//! ```json
//! {
//!     "version": "0.1.0",
//!     "files": {
//!         "docs/README.etch.md": 1525479220
//!     }
//! }
//! ```
//!
//! A run consults the fingerprints loaded at start-up, stages every change it
//! discovers, and applies all of them at once after the walk through
//! [`LockfileCache::apply_staged`]. Several child files can point at the same
//! root template, so an update made mid-walk would make later children compare
//! against a render whose outputs have not been written yet.
//!
//! A lockfile that cannot be trusted (missing, malformed, wrong shape, written
//! by another version) is treated as empty. That is never an error.

mod checksum;
mod io;

pub use checksum::fingerprint;
pub use io::LoadOutcome;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use crate::constants::LOCKFILE_NAME;

/// The persisted lockfile document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Lockfile {
    /// Version of etch that wrote the file
    pub version: String,
    /// Root-relative template path to render fingerprint
    pub files: BTreeMap<String, u32>,
}

impl Lockfile {
    /// Creates an empty lockfile stamped with the running version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            version: Self::current_version().to_string(),
            files: BTreeMap::new(),
        }
    }

    /// The version string written into new lockfiles.
    #[must_use]
    pub const fn current_version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}

impl Default for Lockfile {
    fn default() -> Self {
        Self::new()
    }
}

/// How the cache was initialised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheStatus {
    /// A valid lockfile was loaded
    Loaded,
    /// There was no lockfile
    Missing,
    /// A lockfile existed but was discarded
    Reset {
        /// Why it was discarded
        reason: String,
    },
    /// Force mode ignored whatever was on disk
    Forced,
}

/// The lockfile of one processed root, with staged changes.
///
/// # Examples
///
/// ```rust,no_run
/// use etch::lockfile::{LockfileCache, fingerprint};
/// use std::path::Path;
///
/// # fn example() -> anyhow::Result<()> {
/// let root = Path::new("project");
/// let (mut cache, _status) = LockfileCache::open(root, false);
///
/// let fp = fingerprint("rendered text");
/// if cache.fingerprint_of("README.etch.md") != Some(fp) {
///     cache.stage("README.etch.md", fp);
/// }
///
/// cache.apply_staged(root);
/// let modified = cache.commit()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct LockfileCache {
    path: PathBuf,
    loaded: Option<Lockfile>,
    current: Lockfile,
    staged: BTreeMap<String, u32>,
}

impl LockfileCache {
    /// Loads the lockfile at `root/.etch.lock`.
    ///
    /// With `force`, whatever is on disk is ignored and the cache starts
    /// empty, so every output is rewritten and the lockfile always commits.
    #[must_use]
    pub fn open(root: &Path, force: bool) -> (Self, CacheStatus) {
        let path = root.join(LOCKFILE_NAME);

        let (loaded, status) = if force {
            (None, CacheStatus::Forced)
        } else {
            match Lockfile::load(&path) {
                LoadOutcome::Valid(lockfile) => (Some(lockfile), CacheStatus::Loaded),
                LoadOutcome::Missing => (None, CacheStatus::Missing),
                LoadOutcome::Invalid { reason } => (None, CacheStatus::Reset { reason }),
            }
        };

        let current = loaded.clone().unwrap_or_default();
        debug!("Opened lockfile cache at {} ({status:?})", path.display());

        (
            Self {
                path,
                loaded,
                current,
                staged: BTreeMap::new(),
            },
            status,
        )
    }

    /// Path of the lockfile on disk.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fingerprint recorded for `key`, ignoring anything staged this run.
    #[must_use]
    pub fn fingerprint_of(&self, key: &str) -> Option<u32> {
        self.current.files.get(key).copied()
    }

    /// Stages a fingerprint update for `key`. Later stages for the same key win.
    pub fn stage(&mut self, key: impl Into<String>, fingerprint: u32) {
        let key = key.into();
        trace!("Staging fingerprint {fingerprint} for {key}");
        self.staged.insert(key, fingerprint);
    }

    /// Number of updates waiting for [`Self::apply_staged`].
    #[must_use]
    pub fn staged_len(&self) -> usize {
        self.staged.len()
    }

    /// Prunes entries whose template no longer exists under `root`, then
    /// merges every staged update.
    pub fn apply_staged(&mut self, root: &Path) {
        self.current.files.retain(|key, _| {
            let exists = root.join(key).exists();
            if !exists {
                debug!("Pruning stale lockfile entry {key}");
            }
            exists
        });

        self.current.files.append(&mut self.staged);
    }

    /// Whether the in-memory lockfile differs from what was loaded.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.loaded.as_ref() != Some(&self.current)
    }

    /// The lockfile as it will be committed.
    #[must_use]
    pub const fn lockfile(&self) -> &Lockfile {
        &self.current
    }

    /// Writes the lockfile if it changed. Returns whether it was written.
    ///
    /// # Errors
    ///
    /// Fails if the lockfile cannot be written.
    pub fn commit(&self) -> Result<bool> {
        if !self.is_modified() {
            debug!("Lockfile unchanged, not writing {}", self.path.display());
            return Ok(false);
        }

        self.current.save(&self.path)?;
        debug!("Wrote lockfile {} ({} entries)", self.path.display(), self.current.files.len());
        Ok(true)
    }
}
