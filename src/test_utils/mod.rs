//! Test utilities for etch
//!
//! - [`init_test_logging`] installs a tracing subscriber once per test binary
//! - [`TemplateTree`] is a temporary directory with helpers for laying out
//!   templates and reading back outputs
//!
//! # Example
//!
//! ```rust,no_run
//! use etch::test_utils::{TemplateTree, init_test_logging};
//!
//! init_test_logging(None);
//! let tree = TemplateTree::new();
//! tree.write("docs/README.etch.md", "# {{ name }}");
//! assert!(tree.path("docs/README.etch.md").exists());
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Once;
use tempfile::TempDir;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Uses `level` when given, otherwise `RUST_LOG` when set; with neither, no
/// subscriber is installed.
///
/// ```bash
/// RUST_LOG=etch=trace cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

/// A directory tree for template tests.
///
/// Owns a temporary directory that is removed on drop, unless created with
/// [`TemplateTree::at`] which wraps an existing path.
#[derive(Debug)]
pub struct TemplateTree {
    _temp: Option<TempDir>,
    root: PathBuf,
}

impl Default for TemplateTree {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateTree {
    /// Creates an empty temporary tree.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let root = temp.path().to_path_buf();
        Self {
            _temp: Some(temp),
            root,
        }
    }

    /// Wraps an existing path without taking ownership of it.
    #[must_use]
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self {
            _temp: None,
            root: root.into(),
        }
    }

    /// The tree root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of a root-relative path.
    #[must_use]
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Writes a file, creating parent directories.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    pub fn write(&self, relative: &str, contents: &str) {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        fs::write(&path, contents).expect("Failed to write test file");
    }

    /// Reads a file as text.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be read.
    #[must_use]
    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.path(relative))
            .unwrap_or_else(|e| panic!("Failed to read {relative}: {e}"))
    }
}
