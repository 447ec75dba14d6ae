//! Gitignore-style file selection.
//!
//! An [`IgnoreSpec`] is compiled from `exclude` pattern lines and the
//! contents of any configured ignore files. [`IgnoreSpec::select`] walks a
//! root and lazily yields every file that is *not* ignored, as a path relative
//! to the root.
//!
//! # Pattern Syntax
//!
//! Patterns follow `.gitignore` rules:
//!
//! - `*.log` ignores matching files at any depth
//! - `build/` ignores a directory and everything below it
//! - `/top.txt` is anchored to the root
//! - `**/gen/*.rs` matches across directory levels
//! - `!keep.log` re-includes a previously ignored file
//!
//! Ignored directories are pruned during the walk, so nothing below them is
//! ever read.
//!
//! # Ordering
//!
//! Entries are yielded depth-first with siblings sorted by file name, which
//! makes the selection order stable across runs and platforms.
//!
//! # Examples
//!
//! ```rust,no_run
//! use etch::pattern::IgnoreSpec;
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! let root = Path::new("project");
//! let spec = IgnoreSpec::builder(root)
//!     .patterns(["target/", "*.bak"])
//!     .ignore_file(".gitignore")
//!     .build()?;
//!
//! for relative in spec.select(root) {
//!     println!("{}", relative?.display());
//! }
//! # Ok(())
//! # }
//! ```

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::core::{EtchError, Result};
use crate::utils::platform::resolve_against;

/// Collects pattern lines and ignore files before compiling an [`IgnoreSpec`].
#[derive(Debug, Clone)]
pub struct IgnoreSpecBuilder {
    root: PathBuf,
    patterns: Vec<String>,
    ignore_files: Vec<PathBuf>,
}

impl IgnoreSpecBuilder {
    /// Adds exclude pattern lines. Blank lines and `#` comments are skipped.
    #[must_use]
    pub fn patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.patterns.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Adds one gitignore-style file. Relative paths resolve against the root.
    #[must_use]
    pub fn ignore_file(mut self, path: impl AsRef<Path>) -> Self {
        self.ignore_files.push(resolve_against(&self.root, path.as_ref()));
        self
    }

    /// Adds several gitignore-style files.
    #[must_use]
    pub fn ignore_files<I, P>(self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        paths.into_iter().fold(self, |builder, path| builder.ignore_file(path))
    }

    /// Reads the ignore files and compiles every pattern line.
    ///
    /// # Errors
    ///
    /// - [`EtchError::IgnoreFileNotFound`] if an ignore file does not exist
    /// - [`EtchError::InvalidIgnorePattern`] if a line does not compile
    pub fn build(self) -> Result<IgnoreSpec> {
        let mut lines = Vec::new();

        for file in &self.ignore_files {
            if !file.is_file() {
                return Err(EtchError::IgnoreFileNotFound {
                    path: file.display().to_string(),
                });
            }
            let contents =
                std::fs::read_to_string(file).map_err(|e| EtchError::fs("read", file, e))?;
            debug!("Read ignore file {}", file.display());
            lines.extend(contents.lines().map(str::to_string));
        }

        lines.extend(self.patterns);

        let mut builder = GitignoreBuilder::new(&self.root);
        let mut count = 0;
        for line in &lines {
            let trimmed = line.trim_end();
            if trimmed.trim().is_empty() || trimmed.starts_with('#') {
                continue;
            }
            builder.add_line(None, trimmed).map_err(|e| EtchError::InvalidIgnorePattern {
                pattern: trimmed.to_string(),
                reason: e.to_string(),
            })?;
            count += 1;
        }

        let matcher = builder.build().map_err(|e| EtchError::InvalidIgnorePattern {
            pattern: lines.join("\n"),
            reason: e.to_string(),
        })?;

        debug!("Compiled ignore spec with {count} pattern line(s)");
        Ok(IgnoreSpec {
            matcher,
        })
    }
}

/// A compiled set of gitignore-style exclusions.
#[derive(Debug, Clone)]
pub struct IgnoreSpec {
    matcher: Gitignore,
}

impl IgnoreSpec {
    /// Starts building a spec whose anchored patterns are relative to `root`.
    #[must_use]
    pub fn builder(root: impl Into<PathBuf>) -> IgnoreSpecBuilder {
        IgnoreSpecBuilder {
            root: root.into(),
            patterns: Vec::new(),
            ignore_files: Vec::new(),
        }
    }

    /// Whether a root-relative path is ignored.
    #[must_use]
    pub fn is_ignored(&self, relative: &Path, is_dir: bool) -> bool {
        self.matcher.matched(relative, is_dir).is_ignore()
    }

    /// Lazily yields every non-ignored file under `root`, relative to `root`.
    ///
    /// Ignored directories are not descended into. Walk errors (for example an
    /// unreadable directory) are yielded as [`EtchError::FileSystemError`].
    pub fn select<'a>(&'a self, root: &'a Path) -> impl Iterator<Item = Result<PathBuf>> + 'a {
        WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| {
                if entry.depth() == 0 {
                    return true;
                }
                let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
                let ignored = self.is_ignored(relative, entry.file_type().is_dir());
                if ignored {
                    trace!("Ignoring {}", relative.display());
                }
                !ignored
            })
            .filter_map(move |entry| match entry {
                Ok(entry) if entry.file_type().is_file() => Some(Ok(entry
                    .path()
                    .strip_prefix(root)
                    .unwrap_or(entry.path())
                    .to_path_buf())),
                Ok(_) => None,
                Err(e) => {
                    let path = e.path().map_or_else(|| root.to_path_buf(), Path::to_path_buf);
                    let source = e
                        .into_io_error()
                        .unwrap_or_else(|| std::io::Error::other("directory walk failed"));
                    Some(Err(EtchError::fs("walk", &path, source)))
                }
            })
    }
}
