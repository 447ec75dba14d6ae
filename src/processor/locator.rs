//! Template discovery: which files are templates, what they render from and
//! where their output goes.
//!
//! A file is a template when its name carries the marker as a dot-delimited
//! component. The marker is removed to get the output name:
//!
//! | File               | Output       |
//! |--------------------|--------------|
//! | `README.etch.md`   | `README.md`  |
//! | `.etch.env`        | `.env`       |
//! | `Makefile.etch`    | `Makefile`   |
//! | `notes.etcher.txt` | not a template |
//!
//! A template whose trimmed contents start with the child flag is a *child*:
//! the rest of its contents is a path to the *root template* that is actually
//! rendered. Relative pointer paths resolve against the processed root.
//! Everything else renders its own contents in place.

use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::trace;

use crate::core::{EtchError, Result};
use crate::utils::platform::{normalize_path_for_storage, resolve_against};

/// Compiled filename marker.
#[derive(Debug, Clone)]
pub struct TemplateMarker {
    middle: Regex,
    end: Regex,
}

impl TemplateMarker {
    /// Compiles a marker. `pattern` is a regular expression fragment matched
    /// as a whole dot-delimited filename component.
    ///
    /// # Errors
    ///
    /// Returns [`EtchError::InvalidTemplateMatcher`] if the pattern does not compile.
    pub fn new(pattern: &str) -> Result<Self> {
        let compile = |source: String| {
            Regex::new(&source).map_err(|e| EtchError::InvalidTemplateMatcher {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })
        };
        Ok(Self {
            middle: compile(format!(r"\.(?:{pattern})\."))?,
            end: compile(format!(r"\.(?:{pattern})$"))?,
        })
    }

    /// Output file name for `file_name`, or `None` if it is not a template.
    ///
    /// A mid-name marker wins over a trailing one and only the first
    /// occurrence is removed.
    ///
    /// ```rust
    /// use etch::processor::TemplateMarker;
    ///
    /// let marker = TemplateMarker::new("etch").unwrap();
    /// assert_eq!(marker.output_name("test.etch.txt").as_deref(), Some("test.txt"));
    /// assert_eq!(marker.output_name("test.etch").as_deref(), Some("test"));
    /// assert_eq!(marker.output_name("test.etcher.txt"), None);
    /// ```
    #[must_use]
    pub fn output_name(&self, file_name: &str) -> Option<String> {
        let renamed = if self.middle.is_match(file_name) {
            self.middle.replace(file_name, ".").into_owned()
        } else if self.end.is_match(file_name) {
            self.end.replace(file_name, "").into_owned()
        } else {
            return None;
        };

        if renamed.is_empty() || renamed == "." {
            return None;
        }
        Some(renamed)
    }
}

/// How a template gets its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateKind {
    /// Renders its own contents
    InPlace,
    /// Renders the root template it points at
    Child,
}

/// A discovered template, ready to render.
#[derive(Debug, Clone)]
pub struct LocatedTemplate {
    /// The file that was discovered
    pub source_path: PathBuf,
    /// Where the render is written
    pub output_path: PathBuf,
    /// The file whose text is rendered
    pub root_template_path: PathBuf,
    /// Lockfile key: `root_template_path` relative to the root, `/`-separated
    pub lock_key: String,
    /// In-place or child
    pub kind: TemplateKind,
    /// Raw text of the root template
    pub template_text: String,
}

/// Classifies files under one root.
#[derive(Debug)]
pub struct TemplateLocator {
    root: PathBuf,
    canonical_root: PathBuf,
    marker: TemplateMarker,
    child_flag: String,
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| EtchError::fs("read", path, e))
}

impl TemplateLocator {
    /// Creates a locator for `root`.
    ///
    /// # Errors
    ///
    /// Fails if the root cannot be canonicalized.
    pub fn new(root: &Path, marker: TemplateMarker, child_flag: &str) -> Result<Self> {
        let canonical_root = root.canonicalize().map_err(|e| EtchError::fs("resolve", root, e))?;
        Ok(Self {
            root: root.to_path_buf(),
            canonical_root,
            marker,
            child_flag: child_flag.to_string(),
        })
    }

    /// Inspects one root-relative file.
    ///
    /// Returns `Ok(None)` when the file is not a template.
    ///
    /// # Errors
    ///
    /// - [`EtchError::ChildTemplateNotFound`] if a child points at a missing file
    /// - [`EtchError::TemplateOutsideRoot`] if a child points outside the root
    /// - [`EtchError::FileSystemError`] if a file cannot be read
    pub fn locate(&self, relative: &Path) -> Result<Option<LocatedTemplate>> {
        let Some(file_name) = relative.file_name().map(|n| n.to_string_lossy().into_owned())
        else {
            return Ok(None);
        };
        let Some(output_name) = self.marker.output_name(&file_name) else {
            return Ok(None);
        };

        let source_path = self.root.join(relative);
        let output_path = source_path.with_file_name(output_name);
        let contents = read_text(&source_path)?;

        let trimmed = contents.trim();
        if let Some(pointer) = trimmed.strip_prefix(&self.child_flag) {
            let pointer = pointer.trim();
            let (root_template_path, lock_key) = self.resolve_pointer(&source_path, pointer)?;
            trace!("{} is a child of {}", source_path.display(), root_template_path.display());
            let template_text = read_text(&root_template_path)?;

            return Ok(Some(LocatedTemplate {
                source_path,
                output_path,
                root_template_path,
                lock_key,
                kind: TemplateKind::Child,
                template_text,
            }));
        }

        trace!("{} is an in-place template", source_path.display());
        Ok(Some(LocatedTemplate {
            root_template_path: source_path.clone(),
            source_path,
            output_path,
            lock_key: normalize_path_for_storage(relative),
            kind: TemplateKind::InPlace,
            template_text: contents,
        }))
    }

    fn resolve_pointer(&self, child: &Path, pointer: &str) -> Result<(PathBuf, String)> {
        let not_found = || EtchError::ChildTemplateNotFound {
            child: child.display().to_string(),
            target: pointer.to_string(),
        };

        if pointer.is_empty() {
            return Err(not_found());
        }

        let target = resolve_against(&self.root, Path::new(pointer));
        if !target.is_file() {
            return Err(not_found());
        }

        let canonical =
            target.canonicalize().map_err(|e| EtchError::fs("resolve", &target, e))?;
        let relative = canonical.strip_prefix(&self.canonical_root).map_err(|_| {
            EtchError::TemplateOutsideRoot {
                path: target.display().to_string(),
                child: child.display().to_string(),
                root: self.root.display().to_string(),
            }
        })?;

        Ok((self.root.join(relative), normalize_path_for_storage(relative)))
    }
}
