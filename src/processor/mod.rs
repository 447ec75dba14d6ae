//! Template processing: walk, render, compare, write.
//!
//! [`Processor::run`] processes one directory tree in a single synchronous
//! pass:
//!
//! 1. Validate the root and compile the ignore spec (missing ignore files
//!    fail here, before anything is read).
//! 2. Load the lockfile. An untrustworthy lockfile is reset and reported
//!    through the printer.
//! 3. Walk every non-ignored file, locate templates and render them.
//! 4. Compare each render's fingerprint with the *loaded* lockfile. An output
//!    that exists and matches is identical; anything else is staged.
//! 5. After the walk, prune lockfile entries for deleted templates and apply
//!    the staged fingerprints in one step.
//! 6. Write every pending output, then the lockfile if it changed.
//!
//! Any error aborts the run before step 6, so a failing template never leaves
//! half of a run on disk.
//!
//! # Examples
//!
//! ```rust,no_run
//! use etch::config::ResolvedContext;
//! use etch::processor::{ProcessOptions, Processor};
//! use etch::templating::{EngineOptions, create_engine};
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! let root = Path::new("project");
//! let engine = create_engine(&EngineOptions::default(), root)?;
//! let context = ResolvedContext::default();
//!
//! let output = Processor::new(root, &context, engine.as_ref())
//!     .with_options(ProcessOptions::default())
//!     .with_printer(|line| println!("{line}"))
//!     .run()?;
//!
//! println!("{} written, {} identical", output.written.len(), output.identical.len());
//! # Ok(())
//! # }
//! ```

mod locator;

pub use locator::{LocatedTemplate, TemplateKind, TemplateLocator, TemplateMarker};

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::{Config, ResolvedContext};
use crate::constants::{
    DEFAULT_CHILD_FLAG, DEFAULT_TEMPLATE_MATCHER, LOCKFILE_NAME, PROGRESS_INTERVAL,
};
use crate::core::{EtchError, Result};
use crate::lockfile::{CacheStatus, LockfileCache, fingerprint};
use crate::pattern::IgnoreSpec;
use crate::templating::RenderEngine;
use crate::utils::fs::write_output;

/// Options controlling a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOptions {
    /// Gitignore-style exclude patterns
    pub exclude: Vec<String>,
    /// Gitignore-style files, relative paths resolved against the root
    pub ignore_files: Vec<PathBuf>,
    /// Filename marker regex fragment
    pub template_matcher: String,
    /// Leading token of child files
    pub child_flag: String,
    /// Ignore the lockfile and rewrite every output
    pub force: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            exclude: Vec::new(),
            ignore_files: Vec::new(),
            template_matcher: DEFAULT_TEMPLATE_MATCHER.to_string(),
            child_flag: DEFAULT_CHILD_FLAG.to_string(),
            force: false,
        }
    }
}

impl ProcessOptions {
    /// Options taken from a configuration document.
    #[must_use]
    pub fn from_config(config: &Config, force: bool) -> Self {
        Self {
            exclude: config.exclude.clone(),
            ignore_files: config.ignore_files.clone(),
            template_matcher: config.template_matcher.clone(),
            child_flag: config.child_flag.clone(),
            force,
        }
    }
}

/// A rendered template awaiting comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateRecord {
    /// The discovered file
    pub source_path: PathBuf,
    /// Where the render goes
    pub output_path: PathBuf,
    /// The file that was rendered
    pub root_template_path: PathBuf,
    /// Rendered text
    pub rendered_text: String,
    /// Fingerprint of `rendered_text`
    pub fingerprint: u32,
}

/// Summary of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Outputs that were (re)written
    pub written: Vec<PathBuf>,
    /// Outputs left alone because they already matched
    pub identical: Vec<PathBuf>,
    /// Every root template rendered this run
    pub root_templates: BTreeSet<PathBuf>,
    /// Whether the lockfile was written
    pub lockfile_modified: bool,
}

type Writer<'a> = Box<dyn FnMut(&Path, &str) -> std::io::Result<()> + 'a>;
type Printer<'a> = Box<dyn FnMut(&str) + 'a>;

/// Checks that `root` exists and is a directory.
///
/// # Errors
///
/// Returns [`EtchError::RootNotFound`] or [`EtchError::RootIsFile`].
pub fn validate_root(root: &Path) -> Result<()> {
    if !root.exists() {
        return Err(EtchError::RootNotFound {
            path: root.display().to_string(),
        });
    }
    if !root.is_dir() {
        return Err(EtchError::RootIsFile {
            path: root.display().to_string(),
        });
    }
    Ok(())
}

/// Processes one directory tree.
pub struct Processor<'a> {
    root: PathBuf,
    context: &'a ResolvedContext,
    engine: &'a dyn RenderEngine,
    options: ProcessOptions,
    writer: Writer<'a>,
    printer: Printer<'a>,
}

impl std::fmt::Debug for Processor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Processor")
            .field("root", &self.root)
            .field("engine", &self.engine.name())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<'a> Processor<'a> {
    /// A processor for `root` with default options, writing outputs to disk
    /// and printing nothing.
    pub fn new(
        root: impl Into<PathBuf>,
        context: &'a ResolvedContext,
        engine: &'a dyn RenderEngine,
    ) -> Self {
        Self {
            root: root.into(),
            context,
            engine,
            options: ProcessOptions::default(),
            writer: Box::new(write_output),
            printer: Box::new(|_| {}),
        }
    }

    /// Replaces the options.
    #[must_use]
    pub fn with_options(mut self, options: ProcessOptions) -> Self {
        self.options = options;
        self
    }

    /// Replaces the output writer.
    #[must_use]
    pub fn with_writer(mut self, writer: impl FnMut(&Path, &str) -> std::io::Result<()> + 'a) -> Self {
        self.writer = Box::new(writer);
        self
    }

    /// Sets the printer receiving progress lines.
    #[must_use]
    pub fn with_printer(mut self, printer: impl FnMut(&str) + 'a) -> Self {
        self.printer = Box::new(printer);
        self
    }

    /// Renders a located template, reusing the render of a root template
    /// already seen this run.
    fn render(
        &self,
        located: &LocatedTemplate,
        renders: &mut BTreeMap<String, (String, u32)>,
    ) -> Result<TemplateRecord> {
        let (rendered_text, fp) = match renders.get(&located.lock_key) {
            Some(cached) => cached.clone(),
            None => {
                let text = self.engine.render(&located.template_text, self.context).map_err(
                    |source| EtchError::Render {
                        template: located.root_template_path.display().to_string(),
                        source,
                    },
                )?;
                let fp = fingerprint(&text);
                renders.insert(located.lock_key.clone(), (text.clone(), fp));
                (text, fp)
            }
        };

        Ok(TemplateRecord {
            source_path: located.source_path.clone(),
            output_path: located.output_path.clone(),
            root_template_path: located.root_template_path.clone(),
            rendered_text,
            fingerprint: fp,
        })
    }

    /// Runs the whole pipeline.
    ///
    /// # Errors
    ///
    /// Any config, process, render or IO error aborts the run before any
    /// output or the lockfile is written.
    pub fn run(mut self) -> Result<ProcessOutput> {
        validate_root(&self.root)?;

        let marker = TemplateMarker::new(&self.options.template_matcher)?;
        let locator = TemplateLocator::new(&self.root, marker, &self.options.child_flag)?;
        let ignore = IgnoreSpec::builder(&self.root)
            .patterns(self.options.exclude.iter().cloned())
            .ignore_files(&self.options.ignore_files)
            .build()?;

        let (mut cache, status) = LockfileCache::open(&self.root, self.options.force);
        if let CacheStatus::Reset {
            reason,
        } = &status
        {
            warn!("Discarding lockfile: {reason}");
            (self.printer)("Invalid lockfile. Resetting...");
        }

        let mut output = ProcessOutput::default();
        let mut pending: Vec<(PathBuf, String)> = Vec::new();
        let mut renders: BTreeMap<String, (String, u32)> = BTreeMap::new();

        for (index, relative) in ignore.select(&self.root).enumerate() {
            let relative = relative?;
            if index % PROGRESS_INTERVAL == 0 {
                (self.printer)(&format!(
                    "Checked {index} non-ignored files. Currently checking {}...",
                    relative.display()
                ));
            }

            if relative.file_name().is_some_and(|name| name == LOCKFILE_NAME) {
                continue;
            }

            let Some(located) = locator.locate(&relative)? else {
                continue;
            };

            match located.kind {
                TemplateKind::Child => (self.printer)(&format!(
                    "Found child at {}. Root template: {}. Compiling...",
                    located.source_path.display(),
                    located.root_template_path.display()
                )),
                TemplateKind::InPlace => (self.printer)(&format!(
                    "Found in-place template at {}. Compiling...",
                    located.source_path.display()
                )),
            }

            let record = self.render(&located, &mut renders)?;
            output.root_templates.insert(record.root_template_path.clone());

            if record.output_path.exists()
                && cache.fingerprint_of(&located.lock_key) == Some(record.fingerprint)
            {
                debug!("{} is up to date", record.output_path.display());
                output.identical.push(record.output_path);
                continue;
            }

            cache.stage(located.lock_key.clone(), record.fingerprint);
            pending.push((record.output_path, record.rendered_text));
        }

        cache.apply_staged(&self.root);

        for (path, text) in pending {
            (self.printer)(&format!("Writing compiled template to {}.", path.display()));
            (self.writer)(&path, &text).map_err(|e| EtchError::fs("write", &path, e))?;
            output.written.push(path);
        }

        output.lockfile_modified = cache.commit().map_err(|e| {
            EtchError::fs("write", cache.path(), std::io::Error::other(format!("{e:#}")))
        })?;

        info!(
            "{} template(s) written, {} identical, lockfile {}",
            output.written.len(),
            output.identical.len(),
            if output.lockfile_modified { "modified" } else { "unchanged" }
        );
        Ok(output)
    }
}
