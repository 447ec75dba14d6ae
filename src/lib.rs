//! etch - in-place template rendering
//!
//! etch walks a directory tree, finds files whose names carry a template
//! marker (`README.etch.md`, `config.etch`) and renders each one next to
//! itself with the marker removed (`README.md`, `config`). A context built
//! from `etch.config.yml` feeds every template.
//!
//! # Architecture Overview
//!
//! A run is a straight pipeline:
//!
//! 1. [`config`] loads the YAML document and resolves the context: static
//!    values, environment variables and shell command output, each with an
//!    optional type coercion
//! 2. [`templating`] builds the render engine (minijinja by default, Tera on
//!    request) from the engine options
//! 3. [`pattern`] walks the root in sorted order, skipping excluded paths
//! 4. [`processor`] locates templates, follows child pointers to their root
//!    template, renders, and writes changed outputs
//! 5. [`lockfile`] records a fingerprint of every render in `.etch.lock` so
//!    unchanged outputs are left alone on the next run
//!
//! ## Child templates
//!
//! A template whose contents start with the child flag (`!etch:child`) is a
//! pointer. The rest of its first line names the root template to render in
//! its place:
//!
//! ```text
//! services/api/Dockerfile.etch      !etch:child templates/Dockerfile.etch
//! services/worker/Dockerfile.etch   !etch:child templates/Dockerfile.etch
//! ```
//!
//! Both children render `templates/Dockerfile.etch` once and write it to
//! their own `Dockerfile`.
//!
//! # Core Modules
//!
//! - [`cli`] - the `etch` command line
//! - [`config`] - config parsing and context resolution
//! - [`constants`] - file names and defaults
//! - [`core`] - the error taxonomy and user-facing error display
//! - [`lockfile`] - the `.etch.lock` fingerprint cache
//! - [`pattern`] - exclusion rules and the sorted tree walk
//! - [`processor`] - template discovery and the render loop
//! - [`templating`] - render engine abstraction
//! - [`utils`] - file system and path helpers
//!
//! # Example
//!
//! ```rust,no_run
//! use etch::config::{Config, ContextResolver};
//! use etch::processor::{ProcessOptions, Processor};
//! use etch::templating::create_engine;
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! let root = Path::new(".");
//! let config = Config::load(Path::new("./etch.config.yml"))?;
//! let context = ContextResolver::new().resolve(&config.context)?;
//! let engine = create_engine(&config.engine, root)?;
//!
//! let output = Processor::new(root, &context, engine.as_ref())
//!     .with_options(ProcessOptions::from_config(&config, false))
//!     .run()?;
//! println!("{} written", output.written.len());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod lockfile;
pub mod pattern;
pub mod processor;
pub mod templating;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
