//! The `render` command.
//!
//! Loads the configuration, checks the root, runs `setup`, resolves the
//! context, builds the render engine and hands everything to the
//! [`Processor`]. No user command runs when the root is unusable.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::debug;

use super::CliConfig;
use crate::config::{Config, ContextResolver};
use crate::constants::DEFAULT_CONFIG_PATH;
use crate::core::EtchError;
use crate::processor::{ProcessOptions, ProcessOutput, Processor, validate_root};
use crate::templating::create_engine;

/// Render every template under a root directory.
#[derive(Args, Debug, Clone)]
pub struct RenderCommand {
    /// Directory to search for templates
    #[arg(default_value = ".")]
    root: PathBuf,

    /// Path to the YAML config file, relative to the current directory
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Ignore the lockfile and rewrite every output
    #[arg(short, long)]
    force: bool,
}

impl RenderCommand {
    /// A command rendering `root` with the config at `config`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, config: impl Into<PathBuf>, force: bool) -> Self {
        Self {
            root: root.into(),
            config: config.into(),
            force,
        }
    }

    /// The root directory.
    #[must_use]
    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    /// The config file path as given.
    #[must_use]
    pub fn config_path(&self) -> &PathBuf {
        &self.config
    }

    /// Whether force mode is on.
    #[must_use]
    pub const fn force(&self) -> bool {
        self.force
    }

    /// Runs the command and prints the summary line.
    ///
    /// # Errors
    ///
    /// Any config, process or render error.
    pub fn execute(self, cli: &CliConfig) -> Result<()> {
        let started = Instant::now();
        let output = self.run(cli.verbose)?;
        if !cli.quiet {
            println!("{}", summary_line(&output, started.elapsed()));
        }
        Ok(())
    }

    /// Runs the whole pipeline and returns the processor's summary.
    ///
    /// With `verbose`, progress lines go to stdout.
    ///
    /// # Errors
    ///
    /// Any config, process or render error.
    pub fn run(&self, verbose: bool) -> Result<ProcessOutput> {
        let config = Config::load(&self.config)
            .with_context(|| format!("Failed to load config from {}", self.config.display()))?;
        validate_root(&self.root)?;

        let resolver = ContextResolver::new();
        resolver.run_setup(&config.setup)?;
        let context = resolver.resolve(&config.context)?;
        debug!("Resolved {} context var(s)", context.len());

        let engine = create_engine(&config.engine, &self.root).map_err(|e| {
            EtchError::InvalidConfigValue {
                key: "engine".to_string(),
                reason: e.to_string(),
            }
        })?;

        let options = ProcessOptions::from_config(&config, self.force);
        let printer = |line: &str| {
            if verbose {
                println!("{line}");
            }
        };

        let output = Processor::new(&self.root, &context, engine.as_ref())
            .with_options(options)
            .with_printer(printer)
            .run()?;
        Ok(output)
    }
}

/// `N template(s) written, M identical. Lockfile modified|unchanged. <elapsed>`
#[must_use]
pub fn summary_line(output: &ProcessOutput, elapsed: Duration) -> String {
    let written = format!("{} template(s) written", output.written.len());
    let written = if output.written.is_empty() {
        written.normal()
    } else {
        written.green()
    };
    let lockfile = if output.lockfile_modified { "modified" } else { "unchanged" };

    format!(
        "{written}, {} identical. Lockfile {lockfile}. {}",
        output.identical.len(),
        format!("{elapsed:.2?}").dimmed()
    )
}
