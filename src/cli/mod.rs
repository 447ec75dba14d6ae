//! Command-line interface for etch.
//!
//! # Commands
//!
//! - `etch [ROOT]` / `etch render [ROOT]` - render every template under ROOT
//!   (default: the current directory)
//! - `etch init` - write a starter `etch.config.yml`
//!
//! # Global Options
//!
//! - `--verbose` / `-v` - print progress lines and debug logs
//! - `--quiet` / `-q` - print nothing but errors
//!
//! `RUST_LOG` overrides the log level chosen by these flags.
//!
//! # Example
//!
//! ```bash
//! # Render the current directory with ./etch.config.yml
//! etch
//!
//! # Render ./site with a custom config, ignoring the lockfile
//! etch ./site --config ./ci/etch.config.yml --force
//! ```

mod init;
mod render;

pub use init::InitCommand;
pub use render::{RenderCommand, summary_line};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Settings derived from the global flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    /// Log filter used when `RUST_LOG` is not set
    pub log_level: String,
    /// Print progress lines
    pub verbose: bool,
    /// Suppress the summary line
    pub quiet: bool,
}

impl CliConfig {
    /// Installs the global tracing subscriber, writing to stderr.
    ///
    /// `RUST_LOG` wins over the flag-derived level. Calling this twice is
    /// harmless; the second call is ignored.
    pub fn init_logging(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.log_level));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

/// Render in-place templates across a directory tree.
#[derive(Parser, Debug)]
#[command(
    name = "etch",
    about = "Render in-place templates across a directory tree",
    version,
    args_conflicts_with_subcommands = true,
    long_about = "etch renders every file carrying the template marker (e.g. README.etch.md -> README.md) \
                  with the context defined in etch.config.yml. A lockfile (.etch.lock) records a \
                  fingerprint of each render so unchanged outputs are never rewritten."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Render options when no subcommand is given
    #[command(flatten)]
    render: RenderCommand,

    /// Enable verbose output (progress lines and debug logs)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render templates (the default command)
    Render(RenderCommand),
    /// Write a starter etch.config.yml
    Init(InitCommand),
}

impl Cli {
    /// Runs the selected command.
    ///
    /// # Errors
    ///
    /// Propagates the command's error for `main` to display.
    pub fn execute(self) -> Result<()> {
        let config = self.build_config();
        config.init_logging();

        match self.command {
            Some(Commands::Render(cmd)) => cmd.execute(&config),
            Some(Commands::Init(cmd)) => cmd.execute(&config),
            None => self.render.execute(&config),
        }
    }

    /// Derives logging and output settings from the global flags.
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "warn"
        };

        CliConfig {
            log_level: log_level.to_string(),
            verbose: self.verbose,
            quiet: self.quiet,
        }
    }
}
