//! Write a starter `etch.config.yml`.
//!
//! ```bash
//! etch init
//! etch init --path ./site
//! etch init --force
//! ```
//!
//! An existing config (`.yml` or `.yaml`) is never overwritten without
//! `--force`.

use anyhow::{Result, anyhow};
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::PathBuf;

use super::CliConfig;

/// File name written by `etch init`.
pub const STARTER_CONFIG_NAME: &str = "etch.config.yml";

const STARTER_CONFIG: &str = r#"# etch configuration
# Files named like `README.etch.md` render to `README.md` with this context.

context:
  # Static values are used as-is.
  project: my-project
  # Read from an environment variable, falling back to a default.
  # user:
  #   type: env
  #   value: USER
  #   default: someone
  # Capture the trimmed output of a shell command.
  # commit:
  #   type: shell
  #   value: git rev-parse --short HEAD
  # Convert the value with `as`: str, int, float, bool or json.
  # debug:
  #   type: env
  #   value: DEBUG
  #   default: "false"
  #   as: bool

# Gitignore-style patterns skipped while walking the tree.
exclude:
  - .git/
  - target/
  - node_modules/

# Ignore files whose patterns are also applied, relative to the root.
# ignore_files:
#   - .gitignore

# engine:
#   kind: jinja
#   keep_trailing_newline: true

# template_matcher: etch
# child_flag: "!etch:child"

# Shell commands run once before the context is resolved.
# setup:
#   - ./scripts/prepare.sh
"#;

/// Create a starter configuration file.
#[derive(Args, Debug)]
pub struct InitCommand {
    /// Directory to write the config into (defaults to current directory)
    ///
    /// Created when it does not exist.
    #[arg(short, long)]
    path: Option<PathBuf>,

    /// Overwrite an existing config
    #[arg(short, long)]
    force: bool,
}

impl InitCommand {
    /// Writes the starter config.
    ///
    /// # Errors
    ///
    /// Fails when a config already exists and `force` is off, or when the
    /// directory or file cannot be written.
    pub fn execute(self, cli: &CliConfig) -> Result<()> {
        let target_dir = self.path.unwrap_or_else(|| PathBuf::from("."));
        let config_path = target_dir.join(STARTER_CONFIG_NAME);
        let existing = [config_path.clone(), config_path.with_extension("yaml")]
            .into_iter()
            .find(|candidate| candidate.exists());

        if let Some(existing) = existing.filter(|_| !self.force) {
            return Err(anyhow!(
                "Config already exists at {}. Use --force to overwrite",
                existing.display()
            ));
        }

        if !target_dir.exists() {
            fs::create_dir_all(&target_dir)?;
        }
        fs::write(&config_path, STARTER_CONFIG)?;

        if !cli.quiet {
            println!("{} Initialized {}", "✓".green(), config_path.display());
            println!("\n{}", "Next steps:".cyan());
            println!("  Add a template such as {}", "README.etch.md".bright_white());
            println!("  Then run {} to render it", "etch".bright_white());
        }

        Ok(())
    }
}
