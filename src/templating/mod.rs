//! Pluggable template rendering.
//!
//! The processor only needs one capability from a template engine: turn a
//! template's source text plus the resolved context into output text. That
//! capability is the [`RenderEngine`] trait. Two engines ship with etch:
//!
//! - [`JinjaEngine`] (default, `kind: jinja`): Jinja2 syntax via `minijinja`,
//!   with configurable delimiters, a strict or lenient undefined policy, and
//!   `{% include %}` resolved relative to the processed root.
//! - [`TeraEngine`] (`kind: tera`): Tera syntax with its fixed delimiters.
//!
//! Engines are configured through [`EngineOptions`], the `engine` (or `jinja`)
//! key of the configuration document:
//!
//! ```yaml
//! engine:
//!   kind: jinja
//!   variable_start: "[["
//!   variable_end: "]]"
//!   keep_trailing_newline: true
//!   trim_blocks: true
//!   allow_undefined: false
//! ```
//!
//! Templates are never HTML-escaped.

mod error;
mod jinja;
mod tera_engine;

pub use error::TemplateError;
pub use jinja::JinjaEngine;
pub use tera_engine::TeraEngine;

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::config::ResolvedContext;

/// Renders template source text against a resolved context.
pub trait RenderEngine {
    /// Renders `source` with every context entry bound as a global.
    ///
    /// # Errors
    ///
    /// Returns the engine's syntax or evaluation failure unchanged.
    fn render(&self, source: &str, context: &ResolvedContext) -> Result<String, TemplateError>;

    /// Short engine name for logs.
    fn name(&self) -> &'static str;
}

/// Which engine renders templates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// MiniJinja (Jinja2 syntax)
    #[default]
    #[serde(alias = "minijinja", alias = "jinja2")]
    Jinja,
    /// Tera
    Tera,
}

/// Engine configuration from the `engine` / `jinja` config key.
///
/// Delimiter keys also accept the Jinja2 `*_string` spelling, for example
/// `variable_start_string`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineOptions {
    /// Engine to use
    pub kind: EngineKind,
    /// Block start delimiter, `{%` by default
    #[serde(alias = "block_start_string")]
    pub block_start: Option<String>,
    /// Block end delimiter, `%}` by default
    #[serde(alias = "block_end_string")]
    pub block_end: Option<String>,
    /// Variable start delimiter, `{{` by default
    #[serde(alias = "variable_start_string")]
    pub variable_start: Option<String>,
    /// Variable end delimiter, `}}` by default
    #[serde(alias = "variable_end_string")]
    pub variable_end: Option<String>,
    /// Comment start delimiter, `{#` by default
    #[serde(alias = "comment_start_string")]
    pub comment_start: Option<String>,
    /// Comment end delimiter, `#}` by default
    #[serde(alias = "comment_end_string")]
    pub comment_end: Option<String>,
    /// Keep a single trailing newline at the end of the template
    pub keep_trailing_newline: bool,
    /// Render undefined variables as empty instead of failing
    pub allow_undefined: bool,
    /// Drop the first newline after a block tag
    pub trim_blocks: bool,
    /// Strip whitespace from the start of a line up to a block tag
    pub lstrip_blocks: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            kind: EngineKind::Jinja,
            block_start: None,
            block_end: None,
            variable_start: None,
            variable_end: None,
            comment_start: None,
            comment_end: None,
            keep_trailing_newline: true,
            allow_undefined: false,
            trim_blocks: false,
            lstrip_blocks: false,
        }
    }
}

/// The full delimiter set, with defaults filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiters {
    /// Block start
    pub block_start: String,
    /// Block end
    pub block_end: String,
    /// Variable start
    pub variable_start: String,
    /// Variable end
    pub variable_end: String,
    /// Comment start
    pub comment_start: String,
    /// Comment end
    pub comment_end: String,
}

impl EngineOptions {
    /// Whether any delimiter was overridden.
    #[must_use]
    pub const fn has_custom_delimiters(&self) -> bool {
        self.block_start.is_some()
            || self.block_end.is_some()
            || self.variable_start.is_some()
            || self.variable_end.is_some()
            || self.comment_start.is_some()
            || self.comment_end.is_some()
    }

    /// Resolves the delimiter set, falling back to Jinja2 defaults.
    #[must_use]
    pub fn delimiters(&self) -> Delimiters {
        let pick = |value: &Option<String>, default: &str| {
            value.clone().unwrap_or_else(|| default.to_string())
        };
        Delimiters {
            block_start: pick(&self.block_start, "{%"),
            block_end: pick(&self.block_end, "%}"),
            variable_start: pick(&self.variable_start, "{{"),
            variable_end: pick(&self.variable_end, "}}"),
            comment_start: pick(&self.comment_start, "{#"),
            comment_end: pick(&self.comment_end, "#}"),
        }
    }
}

/// Builds the engine selected by `options`.
///
/// `root` is the processed root; the Jinja engine resolves includes from it.
///
/// # Errors
///
/// Returns [`TemplateError::InvalidOptions`] if the options cannot be honoured
/// by the selected engine.
///
/// # Examples
///
/// ```rust,no_run
/// use etch::config::ResolvedContext;
/// use etch::templating::{EngineOptions, create_engine};
/// use std::path::Path;
///
/// # fn example() -> anyhow::Result<()> {
/// let engine = create_engine(&EngineOptions::default(), Path::new("."))?;
/// let text = engine.render("{{ 1 + 1 }}", &ResolvedContext::default())?;
/// assert_eq!(text, "2");
/// # Ok(())
/// # }
/// ```
pub fn create_engine(
    options: &EngineOptions,
    root: &Path,
) -> Result<Box<dyn RenderEngine>, TemplateError> {
    let engine: Box<dyn RenderEngine> = match options.kind {
        EngineKind::Jinja => Box::new(JinjaEngine::new(options, root)?),
        EngineKind::Tera => Box::new(TeraEngine::new(options)?),
    };
    debug!("Using the {} render engine", engine.name());
    Ok(engine)
}
