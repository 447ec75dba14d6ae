//! MiniJinja render engine.
//!
//! Renders Jinja2-syntax templates with configurable delimiters. Templates
//! can `{% include %}`, `{% import %}` or `{% extends %}` other files by their
//! path relative to the processed root.

use minijinja::syntax::SyntaxConfig;
use minijinja::{AutoEscape, Environment, ErrorKind, UndefinedBehavior, path_loader};
use std::path::Path;
use tracing::trace;

use super::error::flatten_error_chain;
use super::{EngineOptions, RenderEngine, TemplateError};
use crate::config::ResolvedContext;

/// Jinja2-compatible engine backed by `minijinja`.
#[derive(Debug)]
pub struct JinjaEngine {
    env: Environment<'static>,
}

impl JinjaEngine {
    /// Builds an engine from `options`, loading included templates from `root`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::InvalidOptions`] if the delimiters conflict
    /// (for example identical start markers for blocks and variables).
    pub fn new(options: &EngineOptions, root: &Path) -> Result<Self, TemplateError> {
        let mut env = Environment::new();
        env.set_keep_trailing_newline(options.keep_trailing_newline);
        env.set_trim_blocks(options.trim_blocks);
        env.set_lstrip_blocks(options.lstrip_blocks);
        env.set_undefined_behavior(if options.allow_undefined {
            UndefinedBehavior::Lenient
        } else {
            UndefinedBehavior::Strict
        });
        env.set_auto_escape_callback(|_| AutoEscape::None);

        if options.has_custom_delimiters() {
            let delimiters = options.delimiters();
            let syntax = SyntaxConfig::builder()
                .block_delimiters(delimiters.block_start, delimiters.block_end)
                .variable_delimiters(delimiters.variable_start, delimiters.variable_end)
                .comment_delimiters(delimiters.comment_start, delimiters.comment_end)
                .build()
                .map_err(|e| TemplateError::InvalidOptions {
                    message: flatten_error_chain(&e),
                })?;
            env.set_syntax(syntax);
        }

        env.set_loader(path_loader(root));

        Ok(Self {
            env,
        })
    }
}

impl RenderEngine for JinjaEngine {
    fn render(&self, source: &str, context: &ResolvedContext) -> Result<String, TemplateError> {
        trace!("Rendering {} bytes with minijinja", source.len());
        self.env.render_str(source, context).map_err(|e| {
            let message = flatten_error_chain(&e);
            if e.kind() == ErrorKind::SyntaxError {
                TemplateError::Syntax {
                    message,
                }
            } else {
                TemplateError::Render {
                    message,
                }
            }
        })
    }

    fn name(&self) -> &'static str {
        "jinja"
    }
}
