//! Tera render engine.
//!
//! Tera uses fixed `{{ }}` / `{% %}` / `{# #}` delimiters, always errors on
//! undefined variables and only controls whitespace with `{%-` / `-%}`.
//! Options asking for anything else are rejected when the engine is built.

use tera::{Context as TeraContext, Tera};
use tracing::trace;

use super::error::flatten_error_chain;
use super::{EngineOptions, RenderEngine, TemplateError};
use crate::config::ResolvedContext;

/// Engine backed by `tera`, rendering each template as a one-off.
#[derive(Debug, Clone)]
pub struct TeraEngine {
    keep_trailing_newline: bool,
}

impl TeraEngine {
    /// Builds a Tera engine.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::InvalidOptions`] when custom delimiters,
    /// `allow_undefined`, `trim_blocks` or `lstrip_blocks` are requested.
    pub fn new(options: &EngineOptions) -> Result<Self, TemplateError> {
        if options.has_custom_delimiters() {
            return Err(TemplateError::InvalidOptions {
                message: "the tera engine does not support custom delimiters".to_string(),
            });
        }
        if options.allow_undefined {
            return Err(TemplateError::InvalidOptions {
                message: "the tera engine does not support allow_undefined".to_string(),
            });
        }
        if options.trim_blocks || options.lstrip_blocks {
            return Err(TemplateError::InvalidOptions {
                message: "the tera engine does not support trim_blocks or lstrip_blocks, \
                          use {%- and -%} instead"
                    .to_string(),
            });
        }

        Ok(Self {
            keep_trailing_newline: options.keep_trailing_newline,
        })
    }
}

impl RenderEngine for TeraEngine {
    fn render(&self, source: &str, context: &ResolvedContext) -> Result<String, TemplateError> {
        trace!("Rendering {} bytes with tera", source.len());

        let tera_context =
            TeraContext::from_serialize(context).map_err(|e| TemplateError::Render {
                message: flatten_error_chain(&e),
            })?;

        let mut rendered = Tera::one_off(source, &tera_context, false).map_err(|e| {
            let message = flatten_error_chain(&e);
            if message.starts_with("Failed to parse") {
                TemplateError::Syntax {
                    message,
                }
            } else {
                TemplateError::Render {
                    message,
                }
            }
        })?;

        if !self.keep_trailing_newline && rendered.ends_with('\n') {
            rendered.pop();
            if rendered.ends_with('\r') {
                rendered.pop();
            }
        }

        Ok(rendered)
    }

    fn name(&self) -> &'static str {
        "tera"
    }
}
