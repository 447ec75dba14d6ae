//! Render engine errors.

use thiserror::Error;

/// Failure reported by a [`super::RenderEngine`].
///
/// Messages are the engine's own, flattened with their cause chain so they
/// survive being wrapped in [`crate::core::EtchError::Render`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// The template source could not be parsed
    #[error("Template syntax error: {message}")]
    Syntax {
        /// Engine message
        message: String,
    },

    /// The template parsed but failed while evaluating
    #[error("Template render error: {message}")]
    Render {
        /// Engine message
        message: String,
    },

    /// The engine options are not usable with the selected engine
    #[error("Invalid engine options: {message}")]
    InvalidOptions {
        /// What was wrong
        message: String,
    },
}

/// Joins an error with every `source()` below it, separated by `: `.
pub(crate) fn flatten_error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut current = error.source();
    while let Some(cause) = current {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        current = cause.source();
    }
    message
}
