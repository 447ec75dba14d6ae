//! Error handling for etch
//!
//! Every failure etch can raise is a variant of [`EtchError`]. Variants are
//! grouped into categories ([`ErrorCategory`]) that decide how the failure is
//! reported:
//!
//! - **Config**: problems with the configuration document or with resolving
//!   its context variables (unknown keys, missing environment variables,
//!   failing shell commands, coercion failures).
//! - **Process**: problems with the tree being processed (root is a file,
//!   missing ignore files, dangling child pointers).
//! - **Render**: template syntax or evaluation failures reported by the
//!   render engine, wrapped unchanged.
//! - **Io**: filesystem failures while reading templates or writing outputs.
//!
//! All of these abort a run. Lockfile corruption is deliberately absent: it is
//! recovered locally by [`crate::lockfile::LockfileCache`] and never surfaces
//! as an error.
//!
//! At the CLI boundary errors travel as [`anyhow::Error`]. [`user_friendly_error`]
//! downcasts them back to [`EtchError`] and attaches details and a suggestion
//! for display.

use colored::Colorize;
use std::fmt;
use thiserror::Error;

use crate::templating::TemplateError;

/// Convenience alias used throughout the library.
pub type Result<T, E = EtchError> = std::result::Result<T, E>;

/// Broad classification of an [`EtchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Configuration document or context resolution failure.
    Config,
    /// Failure tied to the processed directory tree.
    Process,
    /// Render engine failure.
    Render,
    /// Filesystem failure.
    Io,
}

/// The error type for all etch operations.
#[derive(Error, Debug)]
pub enum EtchError {
    /// Configuration file not found at the given path (or its yml/yaml twin).
    #[error("Could not find config file at {path}")]
    ConfigNotFound {
        /// The path that was requested
        path: String,
    },

    /// Configuration file does not carry a YAML extension.
    #[error("Config file must be a YAML file, with 'yml'/'yaml' ext, not {path}")]
    InvalidConfigExtension {
        /// The offending path
        path: String,
    },

    /// The configuration document could not be parsed.
    #[error("Invalid config file syntax in {file}: {reason}")]
    ConfigParseError {
        /// Path (or a description) of the document
        file: String,
        /// Parser message
        reason: String,
    },

    /// A top-level configuration key is not recognised.
    #[error("Unknown config key: '{key}'")]
    UnknownConfigKey {
        /// The unrecognised key
        key: String,
        /// Closest recognised key, if any is close enough
        suggestion: Option<String>,
    },

    /// A recognised configuration key holds a value of the wrong shape.
    #[error("Invalid value for config key '{key}': {reason}")]
    InvalidConfigValue {
        /// The key
        key: String,
        /// What was wrong with it
        reason: String,
    },

    /// A context variable definition is malformed.
    #[error("Invalid context variable '{name}': {reason}")]
    InvalidContextVariable {
        /// The variable name
        name: String,
        /// What was wrong with it
        reason: String,
    },

    /// An `env` context variable referenced an unset variable without a default.
    #[error(
        "Could not find environment variable '{env_name}' for requested context var '{variable}'"
    )]
    MissingEnvironmentVariable {
        /// Environment variable that was looked up
        env_name: String,
        /// Context variable that requested it
        variable: String,
    },

    /// A shell command exited unsuccessfully or could not be spawned.
    #[error("Command '{command}' failed: {reason}")]
    ShellCommandFailed {
        /// The command line
        command: String,
        /// Exit status or spawn failure description
        reason: String,
        /// Captured standard error, possibly empty
        stderr: String,
    },

    /// The final command of a `shell` variable printed nothing.
    #[error("Implicit empty result: final command '{command}' for context var '{variable}' printed nothing")]
    EmptyShellOutput {
        /// The command line
        command: String,
        /// The context variable being resolved
        variable: String,
    },

    /// A value could not be coerced to the requested kind.
    #[error("Could not convert value '{value}' to type '{kind}': {reason}")]
    CoercionFailed {
        /// Rendered form of the raw value (truncated)
        value: String,
        /// Target kind name
        kind: String,
        /// Why the conversion failed
        reason: String,
    },

    /// The root does not exist.
    #[error("Root path {path} does not exist")]
    RootNotFound {
        /// The root path
        path: String,
    },

    /// The root is a file rather than a directory.
    #[error("Root path {path} is a file. Please specify a directory to search instead.")]
    RootIsFile {
        /// The root path
        path: String,
    },

    /// A configured ignore file does not exist.
    #[error("Could not find git-style ignore file at {path} specified")]
    IgnoreFileNotFound {
        /// The ignore file path
        path: String,
    },

    /// An ignore pattern could not be compiled.
    #[error("Invalid ignore pattern '{pattern}': {reason}")]
    InvalidIgnorePattern {
        /// The pattern line
        pattern: String,
        /// Compiler message
        reason: String,
    },

    /// The template marker is not a valid regular expression.
    #[error("Invalid template matcher '{pattern}': {reason}")]
    InvalidTemplateMatcher {
        /// The marker pattern
        pattern: String,
        /// Regex compiler message
        reason: String,
    },

    /// A child file points at a template that does not exist.
    #[error(
        "Invalid child template at {child}. Could not find source template at {target}"
    )]
    ChildTemplateNotFound {
        /// The child file
        child: String,
        /// The pointer target as written in the child
        target: String,
    },

    /// A root template resolved to a location outside the processed root.
    #[error("Root template {path} referenced by {child} is outside the processed root {root}")]
    TemplateOutsideRoot {
        /// Resolved template path
        path: String,
        /// The file referencing it
        child: String,
        /// The processed root
        root: String,
    },

    /// A template failed to render.
    #[error("Failed to render template {template}")]
    Render {
        /// Root template being rendered
        template: String,
        /// Engine error, unchanged
        #[source]
        source: TemplateError,
    },

    /// A filesystem operation failed.
    #[error("File system error: {operation} {path}")]
    FileSystemError {
        /// What was being attempted
        operation: String,
        /// The path involved
        path: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Pre-formatted message, used when re-wrapping errors for display.
    #[error("{message}")]
    Other {
        /// The message
        message: String,
    },
}

impl EtchError {
    /// Category used for reporting and tests.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigNotFound { .. }
            | Self::InvalidConfigExtension { .. }
            | Self::ConfigParseError { .. }
            | Self::UnknownConfigKey { .. }
            | Self::InvalidConfigValue { .. }
            | Self::InvalidContextVariable { .. }
            | Self::MissingEnvironmentVariable { .. }
            | Self::ShellCommandFailed { .. }
            | Self::EmptyShellOutput { .. }
            | Self::CoercionFailed { .. }
            | Self::InvalidTemplateMatcher { .. } => ErrorCategory::Config,
            Self::RootNotFound { .. }
            | Self::RootIsFile { .. }
            | Self::IgnoreFileNotFound { .. }
            | Self::InvalidIgnorePattern { .. }
            | Self::ChildTemplateNotFound { .. }
            | Self::TemplateOutsideRoot { .. } => ErrorCategory::Process,
            Self::Render { .. } => ErrorCategory::Render,
            Self::FileSystemError { .. } | Self::IoError(_) | Self::Other { .. } => {
                ErrorCategory::Io
            }
        }
    }

    /// Shorthand for a [`EtchError::FileSystemError`].
    pub fn fs(
        operation: impl Into<String>,
        path: &std::path::Path,
        source: std::io::Error,
    ) -> Self {
        Self::FileSystemError {
            operation: operation.into(),
            path: path.display().to_string(),
            source,
        }
    }
}

/// Error wrapper carrying optional details and a suggestion for CLI display.
///
/// ```rust,no_run
/// use etch::core::{EtchError, ErrorContext};
///
/// let context = ErrorContext::new(EtchError::RootIsFile { path: "a.txt".into() })
///     .with_suggestion("Pass the directory containing a.txt instead");
/// context.display();
/// ```
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: EtchError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Wrap an error with no details or suggestion.
    #[must_use]
    pub const fn new(error: EtchError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion, shown in green.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details, shown in yellow.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error, details and suggestion to stderr with terminal colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] with actionable suggestions.
///
/// Recognises [`EtchError`] anywhere in the chain and tailors the suggestion to
/// the variant. Anything else is reported with its full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let chain_message = format_chain(&error);

    if let Some(etch_error) = error.chain().find_map(|e| e.downcast_ref::<EtchError>()) {
        return create_error_context(etch_error, &chain_message);
    }

    ErrorContext::new(EtchError::Other {
        message: chain_message,
    })
}

fn format_chain(error: &anyhow::Error) -> String {
    let mut message = error.to_string();
    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }
    message
}

/// Rebuild an owned copy of the error for display.
///
/// Sources that are not `Clone` (IO errors, engine errors) are flattened into
/// the details text.
fn create_error_context(error: &EtchError, chain_message: &str) -> ErrorContext {
    let display_error = match error {
        EtchError::UnknownConfigKey { key, suggestion } => EtchError::UnknownConfigKey {
            key: key.clone(),
            suggestion: suggestion.clone(),
        },
        other => EtchError::Other {
            message: other.to_string(),
        },
    };

    let context = match error {
        EtchError::UnknownConfigKey { suggestion, .. } => {
            let context = ErrorContext::new(display_error).with_details(
                "Recognised keys are: context, exclude, ignore_files, engine (or jinja), \
                 template_matcher, child_flag, setup",
            );
            match suggestion {
                Some(s) => context.with_suggestion(format!("Did you mean '{s}'?")),
                None => context,
            }
        }
        EtchError::ConfigNotFound { .. } => ErrorContext::new(display_error)
            .with_suggestion("Run 'etch init' to create a starter etch.config.yml, or pass --config"),
        EtchError::InvalidConfigExtension { .. } => ErrorContext::new(display_error)
            .with_suggestion("Rename the config file to end in .yml or .yaml"),
        EtchError::MissingEnvironmentVariable { env_name, .. } => {
            ErrorContext::new(display_error).with_suggestion(format!(
                "Export {env_name} before running etch, or add a 'default' to the variable definition"
            ))
        }
        EtchError::ShellCommandFailed { stderr, .. } => {
            let context = ErrorContext::new(display_error)
                .with_suggestion("Run the command manually to see why it fails");
            if stderr.trim().is_empty() {
                context
            } else {
                context.with_details(format!("stderr:\n{}", stderr.trim_end()))
            }
        }
        EtchError::EmptyShellOutput { .. } => ErrorContext::new(display_error)
            .with_details("A script printing nothing almost always indicates a scripting mistake")
            .with_suggestion("Make sure the last command prints the value to stdout"),
        EtchError::CoercionFailed { .. } => ErrorContext::new(display_error).with_suggestion(
            "Check the 'as' key of the variable; bool accepts true/false/yes/no/y/n/1/0",
        ),
        EtchError::RootIsFile { .. } | EtchError::RootNotFound { .. } => {
            ErrorContext::new(display_error)
                .with_suggestion("Pass the directory that contains your templates as the root")
        }
        EtchError::ChildTemplateNotFound { .. } => ErrorContext::new(display_error)
            .with_suggestion("Child pointer paths are resolved relative to the processed root"),
        EtchError::IgnoreFileNotFound { .. } => ErrorContext::new(display_error)
            .with_suggestion("Ignore file paths are resolved relative to the processed root"),
        EtchError::Render { .. } => ErrorContext::new(display_error)
            .with_details(chain_message.to_string())
            .with_suggestion(
                "Check template syntax: variables use {{ var }}, blocks use {% %}, comments use {# #} \
                 (or the delimiters configured under 'engine')",
            ),
        _ => {
            let context = ErrorContext::new(display_error);
            if chain_message.contains("Caused by") {
                context.with_details(chain_message.to_string())
            } else {
                context
            }
        }
    };

    context
}
