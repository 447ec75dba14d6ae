//! Core types for etch
//!
//! The error taxonomy shared by every module lives here:
//!
//! - [`EtchError`] - one variant per failure mode, grouped by [`ErrorCategory`]
//! - [`ErrorContext`] - an error plus optional details and a suggestion, for
//!   colored CLI output
//! - [`user_friendly_error`] - turns any `anyhow::Error` into an [`ErrorContext`]
//!
//! # Examples
//!
//! ```rust
//! use etch::core::{EtchError, ErrorCategory, user_friendly_error};
//!
//! let error = EtchError::RootIsFile { path: "notes.etch.md".into() };
//! assert_eq!(error.category(), ErrorCategory::Process);
//!
//! let friendly = user_friendly_error(error.into());
//! assert!(friendly.suggestion.is_some());
//! ```

pub mod error;

pub use error::{ErrorCategory, ErrorContext, EtchError, Result, user_friendly_error};
