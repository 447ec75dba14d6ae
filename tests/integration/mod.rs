//! Integration test suite for etch
//!
//! End-to-end tests that run the `etch` binary against temporary project
//! directories.
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **cli**: argument handling, `init`, exit codes and error display
//! - **context**: static, environment and shell context variables
//! - **lockfile**: idempotence, corruption recovery and stale pruning
//! - **render**: in-place and child templates, exclusion, engines

#[path = "../common/mod.rs"]
mod common;

mod cli;
mod context;
mod lockfile;
mod render;
