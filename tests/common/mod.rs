//! Common test utilities for etch integration tests

// Not every helper is used by every test module
#![allow(dead_code)]

use assert_cmd::Command;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tempfile::TempDir;

/// A temporary project directory with a config file and templates.
///
/// The binary runs with the project as its working directory, so the default
/// `./etch.config.yml` and root `.` resolve inside it.
pub struct TestProject {
    _temp: TempDir,
    root: PathBuf,
}

impl TestProject {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let root = temp.path().to_path_buf();
        Self {
            _temp: temp,
            root,
        }
    }

    /// A project with `etch.config.yml` already written.
    pub fn with_config(config: &str) -> Self {
        let project = Self::new();
        project.write_config(config);
        project
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    pub fn write_config(&self, config: &str) {
        self.write("etch.config.yml", config);
    }

    pub fn write(&self, relative: &str, contents: &str) {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        fs::write(&path, contents).expect("Failed to write file");
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.path(relative))
            .unwrap_or_else(|e| panic!("Failed to read {relative}: {e}"))
    }

    pub fn remove(&self, relative: &str) {
        fs::remove_file(self.path(relative)).expect("Failed to remove file");
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.path(relative).exists()
    }

    /// Parsed `.etch.lock`.
    pub fn lockfile(&self) -> Value {
        serde_json::from_str(&self.read(".etch.lock")).expect("Lockfile is not valid JSON")
    }

    /// Keys of the lockfile's `files` table, sorted.
    pub fn lockfile_keys(&self) -> Vec<String> {
        self.lockfile()["files"]
            .as_object()
            .expect("Lockfile has no files table")
            .keys()
            .cloned()
            .collect()
    }

    pub fn modified(&self, relative: &str) -> SystemTime {
        fs::metadata(self.path(relative))
            .and_then(|m| m.modified())
            .expect("Failed to read modification time")
    }

    /// The etch binary, run from the project directory without colors.
    pub fn etch(&self) -> Command {
        let mut cmd = Command::cargo_bin("etch").expect("etch binary not built");
        cmd.current_dir(&self.root).env("NO_COLOR", "1").env_remove("RUST_LOG");
        cmd
    }
}
