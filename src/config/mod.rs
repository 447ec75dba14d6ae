//! Configuration management for etch
//!
//! A run is configured by one YAML document, `etch.config.yml` by default:
//!
//! ```yaml
//! context:
//!   project: etch
//!   commit:
//!     type: shell
//!     value: git rev-parse --short HEAD
//!
//! exclude:
//!   - target/
//!   - "*.bak"
//! ignore_files:
//!   - .gitignore
//!
//! engine:
//!   keep_trailing_newline: true
//!
//! template_matcher: etch
//! child_flag: "!etch:child"
//!
//! setup:
//!   - ./scripts/prepare.sh
//! ```
//!
//! Every key is optional and an empty document is valid. The top level may
//! also be a sequence of mappings; they are folded in order and a later key
//! replaces an earlier one. The same folding applies inside `context`.
//!
//! # Modules
//!
//! - `context` - variable definitions, [`ContextResolver`] and [`ResolvedContext`]
//! - `coerce` - `as:` type conversions
//!
//! # Loading
//!
//! [`Config::load`] accepts a `.yml` or `.yaml` path and falls back to the
//! other extension when the given file does not exist. Parsing validates the
//! whole document, including every context definition, before anything runs.

mod coerce;
mod context;

pub use coerce::{CoercionKind, coerce};
pub use context::{ContextResolver, ContextVariableSpec, ResolvedContext, SourceKind, VariableSource};

use serde_json::Value;
use std::path::{Path, PathBuf};
use strsim::levenshtein;
use tracing::debug;

use crate::constants::{DEFAULT_CHILD_FLAG, DEFAULT_TEMPLATE_MATCHER, MAX_KEY_SUGGESTION_DISTANCE};
use crate::core::{EtchError, Result};
use crate::templating::EngineOptions;
use context::string_list;

/// Top-level keys a configuration document may use.
pub const CONFIG_KEYS: [&str; 8] = [
    "context",
    "exclude",
    "ignore_files",
    "engine",
    "jinja",
    "template_matcher",
    "child_flag",
    "setup",
];

/// A parsed and validated configuration document.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Context variable definitions, in resolution order
    pub context: Vec<ContextVariableSpec>,
    /// Gitignore-style exclude patterns
    pub exclude: Vec<String>,
    /// Gitignore-style files merged into the excludes, relative to the root
    pub ignore_files: Vec<PathBuf>,
    /// Render engine options
    pub engine: EngineOptions,
    /// Filename marker identifying templates
    pub template_matcher: String,
    /// Leading token identifying child files
    pub child_flag: String,
    /// Commands run before context resolution
    pub setup: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            context: Vec::new(),
            exclude: Vec::new(),
            ignore_files: Vec::new(),
            engine: EngineOptions::default(),
            template_matcher: DEFAULT_TEMPLATE_MATCHER.to_string(),
            child_flag: DEFAULT_CHILD_FLAG.to_string(),
            setup: Vec::new(),
        }
    }
}

/// Finds the configuration file, trying the sibling `.yml`/`.yaml` name too.
///
/// # Errors
///
/// - [`EtchError::InvalidConfigExtension`] if `path` is not `.yml`/`.yaml`
/// - [`EtchError::ConfigNotFound`] if neither candidate exists
pub fn locate_config(path: &Path) -> Result<PathBuf> {
    let alternate = match path.extension().and_then(|e| e.to_str()) {
        Some("yml") => path.with_extension("yaml"),
        Some("yaml") => path.with_extension("yml"),
        _ => {
            return Err(EtchError::InvalidConfigExtension {
                path: path.display().to_string(),
            });
        }
    };

    [path.to_path_buf(), alternate].into_iter().find(|candidate| candidate.is_file()).ok_or_else(
        || EtchError::ConfigNotFound {
            path: path.display().to_string(),
        },
    )
}

/// Closest recognised key to `key`, if it is close enough to be a typo.
fn suggest_key(key: &str) -> Option<String> {
    CONFIG_KEYS
        .iter()
        .map(|candidate| (*candidate, levenshtein(key, candidate)))
        .filter(|(_, distance)| *distance <= MAX_KEY_SUGGESTION_DISTANCE)
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate.to_string())
}

/// Folds a mapping, or a sequence of mappings, into ordered unique entries.
///
/// A repeated key replaces the earlier value in place, keeping its position.
fn fold_entries(value: &Value, what: &str) -> Result<Vec<(String, Value)>> {
    let fragments: Vec<&serde_json::Map<String, Value>> = match value {
        Value::Null => Vec::new(),
        Value::Object(map) => vec![map],
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Object(map) => Ok(map),
                other => Err(EtchError::InvalidConfigValue {
                    key: what.to_string(),
                    reason: format!("expected a mapping, found {other}"),
                }),
            })
            .collect::<Result<_>>()?,
        other => {
            return Err(EtchError::InvalidConfigValue {
                key: what.to_string(),
                reason: format!("expected a mapping or a list of mappings, found {other}"),
            });
        }
    };

    let mut entries: Vec<(String, Value)> = Vec::new();
    for fragment in fragments {
        for (key, item) in fragment {
            match entries.iter_mut().find(|(existing, _)| existing == key) {
                Some(slot) => slot.1 = item.clone(),
                None => entries.push((key.clone(), item.clone())),
            }
        }
    }
    Ok(entries)
}

fn string_setting(key: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Ok(s.clone()),
        other => Err(EtchError::InvalidConfigValue {
            key: key.to_string(),
            reason: format!("expected a non-empty string, found {other}"),
        }),
    }
}

fn list_setting(key: &str, value: &Value) -> Result<Vec<String>> {
    string_list(value)
        .map(|items| items.into_iter().filter(|s| !s.trim().is_empty()).collect())
        .map_err(|reason| EtchError::InvalidConfigValue {
            key: key.to_string(),
            reason,
        })
}

impl Config {
    /// Locates, reads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// Any [`EtchError`] of the config category.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use etch::config::Config;
    /// use std::path::Path;
    ///
    /// # fn example() -> anyhow::Result<()> {
    /// let config = Config::load(Path::new("./etch.config.yml"))?;
    /// println!("{} context vars", config.context.len());
    /// # Ok(())
    /// # }
    /// ```
    pub fn load(path: &Path) -> Result<Self> {
        let found = locate_config(path)?;
        debug!("Reading config from {}", found.display());
        let text = std::fs::read_to_string(&found).map_err(|e| EtchError::fs("read", &found, e))?;
        Self::from_yaml_str(&text, &found.display().to_string())
    }

    /// Parses a YAML document. `source` names it in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`EtchError::ConfigParseError`] for invalid YAML and any other
    /// config error raised by [`Config::from_value`].
    pub fn from_yaml_str(text: &str, source: &str) -> Result<Self> {
        let yaml: serde_yaml::Value =
            serde_yaml::from_str(text).map_err(|e| EtchError::ConfigParseError {
                file: source.to_string(),
                reason: e.to_string(),
            })?;
        let value = serde_json::to_value(&yaml).map_err(|e| EtchError::ConfigParseError {
            file: source.to_string(),
            reason: e.to_string(),
        })?;
        Self::from_value(&value)
    }

    /// Builds a config from an already-parsed document tree.
    ///
    /// # Errors
    ///
    /// - [`EtchError::UnknownConfigKey`] for unrecognised top-level keys
    /// - [`EtchError::InvalidConfigValue`] for values of the wrong shape
    /// - [`EtchError::InvalidContextVariable`] for malformed context entries
    pub fn from_value(value: &Value) -> Result<Self> {
        let entries = fold_entries(value, "config")?;

        if let Some((key, _)) = entries.iter().find(|(key, _)| !CONFIG_KEYS.contains(&key.as_str())) {
            return Err(EtchError::UnknownConfigKey {
                key: key.clone(),
                suggestion: suggest_key(key),
            });
        }

        let mut config = Self::default();

        for (key, item) in &entries {
            match key.as_str() {
                "context" => {
                    config.context = fold_entries(item, "context")?
                        .iter()
                        .map(|(name, definition)| ContextVariableSpec::parse(name, definition))
                        .collect::<Result<_>>()?;
                }
                "exclude" => config.exclude = list_setting(key, item)?,
                "ignore_files" => {
                    config.ignore_files =
                        list_setting(key, item)?.into_iter().map(PathBuf::from).collect();
                }
                "engine" | "jinja" => {
                    config.engine = match item {
                        Value::Null => EngineOptions::default(),
                        other => serde_json::from_value(other.clone()).map_err(|e| {
                            EtchError::InvalidConfigValue {
                                key: key.clone(),
                                reason: e.to_string(),
                            }
                        })?,
                    };
                }
                "template_matcher" => config.template_matcher = string_setting(key, item)?,
                "child_flag" => config.child_flag = string_setting(key, item)?.trim().to_string(),
                "setup" => config.setup = list_setting(key, item)?,
                _ => {}
            }
        }

        debug!(
            "Parsed config: {} context var(s), {} exclude pattern(s), {} ignore file(s)",
            config.context.len(),
            config.exclude.len(),
            config.ignore_files.len()
        );
        Ok(config)
    }
}
