//! Context variables: definitions, resolution and the resolved mapping.
//!
//! Each entry under the `context` config key is normalised once, at parse
//! time, into a [`ContextVariableSpec`]. Two shapes are accepted:
//!
//! ```yaml
//! context:
//!   # Inline: a static value of any type
//!   project: etch
//!   ports: [80, 443]
//!
//!   # Full form: a mapping with a `type` key
//!   user:
//!     type: env
//!     value: USER
//!     default: nobody
//!   commit:
//!     type: shell
//!     value: git rev-parse --short HEAD
//!   debug:
//!     type: static
//!     value: "yes"
//!     as: bool
//! ```
//!
//! The full form only accepts the keys `type`, `value`, `default` and `as`.
//! A mapping without `type` is an ordinary static value, as is every list,
//! whatever its items hold. An inline mapping that happens to need a `type`
//! key must be written in full form as `type: static`.
//!
//! [`ContextResolver`] then turns the specs into a [`ResolvedContext`],
//! running shell commands and reading environment variables as it goes.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::process::Command;
use std::str::FromStr;
use tracing::{debug, info};

use super::coerce::{CoercionKind, coerce};
use crate::core::{EtchError, Result};
use crate::utils::platform::get_shell_command;

/// Where a context variable's value comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum VariableSource {
    /// A literal value from the config document
    Static(Value),
    /// The named environment variable
    Environment {
        /// Variable to read
        env_name: String,
    },
    /// Standard output of the last of these shell commands
    Shell {
        /// Commands, run in order
        commands: Vec<String>,
    },
}

/// Name of a source kind as written under `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// `static`
    Static,
    /// `env` or `environment`
    Environment,
    /// `shell` or `cli`
    Shell,
}

impl SourceKind {
    const NAMES: &'static str = "static, env (environment), shell (cli)";
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "static" => Ok(Self::Static),
            "env" | "environment" => Ok(Self::Environment),
            "shell" | "cli" => Ok(Self::Shell),
            other => Err(format!(
                "unknown context var type '{other}', must be one of {}. If this conflicts with \
                 your value, use the full form instead, e.g. type: static, value: ...",
                Self::NAMES
            )),
        }
    }
}

/// A normalised context variable definition.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextVariableSpec {
    /// Name the template sees
    pub name: String,
    /// Where the value comes from
    pub source: VariableSource,
    /// Fallback for a missing environment variable
    pub default: Option<Value>,
    /// Conversion applied after resolution
    pub coerce: Option<CoercionKind>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FullForm {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    value: Option<Value>,
    #[serde(default)]
    default: Option<Value>,
    #[serde(rename = "as", default)]
    coerce: Option<String>,
}

fn is_full_form(value: &Value) -> bool {
    matches!(value, Value::Object(map) if map.contains_key("type"))
}

/// Accepts a sequence of strings or a single string split into lines.
pub(crate) fn string_list(value: &Value) -> std::result::Result<Vec<String>, String> {
    match value {
        Value::String(s) => Ok(s.lines().map(str::to_string).collect()),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                other => Err(format!("expected a string, found {other}")),
            })
            .collect(),
        Value::Null => Ok(Vec::new()),
        other => Err(format!("expected a string or a list of strings, found {other}")),
    }
}

impl ContextVariableSpec {
    /// Normalises one `name: value` entry of the `context` key.
    ///
    /// # Errors
    ///
    /// Returns [`EtchError::InvalidContextVariable`] for unknown `type` or `as`
    /// names, unknown full-form keys, or a missing required `value`.
    pub fn parse(name: &str, value: &Value) -> Result<Self> {
        if !is_full_form(value) {
            return Ok(Self::inline(name, value.clone()));
        }

        let invalid = |reason: String| EtchError::InvalidContextVariable {
            name: name.to_string(),
            reason,
        };

        let full: FullForm =
            serde_json::from_value(value.clone()).map_err(|e| invalid(e.to_string()))?;

        let kind = full.kind.parse::<SourceKind>().map_err(&invalid)?;
        let coerce = full.coerce.as_deref().map(str::parse::<CoercionKind>).transpose().map_err(&invalid)?;

        let source = match kind {
            SourceKind::Static => VariableSource::Static(full.value.ok_or_else(|| {
                invalid("missing 'value' key, required when the full 'type' form is used".into())
            })?),
            SourceKind::Environment => {
                let env_name = match full.value {
                    None | Some(Value::Null) => name.to_string(),
                    Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
                    Some(other) => {
                        return Err(invalid(format!(
                            "'value' must name an environment variable, found {other}"
                        )));
                    }
                };
                VariableSource::Environment {
                    env_name,
                }
            }
            SourceKind::Shell => {
                let raw = full.value.ok_or_else(|| {
                    invalid("missing 'value' key, required when the full 'type' form is used".into())
                })?;
                let commands: Vec<String> = string_list(&raw)
                    .map_err(&invalid)?
                    .into_iter()
                    .filter(|c| !c.trim().is_empty())
                    .collect();
                if commands.is_empty() {
                    return Err(invalid("'value' must contain at least one command".into()));
                }
                VariableSource::Shell {
                    commands,
                }
            }
        };

        Ok(Self {
            name: name.to_string(),
            source,
            default: full.default,
            coerce,
        })
    }

    /// A static variable with no coercion.
    #[must_use]
    pub fn inline(name: &str, value: Value) -> Self {
        Self {
            name: name.to_string(),
            source: VariableSource::Static(value),
            default: None,
            coerce: None,
        }
    }
}

/// The immutable name-to-value mapping templates are rendered against.
///
/// Built from `(name, value)` pairs; a repeated name keeps its last value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResolvedContext(BTreeMap<String, Value>);

impl ResolvedContext {
    /// Value bound to `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Number of bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no bindings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Bindings in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl FromIterator<(String, Value)> for ResolvedContext {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

type EnvLookup = Box<dyn Fn(&str) -> Option<String>>;

/// Resolves context variable specs into a [`ResolvedContext`].
///
/// Environment access goes through a lookup function so callers (and tests)
/// can substitute the process environment.
///
/// # Examples
///
/// ```rust,no_run
/// use etch::config::{ContextResolver, ContextVariableSpec, VariableSource};
///
/// # fn example() -> anyhow::Result<()> {
/// let specs = vec![ContextVariableSpec {
///     name: "home".into(),
///     source: VariableSource::Environment { env_name: "HOME".into() },
///     default: None,
///     coerce: None,
/// }];
///
/// let context = ContextResolver::new()
///     .with_env_lookup(|name| (name == "HOME").then(|| "/home/me".to_string()))
///     .resolve(&specs)?;
/// assert_eq!(context.get("home").unwrap(), "/home/me");
/// # Ok(())
/// # }
/// ```
pub struct ContextResolver {
    env_lookup: EnvLookup,
}

impl fmt::Debug for ContextResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextResolver").finish_non_exhaustive()
    }
}

impl Default for ContextResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextResolver {
    /// A resolver reading the process environment.
    #[must_use]
    pub fn new() -> Self {
        Self {
            env_lookup: Box::new(|name| std::env::var(name).ok()),
        }
    }

    /// Replaces the environment lookup.
    #[must_use]
    pub fn with_env_lookup(mut self, lookup: impl Fn(&str) -> Option<String> + 'static) -> Self {
        self.env_lookup = Box::new(lookup);
        self
    }

    /// Runs `setup` commands in order for their side effects.
    ///
    /// # Errors
    ///
    /// Returns [`EtchError::ShellCommandFailed`] for the first command that
    /// cannot be spawned or exits unsuccessfully.
    pub fn run_setup(&self, commands: &[String]) -> Result<()> {
        for command in commands.iter().filter(|c| !c.trim().is_empty()) {
            info!("Running setup command: {command}");
            let stdout = run_shell(command)?;
            if !stdout.trim().is_empty() {
                debug!("{}", stdout.trim_end());
            }
        }
        Ok(())
    }

    /// Resolves every spec in order.
    ///
    /// # Errors
    ///
    /// Fails on the first variable that cannot be resolved or coerced. No
    /// partial context is returned.
    pub fn resolve(&self, specs: &[ContextVariableSpec]) -> Result<ResolvedContext> {
        let mut resolved = Vec::with_capacity(specs.len());
        for spec in specs {
            let value = self.resolve_one(spec)?;
            debug!("Resolved context var '{}'", spec.name);
            resolved.push((spec.name.clone(), value));
        }
        Ok(resolved.into_iter().collect())
    }

    fn resolve_one(&self, spec: &ContextVariableSpec) -> Result<Value> {
        let value = match &spec.source {
            VariableSource::Static(value) => value.clone(),
            VariableSource::Environment {
                env_name,
            } => match (self.env_lookup)(env_name) {
                Some(found) => Value::String(found.trim().to_string()),
                None => match &spec.default {
                    Some(Value::String(s)) => Value::String(s.trim().to_string()),
                    Some(other) => other.clone(),
                    None => {
                        return Err(EtchError::MissingEnvironmentVariable {
                            env_name: env_name.clone(),
                            variable: spec.name.clone(),
                        });
                    }
                },
            },
            VariableSource::Shell {
                commands,
            } => Value::String(self.resolve_shell(&spec.name, commands)?),
        };

        match spec.coerce {
            Some(kind) => coerce(value, kind),
            None => Ok(value),
        }
    }

    fn resolve_shell(&self, variable: &str, commands: &[String]) -> Result<String> {
        let Some((last, earlier)) = commands.split_last() else {
            return Err(EtchError::InvalidContextVariable {
                name: variable.to_string(),
                reason: "no commands to run".to_string(),
            });
        };

        for command in earlier {
            info!("Running command for context var '{variable}': {command}");
            run_shell(command)?;
        }

        info!("Running command for context var '{variable}': {last}");
        let output = run_shell(last)?;
        let trimmed = output.trim();
        if trimmed.is_empty() {
            return Err(EtchError::EmptyShellOutput {
                command: last.clone(),
                variable: variable.to_string(),
            });
        }
        Ok(trimmed.to_string())
    }
}

/// Runs one command through the platform shell and returns its stdout.
fn run_shell(command: &str) -> Result<String> {
    let (shell, flag) = get_shell_command();
    let output = Command::new(shell).arg(flag).arg(command).output().map_err(|e| {
        EtchError::ShellCommandFailed {
            command: command.to_string(),
            reason: format!("could not start {shell}: {e}"),
            stderr: String::new(),
        }
    })?;

    if !output.status.success() {
        let reason = output
            .status
            .code()
            .map_or_else(|| "terminated by signal".to_string(), |code| format!("exit code {code}"));
        return Err(EtchError::ShellCommandFailed {
            command: command.to_string(),
            reason,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
