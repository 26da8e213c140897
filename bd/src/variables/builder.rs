//! VariablesBuilder - collects and validates prompt variables

use std::collections::{BTreeMap, HashMap};

use serde::{Serialize, Serializer};
use tracing::debug;

use super::VariableError;

/// Names accepted by `add_standard`
pub const STANDARD_VARIABLES: &[&str] = &["input_text_file", "destination_path"];

/// Names accepted by `add_file_path`
pub const FILE_PATH_VARIABLES: &[&str] = &["schema_file"];

/// The one stdin slot
pub const STDIN_VARIABLE: &str = "input_text";

/// Required prefix of user variable names
pub const USER_PREFIX: &str = "uv-";

/// Where a variable came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum VariableKind {
    Standard,
    FilePath,
    Stdin,
    User,
}

impl std::fmt::Display for VariableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Standard => "standard",
            Self::FilePath => "file path",
            Self::Stdin => "stdin",
            Self::User => "user",
        };
        write!(f, "{}", name)
    }
}

/// A validated variable, keyed by its final substitution name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Variable {
    pub key: String,
    pub value: String,
    pub kind: VariableKind,
}

/// Anything that can be flattened into renderer input
pub trait VariableSource {
    fn to_record(&self) -> BTreeMap<String, String>;
}

impl VariableSource for Variable {
    fn to_record(&self) -> BTreeMap<String, String> {
        BTreeMap::from([(self.key.clone(), self.value.clone())])
    }
}

/// Ordered, key-unique variables produced by `VariablesBuilder::build`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableSet {
    variables: Vec<Variable>,
}

impl VariableSet {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables.iter().find(|v| v.key == key).map(|v| v.value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.variables.iter()
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

impl VariableSource for VariableSet {
    fn to_record(&self) -> BTreeMap<String, String> {
        self.variables
            .iter()
            .map(|v| (v.key.clone(), v.value.clone()))
            .collect()
    }
}

impl Serialize for VariableSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.variables.serialize(serializer)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Pending {
    kind: VariableKind,
    name: String,
    value: String,
}

/// Collects variables without validating; `build` validates everything at once
#[derive(Debug, Clone, Default)]
pub struct VariablesBuilder {
    pending: Vec<Pending>,
    /// Later user variables replace earlier ones with the same key
    allow_duplicate_user: bool,
}

impl VariablesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_duplicate_user_variables(mut self, allow: bool) -> Self {
        self.allow_duplicate_user = allow;
        self
    }

    pub fn add_standard(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.push(VariableKind::Standard, name.into(), value.into())
    }

    pub fn add_file_path(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.push(VariableKind::FilePath, name.into(), value.into())
    }

    /// Fill the `input_text` slot; pass `""` when no stdin is attached
    pub fn add_stdin(&mut self, content: impl Into<String>) -> &mut Self {
        self.push(VariableKind::Stdin, STDIN_VARIABLE.to_string(), content.into())
    }

    /// Add a `uv-` prefixed variable; the prefix is stripped at build time
    pub fn add_user(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.push(VariableKind::User, name.into(), value.into())
    }

    /// Add parsed `(uv-name, value)` pairs as user variables
    pub fn add_user_assignments<'a>(
        &mut self,
        assignments: impl IntoIterator<Item = &'a (String, String)>,
    ) -> &mut Self {
        for (name, value) in assignments {
            self.add_user(name.clone(), value.clone());
        }
        self
    }

    fn push(&mut self, kind: VariableKind, name: String, value: String) -> &mut Self {
        debug!(%kind, %name, "VariablesBuilder: add");
        self.pending.push(Pending { kind, name, value });
        self
    }

    /// Validate all pending variables and collect every error found
    ///
    /// Does not change the builder, so repeated calls give equal results.
    pub fn build(&self) -> Result<VariableSet, Vec<VariableError>> {
        let mut errors = Vec::new();
        let mut variables: Vec<Variable> = Vec::with_capacity(self.pending.len());
        let mut positions: HashMap<String, usize> = HashMap::new();

        for pending in &self.pending {
            let key = match final_key(pending) {
                Ok(key) => key,
                Err(e) => {
                    errors.push(e);
                    continue;
                }
            };

            match positions.get(&key).copied() {
                Some(index) => {
                    let existing = &mut variables[index];
                    if self.allow_duplicate_user
                        && existing.kind == VariableKind::User
                        && pending.kind == VariableKind::User
                    {
                        debug!(%key, "VariablesBuilder::build: user variable overridden");
                        existing.value = pending.value.clone();
                    } else {
                        errors.push(VariableError::Duplicate { key });
                    }
                }
                None => {
                    positions.insert(key.clone(), variables.len());
                    variables.push(Variable {
                        key,
                        value: pending.value.clone(),
                        kind: pending.kind,
                    });
                }
            }
        }

        if errors.is_empty() {
            Ok(VariableSet { variables })
        } else {
            debug!(count = errors.len(), "VariablesBuilder::build: rejected");
            Err(errors)
        }
    }
}

fn final_key(pending: &Pending) -> Result<String, VariableError> {
    let naming = |reason: &str| VariableError::Naming {
        kind: pending.kind,
        name: pending.name.clone(),
        reason: reason.to_string(),
    };

    match pending.kind {
        VariableKind::Standard => {
            if STANDARD_VARIABLES.contains(&pending.name.as_str()) {
                Ok(pending.name.clone())
            } else {
                Err(naming("not a standard variable"))
            }
        }
        VariableKind::FilePath => {
            if FILE_PATH_VARIABLES.contains(&pending.name.as_str()) {
                Ok(pending.name.clone())
            } else {
                Err(naming("not a file path variable"))
            }
        }
        VariableKind::Stdin => {
            if pending.name == STDIN_VARIABLE {
                Ok(pending.name.clone())
            } else {
                Err(naming("stdin only fills input_text"))
            }
        }
        VariableKind::User => {
            let Some(stripped) = pending.name.strip_prefix(USER_PREFIX) else {
                return Err(naming("missing uv- prefix"));
            };
            if stripped.is_empty() {
                return Err(naming("empty name after prefix"));
            }
            if !stripped.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
                return Err(naming("only letters, digits, '_' and '-' are allowed"));
            }
            Ok(stripped.to_string())
        }
    }
}
