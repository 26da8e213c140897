//! Variable collection error types

use thiserror::Error;

use super::VariableKind;

/// Problems found while building a variable set
///
/// `VariablesBuilder::build` reports every one of these it finds, not just the first.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VariableError {
    #[error("Invalid {kind} variable name {name:?}: {reason}")]
    Naming {
        kind: VariableKind,
        name: String,
        reason: String,
    },

    #[error("Duplicate variable '{key}'")]
    Duplicate { key: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_naming_message() {
        let err = VariableError::Naming {
            kind: VariableKind::User,
            name: "uv-".to_string(),
            reason: "empty name after prefix".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid user variable name \"uv-\": empty name after prefix"
        );
    }

    #[test]
    fn test_duplicate_message() {
        let err = VariableError::Duplicate { key: "a".to_string() };
        assert_eq!(err.to_string(), "Duplicate variable 'a'");
    }
}
