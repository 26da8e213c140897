//! Token validation error types

use thiserror::Error;

/// Which positional token a validation concerns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Directive,
    Layer,
}

impl TokenKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Directive => "directive",
            Self::Layer => "layer",
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Errors produced while turning raw tokens into validated types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    #[error("No {kind} pattern configured for profile '{profile}'")]
    PatternNotFound { kind: TokenKind, profile: String },

    #[error("{message}: {value:?} does not match {kind} pattern '{pattern}' of profile '{profile}'")]
    ValidationFailed {
        kind: TokenKind,
        value: String,
        pattern: String,
        profile: String,
        message: String,
    },
}
