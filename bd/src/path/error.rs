//! Path resolution error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while composing or probing a template path
#[derive(Debug, Error)]
pub enum PathError {
    #[error("Template not found, tried: {}", join_paths(.attempted))]
    TemplateNotFound { attempted: Vec<PathBuf> },

    #[error("Invalid {what} {segment:?}: {reason}")]
    InvalidPath {
        what: &'static str,
        segment: String,
        reason: &'static str,
    },

    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Path {path} escapes base directory {base}")]
    SecurityViolation { path: PathBuf, base: PathBuf },

    #[error("IO error probing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PathError {
    /// Missing templates can be reported as a warning; everything else fails the request
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PathError::TemplateNotFound { .. })
    }

    /// Candidates probed before giving up, if any
    pub fn attempted(&self) -> &[PathBuf] {
        match self {
            PathError::TemplateNotFound { attempted } => attempted,
            _ => &[],
        }
    }
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_not_found_lists_candidates() {
        let err = PathError::TemplateNotFound {
            attempted: vec![
                PathBuf::from("/w/p/to/project/f_project_strict.md"),
                PathBuf::from("/w/p/to/project/f_project.md"),
            ],
        };

        let msg = err.to_string();
        assert!(msg.contains("f_project_strict.md"));
        assert!(msg.contains("f_project.md"));
        assert!(err.is_recoverable());
        assert_eq!(err.attempted().len(), 2);
    }

    #[test]
    fn test_security_violation_is_not_recoverable() {
        let err = PathError::SecurityViolation {
            path: PathBuf::from("/etc/passwd"),
            base: PathBuf::from("/w/prompts"),
        };

        let msg = err.to_string();
        assert!(msg.contains("/etc/passwd"));
        assert!(msg.contains("/w/prompts"));
        assert!(!err.is_recoverable());
        assert!(err.attempted().is_empty());
    }
}
