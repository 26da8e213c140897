//! Smart constructors for directive and layer tokens

use serde::Serialize;
use tracing::debug;

use super::{TokenKind, TypeError};
use crate::patterns::{Pattern, PatternProvider};

/// "What to do", e.g. `to`, `summary`, `defect`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DirectiveType(String);

impl DirectiveType {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// "At which level", e.g. `project`, `issue`, `task`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LayerType(String);

impl LayerType {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

macro_rules! token_impls {
    ($ty:ident) => {
        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        // Serialize only: deserializing would bypass validation
        impl Serialize for $ty {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(&self.0)
            }
        }
    };
}

token_impls!(DirectiveType);
token_impls!(LayerType);

/// A validated `<directive> <layer>` pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TwoParams {
    pub directive: DirectiveType,
    pub layer: LayerType,
}

/// Validates raw tokens against the patterns of one profile
pub struct TypeFactory<'a> {
    provider: &'a dyn PatternProvider,
}

impl<'a> TypeFactory<'a> {
    pub fn new(provider: &'a dyn PatternProvider) -> Self {
        Self { provider }
    }

    pub fn create_directive_type(&self, raw: &str) -> Result<DirectiveType, TypeError> {
        debug!(%raw, profile = %self.provider.profile(), "create_directive_type: called");
        let pattern = self.provider.directive_pattern();
        let message = self.provider.directive_error_message();
        validate(TokenKind::Directive, raw, pattern, self.provider.profile(), message)
            .map(|value| DirectiveType(value.to_string()))
    }

    pub fn create_layer_type(&self, raw: &str) -> Result<LayerType, TypeError> {
        debug!(%raw, profile = %self.provider.profile(), "create_layer_type: called");
        let pattern = self.provider.layer_pattern();
        let message = self.provider.layer_error_message();
        validate(TokenKind::Layer, raw, pattern, self.provider.profile(), message)
            .map(|value| LayerType(value.to_string()))
    }

    /// Validate both tokens; the directive is always checked first
    pub fn create_both_types(&self, directive_raw: &str, layer_raw: &str) -> Result<TwoParams, TypeError> {
        let directive = self.create_directive_type(directive_raw)?;
        let layer = self.create_layer_type(layer_raw)?;
        Ok(TwoParams { directive, layer })
    }
}

fn validate<'v>(
    kind: TokenKind,
    raw: &'v str,
    pattern: Option<&Pattern>,
    profile: &str,
    message: &str,
) -> Result<&'v str, TypeError> {
    let Some(pattern) = pattern else {
        return Err(TypeError::PatternNotFound {
            kind,
            profile: profile.to_string(),
        });
    };

    let acceptable = !raw.is_empty() && !raw.chars().any(char::is_control) && pattern.matches(raw);
    if acceptable {
        Ok(raw)
    } else {
        debug!(%kind, %raw, pattern = %pattern.source(), "validate: rejected");
        Err(TypeError::ValidationFailed {
            kind,
            value: raw.to_string(),
            pattern: pattern.source().to_string(),
            profile: profile.to_string(),
            message: message.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::{ConfigPatternProvider, PatternSet};
    use proptest::prelude::*;

    fn provider(profile: &str, directive: Option<&str>, layer: Option<&str>) -> ConfigPatternProvider {
        ConfigPatternProvider::from_patterns(
            profile,
            PatternSet {
                directive_pattern: directive.map(|p| Pattern::new(p).unwrap()),
                layer_pattern: layer.map(|p| Pattern::new(p).unwrap()),
                directive_error_message: "Invalid directive type".to_string(),
                layer_error_message: "Invalid layer type".to_string(),
            },
        )
    }

    fn standard() -> ConfigPatternProvider {
        provider("default", Some("^(to|summary|defect)$"), Some("^(project|issue|task)$"))
    }

    #[test]
    fn test_create_both_types_accepts_configured_values() {
        let provider = standard();
        let factory = TypeFactory::new(&provider);

        let params = factory.create_both_types("to", "project").unwrap();
        assert_eq!(params.directive.as_str(), "to");
        assert_eq!(params.layer.as_str(), "project");
    }

    #[test]
    fn test_unconfigured_value_is_rejected_for_this_profile() {
        let default = standard();
        let factory = TypeFactory::new(&default);

        let err = factory.create_both_types("find", "bugs").unwrap_err();
        assert!(matches!(
            &err,
            TypeError::ValidationFailed { kind: TokenKind::Directive, value, profile, .. }
                if value == "find" && profile == "default"
        ));

        // Another profile may accept the same token
        let search = provider("search", Some("^(find)$"), Some("^(bugs)$"));
        let factory = TypeFactory::new(&search);
        let params = factory.create_both_types("find", "bugs").unwrap();
        assert_eq!(params.directive.as_str(), "find");
    }

    #[test]
    fn test_directive_failure_reported_before_layer() {
        let provider = standard();
        let factory = TypeFactory::new(&provider);

        let err = factory.create_both_types("nope", "also-nope").unwrap_err();
        assert!(matches!(err, TypeError::ValidationFailed { kind: TokenKind::Directive, .. }));

        let err = factory.create_both_types("to", "also-nope").unwrap_err();
        assert!(matches!(err, TypeError::ValidationFailed { kind: TokenKind::Layer, .. }));
    }

    #[test]
    fn test_missing_pattern_is_not_permissive() {
        let provider = provider("partial", Some("^to$"), None);
        let factory = TypeFactory::new(&provider);

        assert!(factory.create_directive_type("to").is_ok());
        let err = factory.create_layer_type("project").unwrap_err();
        assert_eq!(
            err,
            TypeError::PatternNotFound {
                kind: TokenKind::Layer,
                profile: "partial".to_string()
            }
        );
    }

    #[test]
    fn test_rejects_empty_and_control_characters() {
        // Even a pattern that accepts anything
        let provider = provider("loose", Some(".*"), Some(".*"));
        let factory = TypeFactory::new(&provider);

        assert!(factory.create_directive_type("").is_err());
        assert!(factory.create_directive_type("to\n").is_err());
        assert!(factory.create_layer_type("pro\u{0}ject").is_err());
        assert!(factory.create_layer_type("\u{1b}[31m").is_err());
        assert!(factory.create_layer_type("project").is_ok());
    }

    #[test]
    fn test_rejects_partial_match_of_anchored_pattern() {
        let provider = standard();
        let factory = TypeFactory::new(&provider);

        assert!(factory.create_directive_type("tomato").is_err());
        assert!(factory.create_directive_type("xto").is_err());
        assert!(factory.create_directive_type("to ").is_err());
        assert!(factory.create_layer_type("projects").is_err());
    }

    #[test]
    fn test_no_implicit_anchors() {
        let provider = provider("loose", Some("to"), Some("project"));
        let factory = TypeFactory::new(&provider);

        // The configured pattern is unanchored, so substrings match
        assert!(factory.create_directive_type("tomato").is_ok());
        assert!(factory.create_layer_type("subproject").is_ok());
    }

    #[test]
    fn test_values_compare_by_value() {
        let provider = standard();
        let factory = TypeFactory::new(&provider);

        let a = factory.create_directive_type("summary").unwrap();
        let b = factory.create_directive_type("summary").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "summary");
        assert_eq!(serde_json::to_string(&a).unwrap(), "\"summary\"");
    }

    proptest! {
        #[test]
        fn prop_directive_accepted_iff_pattern_matches(
            pattern in prop::sample::select(vec!["^(to|summary|defect)$", "^[a-z]+$", "to", "^x", "y$", "^[a-c]{2,3}$"]),
            value in "[a-z_]{1,8}",
        ) {
            let provider = provider("prop", Some(pattern), Some(pattern));
            let factory = TypeFactory::new(&provider);
            let compiled = Pattern::new(pattern).unwrap();

            prop_assert_eq!(factory.create_directive_type(&value).is_ok(), compiled.matches(&value));
            prop_assert_eq!(factory.create_layer_type(&value).is_ok(), compiled.matches(&value));
        }
    }
}
