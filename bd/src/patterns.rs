//! Validation patterns for directive and layer tokens
//!
//! Patterns always come from a configuration profile. Nothing in this crate
//! keeps a list of accepted directive or layer values.

use regex::Regex;
use tracing::{debug, warn};

use crate::config::{Config, PatternConfig};

/// A compiled validation pattern and the source it was compiled from
///
/// Matching uses regex search semantics: no implicit anchors are added. A
/// pattern such as `to|summary` accepts `"tomato"`. Configuration authors who
/// want whole-value matching must write `^(to|summary)$`.
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
}

impl Pattern {
    /// Compile a pattern exactly as written
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(source)?,
        })
    }

    pub fn matches(&self, candidate: &str) -> bool {
        self.regex.is_match(candidate)
    }

    pub fn source(&self) -> &str {
        self.regex.as_str()
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source() == other.source()
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.source())
    }
}

/// Patterns and messages of one profile
#[derive(Debug, Clone, PartialEq)]
pub struct PatternSet {
    pub directive_pattern: Option<Pattern>,
    pub layer_pattern: Option<Pattern>,
    pub directive_error_message: String,
    pub layer_error_message: String,
}

impl PatternSet {
    /// Build from a profile's `params.two` section
    ///
    /// A pattern that does not compile is logged and left absent.
    pub fn from_config(config: &Config) -> Self {
        let two = &config.params.two;
        Self {
            directive_pattern: compile(&two.directive_type, "directive"),
            layer_pattern: compile(&two.layer_type, "layer"),
            directive_error_message: two.directive_type.error_message.clone(),
            layer_error_message: two.layer_type.error_message.clone(),
        }
    }
}

fn compile(config: &PatternConfig, kind: &str) -> Option<Pattern> {
    let source = config.pattern.as_deref()?;
    match Pattern::new(source) {
        Ok(pattern) => {
            debug!(%kind, %source, "compiled pattern");
            Some(pattern)
        }
        Err(e) => {
            warn!("Ignoring invalid {} pattern '{}': {}", kind, source, e);
            None
        }
    }
}

/// Source of directive/layer patterns
///
/// Implementations never fail. An absent pattern is a valid answer and makes
/// validation of that token impossible.
pub trait PatternProvider {
    fn directive_pattern(&self) -> Option<&Pattern>;

    fn layer_pattern(&self) -> Option<&Pattern>;

    /// Profile the patterns were loaded from, for error reporting
    fn profile(&self) -> &str;

    fn directive_error_message(&self) -> &str {
        "Invalid directive type"
    }

    fn layer_error_message(&self) -> &str {
        "Invalid layer type"
    }
}

/// Pattern provider backed by a loaded profile configuration
#[derive(Debug, Clone)]
pub struct ConfigPatternProvider {
    profile: String,
    patterns: PatternSet,
}

impl ConfigPatternProvider {
    pub fn new(profile: impl Into<String>, config: &Config) -> Self {
        Self::from_patterns(profile, PatternSet::from_config(config))
    }

    pub fn from_patterns(profile: impl Into<String>, patterns: PatternSet) -> Self {
        Self {
            profile: profile.into(),
            patterns,
        }
    }
}

impl PatternProvider for ConfigPatternProvider {
    fn directive_pattern(&self) -> Option<&Pattern> {
        self.patterns.directive_pattern.as_ref()
    }

    fn layer_pattern(&self) -> Option<&Pattern> {
        self.patterns.layer_pattern.as_ref()
    }

    fn profile(&self) -> &str {
        &self.profile
    }

    fn directive_error_message(&self) -> &str {
        &self.patterns.directive_error_message
    }

    fn layer_error_message(&self) -> &str {
        &self.patterns.layer_error_message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(directive: Option<&str>, layer: Option<&str>) -> Config {
        let mut config = Config::default();
        config.params.two.directive_type.pattern = directive.map(String::from);
        config.params.two.layer_type.pattern = layer.map(String::from);
        config
    }

    #[test]
    fn test_pattern_matches_as_written() {
        let anchored = Pattern::new("^(to|summary)$").unwrap();
        assert!(anchored.matches("to"));
        assert!(!anchored.matches("tomato"));

        // No implicit anchors
        let loose = Pattern::new("to|summary").unwrap();
        assert!(loose.matches("tomato"));
        assert_eq!(loose.source(), "to|summary");
    }

    #[test]
    fn test_provider_exposes_config_patterns() {
        let provider = ConfigPatternProvider::new("default", &Config::bootstrap());
        assert_eq!(provider.profile(), "default");
        assert_eq!(provider.directive_pattern().unwrap().source(), "^(to|summary|defect)$");
        assert_eq!(provider.layer_pattern().unwrap().source(), "^(project|issue|task)$");
        assert_eq!(provider.directive_error_message(), "Invalid directive type");
    }

    #[test]
    fn test_provider_patterns_are_independent() {
        let provider = ConfigPatternProvider::new("partial", &config_with(Some("^a$"), None));
        assert!(provider.directive_pattern().is_some());
        assert!(provider.layer_pattern().is_none());
    }

    #[test]
    fn test_invalid_pattern_is_absent() {
        let provider = ConfigPatternProvider::new("bad", &config_with(Some("^(unclosed$"), Some("^ok$")));
        assert!(provider.directive_pattern().is_none());
        assert!(provider.layer_pattern().is_some());
    }

    #[test]
    fn test_changing_config_changes_patterns() {
        let first = ConfigPatternProvider::new("one", &config_with(Some("^to$"), None));
        let second = ConfigPatternProvider::new("two", &config_with(Some("^find$"), None));

        assert!(first.directive_pattern().unwrap().matches("to"));
        assert!(!first.directive_pattern().unwrap().matches("find"));
        assert!(second.directive_pattern().unwrap().matches("find"));
        assert!(!second.directive_pattern().unwrap().matches("to"));
    }
}
