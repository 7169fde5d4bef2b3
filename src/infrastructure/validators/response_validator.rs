//! Post-hoc acceptance checks for agent output

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Caller-supplied acceptance criteria. Unset fields are not checked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationRules {
    /// Minimum length in characters
    pub min_length: Option<usize>,
    /// Maximum length in characters
    pub max_length: Option<usize>,
    /// Regexes that must all match somewhere in the text
    pub required_patterns: Vec<String>,
    /// Regexes none of which may match
    pub forbidden_patterns: Vec<String>,
}

impl ValidationRules {
    #[must_use]
    pub fn min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    #[must_use]
    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    #[must_use]
    pub fn require(mut self, pattern: impl Into<String>) -> Self {
        self.required_patterns.push(pattern.into());
        self
    }

    #[must_use]
    pub fn forbid(mut self, pattern: impl Into<String>) -> Self {
        self.forbidden_patterns.push(pattern.into());
        self
    }
}

/// Outcome of [`validate_response`]; `errors` is empty iff `valid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

/// Check `text` against every rule and report all violations.
///
/// An unparsable pattern is reported as a violation rather than raised.
pub fn validate_response(text: &str, rules: &ValidationRules) -> ValidationReport {
    let mut errors = Vec::new();
    let length = text.chars().count();

    if let Some(min) = rules.min_length {
        if length < min {
            errors.push(format!("Response too short: {length} < {min} characters"));
        }
    }
    if let Some(max) = rules.max_length {
        if length > max {
            errors.push(format!("Response too long: {length} > {max} characters"));
        }
    }

    for pattern in &rules.required_patterns {
        match Regex::new(pattern) {
            Ok(regex) if !regex.is_match(text) => {
                errors.push(format!("Missing required pattern: {pattern}"));
            }
            Ok(_) => {}
            Err(e) => errors.push(format!("Invalid pattern '{pattern}': {e}")),
        }
    }

    for pattern in &rules.forbidden_patterns {
        match Regex::new(pattern) {
            Ok(regex) if regex.is_match(text) => {
                errors.push(format!("Contains forbidden pattern: {pattern}"));
            }
            Ok(_) => {}
            Err(e) => errors.push(format!("Invalid pattern '{pattern}': {e}")),
        }
    }

    if !errors.is_empty() {
        tracing::debug!(violations = errors.len(), "Response failed validation");
    }

    ValidationReport {
        valid: errors.is_empty(),
        errors,
    }
}
