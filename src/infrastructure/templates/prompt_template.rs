//! Minimal `{{name}}` prompt templating.

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").unwrap())
}

/// A prompt with `{{name}}` placeholders.
///
/// Placeholders without a supplied value are left verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Substitute every placeholder that has a value in `variables`.
    pub fn format<K, V>(&self, variables: &HashMap<K, V>) -> String
    where
        K: std::borrow::Borrow<str> + std::hash::Hash + Eq,
        V: AsRef<str>,
    {
        placeholder_regex()
            .replace_all(&self.template, |caps: &regex::Captures<'_>| {
                variables
                    .get(&caps[1])
                    .map_or_else(|| caps[0].to_string(), |value| value.as_ref().to_string())
            })
            .into_owned()
    }

    /// Placeholder names in order of first appearance, without duplicates.
    pub fn variables(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for caps in placeholder_regex().captures_iter(&self.template) {
            let name = &caps[1];
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        names
    }
}

impl From<&str> for PromptTemplate {
    fn from(template: &str) -> Self {
        Self::new(template)
    }
}
