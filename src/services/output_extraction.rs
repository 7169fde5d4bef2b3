//! Structured-output extraction from model replies.
//!
//! Models often wrap JSON in markdown fences or surround it with prose;
//! these helpers recover the structured part.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;

fn code_block_regex() -> &'static Regex {
    static CODE_BLOCK: OnceLock<Regex> = OnceLock::new();
    CODE_BLOCK.get_or_init(|| Regex::new(r"(?s)```([^\s`]*)[^\n]*\n(.*?)```").unwrap())
}

fn list_item_regex() -> &'static Regex {
    static LIST_ITEM: OnceLock<Regex> = OnceLock::new();
    LIST_ITEM.get_or_init(|| Regex::new(r"^\s*(?:\d{1,3}[.)]|[-*•])\s+(.+?)\s*$").unwrap())
}

/// A fenced code block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlock {
    /// Info string after the opening fence, if any
    pub language: Option<String>,
    pub code: String,
}

/// Every fenced code block in `text`, in order.
pub fn extract_code_blocks(text: &str) -> Vec<CodeBlock> {
    code_block_regex()
        .captures_iter(text)
        .map(|caps| {
            let language = caps.get(1).map(|m| m.as_str()).filter(|l| !l.is_empty());
            CodeBlock {
                language: language.map(str::to_string),
                code: caps[2].trim_end_matches(['\n', '\r']).to_string(),
            }
        })
        .collect()
}

/// First JSON object or array found in `text`.
///
/// Fenced blocks are tried first, then the whole text, then every
/// balanced `{...}` / `[...]` span in order.
pub fn extract_json(text: &str) -> Option<Value> {
    for block in extract_code_blocks(text) {
        if let Some(value) = parse_structured(&block.code) {
            return Some(value);
        }
    }

    if let Some(value) = parse_structured(text) {
        return Some(value);
    }

    let mut search_from = 0;
    while let Some(offset) = text[search_from..].find(['{', '[']) {
        let start = search_from + offset;
        if let Some(end) = balanced_end(&text[start..]) {
            if let Some(value) = parse_structured(&text[start..start + end]) {
                return Some(value);
            }
        }
        search_from = start + 1;
    }

    None
}

/// Like [`extract_json`], keeping only objects.
pub fn extract_json_object(text: &str) -> Option<serde_json::Map<String, Value>> {
    match extract_json(text)? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Items of numbered (`1.`, `1)`) or bulleted (`-`, `*`, `•`) lists.
///
/// Numbers longer than three digits are not list markers, so a line
/// opening with a year stays prose.
pub fn extract_list(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| list_item_regex().captures(line))
        .map(|caps| caps[1].to_string())
        .collect()
}

fn parse_structured(candidate: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(candidate.trim()) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => Some(value),
        _ => None,
    }
}

/// Byte length of the balanced bracket span starting at `text[0]`,
/// skipping brackets inside string literals.
fn balanced_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(idx + 1);
                }
            }
            _ => {}
        }
    }
    None
}
