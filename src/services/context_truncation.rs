//! Token estimation and truncation.
//!
//! Uses a 4 chars/token heuristic. Counts are in characters, not bytes,
//! so non-ASCII text is not over-estimated.

/// Approximate characters per token.
pub const CHARS_PER_TOKEN: usize = 4;

/// Estimate the number of tokens in a string: `ceil(chars / 4)`.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

/// Shorten `text` so its estimate does not exceed `max_tokens`.
///
/// Text already within budget is returned unchanged. Otherwise the cut
/// lands on a char boundary, at the last whitespace before the limit when
/// there is one.
pub fn truncate_to_token_limit(text: &str, max_tokens: usize) -> &str {
    if estimate_tokens(text) <= max_tokens {
        return text;
    }

    let max_chars = max_tokens.saturating_mul(CHARS_PER_TOKEN);
    let limit = text
        .char_indices()
        .nth(max_chars)
        .map_or(text.len(), |(idx, _)| idx);
    let prefix = &text[..limit];

    match prefix.rfind(char::is_whitespace) {
        Some(cut) if cut > 0 => prefix[..cut].trim_end(),
        _ => prefix,
    }
}
