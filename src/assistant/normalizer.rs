//! Whitespace normalization and truncation for model input.

/// Default character budget for document context (~8K tokens for Mistral).
pub const DEFAULT_MAX_CHARS: usize = 7_000;

/// Collapse whitespace runs to a single space, trim, and keep at most
/// `max_chars` characters.
#[must_use]
pub fn normalize_text(text: &str, max_chars: usize) -> String {
    let mut normalized = String::with_capacity(text.len().min(max_chars.saturating_mul(4)));
    let mut prev_space = false;
    let mut count = 0_usize;

    for ch in text.trim().chars() {
        if count == max_chars {
            break;
        }

        if ch.is_whitespace() {
            if !prev_space {
                normalized.push(' ');
                prev_space = true;
                count += 1;
            }
        } else {
            normalized.push(ch);
            prev_space = false;
            count += 1;
        }
    }

    normalized
}

/// Keep the first `max_chars` characters of `text` without other changes.
#[must_use]
pub fn excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
