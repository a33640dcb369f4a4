//! Text clean-up applied before anything reaches a document.
//!
//! Documents use the standard Type 1 fonts, which only cover a Latin code page, so every
//! character outside printable ASCII is replaced with `?`. Line breaks and tabs survive.

use crate::constants::{DOCUMENT_FILENAME_PREFIX, TRUNCATION_MARKER};

const REPLACEMENT: char = '?';

/// Replaces every non-ASCII or control character (other than `\n`, `\r`, `\t`) with `?`.
///
/// Exactly one `?` is emitted per replaced character, so the character count is unchanged.
pub fn sanitize_text(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\n' | '\r' | '\t' => c,
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => REPLACEMENT,
        })
        .collect()
}

/// Truncates `text` to `max_chars` characters, ending in `...` when shortened.
///
/// Text of `max_chars` characters or fewer is returned unchanged. Longer text keeps its first
/// `max_chars - 3` characters followed by the marker, so the result is exactly `max_chars`
/// characters.
pub fn truncate_with_marker(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(TRUNCATION_MARKER.len());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(TRUNCATION_MARKER);
    out
}

/// Download filename for a report on `topic`.
///
/// The topic is sanitized, spaces become underscores and characters that would break a
/// `Content-Disposition` header or a path are replaced.
pub fn document_filename(topic: &str) -> String {
    let stem: String = sanitize_text(topic.trim())
        .chars()
        .map(|c| match c {
            ' ' | '\t' | '\r' | '\n' => '_',
            '"' | '/' | '\\' | ';' => '_',
            c => c,
        })
        .collect();
    format!("{}-{}.pdf", DOCUMENT_FILENAME_PREFIX, stem)
}
