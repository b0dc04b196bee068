//! Small string helpers shared by the pipeline stages.
//!
//! - Character-safe truncation for prompts and log previews
//! - Normalisation of optional credentials coming from the environment

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with an ellipsis and a count of
/// the dropped characters appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 chars)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    let (head, cut) = truncate_chars(s, max);
    if cut {
        format!("{}…(+{} chars)", head, s.chars().count() - max)
    } else {
        s.to_string()
    }
}

/// Return at most `max` characters of `s`, and whether anything was dropped.
///
/// The cut always lands on a character boundary, so multi-byte text never
/// panics.
pub fn truncate_chars(s: &str, max: usize) -> (&str, bool) {
    match s.char_indices().nth(max) {
        Some((byte_idx, _)) => (&s[..byte_idx], true),
        None => (s, false),
    }
}

/// Treat blank strings as missing.
///
/// Credentials read from the environment are often present but empty
/// (`GEMINI_API_KEY=`), which must behave exactly like an unset variable.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
