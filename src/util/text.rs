use std::borrow::Cow;

/// Marker appended to summaries cut at [`MAX_SUMMARY_CHARS`].
pub const TRUNCATION_MARKER: &str = "...";

/// Longest summary kept before truncation, in characters (not bytes).
pub const MAX_SUMMARY_CHARS: usize = 2000;

/// Cleans a feed summary for a single CSV cell.
///
/// Newlines and carriage returns become spaces, other control characters
/// (everything below 0x20 except tab, plus DEL) are dropped, surrounding
/// whitespace is trimmed, and the result is cut to [`MAX_SUMMARY_CHARS`]
/// characters with [`TRUNCATION_MARKER`] appended when it was longer.
///
/// # Examples
///
/// ```
/// use feedharvest::util::clean_summary;
///
/// assert_eq!(clean_summary("  line one\r\nline two \n"), "line one  line two");
/// assert_eq!(clean_summary(&"x".repeat(2001)).chars().count(), 2003);
/// ```
pub fn clean_summary(raw: &str) -> String {
    let flattened = flatten_line_breaks(raw);
    let stripped = strip_control_chars(&flattened);
    truncate_chars(stripped.trim(), MAX_SUMMARY_CHARS).into_owned()
}

/// Replaces `\n` and `\r` with a space each. Borrowed when there are none.
pub fn flatten_line_breaks(s: &str) -> Cow<'_, str> {
    if !s.contains(['\n', '\r']) {
        return Cow::Borrowed(s);
    }
    Cow::Owned(s.replace(['\n', '\r'], " "))
}

fn is_stripped(c: char) -> bool {
    c == '\x7f' || (c < '\x20' && c != '\t')
}

/// Drops control characters (C0 except tab, and DEL).
///
/// Returns `Cow::Borrowed` when nothing needs stripping, which is the common
/// case for feed text.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    if !s.chars().any(is_stripped) {
        return Cow::Borrowed(s);
    }
    Cow::Owned(s.chars().filter(|&c| !is_stripped(c)).collect())
}

/// Keeps the first `max_chars` characters of `s`, appending
/// [`TRUNCATION_MARKER`] only when something was cut.
pub fn truncate_chars(s: &str, max_chars: usize) -> Cow<'_, str> {
    match s.char_indices().nth(max_chars) {
        None => Cow::Borrowed(s),
        Some((cut, _)) => Cow::Owned(format!("{}{}", &s[..cut], TRUNCATION_MARKER)),
    }
}
