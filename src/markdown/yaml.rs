//! YAML scalar escaping for frontmatter values

/// Characters that force quoting anywhere in a value
const SPECIAL_CHARS: &[char] = &[
    ':', '#', '|', '>', '&', '*', '!', '%', '@', '`', '[', ']', '{', '}', '\\',
];

/// Characters that force quoting at the start of a value
const SPECIAL_LEADING: &[char] = &[
    '-', '?', ':', ',', '[', ']', '{', '}', '&', '*', '!', '%', '@', '`', '|', '>', '\'', '"',
];

/// Literals YAML would read as booleans or null
const RESERVED: &[&str] = &["true", "false", "null", "yes", "no", "on", "off"];

/// Make a value safe to emit as a YAML scalar
///
/// The value is trimmed, then emitted bare unless YAML could misread it, in
/// which case it is double-quoted with backslashes and quotes escaped.
/// Empty values become `""`.
///
/// # Examples
///
/// ```
/// use linkvault::markdown::escape_yaml_value;
///
/// assert_eq!(escape_yaml_value("hello"), "hello");
/// assert_eq!(escape_yaml_value("a: b"), "\"a: b\"");
/// assert_eq!(escape_yaml_value("true"), "\"true\"");
/// assert_eq!(escape_yaml_value(""), "\"\"");
/// ```
pub fn escape_yaml_value(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        return "\"\"".to_string();
    }

    let needs_quotes = value.contains(SPECIAL_CHARS)
        || value.starts_with(SPECIAL_LEADING)
        || RESERVED.contains(&value.to_lowercase().as_str())
        || value.contains('\n');

    if needs_quotes {
        quote_yaml_value(value)
    } else {
        value.to_string()
    }
}

/// Double-quote a value unconditionally
pub fn quote_yaml_value(value: &str) -> String {
    let escaped = value.trim().replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}
