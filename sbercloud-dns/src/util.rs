//! Small name-handling and logging helpers

/// Maximum number of bytes to include in truncated log output.
const TRUNCATE_LIMIT: usize = 256;

/// Truncate a string for safe logging.
///
/// Keeps response bodies (which may echo record values) from flooding debug
/// logs. Returns the original string when it is within the limit.
pub(crate) fn truncate_for_log(s: &str) -> String {
    if s.len() <= TRUNCATE_LIMIT {
        return s.to_string();
    }
    let mut end = TRUNCATE_LIMIT;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... [truncated, {} bytes total]", &s[..end], s.len())
}

/// Appends the trailing dot the DNS API requires on zone and record names.
pub(crate) fn ensure_trailing_dot(name: &str) -> String {
    if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{name}.")
    }
}

/// Strips the trailing dot for human-facing messages.
pub(crate) fn strip_trailing_dot(name: &str) -> &str {
    name.trim_end_matches('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_string_unchanged() {
        assert_eq!(truncate_for_log("hello"), "hello");
    }

    #[test]
    fn over_limit_truncated() {
        let s = "a".repeat(TRUNCATE_LIMIT + 50);
        let out = truncate_for_log(&s);
        assert!(out.len() < s.len());
        assert!(out.contains("... [truncated,"));
        assert!(out.contains(&format!("{} bytes total]", TRUNCATE_LIMIT + 50)));
    }

    #[test]
    fn multibyte_chars_not_split() {
        let s = "ю".repeat(200); // 2 bytes each
        let out = truncate_for_log(&s);
        assert!(out.contains("... [truncated,"));
    }

    #[test]
    fn trailing_dot_added_once() {
        assert_eq!(ensure_trailing_dot("example.com"), "example.com.");
        assert_eq!(ensure_trailing_dot("example.com."), "example.com.");
    }

    #[test]
    fn trailing_dot_stripped() {
        assert_eq!(strip_trailing_dot("example.com."), "example.com");
        assert_eq!(strip_trailing_dot("example.com"), "example.com");
    }
}
