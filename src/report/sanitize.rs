//! Escaping for engine-produced text (error messages, learner-controlled strings) before it is embedded in a
//! document or a script string.

/// Escape `& < > " ' /` for HTML text and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape text for a single- or double-quoted script string literal.
pub fn escape_script_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            _ => out.push(c),
        }
    }
    out
}

/// An error message made safe for HTML. Empty input stays empty.
pub fn sanitize_error(message: &str) -> String {
    escape_html(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<img src="x" onerror='a&b'/>"#),
            "&lt;img src=&quot;x&quot; onerror=&#x27;a&amp;b&#x27;&#x2F;&gt;"
        );
        assert_eq!(escape_html("plain text"), "plain text");
    }

    #[test]
    fn test_escape_script_string() {
        assert_eq!(escape_script_string("a'b\"c\\d\n"), "a\\'b\\\"c\\\\d\\n");
        assert_eq!(escape_script_string("\u{2028}\u{2029}\t\r"), "\\u2028\\u2029\\t\\r");
    }

    #[test]
    fn test_sanitize_error() {
        assert_eq!(sanitize_error(""), "");
        assert_eq!(sanitize_error("</pre><script>"), "&lt;&#x2F;pre&gt;&lt;script&gt;");
    }
}
