//! The static page a preview is delivered in.

use crate::report::sanitize::sanitize_error;

/// Forbids every script source; inline styles are the only active content.
pub const CONTENT_SECURITY_POLICY: &str = "default-src 'none'; style-src 'unsafe-inline'; img-src data:";

pub const NOTE: &str =
    "This preview works best when you have createElement and render functions. Continue building your framework!";

const STYLE: &str = "\
    body {
      margin: 0;
      padding: 20px;
      font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', 'Roboto', sans-serif;
      background: #1a1a1a;
      color: #fff;
    }
    #root {
      padding: 20px;
    }
    .error {
      color: #ff6b6b;
      padding: 20px;
      background: #2a1a1a;
      border: 1px solid #ff6b6b;
      border-radius: 4px;
    }
    .success {
      color: #51cf66;
      padding: 20px;
      background: #1a2a1a;
      border: 1px solid #51cf66;
      border-radius: 4px;
    }";

/// Wrap an already-safe `#root` fragment in a complete document.
pub fn page(root_html: &str) -> String {
    format!(
        "<!DOCTYPE html>
<html>
<head>
  <meta charset=\"UTF-8\">
  <meta http-equiv=\"Content-Security-Policy\" content=\"{CONTENT_SECURITY_POLICY}\">
  <style>
{STYLE}
  </style>
</head>
<body>
  <div id=\"root\">{root_html}</div>
</body>
</html>
"
    )
}

/// A labelled diagnostic block; `detail` is untrusted and escaped here.
pub fn diagnostic(label: &str, detail: &str) -> String {
    format!(
        "<div class=\"error\"><strong>{label}:</strong><pre>{}</pre></div>",
        sanitize_error(detail)
    )
}

pub fn note() -> String {
    format!("<div class=\"error\"><strong>Note:</strong> {NOTE}</div>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_escapes_detail() {
        assert_eq!(
            diagnostic("Error", "<img src=x onerror=alert(1)>"),
            "<div class=\"error\"><strong>Error:</strong><pre>&lt;img src=x onerror=alert(1)&gt;</pre></div>"
        );
    }

    #[test]
    fn test_page_carries_csp() {
        let html = page("");
        assert!(html.contains("Content-Security-Policy"));
        assert!(html.contains("default-src 'none'"));
        assert!(!html.contains("<script"));
    }
}
