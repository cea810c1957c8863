use crate::constants::headers::{REDACTED_SECRET, SECRET};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

const INLINE_REDACTION: &str = "***REDACTED***";

static INLINE_REDACTION_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r"\bsk_(live|test)_[A-Za-z0-9_-]{8,}\b").expect("inline redaction regex"),
            "sk_${1}_***REDACTED***",
        ),
        (
            Regex::new(r"\b(Bearer)\s+([A-Za-z0-9._~-]{10,})\b").expect("inline redaction regex"),
            "$1 ***REDACTED***",
        ),
        (
            Regex::new(r"(?i)\b(x-pica-secret)\b\s*([:=])\s*([^\s,;]+)")
                .expect("inline redaction regex"),
            "$1$2***REDACTED***",
        ),
    ]
});

pub fn is_secret_header(name: &str) -> bool {
    name.trim().eq_ignore_ascii_case(SECRET)
}

/// Copies `headers`, replacing every secret header value with the redaction
/// marker. Other entries are kept byte-for-byte.
pub fn sanitize_headers(headers: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|(key, value)| {
            if is_secret_header(key) {
                (key.clone(), REDACTED_SECRET.to_string())
            } else {
                (key.clone(), value.clone())
            }
        })
        .collect()
}

/// Scrubs known secret shapes and any of the `secrets` given verbatim, then
/// truncates to `max_bytes` on a char boundary.
pub fn redact_text(value: &str, max_bytes: usize, secrets: &[&str]) -> String {
    let mut out = value.to_string();
    for secret in secrets {
        let needle = secret.trim();
        if needle.len() < 6 {
            continue;
        }
        out = out.replace(needle, INLINE_REDACTION);
    }
    for (re, replacement) in INLINE_REDACTION_PATTERNS.iter() {
        if re.is_match(&out) {
            out = re.replace_all(&out, *replacement).to_string();
        }
    }
    truncate(out, max_bytes)
}

fn truncate(value: String, max_bytes: usize) -> String {
    if value.len() <= max_bytes {
        return value;
    }
    let mut end = max_bytes;
    while end > 0 && !value.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &value[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_headers_replaces_only_the_secret() {
        let mut headers = BTreeMap::new();
        headers.insert("x-pica-secret".to_string(), "sk_test_abcdef123456".to_string());
        headers.insert("x-pica-connection-key".to_string(), "live::gmail::default::1".to_string());
        headers.insert("Content-Type".to_string(), "application/json".to_string());

        let sanitized = sanitize_headers(&headers);

        assert_eq!(sanitized["x-pica-secret"], REDACTED_SECRET);
        assert_eq!(sanitized["x-pica-connection-key"], headers["x-pica-connection-key"]);
        assert_eq!(sanitized["Content-Type"], headers["Content-Type"]);
        assert_eq!(headers["x-pica-secret"], "sk_test_abcdef123456");
    }

    #[test]
    fn sanitize_headers_matches_secret_case_insensitively() {
        let mut headers = BTreeMap::new();
        headers.insert("X-Pica-Secret".to_string(), "spoofed".to_string());
        let sanitized = sanitize_headers(&headers);
        assert_eq!(sanitized["X-Pica-Secret"], REDACTED_SECRET);
    }

    #[test]
    fn redact_text_scrubs_configured_secret_and_known_shapes() {
        let text = "denied for key my-very-secret-value and sk_live_0123456789abcdef";
        let out = redact_text(text, usize::MAX, &["my-very-secret-value"]);
        assert!(!out.contains("my-very-secret-value"));
        assert!(!out.contains("0123456789abcdef"));
        assert!(out.contains("sk_live_***REDACTED***"));
    }

    #[test]
    fn redact_text_keeps_the_key_environment_marker() {
        let out = redact_text("test key sk_test_abcdefgh12345678 rejected", usize::MAX, &[]);
        assert_eq!(out, "test key sk_test_***REDACTED*** rejected");
    }

    #[test]
    fn redact_text_truncates_on_char_boundary() {
        let out = redact_text("ééééé", 3, &[]);
        assert_eq!(out, "é...");
    }
}
