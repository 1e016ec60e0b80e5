//! URL comparison keys.
//!
//! Deliberately literal: only the scheme prefix, letter case, surrounding
//! whitespace and a single trailing slash are ignored. Query strings, ports and
//! percent-escapes are compared as written.

const SCHEME_PREFIXES: &[&str] = &["https://", "http://"];

/// Canonicalize a raw bookmark URL into the key used for duplicate grouping.
pub fn normalize_url(url: &str) -> String {
    let mut normalized = url.trim().to_lowercase();

    for prefix in SCHEME_PREFIXES {
        if normalized.starts_with(prefix) {
            normalized.replace_range(..prefix.len(), "");
            break;
        }
    }

    if normalized.ends_with('/') {
        normalized.pop();
    }

    normalized
}
