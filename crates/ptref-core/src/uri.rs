//! Syntactic URL recognition.
//!
//! URLs are never dereferenced. A candidate counts as a URL only when it
//! carries both a scheme and a network location (`scheme://host...`).

use url::Url;

/// Check whether `text` is an absolute URL with scheme and authority.
///
/// Malformed input yields `false`. Scheme-only forms such as
/// `mailto:someone@example.com` or `urn:isbn:0451450523` are rejected, as
/// are forms without the `//` authority introducer (`http:example.com`).
///
/// # Examples
///
/// ```
/// use ptref_core::is_url;
///
/// assert!(is_url("http://example.com"));
/// assert!(is_url("https://example.org/a?b=c#d"));
/// assert!(!is_url("not a url"));
/// assert!(!is_url("mailto:someone@example.com"));
/// ```
#[must_use]
pub fn is_url(text: &str) -> bool {
    let Ok(parsed) = Url::parse(text) else {
        return false;
    };

    if parsed.scheme().is_empty() {
        return false;
    }

    // The parser fills in an authority for special schemes even when the
    // source omits `//`, so check the raw text as well.
    let raw = text.trim_start();
    let Some(after_scheme) = raw.get(parsed.scheme().len()..) else {
        return false;
    };
    if !after_scheme.starts_with("://") {
        return false;
    }

    parsed.host_str().is_some_and(|host| !host.is_empty())
}
