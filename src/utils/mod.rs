//! Utility functions and helpers.

pub mod http;

use url::Url;

use crate::error::Result;

/// Append a route to a base URL, keeping any path prefix the base carries.
///
/// `Url::join` with an absolute path would drop `/backend` from
/// `https://host/backend`, so the strings are joined directly.
pub fn endpoint(base: &str, path: &str) -> Result<Url> {
    let joined = format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Ok(Url::parse(&joined)?)
}

/// True when the string looks like an http(s) URL rather than a filesystem path.
pub fn is_http_url(s: &str) -> bool {
    Url::parse(s)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Case-insensitive substring test.
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
