//! Base-URL prefixing.

/// Returns whether `url` carries an explicit `http://` or `https://` scheme.
#[must_use]
pub fn has_http_scheme(url: &str) -> bool {
    let lower = url.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Joins a relative URL onto a base URL.
///
/// URLs that already carry a scheme, and any URL when no base is configured,
/// are returned unchanged. Exactly one `/` separates base and path.
#[must_use]
pub fn resolve_url(url: &str, base: Option<&str>) -> String {
    let url = url.trim();
    let base = base.map(str::trim).filter(|base| !base.is_empty());
    match base {
        Some(base) if !url.contains("://") => {
            let base = base.trim_end_matches('/');
            let path = url.trim_start_matches('/');
            if path.is_empty() {
                base.to_string()
            } else {
                format!("{base}/{path}")
            }
        }
        _ => url.to_string(),
    }
}
