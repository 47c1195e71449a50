//! URL handling for requests forwarded to the origin.

/// Error type for URL handling failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Canonicalize the configured origin.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Default scheme to https:// if missing
/// 3. Lowercase the host
/// 4. Drop path, query and fragment; the origin is scheme + authority only
pub fn canonicalize_origin(input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let url_str = if trimmed.contains("://") { trimmed.to_string() } else { format!("https://{trimmed}") };

    let mut parsed = url::Url::parse(&url_str).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if let Some(host) = parsed.host_str() {
        let host = host.to_lowercase();
        parsed
            .set_host(Some(&host))
            .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    }

    parsed.set_path("/");
    parsed.set_query(None);
    parsed.set_fragment(None);

    Ok(parsed)
}

/// Rebuild an intercepted request target as an absolute origin URL.
///
/// `path_and_query` is the request-target as received by the proxy
/// (e.g. `/general/about?lang=ha`). Fragments never reach a server, but one
/// is stripped here anyway so cache keys stay stable.
pub fn resolve(origin: &url::Url, path_and_query: &str) -> Result<url::Url, UrlError> {
    if !path_and_query.starts_with('/') || path_and_query.starts_with("//") {
        return Err(UrlError::InvalidUrl(format!("request target must be origin-relative: {path_and_query}")));
    }

    let mut url = origin
        .join(path_and_query)
        .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    url.set_fragment(None);

    Ok(url)
}
