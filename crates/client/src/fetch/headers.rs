//! Header filtering for proxied exchanges.

use http::HeaderMap;
use http::header::{self, HeaderName};

/// Connection-scoped headers that never cross a proxy (RFC 9110 §7.6.1).
const HOP_BY_HOP: &[HeaderName] = &[
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

fn is_hop_by_hop(name: &HeaderName, connection_listed: &[String]) -> bool {
    HOP_BY_HOP.contains(name)
        || name.as_str() == "keep-alive"
        || connection_listed.iter().any(|listed| listed.eq_ignore_ascii_case(name.as_str()))
}

fn connection_listed(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .collect()
}

/// Headers to send upstream.
///
/// Drops hop-by-hop headers and `Host` (the client sets it for the origin).
/// `Accept-Encoding` is dropped too so the client negotiates and decodes the
/// body itself.
pub fn outbound(headers: &HeaderMap) -> HeaderMap {
    let listed = connection_listed(headers);
    headers
        .iter()
        .filter(|(name, _)| !is_hop_by_hop(name, &listed))
        .filter(|(name, _)| *name != header::HOST && *name != header::ACCEPT_ENCODING && *name != header::CONTENT_LENGTH)
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

/// Headers to hand back to the page.
///
/// The body has already been buffered and decoded, so framing headers
/// (`Content-Length`, `Content-Encoding`) are recomputed by the host.
pub fn inbound(headers: &HeaderMap) -> HeaderMap {
    let listed = connection_listed(headers);
    headers
        .iter()
        .filter(|(name, _)| !is_hop_by_hop(name, &listed))
        .filter(|(name, _)| *name != header::CONTENT_LENGTH && *name != header::CONTENT_ENCODING)
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}
