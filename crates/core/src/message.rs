//! Request and response values exchanged between the host, the worker and
//! the origin.

use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Method, StatusCode, header};
use url::Url;

use crate::cache::hash::compute_cache_key;

/// How the page issued the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMode {
    /// A top-level page navigation.
    Navigate,
    /// Anything else: scripts, images, XHR, fetch().
    #[default]
    Subresource,
}

impl RequestMode {
    /// Infer the mode from browser request headers.
    ///
    /// `Sec-Fetch-Mode` wins when present. Older clients that omit it are
    /// treated as navigating when their `Accept` header leads with HTML.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        if let Some(mode) = headers.get("sec-fetch-mode").and_then(|v| v.to_str().ok()) {
            return if mode.eq_ignore_ascii_case("navigate") { Self::Navigate } else { Self::Subresource };
        }

        let accepts_html = headers
            .get(header::ACCEPT)
            .and_then(|v| v.to_str().ok())
            .and_then(|accept| accept.split(',').next())
            .is_some_and(|first| first.trim().starts_with("text/html"));

        if accepts_html { Self::Navigate } else { Self::Subresource }
    }
}

/// An intercepted page request.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub mode: RequestMode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Request {
    /// A bodiless request with the given method.
    pub fn new(method: Method, mut url: Url) -> Self {
        url.set_fragment(None);
        Self { method, url, mode: RequestMode::default(), headers: HeaderMap::new(), body: Bytes::new() }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: Bytes) -> Self {
        self.body = body;
        self
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    /// Cache key over method and URL.
    pub fn cache_key(&self) -> String {
        compute_cache_key(self.method.as_str(), self.url.as_str())
    }
}

/// A response handed back to the page, fetched from the origin or the cache,
/// or built locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self { status, headers: HeaderMap::new(), body: body.into() }
    }

    pub fn with_header(mut self, name: header::HeaderName, value: &'static str) -> Self {
        self.headers.insert(name, HeaderValue::from_static(value));
        self
    }

    /// A synthetic 503 with a plain-text body.
    pub fn offline(message: &'static str) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message).with_header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
    }

    /// A synthetic 503 rendered as HTML, for navigations.
    pub fn offline_html(message: &'static str) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message).with_header(header::CONTENT_TYPE, "text/html")
    }

    /// Only plain 200s are worth keeping.
    pub fn is_cacheable(&self) -> bool {
        self.status == StatusCode::OK
    }
}
