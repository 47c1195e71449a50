//! HTTP client for the page-origin server.
//!
//! ### Forwarding
//! - Method, headers and body are forwarded; hop-by-hop headers are not
//! - Redirects are handed back to the page rather than followed (default)
//! - Bodies are buffered, decoded, and capped at `max_bytes`
//!
//! ### Failure model
//! - Any response, whatever its status, is `Ok`
//! - Connect errors, timeouts and oversized bodies are `NetworkError`s, which
//!   the worker turns into cache fallbacks

pub mod headers;
pub mod url;

use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};

pub use self::url::{UrlError, canonicalize_origin, resolve};

use swcache_core::{AppConfig, Error, Network, NetworkError, Request, Response};

/// Configuration for the origin client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "swcache/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow; 0 passes them to the page (default: 0)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "swcache/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 0,
        }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            ..Default::default()
        }
    }
}

/// reqwest-backed `Network` talking to the origin.
pub struct OriginClient {
    http: Client,
    config: FetchConfig,
}

impl OriginClient {
    /// Create a new origin client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let redirect = match config.max_redirects {
            0 => reqwest::redirect::Policy::none(),
            n => reqwest::redirect::Policy::limited(n),
        };

        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(redirect)
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::InvalidInput(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    fn classify(&self, err: &reqwest::Error) -> NetworkError {
        if err.is_timeout() { NetworkError::Timeout(self.config.timeout) } else { NetworkError::Unreachable(err.to_string()) }
    }
}

#[async_trait]
impl Network for OriginClient {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        let start = Instant::now();

        let response = self
            .http
            .request(request.method.clone(), request.url.as_str())
            .headers(headers::outbound(&request.headers))
            .body(request.body.clone())
            .send()
            .await
            .map_err(|e| self.classify(&e))?;

        let status = response.status();

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(NetworkError::TooLarge(len as usize));
        }

        let response_headers = headers::inbound(response.headers());

        let body = response.bytes().await.map_err(|e| self.classify(&e))?;

        if body.len() > self.config.max_bytes {
            return Err(NetworkError::TooLarge(body.len()));
        }

        tracing::debug!(
            "fetched {} {} -> {} in {}ms ({} bytes)",
            request.method,
            request.url,
            status.as_u16(),
            start.elapsed().as_millis(),
            body.len()
        );

        Ok(Response { status, headers: response_headers, body })
    }
}
