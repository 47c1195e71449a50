//! The origin side of the worker.

use std::time::Duration;

use async_trait::async_trait;

use crate::message::{Request, Response};

/// Ways a fetch can fail to produce any response at all.
///
/// A non-2xx status is not an error: it comes back as a `Response`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum NetworkError {
    #[error("origin unreachable: {0}")]
    Unreachable(String),

    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("response too large: {0} bytes")]
    TooLarge(usize),
}

/// Something that can turn a request into a response: the page-origin server.
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError>;
}

/// Fetch with an upper bound on how long the caller waits.
pub async fn fetch_with_timeout(
    network: &dyn Network, request: &Request, limit: Duration,
) -> Result<Response, NetworkError> {
    match tokio::time::timeout(limit, network.fetch(request)).await {
        Ok(result) => result,
        Err(_) => Err(NetworkError::Timeout(limit)),
    }
}
