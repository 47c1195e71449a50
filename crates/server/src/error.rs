//! Structured errors for the swcache host.
//!
//! Only the control routes and the pass-through path can fail; cache misses
//! and offline origins are turned into responses by the worker itself.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use swcache_client::UrlError;
use swcache_core::{Error, NetworkError};

/// Structured errors for the swcache host.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The incoming request could not be turned into an origin request.
    #[error("INVALID_REQUEST: {0}")]
    BadRequest(String),

    /// A pass-through request got no response from the origin.
    #[error("UPSTREAM_ERROR: {0}")]
    Upstream(#[from] NetworkError),

    #[error(transparent)]
    Core(#[from] Error),
}

impl From<UrlError> for ServerError {
    fn from(err: UrlError) -> Self {
        ServerError::BadRequest(err.to_string())
    }
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Upstream(NetworkError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            ServerError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ServerError::Core(Error::InvalidInput(_) | Error::InvalidUrl(_)) => StatusCode::BAD_REQUEST,
            ServerError::Core(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ServerError::BadRequest(_) => "INVALID_REQUEST",
            ServerError::Upstream(_) => "UPSTREAM_ERROR",
            ServerError::Core(e) => e.code(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(error = %self, "request failed");
        }

        let body = serde_json::json!({ "code": self.code(), "message": self.to_string() });
        (status, Json(body)).into_response()
    }
}
