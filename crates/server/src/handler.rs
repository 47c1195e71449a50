//! HTTP surface of the host.
//!
//! Everything outside `/__sw/` is offered to the worker first and forwarded to
//! the origin only when the worker passes it through. The control routes
//! deliver the side-channel events a browser would normally dispatch.

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::{Request as HttpRequest, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response as HttpResponse};
use axum::routing::{any, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use swcache_client::resolve;
use swcache_core::worker::SyncOutcome;
use swcache_core::{FetchOutcome, Network, OfflineWorker, Request, RequestMode, Response};
use tower_http::trace::TraceLayer;

use crate::error::ServerError;

#[derive(Clone)]
pub struct AppState {
    worker: Arc<OfflineWorker>,
    origin: Arc<dyn Network>,
    max_body_bytes: usize,
}

impl AppState {
    pub fn new(worker: Arc<OfflineWorker>, origin: Arc<dyn Network>, max_body_bytes: usize) -> Self {
        Self { worker, origin, max_body_bytes }
    }
}

#[derive(Debug, Deserialize)]
pub struct ClickRequest {
    #[serde(default)]
    pub action: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    pub tag: String,
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub tag: String,
    pub outcome: SyncOutcome,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/__sw/push", post(push))
        .route("/__sw/notificationclick", post(notification_click))
        .route("/__sw/sync", post(sync))
        .route("/__sw/status", get(status))
        .route("/__sw/{*rest}", any(unknown_control))
        .fallback(proxy)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Offer an intercepted request to the worker, forwarding it on pass-through.
pub async fn proxy(State(state): State<AppState>, request: HttpRequest) -> Result<HttpResponse, ServerError> {
    let (parts, body) = request.into_parts();
    let target = parts.uri.path_and_query().map_or("/", |pq| pq.as_str());
    let url = resolve(state.worker.origin(), target)?;
    let body = axum::body::to_bytes(body, state.max_body_bytes)
        .await
        .map_err(|e| ServerError::BadRequest(format!("unreadable request body: {e}")))?;

    let request = Request::new(parts.method, url)
        .with_mode(RequestMode::from_headers(&parts.headers))
        .with_headers(parts.headers)
        .with_body(body);

    let response = match state.worker.fetch(request).await {
        FetchOutcome::Respond(response) => response,
        FetchOutcome::PassThrough(request) => state.origin.fetch(&request).await?,
    };

    Ok(into_http(response))
}

fn into_http(response: Response) -> HttpResponse {
    let mut out = HttpResponse::new(Body::from(response.body));
    *out.status_mut() = response.status;
    *out.headers_mut() = response.headers;
    out
}

/// Deliver a push message. An empty payload shows nothing.
pub async fn push(State(state): State<AppState>, body: Bytes) -> Result<HttpResponse, ServerError> {
    match state.worker.push(&body)? {
        Some(notification) => Ok(Json(notification).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

pub async fn notification_click(State(state): State<AppState>, Json(click): Json<ClickRequest>) -> impl IntoResponse {
    Json(state.worker.notification_click(click.action.as_deref()))
}

pub async fn sync(State(state): State<AppState>, Json(request): Json<SyncRequest>) -> impl IntoResponse {
    let outcome = state.worker.sync(&request.tag).await;
    Json(SyncResponse { tag: request.tag, outcome })
}

pub async fn status(State(state): State<AppState>) -> Result<HttpResponse, ServerError> {
    Ok(Json(state.worker.status().await?).into_response())
}

async fn unknown_control() -> StatusCode {
    StatusCode::NOT_FOUND
}
