//! The offline cache router.
//!
//! `OfflineWorker` is driven by a host the same way a browser drives a service
//! worker: `install` and `activate` once at startup, then `fetch` for every
//! intercepted request, plus the push / click / sync side channels.
//!
//! Cache writes triggered by `fetch` run as background tasks. The response is
//! returned without waiting for them, so a crash in between loses the write.
//! That is acceptable for a cache. `settle` waits for outstanding writes.

mod lifecycle;
mod strategy;

#[cfg(test)]
mod testing;

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinSet;
use url::Url;

use crate::Error;
use crate::cache::{CacheStore, CachedResponse, GenerationKind, Generations};
use crate::config::{AppConfig, NotificationConfig};
use crate::message::{Request, Response};
use crate::network::{Network, NetworkError, fetch_with_timeout};
use crate::push::{ClickOutcome, Notification, NotificationActionKind, PushPayload};
use crate::routing::RouteTable;

pub use lifecycle::{ActivateReport, InstallReport, PrecacheFailure};

/// Tag that triggers the background-sync hook.
pub const BACKGROUND_SYNC_TAG: &str = "background-sync";

/// Lifecycle position of the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    /// Activated and controlling every client.
    Activated,
}

/// Result of offering a request to the worker.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The worker produced the response.
    Respond(Response),
    /// The worker declined; the host sends the request to the origin as is.
    PassThrough(Request),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    Completed,
    Ignored,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationStatus {
    pub name: String,
    pub entries: u64,
    pub current: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkerStatus {
    pub state: WorkerState,
    pub generations: Vec<GenerationStatus>,
}

/// Paths pre-cached during install.
#[derive(Debug, Clone)]
struct Manifest {
    static_assets: Vec<String>,
    cacheable: Vec<String>,
}

pub struct OfflineWorker {
    store: Arc<dyn CacheStore>,
    network: Arc<dyn Network>,
    routes: RouteTable,
    generations: Generations,
    manifest: Manifest,
    notifications: NotificationConfig,
    origin: Url,
    network_timeout: Duration,
    state: watch::Sender<WorkerState>,
    pending: Mutex<JoinSet<()>>,
}

impl OfflineWorker {
    /// Build a worker from configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidUrl` if the configured origin does not parse.
    pub fn new(config: &AppConfig, store: Arc<dyn CacheStore>, network: Arc<dyn Network>) -> Result<Self, Error> {
        let origin = Url::parse(&config.origin).map_err(|e| Error::InvalidUrl(format!("{}: {e}", config.origin)))?;

        Ok(Self {
            store,
            network,
            routes: RouteTable::from_config(&config.routes),
            generations: config.generations(),
            manifest: Manifest {
                static_assets: config.routes.static_assets.clone(),
                cacheable: config.routes.cacheable.clone(),
            },
            notifications: config.notifications.clone(),
            origin,
            network_timeout: config.network_timeout(),
            state: watch::Sender::new(WorkerState::Parsed),
            pending: Mutex::new(JoinSet::new()),
        })
    }

    pub fn state(&self) -> WorkerState {
        *self.state.borrow()
    }

    /// Watch lifecycle transitions.
    pub fn subscribe(&self) -> watch::Receiver<WorkerState> {
        self.state.subscribe()
    }

    pub fn generations(&self) -> &Generations {
        &self.generations
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Resolve a site path against the origin.
    pub fn resolve(&self, path: &str) -> Result<Url, Error> {
        self.origin.join(path).map_err(|e| Error::InvalidUrl(format!("{path}: {e}")))
    }

    fn transition(&self, next: WorkerState) {
        let previous = self.state.send_replace(next);
        tracing::info!(from = ?previous, to = ?next, "worker state changed");
    }

    /// Background-sync hook. Resolves immediately; no offline actions are
    /// queued yet.
    pub async fn sync(&self, tag: &str) -> SyncOutcome {
        if tag == BACKGROUND_SYNC_TAG {
            tracing::info!("background sync triggered");
            SyncOutcome::Completed
        } else {
            tracing::debug!(tag, "ignoring sync event");
            SyncOutcome::Ignored
        }
    }

    /// Turn a push message into the notification to display.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if the payload is not JSON.
    pub fn push(&self, raw: &[u8]) -> Result<Option<Notification>, Error> {
        let notification =
            PushPayload::parse(raw)?.map(|payload| Notification::from_payload(payload, &self.notifications));
        if let Some(n) = &notification {
            tracing::debug!(title = %n.title, "showing push notification");
        }
        Ok(notification)
    }

    /// React to a notification click. Only the "View" action opens a window.
    pub fn notification_click(&self, action: Option<&str>) -> ClickOutcome {
        match action.and_then(NotificationActionKind::from_id) {
            Some(NotificationActionKind::View) => {
                ClickOutcome::OpenWindow { url: self.notifications.dashboard_url.clone() }
            }
            _ => ClickOutcome::Dismiss,
        }
    }

    /// Current state and every generation the store knows about.
    pub async fn status(&self) -> Result<WorkerStatus, Error> {
        let mut generations = Vec::new();
        for name in self.store.list_generations().await? {
            let entries = self.store.count(&name).await?;
            let current = self.generations.is_current(&name);
            generations.push(GenerationStatus { name, entries, current });
        }
        Ok(WorkerStatus { state: self.state(), generations })
    }

    /// Wait for every background cache write started so far.
    pub async fn settle(&self) {
        let mut pending = std::mem::take(&mut *self.pending.lock().await);
        while let Some(joined) = pending.join_next().await {
            if let Err(e) = joined {
                tracing::warn!(error = %e, "background cache task failed");
            }
        }
    }

    async fn network_fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        fetch_with_timeout(self.network.as_ref(), request, self.network_timeout).await
    }

    /// Cached response for a request, if any. Store failures read as a miss.
    async fn lookup(&self, request: &Request) -> Option<Response> {
        match self.store.get(&request.cache_key()).await {
            Ok(hit) => hit.map(|entry| entry.to_response()),
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "cache lookup failed");
                None
            }
        }
    }

    /// Cached GET response for a site path.
    async fn lookup_path(&self, path: &str) -> Option<Response> {
        let url = self.resolve(path).ok()?;
        self.lookup(&Request::get(url)).await
    }

    async fn spawn_background<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut pending = self.pending.lock().await;
        while pending.try_join_next().is_some() {}
        pending.spawn(task);
    }

    /// Store a response without making the caller wait for the write.
    async fn store_in_background(&self, kind: GenerationKind, request: &Request, response: &Response) {
        let store = Arc::clone(&self.store);
        let generation = self.generations.name(kind).to_string();
        let key = request.cache_key();
        let entry = CachedResponse::capture(request, response);

        self.spawn_background(async move {
            if let Err(e) = store.put(&generation, &key, entry).await {
                tracing::warn!(generation = %generation, error = %e, "dropped cache write");
            }
        })
        .await;
    }

    /// Refetch a request and store the result in the dynamic generation.
    async fn revalidate_in_background(&self, request: Request) {
        let store = Arc::clone(&self.store);
        let network = Arc::clone(&self.network);
        let generation = self.generations.dynamic_name().to_string();
        let limit = self.network_timeout;

        self.spawn_background(async move {
            match fetch_with_timeout(network.as_ref(), &request, limit).await {
                Ok(response) if response.is_cacheable() => {
                    let entry = CachedResponse::capture(&request, &response);
                    if let Err(e) = store.put(&generation, &request.cache_key(), entry).await {
                        tracing::warn!(generation = %generation, error = %e, "dropped cache write");
                    }
                }
                Ok(response) => {
                    tracing::debug!(url = %request.url, status = response.status.as_u16(), "revalidation not cacheable");
                }
                Err(e) => {
                    tracing::debug!(url = %request.url, error = %e, "revalidation failed");
                }
            }
        })
        .await;
    }
}
