//! Test doubles for driving the worker without a real origin.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use http::StatusCode;
use tokio::sync::Semaphore;

use super::OfflineWorker;
use crate::cache::{CacheStore, MemoryStore};
use crate::config::AppConfig;
use crate::message::{Request, Response};
use crate::network::{Network, NetworkError};

#[derive(Clone)]
enum Reply {
    Respond(StatusCode, Bytes),
    Offline,
    Hang,
}

/// Scripted origin. Unknown paths behave as if the network were down.
pub(crate) struct FakeNetwork {
    replies: Mutex<HashMap<String, Reply>>,
    calls: Mutex<Vec<String>>,
    gate: Option<Semaphore>,
}

impl FakeNetwork {
    pub(crate) fn new() -> Self {
        Self { replies: Mutex::new(HashMap::new()), calls: Mutex::new(Vec::new()), gate: None }
    }

    /// Every fetch blocks until `open_gate` is called.
    pub(crate) fn gated() -> Self {
        Self { gate: Some(Semaphore::new(0)), ..Self::new() }
    }

    pub(crate) fn reply(&self, path: &str, status: StatusCode, body: impl Into<Bytes>) {
        self.replies.lock().unwrap().insert(path.to_string(), Reply::Respond(status, body.into()));
    }

    pub(crate) fn offline(&self, path: &str) {
        self.replies.lock().unwrap().insert(path.to_string(), Reply::Offline);
    }

    pub(crate) fn hang(&self, path: &str) {
        self.replies.lock().unwrap().insert(path.to_string(), Reply::Hang);
    }

    pub(crate) fn open_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1024);
        }
    }

    /// Paths fetched so far, in order.
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Network for FakeNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        let path = request.path().to_string();
        self.calls.lock().unwrap().push(path.clone());

        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await.unwrap();
        }

        let reply = self.replies.lock().unwrap().get(&path).cloned().unwrap_or(Reply::Offline);
        match reply {
            Reply::Respond(status, body) => Ok(Response::new(status, body)),
            Reply::Offline => Err(NetworkError::Unreachable(format!("no route to {path}"))),
            Reply::Hang => std::future::pending().await,
        }
    }
}

pub(crate) fn worker_with_config(
    config: AppConfig, network: FakeNetwork,
) -> (OfflineWorker, Arc<MemoryStore>, Arc<FakeNetwork>) {
    let store = Arc::new(MemoryStore::new());
    let network = Arc::new(network);
    let worker = OfflineWorker::new(
        &config,
        Arc::clone(&store) as Arc<dyn CacheStore>,
        Arc::clone(&network) as Arc<dyn Network>,
    )
    .expect("test config is valid");
    (worker, store, network)
}

pub(crate) fn worker_with(network: FakeNetwork) -> (OfflineWorker, Arc<MemoryStore>, Arc<FakeNetwork>) {
    let config = AppConfig { origin: "https://app.test".into(), ..Default::default() };
    worker_with_config(config, network)
}
