//! Install and activate.
//!
//! Install pre-caches each manifest entry on its own: an entry that cannot be
//! fetched is reported and skipped instead of failing the whole generation.
//! Activate garbage-collects every generation outside the current whitelist
//! and only then claims clients.

use serde::Serialize;

use super::{OfflineWorker, WorkerState};
use crate::Error;
use crate::cache::{CachedResponse, GenerationKind};
use crate::message::Request;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrecacheFailure {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct InstallReport {
    pub cached: Vec<String>,
    pub failed: Vec<PrecacheFailure>,
    /// Always set: a new worker never waits for the old one to retire.
    pub skip_waiting: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ActivateReport {
    pub deleted: Vec<String>,
    pub claimed: bool,
}

#[derive(Default)]
struct Precached {
    cached: Vec<String>,
    failed: Vec<PrecacheFailure>,
}

impl OfflineWorker {
    /// Open both generations and fill them from the manifests.
    ///
    /// # Errors
    ///
    /// Returns `Error::Lifecycle` if the worker was already installed and an
    /// error if a generation cannot be opened. Individual entries never fail
    /// the install.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        if self.state() != WorkerState::Parsed {
            return Err(Error::Lifecycle(format!("install called in state {:?}", self.state())));
        }
        self.transition(WorkerState::Installing);

        // Lookups walk generations in creation order, so static is opened first.
        self.store.open(self.generations.static_name()).await?;
        self.store.open(self.generations.dynamic_name()).await?;

        let (statics, dynamics) = tokio::join!(
            self.precache(GenerationKind::Static, &self.manifest.static_assets),
            self.precache(GenerationKind::Dynamic, &self.manifest.cacheable),
        );

        let mut report = InstallReport { skip_waiting: true, ..Default::default() };
        for precached in [statics?, dynamics?] {
            report.cached.extend(precached.cached);
            report.failed.extend(precached.failed);
        }

        if !report.failed.is_empty() {
            tracing::warn!(
                cached = report.cached.len(),
                failed = report.failed.len(),
                "install finished with missing manifest entries"
            );
        }
        tracing::info!(cached = report.cached.len(), "worker installed");
        self.transition(WorkerState::Installed);

        Ok(report)
    }

    async fn precache(&self, kind: GenerationKind, paths: &[String]) -> Result<Precached, Error> {
        let generation = self.generations.name(kind);

        let mut outcome = Precached::default();
        for path in paths {
            let failure = |reason: String| PrecacheFailure { path: path.clone(), reason };

            let request = match self.resolve(path) {
                Ok(url) => Request::get(url),
                Err(e) => {
                    outcome.failed.push(failure(e.to_string()));
                    continue;
                }
            };

            match self.network_fetch(&request).await {
                Ok(response) if response.is_cacheable() => {
                    let entry = CachedResponse::capture(&request, &response);
                    match self.store.put(generation, &request.cache_key(), entry).await {
                        Ok(()) => outcome.cached.push(path.clone()),
                        Err(e) => outcome.failed.push(failure(e.to_string())),
                    }
                }
                Ok(response) => outcome.failed.push(failure(format!("status {}", response.status.as_u16()))),
                Err(e) => outcome.failed.push(failure(e.to_string())),
            }
        }

        tracing::debug!(generation, cached = outcome.cached.len(), failed = outcome.failed.len(), "precached");
        Ok(outcome)
    }

    /// Delete stale generations, then claim clients.
    ///
    /// # Errors
    ///
    /// Returns `Error::Lifecycle` unless the worker is installed, and store
    /// errors from listing or deleting generations.
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        if self.state() != WorkerState::Installed {
            return Err(Error::Lifecycle(format!("activate called in state {:?}", self.state())));
        }
        self.transition(WorkerState::Activating);

        let mut deleted = Vec::new();
        for name in self.store.list_generations().await? {
            if self.generations.is_current(&name) {
                continue;
            }
            tracing::info!(generation = %name, "deleting old cache generation");
            if self.store.delete_generation(&name).await? {
                deleted.push(name);
            }
        }

        self.transition(WorkerState::Activated);
        tracing::info!(deleted = deleted.len(), "worker activated");

        Ok(ActivateReport { deleted, claimed: true })
    }
}
