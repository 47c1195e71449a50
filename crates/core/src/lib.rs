//! Core of swcache: an offline cache router in front of a page-origin server.
//!
//! This crate provides:
//! - The `OfflineWorker` with its three caching strategies and lifecycle
//! - Generation-partitioned cache storage (SQLite and in-memory)
//! - Route classification and push-notification handling
//! - Unified error types and layered configuration

pub mod cache;
pub mod config;
pub mod error;
pub mod message;
pub mod network;
pub mod push;
pub mod routing;
pub mod worker;

pub use cache::{CacheDb, CacheStore, MemoryStore};
pub use config::AppConfig;
pub use error::Error;
pub use message::{Request, RequestMode, Response};
pub use network::{Network, NetworkError};
pub use routing::{Policy, RouteTable};
pub use worker::{FetchOutcome, OfflineWorker, WorkerState};
