//! Persistent request→response cache split into named generations.
//!
//! - `CacheStore` is the seam the worker depends on
//! - `CacheDb` persists generations in SQLite via tokio-rusqlite (WAL mode,
//!   versioned migrations, cascade deletes)
//! - `MemoryStore` keeps everything in process
//!
//! Entries have no TTL. They disappear only when their whole generation is
//! deleted during activation.

pub mod connection;
pub mod entries;
pub mod generation;
pub mod hash;
pub mod memory;
pub mod migrations;
pub mod store;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::CachedResponse;
pub use generation::{GenerationKind, Generations};
pub use memory::MemoryStore;
pub use store::CacheStore;
