//! Client code for swcache.
//!
//! This crate provides the HTTP client that forwards intercepted requests to
//! the page-origin server.

pub mod fetch;

pub use fetch::{FetchConfig, OriginClient, UrlError, canonicalize_origin, resolve};
