//! ACS Cache - Local entity cache
//!
//! Keeps an in-memory mirror of every entity the decision engine reads,
//! plus a timestamp-ordered buffer of recent access log entries.
//!
//! # Architecture
//!
//! - [`LocalEntityCache`] is the public handle, shared by `Arc` between the
//!   decision engine, the audit sink and the administrative layer.
//! - Entities live in per-kind [`dashmap::DashMap`] buckets so lookups on
//!   one bucket never block writers on another.
//! - Buckets and the log buffer together form one generation. A full
//!   reload builds a fresh generation off to the side and publishes it in
//!   a single pointer swap; readers never see a half-loaded cache.
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use acs_cache::LocalEntityCache;
//!
//! let cache = Arc::new(LocalEntityCache::new());
//! cache.reload_all(store.as_ref()).await?;
//! let badge = cache.get_badge(&badge_id);
//! ```

pub mod cache;
mod generation;

pub use cache::{CacheStats, LocalEntityCache};
