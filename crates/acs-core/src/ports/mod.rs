//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the domain core
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IEntityStore`] - Durable storage for badges, employees, groups,
//!   resources and the access log
//! - [`IEntityLookup`] - Synchronous entity reads served by the local cache

pub mod entity_lookup;
pub mod entity_store;

pub use entity_lookup::IEntityLookup;
pub use entity_store::IEntityStore;
