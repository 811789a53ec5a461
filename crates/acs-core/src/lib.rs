//! ACS Core - Domain logic and business rules
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `Badge`, `Employee`, `Group`, `Resource`, `AccessLogEntry`
//! - **Verdict types** - `AccessRequest`, `AccessResult`, `AccessDecision`, `ReasonCode`
//! - **Port definitions** - `IEntityStore` (storage adapters) and `IEntityLookup` (the cache)
//! - **Configuration** - YAML-backed `Config` with validation
//!
//! # Architecture
//!
//! This crate follows the hexagonal (ports & adapters) architecture pattern.
//! The domain module contains pure business logic with no I/O.
//! Ports define trait interfaces that adapter crates implement.
//! Associations between entities are held as id sets, never as references,
//! so the object graph has no ownership cycles.

pub mod config;
pub mod domain;
pub mod ports;
