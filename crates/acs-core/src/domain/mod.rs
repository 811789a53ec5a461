//! Domain entities and business logic
//!
//! This module contains the core domain types for access control:
//! - Newtypes for type-safe, validated identifiers
//! - Badges, employees, groups and resources
//! - Access log entries (the audit trail)
//! - Access requests, verdicts and reason codes
//! - Domain-specific error types

pub mod access_log;
pub mod badge;
pub mod decision;
pub mod employee;
pub mod errors;
pub mod group;
pub mod newtypes;
pub mod resource;

// Re-export commonly used types
pub use access_log::AccessLogEntry;
pub use badge::{Badge, BadgeStatus};
pub use decision::{AccessDecision, AccessRequest, AccessResult, ReasonCode};
pub use employee::Employee;
pub use errors::DomainError;
pub use group::Group;
pub use newtypes::*;
pub use resource::{Resource, ResourceState, ResourceType};
