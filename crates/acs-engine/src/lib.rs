//! ACS Engine - Access decisions and administration
//!
//! Provides:
//! - `DecisionEngine`: Turns an access request into a verdict and records
//!   exactly one audit entry for it
//! - `AdminService`: Store-first maintenance of badges, employees, groups
//!   and resources, mirrored into the local cache
//!
//! # Usage
//!
//! ```ignore
//! let engine = DecisionEngine::new(cache.clone(), audit.clone());
//! let result = engine
//!     .evaluate(&AccessRequest::new("B001", "R-LAB", Utc::now()))
//!     .await;
//! if result.is_allowed() {
//!     // open the door
//! }
//! ```

pub mod admin;
pub mod engine;

pub use admin::{AdminError, AdminService};
pub use engine::DecisionEngine;
