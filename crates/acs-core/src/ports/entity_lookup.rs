//! Entity lookup port (read side of the local cache)
//!
//! The decision engine resolves every entity through this trait. Lookups
//! are synchronous and infallible: an entity that cannot be found, for
//! whatever reason, is reported as `None`.

use std::sync::Arc;

use crate::domain::{
    newtypes::{BadgeId, EmployeeId, GroupId, ResourceId},
    Badge, Employee, Group, Resource,
};

/// Port trait for point lookups of cached entities
pub trait IEntityLookup: Send + Sync {
    fn badge(&self, id: &BadgeId) -> Option<Badge>;

    fn employee(&self, id: &EmployeeId) -> Option<Employee>;

    fn group(&self, id: &GroupId) -> Option<Group>;

    fn resource(&self, id: &ResourceId) -> Option<Resource>;

    /// A view that keeps answering from the same state for a whole
    /// sequence of lookups, unaffected by a concurrent full reload.
    fn snapshot(self: Arc<Self>) -> Arc<dyn IEntityLookup>;
}
