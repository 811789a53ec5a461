//! Group domain entity
//!
//! Groups are the sole unit of authorization: an employee may access a
//! resource iff at least one of their groups grants it.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::newtypes::{GroupId, ResourceId};

/// A named set of granted resources
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    id: GroupId,
    name: String,
    #[serde(default)]
    resource_ids: BTreeSet<ResourceId>,
}

impl Group {
    /// Creates a new group with no grants
    pub fn new(id: GroupId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            resource_ids: BTreeSet::new(),
        }
    }

    /// Grants access to a resource
    pub fn with_resource(mut self, resource_id: ResourceId) -> Self {
        self.resource_ids.insert(resource_id);
        self
    }

    pub fn id(&self) -> &GroupId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn resource_ids(&self) -> &BTreeSet<ResourceId> {
        &self.resource_ids
    }

    /// Returns true if this group grants the resource
    pub fn grants(&self, resource_id: &ResourceId) -> bool {
        self.resource_ids.contains(resource_id)
    }

    /// Adds a grant; returns false if it already existed
    pub fn grant(&mut self, resource_id: ResourceId) -> bool {
        self.resource_ids.insert(resource_id)
    }

    /// Removes a grant; returns false if it did not exist
    pub fn revoke(&mut self, resource_id: &ResourceId) -> bool {
        self.resource_ids.remove(resource_id)
    }
}
