//! Employee domain entity

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::newtypes::{BadgeId, EmployeeId, GroupId};

/// A person who may hold a badge
///
/// Group membership is a set of group ids; order is irrelevant and
/// duplicates collapse. An employee may exist without a badge (new hire).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    id: EmployeeId,
    name: String,
    badge_id: Option<BadgeId>,
    #[serde(default)]
    group_ids: BTreeSet<GroupId>,
}

impl Employee {
    /// Creates a new employee with no badge and no group membership
    pub fn new(id: EmployeeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            badge_id: None,
            group_ids: BTreeSet::new(),
        }
    }

    /// Sets the employee's badge
    pub fn with_badge(mut self, badge_id: BadgeId) -> Self {
        self.badge_id = Some(badge_id);
        self
    }

    /// Adds the employee to a group
    pub fn with_group(mut self, group_id: GroupId) -> Self {
        self.group_ids.insert(group_id);
        self
    }

    pub fn id(&self) -> &EmployeeId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn badge_id(&self) -> Option<&BadgeId> {
        self.badge_id.as_ref()
    }

    pub fn group_ids(&self) -> &BTreeSet<GroupId> {
        &self.group_ids
    }

    /// Returns true if the employee belongs to the given group
    pub fn is_member_of(&self, group_id: &GroupId) -> bool {
        self.group_ids.contains(group_id)
    }

    pub fn set_badge(&mut self, badge_id: Option<BadgeId>) {
        self.badge_id = badge_id;
    }

    /// Adds a group membership; returns false if it already existed
    pub fn join_group(&mut self, group_id: GroupId) -> bool {
        self.group_ids.insert(group_id)
    }

    /// Removes a group membership; returns false if it did not exist
    pub fn leave_group(&mut self, group_id: &GroupId) -> bool {
        self.group_ids.remove(group_id)
    }
}
