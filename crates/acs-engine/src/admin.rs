//! Administrative service
//!
//! Maintains badges, employees, groups and resources. Each operation reads
//! the current state from the entity store, writes the change back to the
//! store and, only once every write succeeded, mirrors the new values into
//! the local cache.

use std::sync::Arc;

use acs_cache::LocalEntityCache;
use acs_core::domain::{
    newtypes::{BadgeId, EmployeeId, GroupId, ResourceId},
    Badge, BadgeStatus, DomainError, Employee, Group, Resource, ResourceState, ResourceType,
};
use acs_core::ports::IEntityStore;

/// Errors returned by administrative operations
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    /// A required argument was missing or blank
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The entity to be created already exists
    #[error("{kind} already exists: {id}")]
    AlreadyExists { kind: &'static str, id: String },

    /// A referenced entity does not exist
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// The entity store failed
    #[error("Store error: {0}")]
    Store(anyhow::Error),
}

impl From<DomainError> for AdminError {
    fn from(e: DomainError) -> Self {
        AdminError::InvalidArgument(e.to_string())
    }
}

impl From<anyhow::Error> for AdminError {
    fn from(e: anyhow::Error) -> Self {
        AdminError::Store(e)
    }
}

pub type Result<T> = std::result::Result<T, AdminError>;

fn require_name(name: &str, field: &str) -> Result<String> {
    if name.trim().is_empty() {
        return Err(AdminError::InvalidArgument(format!("{} cannot be empty", field)));
    }
    Ok(name.to_string())
}

/// Store-first administration of the access control entities
///
/// Operations are serialized among themselves so that read-modify-write
/// sequences on the same entity cannot interleave.
pub struct AdminService {
    store: Arc<dyn IEntityStore>,
    cache: Arc<LocalEntityCache>,
    write_lock: tokio::sync::Mutex<()>,
}

impl AdminService {
    pub fn new(store: Arc<dyn IEntityStore>, cache: Arc<LocalEntityCache>) -> Self {
        Self {
            store,
            cache,
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    async fn existing_badge(&self, id: &BadgeId) -> Result<Badge> {
        self.store
            .get_badge(id)
            .await?
            .ok_or_else(|| AdminError::NotFound {
                kind: "Badge",
                id: id.to_string(),
            })
    }

    async fn existing_employee(&self, id: &EmployeeId) -> Result<Employee> {
        self.store
            .get_employee(id)
            .await?
            .ok_or_else(|| AdminError::NotFound {
                kind: "Employee",
                id: id.to_string(),
            })
    }

    async fn existing_group(&self, id: &GroupId) -> Result<Group> {
        self.store
            .get_group(id)
            .await?
            .ok_or_else(|| AdminError::NotFound {
                kind: "Group",
                id: id.to_string(),
            })
    }

    async fn existing_resource(&self, id: &ResourceId) -> Result<Resource> {
        self.store
            .get_resource(id)
            .await?
            .ok_or_else(|| AdminError::NotFound {
                kind: "Resource",
                id: id.to_string(),
            })
    }

    // ========================================================================
    // Employees and badges
    // ========================================================================

    /// Creates an employee with no badge and no group memberships
    pub async fn register_employee(&self, employee_id: &str, name: &str) -> Result<Employee> {
        let id = EmployeeId::new(employee_id)?;
        let name = require_name(name, "name")?;
        let _guard = self.write_lock.lock().await;

        if self.store.get_employee(&id).await?.is_some() {
            return Err(AdminError::AlreadyExists {
                kind: "Employee",
                id: id.to_string(),
            });
        }

        let employee = Employee::new(id, name);
        self.store.save_employee(&employee).await?;
        self.cache.put_employee(employee.clone()).await;

        tracing::info!(employee_id = %employee.id(), "Registered employee");
        Ok(employee)
    }

    /// Issues a new active badge to an employee
    ///
    /// A badge the employee held before is unbound from them but keeps its
    /// status.
    pub async fn issue_badge(&self, employee_id: &str, badge_id: &str) -> Result<Badge> {
        let employee_id = EmployeeId::new(employee_id)?;
        let badge_id = BadgeId::new(badge_id)?;
        let _guard = self.write_lock.lock().await;

        let mut employee = self.existing_employee(&employee_id).await?;
        if self.store.get_badge(&badge_id).await?.is_some() {
            return Err(AdminError::AlreadyExists {
                kind: "Badge",
                id: badge_id.to_string(),
            });
        }

        let previous = match employee.badge_id() {
            Some(old_id) => self.store.get_badge(old_id).await?,
            None => None,
        };
        let previous = previous.map(|mut old| {
            old.set_employee(None);
            old
        });

        let badge = Badge::new(badge_id.clone(), BadgeStatus::Active).with_employee(employee_id);
        employee.set_badge(Some(badge_id));
        self.store
            .bind_badge(previous.as_ref(), &badge, &employee)
            .await?;

        if let Some(old) = previous {
            self.cache.put_badge(old).await;
        }
        self.cache.put_badge(badge.clone()).await;
        self.cache.put_employee(employee).await;

        tracing::info!(badge_id = %badge.id(), employee_id = ?badge.employee_id(), "Issued badge");
        Ok(badge)
    }

    pub async fn set_badge_status(&self, badge_id: &str, status: BadgeStatus) -> Result<Badge> {
        let badge_id = BadgeId::new(badge_id)?;
        let _guard = self.write_lock.lock().await;

        let mut badge = self.existing_badge(&badge_id).await?;
        badge.set_status(status);
        self.store.save_badge(&badge).await?;
        self.cache.put_badge(badge.clone()).await;

        tracing::info!(badge_id = %badge.id(), %status, "Changed badge status");
        Ok(badge)
    }

    // ========================================================================
    // Groups
    // ========================================================================

    pub async fn create_group(&self, group_id: &str, name: &str) -> Result<Group> {
        let id = GroupId::new(group_id)?;
        let name = require_name(name, "group name")?;
        let _guard = self.write_lock.lock().await;

        if self.store.get_group(&id).await?.is_some() {
            return Err(AdminError::AlreadyExists {
                kind: "Group",
                id: id.to_string(),
            });
        }

        let group = Group::new(id, name);
        self.store.save_group(&group).await?;
        self.cache.put_group(group.clone()).await;

        tracing::info!(group_id = %group.id(), "Created group");
        Ok(group)
    }

    pub async fn assign_employee_to_group(
        &self,
        employee_id: &str,
        group_id: &str,
    ) -> Result<Employee> {
        let employee_id = EmployeeId::new(employee_id)?;
        let group_id = GroupId::new(group_id)?;
        let _guard = self.write_lock.lock().await;

        let mut employee = self.existing_employee(&employee_id).await?;
        self.existing_group(&group_id).await?;

        if employee.join_group(group_id.clone()) {
            self.store.save_employee(&employee).await?;
            self.cache.put_employee(employee.clone()).await;
            tracing::info!(employee_id = %employee_id, group_id = %group_id, "Added employee to group");
        }
        Ok(employee)
    }

    pub async fn remove_employee_from_group(
        &self,
        employee_id: &str,
        group_id: &str,
    ) -> Result<Employee> {
        let employee_id = EmployeeId::new(employee_id)?;
        let group_id = GroupId::new(group_id)?;
        let _guard = self.write_lock.lock().await;

        let mut employee = self.existing_employee(&employee_id).await?;
        self.existing_group(&group_id).await?;

        if employee.leave_group(&group_id) {
            self.store.save_employee(&employee).await?;
            self.cache.put_employee(employee.clone()).await;
            tracing::info!(employee_id = %employee_id, group_id = %group_id, "Removed employee from group");
        }
        Ok(employee)
    }

    // ========================================================================
    // Resources and grants
    // ========================================================================

    /// Creates a resource in the `Available` state
    pub async fn register_resource(
        &self,
        resource_id: &str,
        name: &str,
        resource_type: ResourceType,
    ) -> Result<Resource> {
        let id = ResourceId::new(resource_id)?;
        let name = require_name(name, "name")?;
        let _guard = self.write_lock.lock().await;

        if self.store.get_resource(&id).await?.is_some() {
            return Err(AdminError::AlreadyExists {
                kind: "Resource",
                id: id.to_string(),
            });
        }

        let resource = Resource::new(id, name, resource_type);
        self.store.save_resource(&resource).await?;
        self.cache.put_resource(resource.clone()).await;

        tracing::info!(resource_id = %resource.id(), %resource_type, "Registered resource");
        Ok(resource)
    }

    pub async fn set_resource_state(
        &self,
        resource_id: &str,
        state: ResourceState,
    ) -> Result<Resource> {
        let id = ResourceId::new(resource_id)?;
        let _guard = self.write_lock.lock().await;

        let mut resource = self.existing_resource(&id).await?;
        resource.set_state(state);
        self.store.save_resource(&resource).await?;
        self.cache.put_resource(resource.clone()).await;

        tracing::info!(resource_id = %resource.id(), %state, "Changed resource state");
        Ok(resource)
    }

    pub async fn grant_group_access(&self, group_id: &str, resource_id: &str) -> Result<Group> {
        let group_id = GroupId::new(group_id)?;
        let resource_id = ResourceId::new(resource_id)?;
        let _guard = self.write_lock.lock().await;

        let mut group = self.existing_group(&group_id).await?;
        self.existing_resource(&resource_id).await?;

        if group.grant(resource_id.clone()) {
            self.store.save_group(&group).await?;
            self.cache.put_group(group.clone()).await;
            tracing::info!(group_id = %group_id, resource_id = %resource_id, "Granted access");
        }
        Ok(group)
    }

    pub async fn revoke_group_access(&self, group_id: &str, resource_id: &str) -> Result<Group> {
        let group_id = GroupId::new(group_id)?;
        let resource_id = ResourceId::new(resource_id)?;
        let _guard = self.write_lock.lock().await;

        let mut group = self.existing_group(&group_id).await?;
        self.existing_resource(&resource_id).await?;

        if group.revoke(&resource_id) {
            self.store.save_group(&group).await?;
            self.cache.put_group(group.clone()).await;
            tracing::info!(group_id = %group_id, resource_id = %resource_id, "Revoked access");
        }
        Ok(group)
    }
}
