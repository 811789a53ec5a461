//! Admin command - Maintain badges, employees, groups and resources
//!
//! Every change is written to the entity store first and then mirrored into
//! the cache, so a later `acs check` sees it immediately.

use anyhow::{Context, Result};
use clap::Subcommand;
use serde::Serialize;

use acs_core::config::Config;
use acs_core::domain::{BadgeStatus, ResourceState, ResourceType};
use acs_engine::{AdminError, AdminService};

use super::Services;
use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum AdminCommand {
    /// Manage employees
    #[command(subcommand)]
    Employee(EmployeeCommand),
    /// Manage badges
    #[command(subcommand)]
    Badge(BadgeCommand),
    /// Manage groups and membership
    #[command(subcommand)]
    Group(GroupCommand),
    /// Manage resources
    #[command(subcommand)]
    Resource(ResourceCommand),
    /// Allow a group to access a resource
    Grant {
        group: String,
        resource: String,
    },
    /// Withdraw a group's access to a resource
    Revoke {
        group: String,
        resource: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum EmployeeCommand {
    /// Register a new employee
    Add { id: String, name: String },
}

#[derive(Debug, Subcommand)]
pub enum BadgeCommand {
    /// Issue a badge to an employee, replacing any badge they already hold
    Issue { employee: String, badge: String },
    /// Change a badge's status (active, disabled, lost)
    Status { badge: String, status: BadgeStatus },
}

#[derive(Debug, Subcommand)]
pub enum GroupCommand {
    /// Create a new group
    Add { id: String, name: String },
    /// Add an employee to a group
    Assign { group: String, employee: String },
    /// Remove an employee from a group
    Remove { group: String, employee: String },
}

#[derive(Debug, Subcommand)]
pub enum ResourceCommand {
    /// Register a new resource
    Add {
        id: String,
        name: String,
        /// Resource type (door, printer, computer, room, other, pending)
        #[arg(long = "type", default_value = "door")]
        resource_type: ResourceType,
    },
    /// Change a resource's state (available, occupied, locked, offline)
    State { id: String, state: ResourceState },
}

impl AdminCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);
        let services = Services::open(config).await?;

        match self.apply(&services.admin).await {
            Ok(outcome) => {
                if format.is_json() {
                    let json = serde_json::to_value(&outcome.entity)
                        .context("Failed to serialize result")?;
                    formatter.print_json(&serde_json::json!({
                        "success": true,
                        "message": outcome.message,
                        "entity": json,
                    }));
                } else {
                    formatter.success(&outcome.message);
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "Admin command failed");
                formatter.error(&e.to_string());
            }
        }

        Ok(())
    }

    async fn apply(&self, admin: &AdminService) -> std::result::Result<Outcome, AdminError> {
        let outcome = match self {
            AdminCommand::Employee(EmployeeCommand::Add { id, name }) => {
                let employee = admin.register_employee(id, name).await?;
                Outcome::new(format!("Registered employee {} ({})", id, name), &employee)
            }
            AdminCommand::Badge(BadgeCommand::Issue { employee, badge }) => {
                let issued = admin.issue_badge(employee, badge).await?;
                Outcome::new(format!("Issued badge {} to {}", badge, employee), &issued)
            }
            AdminCommand::Badge(BadgeCommand::Status { badge, status }) => {
                let updated = admin.set_badge_status(badge, *status).await?;
                Outcome::new(format!("Badge {} is now {}", badge, status), &updated)
            }
            AdminCommand::Group(GroupCommand::Add { id, name }) => {
                let group = admin.create_group(id, name).await?;
                Outcome::new(format!("Created group {} ({})", id, name), &group)
            }
            AdminCommand::Group(GroupCommand::Assign { group, employee }) => {
                let updated = admin.assign_employee_to_group(employee, group).await?;
                Outcome::new(format!("Added {} to group {}", employee, group), &updated)
            }
            AdminCommand::Group(GroupCommand::Remove { group, employee }) => {
                let updated = admin.remove_employee_from_group(employee, group).await?;
                Outcome::new(format!("Removed {} from group {}", employee, group), &updated)
            }
            AdminCommand::Resource(ResourceCommand::Add {
                id,
                name,
                resource_type,
            }) => {
                let resource = admin.register_resource(id, name, *resource_type).await?;
                Outcome::new(
                    format!("Registered {} {} ({})", resource_type, id, name),
                    &resource,
                )
            }
            AdminCommand::Resource(ResourceCommand::State { id, state }) => {
                let resource = admin.set_resource_state(id, *state).await?;
                Outcome::new(format!("Resource {} is now {}", id, state), &resource)
            }
            AdminCommand::Grant { group, resource } => {
                let updated = admin.grant_group_access(group, resource).await?;
                Outcome::new(format!("Group {} may access {}", group, resource), &updated)
            }
            AdminCommand::Revoke { group, resource } => {
                let updated = admin.revoke_group_access(group, resource).await?;
                Outcome::new(
                    format!("Group {} may no longer access {}", group, resource),
                    &updated,
                )
            }
        };
        Ok(outcome)
    }
}

/// What an admin operation changed, ready for either output format
struct Outcome {
    message: String,
    entity: serde_json::Value,
}

impl Outcome {
    fn new(message: String, entity: &impl Serialize) -> Self {
        Self {
            message,
            entity: serde_json::to_value(entity).unwrap_or_default(),
        }
    }
}
