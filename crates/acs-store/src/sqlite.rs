//! SQLite implementation of IEntityStore
//!
//! This module provides the durable, SQLite-based implementation of the
//! entity store port defined in acs-core. It handles domain type
//! conversion and SQL query construction.
//!
//! ## Type Mapping
//!
//! | Domain Type                | SQL Type | Strategy                                  |
//! |----------------------------|----------|-------------------------------------------|
//! | BadgeId, EmployeeId, ...   | TEXT     | `.as_str()` / `::new()`                   |
//! | LogId                      | INTEGER  | AUTOINCREMENT rowid                       |
//! | DateTime<Utc>              | TEXT     | fixed-width RFC 3339, nanosecond precision |
//! | BadgeStatus, ResourceState | TEXT     | `.as_str()` / `FromStr`                   |
//! | ResourceType               | TEXT     | `.as_str()` / `FromStr`                   |
//! | AccessDecision, ReasonCode | TEXT     | `.as_str()` / `FromStr`                   |
//! | Employee.group_ids         | rows     | `employee_groups` join table              |
//! | Group.resource_ids         | rows     | `group_resources` join table              |

use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::{Row, SqlitePool};

use acs_core::domain::{
    newtypes::{BadgeId, EmployeeId, GroupId, LogId, ResourceId},
    AccessDecision, AccessLogEntry, Badge, BadgeStatus, Employee, Group, ReasonCode, Resource,
    ResourceState, ResourceType,
};
use acs_core::ports::IEntityStore;

use crate::StoreError;

/// SQLite-based implementation of the entity store port
///
/// Provides persistent storage for all domain entities using SQLite.
/// All operations are performed through a connection pool for concurrency.
pub struct SqliteEntityStore {
    pool: SqlitePool,
}

impl SqliteEntityStore {
    /// Creates a new store instance with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

// ============================================================================
// Helper functions for type conversion
// ============================================================================

/// Format a timestamp so that string order equals chronological order
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Parse a DateTime<Utc> from its stored RFC 3339 string
fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            StoreError::SerializationError(format!("Failed to parse timestamp '{}': {}", s, e))
        })
}

/// Wrap a domain conversion failure with the column it came from
fn column_error(column: &str, value: &str, e: impl std::fmt::Display) -> StoreError {
    StoreError::SerializationError(format!("Invalid {} '{}': {}", column, value, e))
}

fn parse_optional_id<T>(
    column: &str,
    value: Option<String>,
    parse: impl FnOnce(String) -> Result<T, acs_core::domain::DomainError>,
) -> Result<Option<T>, StoreError> {
    match value {
        Some(v) if !v.is_empty() => parse(v.clone())
            .map(Some)
            .map_err(|e| column_error(column, &v, e)),
        _ => Ok(None),
    }
}

// ============================================================================
// Row mapping functions
// ============================================================================

fn badge_from_row(row: &SqliteRow) -> Result<Badge, StoreError> {
    let id_str: String = row.get("id");
    let status_str: String = row.get("status");
    let employee_id_str: Option<String> = row.get("employee_id");

    let id = BadgeId::new(id_str.clone()).map_err(|e| column_error("badge id", &id_str, e))?;
    let status: BadgeStatus = status_str
        .parse()
        .map_err(|e| column_error("badge status", &status_str, e))?;
    let employee_id = parse_optional_id("employee_id", employee_id_str, EmployeeId::new)?;

    let mut badge = Badge::new(id, status);
    badge.set_employee(employee_id);
    Ok(badge)
}

/// Reconstruct an Employee from its row; group memberships are attached separately
fn employee_from_row(row: &SqliteRow) -> Result<Employee, StoreError> {
    let id_str: String = row.get("id");
    let name: String = row.get("name");
    let badge_id_str: Option<String> = row.get("badge_id");

    let id =
        EmployeeId::new(id_str.clone()).map_err(|e| column_error("employee id", &id_str, e))?;
    let badge_id = parse_optional_id("badge_id", badge_id_str, BadgeId::new)?;

    let mut employee = Employee::new(id, name);
    employee.set_badge(badge_id);
    Ok(employee)
}

fn group_from_row(row: &SqliteRow) -> Result<Group, StoreError> {
    let id_str: String = row.get("id");
    let name: String = row.get("name");

    let id = GroupId::new(id_str.clone()).map_err(|e| column_error("group id", &id_str, e))?;
    Ok(Group::new(id, name))
}

fn resource_from_row(row: &SqliteRow) -> Result<Resource, StoreError> {
    let id_str: String = row.get("id");
    let name: String = row.get("name");
    let type_str: String = row.get("resource_type");
    let state_str: String = row.get("state");

    let id =
        ResourceId::new(id_str.clone()).map_err(|e| column_error("resource id", &id_str, e))?;
    let resource_type: ResourceType = type_str
        .parse()
        .map_err(|e| column_error("resource type", &type_str, e))?;
    let state: ResourceState = state_str
        .parse()
        .map_err(|e| column_error("resource state", &state_str, e))?;

    Ok(Resource::new(id, name, resource_type).with_state(state))
}

fn log_entry_from_row(row: &SqliteRow) -> Result<AccessLogEntry, StoreError> {
    let id: i64 = row.get("id");
    let timestamp_str: String = row.get("timestamp");
    let badge_id: String = row.get("badge_id");
    let employee_id_str: Option<String> = row.get("employee_id");
    let resource_id: String = row.get("resource_id");
    let decision_str: String = row.get("decision");
    let reason_str: String = row.get("reason_code");

    let timestamp = parse_timestamp(&timestamp_str)?;
    let employee_id = parse_optional_id("employee_id", employee_id_str, EmployeeId::new)?;
    let reason: ReasonCode = reason_str
        .parse()
        .map_err(|e| column_error("reason_code", &reason_str, e))?;
    let decision: AccessDecision = decision_str
        .parse()
        .map_err(|e| column_error("decision", &decision_str, e))?;

    if decision != reason.decision() {
        return Err(StoreError::SerializationError(format!(
            "Log entry {} has decision {} but reason {}",
            id, decision, reason
        )));
    }

    Ok(AccessLogEntry::new(timestamp, badge_id, employee_id, resource_id, reason)
        .with_id(LogId::new(id)))
}

// ============================================================================
// IEntityStore implementation
// ============================================================================

// ============================================================================
// Row writers shared by single saves and multi-row transactions
// ============================================================================

async fn write_badge(conn: &mut SqliteConnection, badge: &Badge) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT OR REPLACE INTO badges (id, status, employee_id) VALUES (?, ?, ?)")
        .bind(badge.id().as_str())
        .bind(badge.status().as_str())
        .bind(badge.employee_id().map(|e| e.as_str()))
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Writes the employee row and replaces its membership rows
async fn write_employee(
    conn: &mut SqliteConnection,
    employee: &Employee,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT OR REPLACE INTO employees (id, name, badge_id) VALUES (?, ?, ?)")
        .bind(employee.id().as_str())
        .bind(employee.name())
        .bind(employee.badge_id().map(|b| b.as_str()))
        .execute(&mut *conn)
        .await?;

    sqlx::query("DELETE FROM employee_groups WHERE employee_id = ?")
        .bind(employee.id().as_str())
        .execute(&mut *conn)
        .await?;

    for group_id in employee.group_ids() {
        sqlx::query("INSERT INTO employee_groups (employee_id, group_id) VALUES (?, ?)")
            .bind(employee.id().as_str())
            .bind(group_id.as_str())
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

#[async_trait::async_trait]
impl IEntityStore for SqliteEntityStore {
    // --- Badge operations ---

    async fn load_all_badges(&self) -> anyhow::Result<Vec<Badge>> {
        let rows = sqlx::query("SELECT * FROM badges ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        let mut badges = Vec::with_capacity(rows.len());
        for row in &rows {
            badges.push(badge_from_row(row)?);
        }
        Ok(badges)
    }

    async fn get_badge(&self, id: &BadgeId) -> anyhow::Result<Option<Badge>> {
        let row = sqlx::query("SELECT * FROM badges WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => Ok(Some(badge_from_row(r)?)),
            None => Ok(None),
        }
    }

    async fn save_badge(&self, badge: &Badge) -> anyhow::Result<()> {
        let mut conn = self.pool.acquire().await?;
        write_badge(&mut conn, badge).await?;

        tracing::trace!(badge_id = %badge.id(), "Saved badge");
        Ok(())
    }

    async fn bind_badge(
        &self,
        previous: Option<&Badge>,
        badge: &Badge,
        employee: &Employee,
    ) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        if let Some(old) = previous {
            write_badge(&mut tx, old).await?;
        }
        write_badge(&mut tx, badge).await?;
        write_employee(&mut tx, employee).await?;

        tx.commit().await?;

        tracing::trace!(
            badge_id = %badge.id(),
            employee_id = %employee.id(),
            previous = ?previous.map(|b| b.id().as_str()),
            "Bound badge"
        );
        Ok(())
    }

    async fn delete_badge(&self, id: &BadgeId) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM badges WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        tracing::trace!(badge_id = %id, "Deleted badge");
        Ok(())
    }

    // --- Employee operations ---

    async fn load_all_employees(&self) -> anyhow::Result<Vec<Employee>> {
        let rows = sqlx::query("SELECT * FROM employees ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        let memberships = sqlx::query("SELECT employee_id, group_id FROM employee_groups")
            .fetch_all(&self.pool)
            .await?;

        let mut employees: HashMap<String, Employee> = HashMap::with_capacity(rows.len());
        for row in &rows {
            let employee = employee_from_row(row)?;
            employees.insert(employee.id().as_str().to_string(), employee);
        }

        for row in &memberships {
            let employee_id: String = row.get("employee_id");
            let group_id: String = row.get("group_id");
            if let Some(employee) = employees.get_mut(&employee_id) {
                let group_id = GroupId::new(group_id.clone())
                    .map_err(|e| column_error("group_id", &group_id, e))?;
                employee.join_group(group_id);
            }
        }

        let mut employees: Vec<Employee> = employees.into_values().collect();
        employees.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(employees)
    }

    async fn get_employee(&self, id: &EmployeeId) -> anyhow::Result<Option<Employee>> {
        let row = sqlx::query("SELECT * FROM employees WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut employee = employee_from_row(&row)?;

        let groups = sqlx::query("SELECT group_id FROM employee_groups WHERE employee_id = ?")
            .bind(id.as_str())
            .fetch_all(&self.pool)
            .await?;
        for row in &groups {
            let group_id: String = row.get("group_id");
            let group_id = GroupId::new(group_id.clone())
                .map_err(|e| column_error("group_id", &group_id, e))?;
            employee.join_group(group_id);
        }

        Ok(Some(employee))
    }

    async fn save_employee(&self, employee: &Employee) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;
        write_employee(&mut tx, employee).await?;
        tx.commit().await?;

        tracing::trace!(
            employee_id = %employee.id(),
            groups = employee.group_ids().len(),
            "Saved employee"
        );
        Ok(())
    }

    async fn delete_employee(&self, id: &EmployeeId) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM employee_groups WHERE employee_id = ?")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM employees WHERE id = ?")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::trace!(employee_id = %id, "Deleted employee");
        Ok(())
    }

    // --- Group operations ---

    async fn load_all_groups(&self) -> anyhow::Result<Vec<Group>> {
        let rows = sqlx::query("SELECT * FROM access_groups ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        let grants = sqlx::query("SELECT group_id, resource_id FROM group_resources")
            .fetch_all(&self.pool)
            .await?;

        let mut groups: HashMap<String, Group> = HashMap::with_capacity(rows.len());
        for row in &rows {
            let group = group_from_row(row)?;
            groups.insert(group.id().as_str().to_string(), group);
        }

        for row in &grants {
            let group_id: String = row.get("group_id");
            let resource_id: String = row.get("resource_id");
            if let Some(group) = groups.get_mut(&group_id) {
                let resource_id = ResourceId::new(resource_id.clone())
                    .map_err(|e| column_error("resource_id", &resource_id, e))?;
                group.grant(resource_id);
            }
        }

        let mut groups: Vec<Group> = groups.into_values().collect();
        groups.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(groups)
    }

    async fn get_group(&self, id: &GroupId) -> anyhow::Result<Option<Group>> {
        let row = sqlx::query("SELECT * FROM access_groups WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut group = group_from_row(&row)?;

        let grants = sqlx::query("SELECT resource_id FROM group_resources WHERE group_id = ?")
            .bind(id.as_str())
            .fetch_all(&self.pool)
            .await?;
        for row in &grants {
            let resource_id: String = row.get("resource_id");
            let resource_id = ResourceId::new(resource_id.clone())
                .map_err(|e| column_error("resource_id", &resource_id, e))?;
            group.grant(resource_id);
        }

        Ok(Some(group))
    }

    async fn save_group(&self, group: &Group) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT OR REPLACE INTO access_groups (id, name) VALUES (?, ?)")
            .bind(group.id().as_str())
            .bind(group.name())
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM group_resources WHERE group_id = ?")
            .bind(group.id().as_str())
            .execute(&mut *tx)
            .await?;

        for resource_id in group.resource_ids() {
            sqlx::query("INSERT INTO group_resources (group_id, resource_id) VALUES (?, ?)")
                .bind(group.id().as_str())
                .bind(resource_id.as_str())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        tracing::trace!(
            group_id = %group.id(),
            grants = group.resource_ids().len(),
            "Saved group"
        );
        Ok(())
    }

    async fn delete_group(&self, id: &GroupId) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM group_resources WHERE group_id = ?")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM employee_groups WHERE group_id = ?")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM access_groups WHERE id = ?")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::trace!(group_id = %id, "Deleted group");
        Ok(())
    }

    // --- Resource operations ---

    async fn load_all_resources(&self) -> anyhow::Result<Vec<Resource>> {
        let rows = sqlx::query("SELECT * FROM resources ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        let mut resources = Vec::with_capacity(rows.len());
        for row in &rows {
            resources.push(resource_from_row(row)?);
        }
        Ok(resources)
    }

    async fn get_resource(&self, id: &ResourceId) -> anyhow::Result<Option<Resource>> {
        let row = sqlx::query("SELECT * FROM resources WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => Ok(Some(resource_from_row(r)?)),
            None => Ok(None),
        }
    }

    async fn save_resource(&self, resource: &Resource) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT OR REPLACE INTO resources (id, name, resource_type, state) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(resource.id().as_str())
        .bind(resource.name())
        .bind(resource.resource_type().as_str())
        .bind(resource.state().as_str())
        .execute(&self.pool)
        .await?;

        tracing::trace!(resource_id = %resource.id(), state = %resource.state(), "Saved resource");
        Ok(())
    }

    async fn delete_resource(&self, id: &ResourceId) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM group_resources WHERE resource_id = ?")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM resources WHERE id = ?")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::trace!(resource_id = %id, "Deleted resource");
        Ok(())
    }

    // --- Audit operations ---

    async fn append_audit_record(&self, entry: &AccessLogEntry) -> anyhow::Result<LogId> {
        let timestamp = format_timestamp(&entry.timestamp());

        let result = sqlx::query(
            "INSERT INTO access_log \
             (timestamp, badge_id, employee_id, resource_id, decision, reason_code) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&timestamp)
        .bind(entry.badge_id())
        .bind(entry.employee_id().map(|e| e.as_str()))
        .bind(entry.resource_id())
        .bind(entry.decision().as_str())
        .bind(entry.reason_code().as_str())
        .execute(&self.pool)
        .await?;

        let id = LogId::new(result.last_insert_rowid());
        tracing::trace!(log_id = %id, reason = %entry.reason_code(), "Appended audit record");
        Ok(id)
    }

    async fn load_all_audit_records(&self) -> anyhow::Result<Vec<AccessLogEntry>> {
        let rows = sqlx::query("SELECT * FROM access_log ORDER BY timestamp ASC, id ASC")
            .fetch_all(&self.pool)
            .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in &rows {
            entries.push(log_entry_from_row(row)?);
        }
        Ok(entries)
    }

    async fn delete_audit_records_older_than(
        &self,
        cutoff: DateTime<Utc>,
    ) -> anyhow::Result<u64> {
        let cutoff_str = format_timestamp(&cutoff);

        let result = sqlx::query("DELETE FROM access_log WHERE timestamp < ?")
            .bind(&cutoff_str)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected();
        tracing::debug!(cutoff = %cutoff_str, deleted, "Deleted expired audit records");
        Ok(deleted)
    }
}
