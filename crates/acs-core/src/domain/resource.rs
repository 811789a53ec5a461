//! Resource domain entity
//!
//! A resource is anything access is controlled for: doors, rooms,
//! printers, workstations. Its type is a classification only; its state
//! determines whether access can currently be granted.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::newtypes::ResourceId;

/// Classification of a resource (never affects decisions)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceType {
    Door,
    Printer,
    Computer,
    Room,
    Other,
    /// Registered but not yet classified
    Pending,
}

impl ResourceType {
    /// Returns the stored string form of this type
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Door => "DOOR",
            ResourceType::Printer => "PRINTER",
            ResourceType::Computer => "COMPUTER",
            ResourceType::Room => "ROOM",
            ResourceType::Other => "OTHER",
            ResourceType::Pending => "PENDING",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DOOR" => Ok(ResourceType::Door),
            "PRINTER" => Ok(ResourceType::Printer),
            "COMPUTER" => Ok(ResourceType::Computer),
            "ROOM" => Ok(ResourceType::Room),
            "OTHER" => Ok(ResourceType::Other),
            "PENDING" => Ok(ResourceType::Pending),
            _ => Err(DomainError::UnknownVariant {
                kind: "resource type",
                value: s.to_string(),
            }),
        }
    }
}

/// Operational state of a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceState {
    /// Resource can be accessed
    Available,
    /// Resource is in use
    Occupied,
    /// Resource is administratively locked
    Locked,
    /// Resource is unreachable or powered down
    Offline,
}

impl ResourceState {
    /// Returns the stored string form of this state
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceState::Available => "AVAILABLE",
            ResourceState::Occupied => "OCCUPIED",
            ResourceState::Locked => "LOCKED",
            ResourceState::Offline => "OFFLINE",
        }
    }
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceState {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "AVAILABLE" => Ok(ResourceState::Available),
            "OCCUPIED" => Ok(ResourceState::Occupied),
            "LOCKED" => Ok(ResourceState::Locked),
            "OFFLINE" => Ok(ResourceState::Offline),
            _ => Err(DomainError::UnknownVariant {
                kind: "resource state",
                value: s.to_string(),
            }),
        }
    }
}

/// A controlled resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    id: ResourceId,
    name: String,
    resource_type: ResourceType,
    state: ResourceState,
}

impl Resource {
    /// Creates a new resource in the `Available` state
    pub fn new(id: ResourceId, name: impl Into<String>, resource_type: ResourceType) -> Self {
        Self {
            id,
            name: name.into(),
            resource_type,
            state: ResourceState::Available,
        }
    }

    /// Sets the initial state
    pub fn with_state(mut self, state: ResourceState) -> Self {
        self.state = state;
        self
    }

    pub fn id(&self) -> &ResourceId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    pub fn state(&self) -> ResourceState {
        self.state
    }

    pub fn set_state(&mut self, state: ResourceState) {
        self.state = state;
    }
}
