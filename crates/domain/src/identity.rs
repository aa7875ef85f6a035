//! Identity and authorization catalog types.

use serde::{Deserialize, Serialize};

/// Server-assigned identifier of a role row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleId(i32);

impl RoleId {
    /// Creates a role identifier from a stored key.
    #[must_use]
    pub fn new(value: i32) -> Self {
        Self(value)
    }

    /// Returns the stored key.
    #[must_use]
    pub fn value(&self) -> i32 {
        self.0
    }
}

impl std::fmt::Display for RoleId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Server-assigned identifier of a user row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(i32);

impl UserId {
    /// Creates a user identifier from a stored key.
    #[must_use]
    pub fn new(value: i32) -> Self {
        Self(value)
    }

    /// Returns the stored key.
    #[must_use]
    pub fn value(&self) -> i32 {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// A permission in the default catalog, identified by its unique name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionDefinition {
    /// Unique permission name, e.g. `repuestos_crear`.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Resource the permission applies to, e.g. `repuestos`.
    pub resource: String,
    /// Action allowed on the resource, e.g. `crear`.
    pub action: String,
}

impl PermissionDefinition {
    /// Creates a catalog permission.
    #[must_use]
    pub fn new(name: &str, description: &str, resource: &str, action: &str) -> Self {
        Self {
            name: name.to_owned(),
            description: description.to_owned(),
            resource: resource.to_owned(),
            action: action.to_owned(),
        }
    }
}

/// A navigable page in the default catalog.
///
/// Both `name` and `route` are unique keys in storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageDefinition {
    /// Unique page name.
    pub name: String,
    /// Unique frontend route.
    pub route: String,
    /// Display title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Optional icon identifier.
    pub icon: Option<String>,
    /// Display ordering.
    pub order: i32,
    /// Whether only administrators may see the page.
    pub admin_only: bool,
}
