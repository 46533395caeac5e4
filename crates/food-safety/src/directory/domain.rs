use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ParseLabelError, SchoolId, UserId};

/// The single role every directory user holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    Inspector,
    Kitchen,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Inspector => "inspector",
            Role::Kitchen => "kitchen",
        }
    }
}

impl FromStr for Role {
    type Err = ParseLabelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "inspector" => Ok(Role::Inspector),
            "kitchen" => Ok(Role::Kitchen),
            _ => Err(ParseLabelError::new("role", value)),
        }
    }
}

/// Identity and role of whoever is performing an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: UserId,
    pub role: Role,
}

impl Actor {
    pub const fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub full_name: String,
    pub role: Role,
    pub is_active: bool,
}

impl User {
    pub fn actor(&self) -> Actor {
        Actor::new(self.id, self.role)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub full_name: String,
    pub role: Role,
}

/// Which staffing collection of a school a user belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffRelation {
    Manager,
    Kitchen,
    Inspector,
}

impl StaffRelation {
    pub const fn label(self) -> &'static str {
        match self {
            StaffRelation::Manager => "manager",
            StaffRelation::Kitchen => "kitchen",
            StaffRelation::Inspector => "inspector",
        }
    }
}

impl FromStr for StaffRelation {
    type Err = ParseLabelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "manager" => Ok(StaffRelation::Manager),
            "kitchen" => Ok(StaffRelation::Kitchen),
            "inspector" => Ok(StaffRelation::Inspector),
            _ => Err(ParseLabelError::new("staff relation", value)),
        }
    }
}

/// A school together with its ordered staffing collections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct School {
    pub id: SchoolId,
    pub name: String,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub managers: Vec<UserId>,
    pub kitchen_staff: Vec<UserId>,
    pub inspectors: Vec<UserId>,
}

impl School {
    pub fn staff(&self, relation: StaffRelation) -> &[UserId] {
        match relation {
            StaffRelation::Manager => &self.managers,
            StaffRelation::Kitchen => &self.kitchen_staff,
            StaffRelation::Inspector => &self.inspectors,
        }
    }

    /// Manager recorded on new inspections. Collection order decides when several exist.
    pub fn primary_manager(&self) -> Option<UserId> {
        self.managers.first().copied()
    }

    /// Default owner of corrective actions: kitchen staff first, then managers.
    pub fn remediation_owner(&self) -> Option<UserId> {
        self.kitchen_staff
            .first()
            .or_else(|| self.managers.first())
            .copied()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSchool {
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
}

impl NewSchool {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn school(managers: Vec<i64>, kitchen: Vec<i64>) -> School {
        School {
            id: SchoolId(1),
            name: "Lincoln Elementary".to_string(),
            address: None,
            phone_number: None,
            is_active: true,
            created_at: Utc::now(),
            managers: managers.into_iter().map(UserId).collect(),
            kitchen_staff: kitchen.into_iter().map(UserId).collect(),
            inspectors: Vec::new(),
        }
    }

    #[test]
    fn remediation_owner_prefers_kitchen_staff() {
        assert_eq!(school(vec![3], vec![7, 8]).remediation_owner(), Some(UserId(7)));
        assert_eq!(school(vec![3, 4], vec![]).remediation_owner(), Some(UserId(3)));
        assert_eq!(school(vec![], vec![]).remediation_owner(), None);
    }

    #[test]
    fn role_labels_parse_case_insensitively() {
        assert_eq!("Inspector".parse::<Role>(), Ok(Role::Inspector));
        assert_eq!(" KITCHEN ".parse::<Role>(), Ok(Role::Kitchen));
        assert!("janitor".parse::<Role>().is_err());
    }
}
