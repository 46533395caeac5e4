use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{ActionStatus, Inspection, InspectionStatus};
use crate::directory::{Actor, Role, School};
use crate::error::ValidationError;
use crate::ids::{SchoolId, UserId};

/// Columns list views may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Date,
    Status,
    SchoolName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Default for Sort {
    /// Newest first.
    fn default() -> Self {
        Self {
            key: SortKey::Date,
            direction: SortDirection::Descending,
        }
    }
}

impl FromStr for Sort {
    type Err = ValidationError;

    /// Parses `field` or `-field`, where the leading dash means descending.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        let (direction, field) = match raw.strip_prefix('-') {
            Some(field) => (SortDirection::Descending, field),
            None => (SortDirection::Ascending, raw),
        };
        let key = match field {
            "date" => SortKey::Date,
            "status" => SortKey::Status,
            "school" | "school_name" | "school__name" => SortKey::SchoolName,
            _ => {
                return Err(ValidationError::new(
                    "sort",
                    format!("'{field}' is not a sortable column (date, status, school_name)"),
                ))
            }
        };
        Ok(Self { key, direction })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InspectionFilter {
    pub school_id: Option<SchoolId>,
    pub status: Option<InspectionStatus>,
    pub date: Option<NaiveDate>,
}

/// Action filters apply to the action status and to the parent inspection's school and date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionFilter {
    pub school_id: Option<SchoolId>,
    pub status: Option<ActionStatus>,
    pub date: Option<NaiveDate>,
}

/// Which inspections an actor may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InspectionVisibility {
    All,
    SchoolsManagedBy(UserId),
    AssignedInspector(UserId),
    SchoolsStaffedBy(UserId),
}

impl InspectionVisibility {
    pub fn for_actor(actor: &Actor) -> Self {
        match actor.role {
            Role::Admin => Self::All,
            Role::Manager => Self::SchoolsManagedBy(actor.id),
            Role::Inspector => Self::AssignedInspector(actor.id),
            Role::Kitchen => Self::SchoolsStaffedBy(actor.id),
        }
    }

    /// `school` must be the inspection's school.
    pub fn permits(&self, inspection: &Inspection, school: &School) -> bool {
        match *self {
            Self::All => true,
            Self::SchoolsManagedBy(user) => school.managers.contains(&user),
            Self::AssignedInspector(user) => inspection.inspector_id == Some(user),
            Self::SchoolsStaffedBy(user) => school.kitchen_staff.contains(&user),
        }
    }
}

/// Which corrective actions an actor may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionVisibility {
    All,
    AssignedOrManagedBy(UserId),
    InspectedBy(UserId),
    AssignedOrStaffedBy(UserId),
}

impl ActionVisibility {
    pub fn for_actor(actor: &Actor) -> Self {
        match actor.role {
            Role::Admin => Self::All,
            Role::Manager => Self::AssignedOrManagedBy(actor.id),
            Role::Inspector => Self::InspectedBy(actor.id),
            Role::Kitchen => Self::AssignedOrStaffedBy(actor.id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectionQuery {
    pub visibility: InspectionVisibility,
    pub filter: InspectionFilter,
    pub sort: Sort,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionQuery {
    pub visibility: ActionVisibility,
    pub filter: ActionFilter,
    pub sort: Sort,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_parses_dash_prefix_as_descending() {
        let sort: Sort = "-school_name".parse().expect("valid sort");
        assert_eq!(sort.key, SortKey::SchoolName);
        assert_eq!(sort.direction, SortDirection::Descending);

        let sort: Sort = "status".parse().expect("valid sort");
        assert_eq!(sort.direction, SortDirection::Ascending);
    }

    #[test]
    fn sort_rejects_columns_outside_allow_list() {
        let err = "inspector_id".parse::<Sort>().expect_err("not allowed");
        assert_eq!(err.field, "sort");
    }

    #[test]
    fn visibility_follows_role() {
        let kitchen = Actor::new(UserId(9), Role::Kitchen);
        assert_eq!(
            InspectionVisibility::for_actor(&kitchen),
            InspectionVisibility::SchoolsStaffedBy(UserId(9))
        );
        let inspector = Actor::new(UserId(4), Role::Inspector);
        assert_eq!(
            ActionVisibility::for_actor(&inspector),
            ActionVisibility::InspectedBy(UserId(4))
        );
    }
}
