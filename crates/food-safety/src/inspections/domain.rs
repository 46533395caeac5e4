use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{
    ActionId, ChecklistId, ChecklistItemId, InspectionId, InspectionItemId, ParseLabelError,
    SchoolId, UserId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectionStatus {
    Pending,
    Completed,
    Passed,
    Failed,
}

impl InspectionStatus {
    pub const fn label(self) -> &'static str {
        match self {
            InspectionStatus::Pending => "pending",
            InspectionStatus::Completed => "completed",
            InspectionStatus::Passed => "passed",
            InspectionStatus::Failed => "failed",
        }
    }
}

impl FromStr for InspectionStatus {
    type Err = ParseLabelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(InspectionStatus::Pending),
            "completed" => Ok(InspectionStatus::Completed),
            "passed" => Ok(InspectionStatus::Passed),
            "failed" => Ok(InspectionStatus::Failed),
            _ => Err(ParseLabelError::new("inspection status", value)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Open,
    InProgress,
    AwaitingReinspection,
    Reinspected,
    Resolved,
}

impl ActionStatus {
    /// Statuses that keep an inspection failed.
    pub const UNRESOLVED: [ActionStatus; 3] = [
        ActionStatus::Open,
        ActionStatus::InProgress,
        ActionStatus::AwaitingReinspection,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ActionStatus::Open => "open",
            ActionStatus::InProgress => "in_progress",
            ActionStatus::AwaitingReinspection => "awaiting_reinspection",
            ActionStatus::Reinspected => "reinspected",
            ActionStatus::Resolved => "resolved",
        }
    }

    pub const fn is_unresolved(self) -> bool {
        match self {
            ActionStatus::Open | ActionStatus::InProgress | ActionStatus::AwaitingReinspection => {
                true
            }
            ActionStatus::Reinspected | ActionStatus::Resolved => false,
        }
    }
}

impl FromStr for ActionStatus {
    type Err = ParseLabelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(ActionStatus::Open),
            "in_progress" => Ok(ActionStatus::InProgress),
            "awaiting_reinspection" => Ok(ActionStatus::AwaitingReinspection),
            "reinspected" => Ok(ActionStatus::Reinspected),
            "resolved" => Ok(ActionStatus::Resolved),
            _ => Err(ParseLabelError::new("corrective action status", value)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inspection {
    pub id: InspectionId,
    pub school_id: SchoolId,
    pub inspector_id: Option<UserId>,
    pub manager_id: Option<UserId>,
    pub checklist_id: Option<ChecklistId>,
    pub date: NaiveDate,
    pub status: InspectionStatus,
    pub notes: Option<String>,
    /// Incremented on every save; a stale revision is rejected.
    pub revision: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One checklist criterion's result within an inspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectionItem {
    pub id: InspectionItemId,
    pub inspection_id: InspectionId,
    pub checklist_item_id: ChecklistItemId,
    pub text: String,
    pub order: u32,
    pub passed: Option<bool>,
    pub notes: Option<String>,
}

impl InspectionItem {
    pub fn failed(&self) -> bool {
        self.passed == Some(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectiveAction {
    pub id: ActionId,
    pub inspection_item_id: InspectionItemId,
    pub assigned_to: Option<UserId>,
    pub description: String,
    pub status: ActionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An inspection with the items and corrective actions it owns. Storage loads and saves
/// the whole record in one transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectionRecord {
    pub inspection: Inspection,
    pub items: Vec<InspectionItem>,
    pub actions: Vec<CorrectiveAction>,
}

impl InspectionRecord {
    pub fn id(&self) -> InspectionId {
        self.inspection.id
    }

    pub fn item(&self, id: InspectionItemId) -> Option<&InspectionItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn action(&self, id: ActionId) -> Option<&CorrectiveAction> {
        self.actions.iter().find(|action| action.id == id)
    }

    pub(crate) fn action_mut(&mut self, id: ActionId) -> Option<&mut CorrectiveAction> {
        self.actions.iter_mut().find(|action| action.id == id)
    }

    pub fn actions_for_item(
        &self,
        item_id: InspectionItemId,
    ) -> impl Iterator<Item = &CorrectiveAction> + '_ {
        self.actions
            .iter()
            .filter(move |action| action.inspection_item_id == item_id)
    }

    pub fn has_unresolved_actions(&self) -> bool {
        self.actions.iter().any(|action| action.status.is_unresolved())
    }

    pub fn unresolved_actions(&self) -> impl Iterator<Item = &CorrectiveAction> + '_ {
        self.actions
            .iter()
            .filter(|action| action.status.is_unresolved())
    }
}

/// Request to open an inspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewInspection {
    pub school_id: SchoolId,
    #[serde(default)]
    pub checklist_id: Option<ChecklistId>,
    #[serde(default)]
    pub inspector_id: Option<UserId>,
    pub date: NaiveDate,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Fully resolved inspection ready to be persisted with its materialized items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectionDraft {
    pub school_id: SchoolId,
    pub inspector_id: Option<UserId>,
    pub manager_id: Option<UserId>,
    pub checklist_id: Option<ChecklistId>,
    pub date: NaiveDate,
    pub notes: Option<String>,
    /// Definitions to materialize, in template order.
    pub items: Vec<ChecklistItemId>,
    pub created_at: DateTime<Utc>,
}

/// Submitted outcome for a single inspection item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemResult {
    pub item_id: InspectionItemId,
    pub passed: Option<bool>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ItemResult {
    pub fn passed(item_id: InspectionItemId) -> Self {
        Self {
            item_id,
            passed: Some(true),
            notes: None,
        }
    }

    pub fn failed(item_id: InspectionItemId, notes: impl Into<String>) -> Self {
        Self {
            item_id,
            passed: Some(false),
            notes: Some(notes.into()),
        }
    }
}

/// Which corrective actions a reinspection re-evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReinspectionScope {
    Action(ActionId),
    AllUnresolved,
}

/// Corrective action produced by a completion, persisted with the inspection save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCorrectiveAction {
    pub inspection_item_id: InspectionItemId,
    pub assigned_to: Option<UserId>,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Row shape for inspection list views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectionSummary {
    pub id: InspectionId,
    pub school_id: SchoolId,
    pub school_name: String,
    pub inspector_id: Option<UserId>,
    pub manager_id: Option<UserId>,
    pub checklist_id: Option<ChecklistId>,
    pub date: NaiveDate,
    pub status: InspectionStatus,
}

/// Row shape for corrective action list views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSummary {
    pub id: ActionId,
    pub inspection_id: InspectionId,
    pub inspection_item_id: InspectionItemId,
    pub item_text: String,
    pub school_id: SchoolId,
    pub school_name: String,
    pub inspection_date: NaiveDate,
    pub assigned_to: Option<UserId>,
    pub description: String,
    pub status: ActionStatus,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_set_matches_predicate() {
        for status in ActionStatus::UNRESOLVED {
            assert!(status.is_unresolved());
        }
        assert!(!ActionStatus::Resolved.is_unresolved());
        assert!(!ActionStatus::Reinspected.is_unresolved());
    }

    #[test]
    fn status_filters_accept_query_string_spelling() {
        assert_eq!(
            "Awaiting_Reinspection".parse::<ActionStatus>(),
            Ok(ActionStatus::AwaitingReinspection)
        );
        let err = "closed".parse::<InspectionStatus>().expect_err("unknown status");
        assert_eq!(err.to_string(), "unknown inspection status 'closed'");
    }

    #[test]
    fn reinspection_scope_uses_snake_case_json() {
        let scope: ReinspectionScope =
            serde_json::from_str(r#"{"action": 4}"#).expect("single scope");
        assert_eq!(scope, ReinspectionScope::Action(ActionId(4)));
        let scope: ReinspectionScope =
            serde_json::from_str(r#""all_unresolved""#).expect("bulk scope");
        assert_eq!(scope, ReinspectionScope::AllUnresolved);
    }
}
