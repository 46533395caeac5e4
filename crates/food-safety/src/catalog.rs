//! Checklist templates and their ordered item definitions.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::access::{require_admin, Operation};
use crate::directory::Actor;
use crate::error::{LifecycleError, ValidationError};
use crate::ids::{ChecklistId, ChecklistItemId};
use crate::repository::TrackerRepository;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistTemplate {
    pub id: ChecklistId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Sorted by `order`.
    pub items: Vec<ChecklistItemDef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItemDef {
    pub id: ChecklistItemId,
    pub checklist_id: ChecklistId,
    pub text: String,
    pub order: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewChecklist {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub items: Vec<NewChecklistItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewChecklistItem {
    pub text: String,
    pub order: u32,
}

impl NewChecklist {
    /// Builds a checklist whose item order follows the given slice.
    pub fn ordered(name: impl Into<String>, items: &[&str]) -> Self {
        Self {
            name: name.into(),
            description: None,
            items: items
                .iter()
                .zip(0u32..)
                .map(|(text, order)| NewChecklistItem {
                    text: (*text).to_string(),
                    order,
                })
                .collect(),
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::new("name", "must not be blank"));
        }

        let mut seen = BTreeSet::new();
        for (index, item) in self.items.iter().enumerate() {
            if item.text.trim().is_empty() {
                return Err(ValidationError::new(
                    format!("items[{index}].text"),
                    "must not be blank",
                ));
            }
            if !seen.insert(item.order) {
                return Err(ValidationError::new(
                    format!("items[{index}].order"),
                    format!("order {} is already used in this checklist", item.order),
                ));
            }
        }
        Ok(())
    }
}

/// Admin maintenance of checklist templates.
pub struct ChecklistCatalog<R> {
    repository: Arc<R>,
}

impl<R> ChecklistCatalog<R>
where
    R: TrackerRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub fn create(
        &self,
        checklist: NewChecklist,
        actor: &Actor,
    ) -> Result<ChecklistTemplate, LifecycleError> {
        require_admin(actor, Operation::ManageCatalog)?;
        checklist.validate()?;
        let stored = self.repository.insert_checklist(checklist)?;
        info!(checklist_id = %stored.id, items = stored.items.len(), "checklist created");
        Ok(stored)
    }

    pub fn get(&self, id: ChecklistId) -> Result<ChecklistTemplate, LifecycleError> {
        self.repository
            .checklist(id)?
            .ok_or_else(|| LifecycleError::not_found("checklist", id.0))
    }

    /// Removes the template and its item definitions. Inspections that used it keep
    /// their record with the checklist reference cleared, but lose the items that were
    /// materialized from it.
    pub fn delete(&self, id: ChecklistId, actor: &Actor) -> Result<(), LifecycleError> {
        require_admin(actor, Operation::ManageCatalog)?;
        if !self.repository.delete_checklist(id)? {
            return Err(LifecycleError::not_found("checklist", id.0));
        }
        info!(checklist_id = %id, "checklist deleted");
        Ok(())
    }

    pub fn delete_item(&self, id: ChecklistItemId, actor: &Actor) -> Result<(), LifecycleError> {
        require_admin(actor, Operation::ManageCatalog)?;
        if !self.repository.delete_checklist_item(id)? {
            return Err(LifecycleError::not_found("checklist item", id.0));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordered_assigns_sequential_positions() {
        let checklist = NewChecklist::ordered("Daily", &["Fridge below 5C", "Hands washed"]);
        let orders: Vec<u32> = checklist.items.iter().map(|item| item.order).collect();
        assert_eq!(orders, vec![0, 1]);
        assert!(checklist.validate().is_ok());
    }

    #[test]
    fn duplicate_orders_are_rejected() {
        let mut checklist = NewChecklist::ordered("Daily", &["A", "B"]);
        checklist.items[1].order = 0;
        let err = checklist.validate().expect_err("duplicate order");
        assert_eq!(err.field, "items[1].order");
    }
}
