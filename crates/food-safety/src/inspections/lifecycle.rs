//! Result recording and status derivation for a loaded inspection record.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use super::domain::{
    InspectionItem, InspectionRecord, InspectionStatus, ItemResult, NewCorrectiveAction,
};
use crate::error::ValidationError;
use crate::ids::{InspectionItemId, UserId};

pub fn corrective_action_description(item_text: &str) -> String {
    format!("Corrective action required: {item_text}")
}

/// Applies submitted results to the record's items. `scope`, when given, restricts which
/// items may be touched. Nothing is modified unless every entry is valid.
pub(crate) fn apply_results(
    record: &mut InspectionRecord,
    results: &[ItemResult],
    scope: Option<&BTreeSet<InspectionItemId>>,
) -> Result<(), ValidationError> {
    let mut seen = BTreeSet::new();
    for (index, result) in results.iter().enumerate() {
        let field = format!("items[{index}].item_id");
        if record.item(result.item_id).is_none() {
            return Err(ValidationError::new(
                field,
                format!(
                    "item {} does not belong to inspection {}",
                    result.item_id,
                    record.id()
                ),
            ));
        }
        if scope.is_some_and(|scope| !scope.contains(&result.item_id)) {
            return Err(ValidationError::new(
                field,
                format!("item {} is outside the reinspection scope", result.item_id),
            ));
        }
        if !seen.insert(result.item_id) {
            return Err(ValidationError::new(
                field,
                format!("item {} was submitted more than once", result.item_id),
            ));
        }
    }

    for result in results {
        if let Some(item) = record.items.iter_mut().find(|item| item.id == result.item_id) {
            item.passed = result.passed;
            if let Some(notes) = &result.notes {
                let trimmed = notes.trim();
                item.notes = (!trimmed.is_empty()).then(|| trimmed.to_string());
            }
        }
    }
    Ok(())
}

pub(crate) fn save_draft(record: &mut InspectionRecord) {
    record.inspection.status = InspectionStatus::Pending;
}

/// Marks the inspection complete and returns the corrective actions to create: one per
/// failed item that has no unresolved action yet.
pub(crate) fn complete(
    record: &mut InspectionRecord,
    owner: Option<UserId>,
    now: DateTime<Utc>,
) -> Vec<NewCorrectiveAction> {
    let created: Vec<NewCorrectiveAction> = record
        .items
        .iter()
        .filter(|item| item.failed())
        .filter(|item| {
            !record
                .actions_for_item(item.id)
                .any(|action| action.status.is_unresolved())
        })
        .map(|item| NewCorrectiveAction {
            inspection_item_id: item.id,
            assigned_to: owner,
            description: corrective_action_description(&item.text),
            created_at: now,
        })
        .collect();

    record.inspection.status = if record.items.iter().any(InspectionItem::failed) {
        InspectionStatus::Failed
    } else {
        InspectionStatus::Passed
    };

    created
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspections::domain::ActionStatus;
    use crate::inspections::tests::common::{action, record_with_items};

    #[test]
    fn complete_without_failures_passes() {
        let mut record = record_with_items(&["Fridge temperature", "Hand washing"]);
        record.items[0].passed = Some(true);
        let created = complete(&mut record, Some(UserId(7)), Utc::now());
        assert!(created.is_empty());
        assert_eq!(record.inspection.status, InspectionStatus::Passed);
    }

    #[test]
    fn complete_creates_actions_only_for_items_without_open_work() {
        let mut record = record_with_items(&["Fridge temperature", "Hand washing", "Pest control"]);
        for item in &mut record.items {
            item.passed = Some(false);
        }
        let first = record.items[0].id;
        let second = record.items[1].id;
        record.actions.push(action(1, first, ActionStatus::InProgress));
        record.actions.push(action(2, second, ActionStatus::Resolved));

        let created = complete(&mut record, Some(UserId(7)), Utc::now());

        let targets: Vec<_> = created.iter().map(|new| new.inspection_item_id).collect();
        assert_eq!(targets, vec![second, record.items[2].id]);
        assert_eq!(record.inspection.status, InspectionStatus::Failed);
        assert_eq!(
            created[0].description,
            "Corrective action required: Hand washing"
        );
        assert!(created.iter().all(|new| new.assigned_to == Some(UserId(7))));
    }

    #[test]
    fn apply_results_rejects_foreign_items_without_partial_writes() {
        let mut record = record_with_items(&["Fridge temperature"]);
        let own = record.items[0].id;
        let results = vec![
            ItemResult::failed(own, "above 8C"),
            ItemResult::passed(InspectionItemId(999)),
        ];

        let err = apply_results(&mut record, &results, None).expect_err("foreign item");
        assert_eq!(err.field, "items[1].item_id");
        assert_eq!(record.items[0].passed, None);
    }

    #[test]
    fn apply_results_rejects_duplicate_entries() {
        let mut record = record_with_items(&["Fridge temperature"]);
        let own = record.items[0].id;
        let results = vec![ItemResult::passed(own), ItemResult::failed(own, "changed mind")];
        let err = apply_results(&mut record, &results, None).expect_err("duplicate");
        assert_eq!(err.field, "items[1].item_id");
    }

    #[test]
    fn blank_notes_clear_and_missing_notes_keep() {
        let mut record = record_with_items(&["Fridge temperature"]);
        let own = record.items[0].id;
        apply_results(&mut record, &[ItemResult::failed(own, " above 8C ")], None)
            .expect("valid");
        assert_eq!(record.items[0].notes.as_deref(), Some("above 8C"));

        apply_results(&mut record, &[ItemResult::passed(own)], None).expect("valid");
        assert_eq!(record.items[0].notes.as_deref(), Some("above 8C"));

        let clear = ItemResult {
            item_id: own,
            passed: Some(true),
            notes: Some(String::new()),
        };
        apply_results(&mut record, &[clear], None).expect("valid");
        assert_eq!(record.items[0].notes, None);
    }
}
