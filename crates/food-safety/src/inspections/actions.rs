//! Corrective action transitions and reinspection of failed items.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{
    ActionStatus, CorrectiveAction, InspectionRecord, InspectionStatus, ItemResult,
    ReinspectionScope,
};
use super::lifecycle::apply_results;
use crate::error::{LifecycleError, ValidationError};
use crate::ids::{ActionId, InspectionItemId, UserId};

/// Counts of action transitions performed by one reinspection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReinspectionOutcome {
    pub reinspected: usize,
    pub reopened: usize,
}

pub(crate) fn assign(
    action: &mut CorrectiveAction,
    assignee: Option<UserId>,
    now: DateTime<Utc>,
) -> bool {
    if action.assigned_to == assignee {
        return false;
    }
    action.assigned_to = assignee;
    action.updated_at = now;
    true
}

/// Open → InProgress. Repeating the transition is a no-op.
pub(crate) fn start(
    action: &mut CorrectiveAction,
    now: DateTime<Utc>,
) -> Result<bool, ValidationError> {
    match action.status {
        ActionStatus::Open => {
            action.status = ActionStatus::InProgress;
            action.updated_at = now;
            Ok(true)
        }
        ActionStatus::InProgress => Ok(false),
        other => Err(ValidationError::new(
            "status",
            format!("cannot start work on a {} corrective action", other.label()),
        )),
    }
}

/// Unconditional. The parent inspection's status is left alone.
pub(crate) fn resolve(action: &mut CorrectiveAction, now: DateTime<Utc>) -> bool {
    set_status(action, ActionStatus::Resolved, now)
}

pub(crate) fn request_reinspection(action: &mut CorrectiveAction, now: DateTime<Utc>) -> bool {
    set_status(action, ActionStatus::AwaitingReinspection, now)
}

fn set_status(action: &mut CorrectiveAction, status: ActionStatus, now: DateTime<Utc>) -> bool {
    if action.status == status {
        return false;
    }
    action.status = status;
    action.updated_at = now;
    true
}

pub(crate) fn scoped_actions(
    record: &InspectionRecord,
    scope: ReinspectionScope,
) -> Result<Vec<ActionId>, LifecycleError> {
    match scope {
        ReinspectionScope::Action(id) => record
            .action(id)
            .map(|action| vec![action.id])
            .ok_or_else(|| LifecycleError::not_found("corrective action", id.0)),
        ReinspectionScope::AllUnresolved => {
            Ok(record.unresolved_actions().map(|action| action.id).collect())
        }
    }
}

/// Re-evaluates the items behind the in-scope actions. Every action tied to one of those
/// items follows the item: passing marks it reinspected, anything else reopens it. No
/// action is ever created here.
pub(crate) fn reinspect(
    record: &mut InspectionRecord,
    scope: ReinspectionScope,
    results: &[ItemResult],
    now: DateTime<Utc>,
) -> Result<ReinspectionOutcome, LifecycleError> {
    let in_scope = scoped_actions(record, scope)?;
    let items: BTreeSet<InspectionItemId> = in_scope
        .iter()
        .filter_map(|id| record.action(*id))
        .map(|action| action.inspection_item_id)
        .collect();

    apply_results(record, results, Some(&items))?;

    let passed: BTreeSet<InspectionItemId> = record
        .items
        .iter()
        .filter(|item| items.contains(&item.id) && item.passed == Some(true))
        .map(|item| item.id)
        .collect();

    let mut outcome = ReinspectionOutcome::default();
    for action in record
        .actions
        .iter_mut()
        .filter(|action| items.contains(&action.inspection_item_id))
    {
        if passed.contains(&action.inspection_item_id) {
            action.status = ActionStatus::Reinspected;
            outcome.reinspected += 1;
        } else {
            action.status = ActionStatus::Open;
            outcome.reopened += 1;
        }
        action.updated_at = now;
    }

    recompute_status(record);
    Ok(outcome)
}

/// Failed while any action is still unresolved, passed otherwise.
pub fn recompute_status(record: &mut InspectionRecord) {
    record.inspection.status = if record.has_unresolved_actions() {
        InspectionStatus::Failed
    } else {
        InspectionStatus::Passed
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspections::tests::common::{action, record_with_items};

    #[test]
    fn resolve_twice_is_a_no_op() {
        let mut action = action(1, InspectionItemId(10), ActionStatus::Open);
        assert!(resolve(&mut action, Utc::now()));
        let stamp = action.updated_at;
        assert!(!resolve(&mut action, Utc::now()));
        assert_eq!(action.status, ActionStatus::Resolved);
        assert_eq!(action.updated_at, stamp);
    }

    #[test]
    fn start_only_leaves_open() {
        let mut open = action(1, InspectionItemId(10), ActionStatus::Open);
        assert_eq!(start(&mut open, Utc::now()), Ok(true));
        assert_eq!(open.status, ActionStatus::InProgress);
        assert_eq!(start(&mut open, Utc::now()), Ok(false));

        let mut resolved = action(2, InspectionItemId(10), ActionStatus::Resolved);
        let err = start(&mut resolved, Utc::now()).expect_err("resolved cannot restart");
        assert_eq!(err.field, "status");
    }

    #[test]
    fn single_scope_leaves_other_items_untouched() {
        let mut record = record_with_items(&["Fridge temperature", "Hand washing"]);
        for item in &mut record.items {
            item.passed = Some(false);
        }
        let (first, second) = (record.items[0].id, record.items[1].id);
        record.actions.push(action(1, first, ActionStatus::AwaitingReinspection));
        record.actions.push(action(2, second, ActionStatus::Open));

        let outcome = reinspect(
            &mut record,
            ReinspectionScope::Action(ActionId(1)),
            &[ItemResult::passed(first)],
            Utc::now(),
        )
        .expect("reinspection succeeds");

        assert_eq!(outcome.reinspected, 1);
        assert_eq!(record.items[1].passed, Some(false));
        assert_eq!(record.actions[1].status, ActionStatus::Open);
        assert_eq!(record.inspection.status, InspectionStatus::Failed);
    }

    #[test]
    fn single_scope_settles_every_action_on_the_item() {
        let mut record = record_with_items(&["Fridge temperature"]);
        record.items[0].passed = Some(false);
        let item = record.items[0].id;
        record.actions.push(action(1, item, ActionStatus::AwaitingReinspection));
        record.actions.push(action(2, item, ActionStatus::Open));

        let outcome = reinspect(
            &mut record,
            ReinspectionScope::Action(ActionId(1)),
            &[ItemResult::passed(item)],
            Utc::now(),
        )
        .expect("reinspection succeeds");

        assert_eq!(outcome, ReinspectionOutcome { reinspected: 2, reopened: 0 });
        assert_eq!(record.actions[0].status, ActionStatus::Reinspected);
        assert_eq!(record.actions[1].status, ActionStatus::Reinspected);
        assert_eq!(record.inspection.status, InspectionStatus::Passed);
    }

    #[test]
    fn single_scope_rejects_results_for_other_items() {
        let mut record = record_with_items(&["Fridge temperature", "Hand washing"]);
        let (first, second) = (record.items[0].id, record.items[1].id);
        record.actions.push(action(1, first, ActionStatus::Open));
        record.actions.push(action(2, second, ActionStatus::Open));
        let before = record.clone();

        let err = reinspect(
            &mut record,
            ReinspectionScope::Action(ActionId(1)),
            &[ItemResult::passed(second)],
            Utc::now(),
        )
        .expect_err("out of scope");

        assert!(matches!(err, LifecycleError::Validation(_)));
        assert_eq!(record, before);
    }

    #[test]
    fn bulk_scope_reopens_failures_and_passes_when_all_clear() {
        let mut record = record_with_items(&["Fridge temperature", "Hand washing"]);
        let (first, second) = (record.items[0].id, record.items[1].id);
        record.actions.push(action(1, first, ActionStatus::InProgress));
        record.actions.push(action(2, second, ActionStatus::AwaitingReinspection));

        let outcome = reinspect(
            &mut record,
            ReinspectionScope::AllUnresolved,
            &[ItemResult::passed(first), ItemResult::failed(second, "soap missing")],
            Utc::now(),
        )
        .expect("reinspection succeeds");
        assert_eq!(outcome, ReinspectionOutcome { reinspected: 1, reopened: 1 });
        assert_eq!(record.inspection.status, InspectionStatus::Failed);
        assert_eq!(record.actions.len(), 2);

        reinspect(
            &mut record,
            ReinspectionScope::AllUnresolved,
            &[ItemResult::passed(second)],
            Utc::now(),
        )
        .expect("second pass succeeds");
        assert_eq!(record.actions[1].status, ActionStatus::Reinspected);
        assert_eq!(record.inspection.status, InspectionStatus::Passed);
    }

    #[test]
    fn unknown_action_scope_is_not_found() {
        let mut record = record_with_items(&["Fridge temperature"]);
        let err = reinspect(
            &mut record,
            ReinspectionScope::Action(ActionId(42)),
            &[],
            Utc::now(),
        )
        .expect_err("missing action");
        assert!(matches!(
            err,
            LifecycleError::NotFound {
                entity: "corrective action",
                id: 42
            }
        ));
    }
}
