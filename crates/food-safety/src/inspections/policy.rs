//! Role and ownership rules for inspection and corrective action operations.

use super::domain::{
    CorrectiveAction, Inspection, InspectionRecord, InspectionStatus, ReinspectionScope,
};
use crate::directory::{Actor, Role};

pub fn may_create_inspection(actor: &Actor) -> bool {
    match actor.role {
        Role::Admin | Role::Inspector => true,
        Role::Manager | Role::Kitchen => false,
    }
}

/// Results (initial or reinspection) come from an admin or the assigned inspector.
pub fn may_record_results(actor: &Actor, inspection: &Inspection) -> bool {
    match actor.role {
        Role::Admin => true,
        Role::Inspector => inspection.inspector_id == Some(actor.id),
        Role::Manager | Role::Kitchen => false,
    }
}

pub fn may_assign_action(actor: &Actor) -> bool {
    match actor.role {
        Role::Admin | Role::Manager => true,
        Role::Inspector | Role::Kitchen => false,
    }
}

/// Resolution and starting work are open to admins, managers, and the current assignee.
pub fn may_work_action(actor: &Actor, action: &CorrectiveAction) -> bool {
    match actor.role {
        Role::Admin | Role::Manager => true,
        Role::Inspector | Role::Kitchen => action.assigned_to == Some(actor.id),
    }
}

pub fn may_request_reinspection(actor: &Actor) -> bool {
    match actor.role {
        Role::Admin | Role::Manager | Role::Inspector => true,
        Role::Kitchen => false,
    }
}

/// Whether the perform form should be locked. A reinspection scope always unlocks it.
pub fn is_read_only(record: &InspectionRecord, scope: Option<ReinspectionScope>) -> bool {
    if scope.is_some() {
        return false;
    }
    let settled = matches!(
        record.inspection.status,
        InspectionStatus::Passed | InspectionStatus::Completed
    );
    settled && !record.has_unresolved_actions()
}
