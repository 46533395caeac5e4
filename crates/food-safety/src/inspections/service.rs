use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use super::actions::{self, ReinspectionOutcome};
use super::domain::{
    ActionSummary, CorrectiveAction, InspectionDraft, InspectionRecord, InspectionSummary,
    ItemResult, NewInspection, ReinspectionScope,
};
use super::lifecycle;
use super::policy;
use super::query::{
    ActionFilter, ActionQuery, ActionVisibility, InspectionFilter, InspectionQuery,
    InspectionVisibility, Sort,
};
use crate::access::{ensure, require_admin, Operation};
use crate::directory::{Actor, Role, School};
use crate::error::{LifecycleError, ValidationError};
use crate::ids::{ActionId, InspectionId, SchoolId, UserId};
use crate::repository::TrackerRepository;

/// Inspection detail as presented to a viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InspectionView {
    #[serde(flatten)]
    pub record: InspectionRecord,
    pub read_only: bool,
}

/// Reinspection result together with the action transitions it caused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reinspection {
    #[serde(flatten)]
    pub record: InspectionRecord,
    pub outcome: ReinspectionOutcome,
}

/// Service driving inspections and their corrective actions through the repository.
pub struct InspectionTracker<R> {
    repository: Arc<R>,
}

impl<R> InspectionTracker<R>
where
    R: TrackerRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    /// Resolves a user id to an acting identity. Unknown and inactive users are rejected.
    pub fn actor(&self, id: UserId) -> Result<Actor, LifecycleError> {
        match self.repository.user(id)? {
            Some(user) if user.is_active => Ok(user.actor()),
            _ => Err(LifecycleError::Unauthenticated),
        }
    }

    pub fn create_inspection(
        &self,
        request: NewInspection,
        actor: &Actor,
    ) -> Result<InspectionRecord, LifecycleError> {
        ensure(
            policy::may_create_inspection(actor),
            Operation::CreateInspection,
        )?;

        let school = self.load_school(request.school_id)?;
        let items = match request.checklist_id {
            Some(id) => self
                .repository
                .checklist(id)?
                .ok_or_else(|| LifecycleError::not_found("checklist", id.0))?
                .items
                .iter()
                .map(|item| item.id)
                .collect(),
            None => Vec::new(),
        };
        if let Some(id) = request.inspector_id {
            let inspector = self
                .repository
                .user(id)?
                .ok_or_else(|| LifecycleError::not_found("user", id.0))?;
            if inspector.role != Role::Inspector {
                return Err(ValidationError::new(
                    "inspector",
                    format!("user {id} is not an inspector"),
                )
                .into());
            }
        }

        let draft = InspectionDraft {
            school_id: school.id,
            inspector_id: request.inspector_id,
            manager_id: school.primary_manager(),
            checklist_id: request.checklist_id,
            date: request.date,
            notes: request.notes,
            items,
            created_at: Utc::now(),
        };
        let record = self.repository.insert_inspection(draft)?;
        info!(
            inspection_id = %record.id(),
            school_id = %school.id,
            actor_id = %actor.id,
            items = record.items.len(),
            "inspection created"
        );
        Ok(record)
    }

    /// Applies per-item results. With `complete`, derives the final status and opens a
    /// corrective action for every failed item that has no unresolved action yet.
    pub fn record_results(
        &self,
        id: InspectionId,
        results: &[ItemResult],
        complete: bool,
        actor: &Actor,
    ) -> Result<InspectionRecord, LifecycleError> {
        let mut record = self.load_record(id)?;
        ensure(
            policy::may_record_results(actor, &record.inspection),
            Operation::RecordResults,
        )?;

        lifecycle::apply_results(&mut record, results, None)?;
        let now = Utc::now();
        let created = if complete {
            let school = self.load_school(record.inspection.school_id)?;
            lifecycle::complete(&mut record, school.remediation_owner(), now)
        } else {
            lifecycle::save_draft(&mut record);
            Vec::new()
        };
        record.inspection.updated_at = now;

        let saved = self.repository.save_inspection(&record, &created)?;
        info!(
            inspection_id = %id,
            actor_id = %actor.id,
            status = saved.inspection.status.label(),
            created_actions = created.len(),
            "inspection results recorded"
        );
        Ok(saved)
    }

    pub fn reinspect(
        &self,
        id: InspectionId,
        scope: ReinspectionScope,
        results: &[ItemResult],
        actor: &Actor,
    ) -> Result<Reinspection, LifecycleError> {
        let mut record = self.load_record(id)?;
        ensure(
            policy::may_record_results(actor, &record.inspection),
            Operation::Reinspect,
        )?;

        let now = Utc::now();
        let outcome = actions::reinspect(&mut record, scope, results, now)?;
        record.inspection.updated_at = now;

        let saved = self.repository.save_inspection(&record, &[])?;
        info!(
            inspection_id = %id,
            actor_id = %actor.id,
            reinspected = outcome.reinspected,
            reopened = outcome.reopened,
            status = saved.inspection.status.label(),
            "reinspection recorded"
        );
        Ok(Reinspection {
            record: saved,
            outcome,
        })
    }

    /// Reassigns the action; `None` clears the assignee.
    pub fn assign_action(
        &self,
        id: ActionId,
        assignee: Option<UserId>,
        actor: &Actor,
    ) -> Result<CorrectiveAction, LifecycleError> {
        ensure(policy::may_assign_action(actor), Operation::AssignAction)?;
        if let Some(user) = assignee {
            self.repository
                .user(user)?
                .ok_or_else(|| LifecycleError::not_found("user", user.0))?;
        }
        self.mutate_action(id, "corrective action assigned", actor, |action, now| {
            Ok(actions::assign(action, assignee, now))
        })
    }

    pub fn start_action(
        &self,
        id: ActionId,
        actor: &Actor,
    ) -> Result<CorrectiveAction, LifecycleError> {
        self.mutate_action(id, "corrective action started", actor, |action, now| {
            ensure(policy::may_work_action(actor, action), Operation::StartAction)?;
            Ok(actions::start(action, now)?)
        })
    }

    /// Marks the action resolved. Resolving twice succeeds without writing.
    pub fn resolve_action(
        &self,
        id: ActionId,
        actor: &Actor,
    ) -> Result<CorrectiveAction, LifecycleError> {
        self.mutate_action(id, "corrective action resolved", actor, |action, now| {
            ensure(policy::may_work_action(actor, action), Operation::ResolveAction)?;
            Ok(actions::resolve(action, now))
        })
    }

    pub fn request_reinspection(
        &self,
        id: ActionId,
        actor: &Actor,
    ) -> Result<CorrectiveAction, LifecycleError> {
        ensure(
            policy::may_request_reinspection(actor),
            Operation::RequestReinspection,
        )?;
        self.mutate_action(id, "reinspection requested", actor, |action, now| {
            Ok(actions::request_reinspection(action, now))
        })
    }

    /// Removes the inspection with its items and corrective actions.
    pub fn delete_inspection(&self, id: InspectionId, actor: &Actor) -> Result<(), LifecycleError> {
        require_admin(actor, Operation::DeleteInspection)?;
        if !self.repository.delete_inspection(id)? {
            return Err(LifecycleError::not_found("inspection", id.0));
        }
        info!(inspection_id = %id, actor_id = %actor.id, "inspection deleted");
        Ok(())
    }

    /// Inspection detail with the advisory read-only flag.
    pub fn inspection(
        &self,
        id: InspectionId,
        actor: &Actor,
    ) -> Result<InspectionView, LifecycleError> {
        self.inspection_in_scope(id, None, actor)
    }

    /// Detail as seen while reinspecting `scope`; the read-only flag is never set there.
    /// A single-action scope must name an action of this inspection.
    pub fn inspection_in_scope(
        &self,
        id: InspectionId,
        scope: Option<ReinspectionScope>,
        actor: &Actor,
    ) -> Result<InspectionView, LifecycleError> {
        let record = self.load_record(id)?;
        let school = self.load_school(record.inspection.school_id)?;
        ensure(
            InspectionVisibility::for_actor(actor).permits(&record.inspection, &school),
            Operation::ViewInspection,
        )?;
        if let Some(scope) = scope {
            actions::scoped_actions(&record, scope)?;
        }
        let read_only = policy::is_read_only(&record, scope);
        Ok(InspectionView { record, read_only })
    }

    pub fn visible_inspections(
        &self,
        filter: InspectionFilter,
        sort: Sort,
        actor: &Actor,
    ) -> Result<Vec<InspectionSummary>, LifecycleError> {
        let query = InspectionQuery {
            visibility: InspectionVisibility::for_actor(actor),
            filter,
            sort,
        };
        let rows = self.repository.search_inspections(&query)?;
        debug!(actor_id = %actor.id, rows = rows.len(), "inspections listed");
        Ok(rows)
    }

    pub fn visible_actions(
        &self,
        filter: ActionFilter,
        sort: Sort,
        actor: &Actor,
    ) -> Result<Vec<ActionSummary>, LifecycleError> {
        let query = ActionQuery {
            visibility: ActionVisibility::for_actor(actor),
            filter,
            sort,
        };
        let rows = self.repository.search_actions(&query)?;
        debug!(actor_id = %actor.id, rows = rows.len(), "corrective actions listed");
        Ok(rows)
    }

    fn load_record(&self, id: InspectionId) -> Result<InspectionRecord, LifecycleError> {
        self.repository
            .inspection(id)?
            .ok_or_else(|| LifecycleError::not_found("inspection", id.0))
    }

    fn load_school(&self, id: SchoolId) -> Result<School, LifecycleError> {
        self.repository
            .school(id)?
            .ok_or_else(|| LifecycleError::not_found("school", id.0))
    }

    fn load_action_record(&self, id: ActionId) -> Result<InspectionRecord, LifecycleError> {
        let inspection = self
            .repository
            .action_inspection(id)?
            .ok_or_else(|| LifecycleError::not_found("corrective action", id.0))?;
        self.load_record(inspection)
    }

    /// Loads the owning inspection and applies `change`, which may also reject the actor.
    /// The record is saved only when `change` reports a modification.
    fn mutate_action<F>(
        &self,
        id: ActionId,
        event: &'static str,
        actor: &Actor,
        change: F,
    ) -> Result<CorrectiveAction, LifecycleError>
    where
        F: FnOnce(&mut CorrectiveAction, DateTime<Utc>) -> Result<bool, LifecycleError>,
    {
        let mut record = self.load_action_record(id)?;
        let now = Utc::now();
        let action = record
            .action_mut(id)
            .ok_or_else(|| LifecycleError::not_found("corrective action", id.0))?;
        if !change(action, now)? {
            let unchanged = action.clone();
            debug!(action_id = %id, status = unchanged.status.label(), "{event}: no change");
            return Ok(unchanged);
        }

        let saved = self.repository.save_inspection(&record, &[])?;
        let action = saved
            .action(id)
            .cloned()
            .ok_or_else(|| LifecycleError::not_found("corrective action", id.0))?;
        info!(
            action_id = %id,
            inspection_id = %saved.id(),
            actor_id = %actor.id,
            status = action.status.label(),
            assigned_to = ?action.assigned_to,
            "{event}"
        );
        Ok(action)
    }
}
