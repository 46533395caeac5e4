use crate::catalog::{ChecklistTemplate, NewChecklist};
use crate::directory::{NewSchool, NewUser, School, StaffRelation, User};
use crate::ids::{ActionId, ChecklistId, ChecklistItemId, InspectionId, SchoolId, UserId};
use crate::inspections::domain::{
    ActionSummary, InspectionDraft, InspectionRecord, InspectionSummary, NewCorrectiveAction,
};
use crate::inspections::query::{ActionQuery, InspectionQuery};

/// Storage abstraction so the lifecycle services can be exercised against any backend.
///
/// Every method is atomic. Deletes cascade: schools and inspections take their items and
/// corrective actions with them, checklist items take the inspection items materialized
/// from them, and deleted users are cleared from every reference.
pub trait TrackerRepository: Send + Sync {
    fn insert_user(&self, user: NewUser) -> Result<User, RepositoryError>;
    fn user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;
    fn delete_user(&self, id: UserId) -> Result<bool, RepositoryError>;

    fn insert_school(&self, school: NewSchool) -> Result<School, RepositoryError>;
    fn school(&self, id: SchoolId) -> Result<Option<School>, RepositoryError>;
    /// Appends `user` to the end of the relation; already-listed users keep their place.
    fn add_staff(
        &self,
        school: SchoolId,
        user: UserId,
        relation: StaffRelation,
    ) -> Result<(), RepositoryError>;
    fn remove_staff(
        &self,
        school: SchoolId,
        user: UserId,
        relation: StaffRelation,
    ) -> Result<bool, RepositoryError>;
    fn delete_school(&self, id: SchoolId) -> Result<bool, RepositoryError>;

    fn insert_checklist(&self, checklist: NewChecklist)
        -> Result<ChecklistTemplate, RepositoryError>;
    fn checklist(&self, id: ChecklistId) -> Result<Option<ChecklistTemplate>, RepositoryError>;
    fn delete_checklist(&self, id: ChecklistId) -> Result<bool, RepositoryError>;
    fn delete_checklist_item(&self, id: ChecklistItemId) -> Result<bool, RepositoryError>;

    /// Persists the inspection and materializes its items in one transaction.
    fn insert_inspection(&self, draft: InspectionDraft)
        -> Result<InspectionRecord, RepositoryError>;
    fn inspection(&self, id: InspectionId) -> Result<Option<InspectionRecord>, RepositoryError>;
    /// Writes the inspection, its items and existing actions, and inserts `created`, all
    /// in one transaction. Fails with [`RepositoryError::Conflict`] when the stored
    /// revision no longer matches `record.inspection.revision`.
    fn save_inspection(
        &self,
        record: &InspectionRecord,
        created: &[NewCorrectiveAction],
    ) -> Result<InspectionRecord, RepositoryError>;
    fn delete_inspection(&self, id: InspectionId) -> Result<bool, RepositoryError>;
    /// Inspection that owns the corrective action.
    fn action_inspection(&self, id: ActionId) -> Result<Option<InspectionId>, RepositoryError>;

    fn search_inspections(
        &self,
        query: &InspectionQuery,
    ) -> Result<Vec<InspectionSummary>, RepositoryError>;
    fn search_actions(&self, query: &ActionQuery) -> Result<Vec<ActionSummary>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    /// A unique column already holds the value; carries the column name.
    #[error("{0} already exists")]
    Duplicate(String),
    #[error("revision mismatch (expected={expected}, actual={actual})")]
    Conflict { expected: i64, actual: i64 },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
    #[error("sqlite: {0}")]
    Sql(#[from] rusqlite::Error),
}
