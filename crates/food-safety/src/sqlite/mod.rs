//! SQLite-backed [`TrackerRepository`].

mod catalog;
mod codec;
mod directory;
mod inspections;
mod schema;

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::Connection;
use tracing::info;

use crate::catalog::{ChecklistTemplate, NewChecklist};
use crate::directory::{NewSchool, NewUser, School, StaffRelation, User};
use crate::ids::{ActionId, ChecklistId, ChecklistItemId, InspectionId, SchoolId, UserId};
use crate::inspections::domain::{
    ActionSummary, InspectionDraft, InspectionRecord, InspectionSummary, NewCorrectiveAction,
};
use crate::inspections::query::{ActionQuery, InspectionQuery};
use crate::repository::{RepositoryError, TrackerRepository};

/// Single-connection store; writes are serialized through the mutex.
pub struct SqliteRepository {
    conn: Mutex<Connection>,
}

impl SqliteRepository {
    pub fn open(path: &Path) -> Result<Self, RepositoryError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|err| {
                RepositoryError::Unavailable(format!(
                    "cannot create database directory {}: {err}",
                    parent.display()
                ))
            })?;
        }
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        info!(path = %path.display(), "opened sqlite database");
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, RepositoryError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, RepositoryError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        schema::install(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>, RepositoryError> {
        self.conn
            .lock()
            .map_err(|_| RepositoryError::Unavailable("sqlite connection mutex poisoned".into()))
    }
}

pub(super) fn unique_violation(err: rusqlite::Error, column: &str) -> RepositoryError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            RepositoryError::Duplicate(column.to_string())
        }
        _ => RepositoryError::Sql(err),
    }
}

impl TrackerRepository for SqliteRepository {
    fn insert_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        directory::insert_user(&*self.connection()?, user)
    }

    fn user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        directory::load_user(&*self.connection()?, id)
    }

    fn delete_user(&self, id: UserId) -> Result<bool, RepositoryError> {
        directory::delete_user(&*self.connection()?, id)
    }

    fn insert_school(&self, school: NewSchool) -> Result<School, RepositoryError> {
        directory::insert_school(&*self.connection()?, school)
    }

    fn school(&self, id: SchoolId) -> Result<Option<School>, RepositoryError> {
        directory::load_school(&*self.connection()?, id)
    }

    fn add_staff(
        &self,
        school: SchoolId,
        user: UserId,
        relation: StaffRelation,
    ) -> Result<(), RepositoryError> {
        directory::add_staff(&*self.connection()?, school, user, relation)
    }

    fn remove_staff(
        &self,
        school: SchoolId,
        user: UserId,
        relation: StaffRelation,
    ) -> Result<bool, RepositoryError> {
        directory::remove_staff(&*self.connection()?, school, user, relation)
    }

    fn delete_school(&self, id: SchoolId) -> Result<bool, RepositoryError> {
        directory::delete_school(&*self.connection()?, id)
    }

    fn insert_checklist(
        &self,
        checklist: NewChecklist,
    ) -> Result<ChecklistTemplate, RepositoryError> {
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        let stored = catalog::insert_checklist(&tx, checklist)?;
        tx.commit()?;
        Ok(stored)
    }

    fn checklist(&self, id: ChecklistId) -> Result<Option<ChecklistTemplate>, RepositoryError> {
        catalog::load_checklist(&*self.connection()?, id)
    }

    fn delete_checklist(&self, id: ChecklistId) -> Result<bool, RepositoryError> {
        catalog::delete_checklist(&*self.connection()?, id)
    }

    fn delete_checklist_item(&self, id: ChecklistItemId) -> Result<bool, RepositoryError> {
        catalog::delete_checklist_item(&*self.connection()?, id)
    }

    fn insert_inspection(
        &self,
        draft: InspectionDraft,
    ) -> Result<InspectionRecord, RepositoryError> {
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        let record = inspections::insert(&tx, draft)?;
        tx.commit()?;
        Ok(record)
    }

    fn inspection(&self, id: InspectionId) -> Result<Option<InspectionRecord>, RepositoryError> {
        inspections::load_record(&*self.connection()?, id)
    }

    fn save_inspection(
        &self,
        record: &InspectionRecord,
        created: &[NewCorrectiveAction],
    ) -> Result<InspectionRecord, RepositoryError> {
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        let saved = inspections::save(&tx, record, created)?;
        tx.commit()?;
        Ok(saved)
    }

    fn delete_inspection(&self, id: InspectionId) -> Result<bool, RepositoryError> {
        inspections::delete(&*self.connection()?, id)
    }

    fn action_inspection(&self, id: ActionId) -> Result<Option<InspectionId>, RepositoryError> {
        inspections::action_inspection(&*self.connection()?, id)
    }

    fn search_inspections(
        &self,
        query: &InspectionQuery,
    ) -> Result<Vec<InspectionSummary>, RepositoryError> {
        inspections::search(&*self.connection()?, query)
    }

    fn search_actions(&self, query: &ActionQuery) -> Result<Vec<ActionSummary>, RepositoryError> {
        inspections::search_actions(&*self.connection()?, query)
    }
}
