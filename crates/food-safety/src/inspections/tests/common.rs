use std::sync::Arc;

use axum::http::{header, Method, Request};
use axum::response::Response;
use axum::Router;
use chrono::{NaiveDate, Utc};
use serde_json::Value;

use crate::catalog::{ChecklistCatalog, ChecklistTemplate, NewChecklist};
use crate::directory::{Actor, Directory, NewSchool, NewUser, Role, School, StaffRelation, User};
use crate::ids::{
    ActionId, ChecklistId, ChecklistItemId, InspectionId, InspectionItemId, SchoolId, UserId,
};
use crate::inspections::domain::{
    ActionStatus, ActionSummary, CorrectiveAction, Inspection, InspectionDraft, InspectionItem,
    InspectionRecord, InspectionStatus, InspectionSummary, ItemResult, NewCorrectiveAction,
    NewInspection,
};
use crate::inspections::query::{ActionQuery, InspectionQuery};
use crate::inspections::{tracker_router, InspectionTracker, ACTOR_HEADER};
use crate::repository::{RepositoryError, TrackerRepository};
use crate::sqlite::SqliteRepository;

/// Unsaved record with one item per text, ids counting up from 1.
pub(crate) fn record_with_items(texts: &[&str]) -> InspectionRecord {
    let now = Utc::now();
    let items = texts
        .iter()
        .zip(1i64..)
        .map(|(text, id)| InspectionItem {
            id: InspectionItemId(id),
            inspection_id: InspectionId(1),
            checklist_item_id: ChecklistItemId(id),
            text: (*text).to_string(),
            order: (id - 1) as u32,
            passed: None,
            notes: None,
        })
        .collect();

    InspectionRecord {
        inspection: Inspection {
            id: InspectionId(1),
            school_id: SchoolId(1),
            inspector_id: Some(UserId(2)),
            manager_id: None,
            checklist_id: Some(ChecklistId(1)),
            date: NaiveDate::from_ymd_opt(2024, 9, 2).expect("valid date"),
            status: InspectionStatus::Pending,
            notes: None,
            revision: 0,
            created_at: now,
            updated_at: now,
        },
        items,
        actions: Vec::new(),
    }
}

pub(crate) fn action(id: i64, item: InspectionItemId, status: ActionStatus) -> CorrectiveAction {
    let now = Utc::now();
    CorrectiveAction {
        id: ActionId(id),
        inspection_item_id: item,
        assigned_to: None,
        description: "Corrective action required: item".to_string(),
        status,
        created_at: now,
        updated_at: now,
    }
}

/// Seeded in-memory tracker: one school staffed by a manager and a kitchen worker, a
/// second school with its own kitchen worker, and a two-item checklist.
pub(crate) struct Fixture {
    pub(crate) repository: Arc<SqliteRepository>,
    pub(crate) tracker: Arc<InspectionTracker<SqliteRepository>>,
    pub(crate) admin: Actor,
    pub(crate) inspector: Actor,
    pub(crate) other_inspector: Actor,
    pub(crate) manager: Actor,
    pub(crate) kitchen: Actor,
    pub(crate) other_kitchen: Actor,
    pub(crate) school: School,
    pub(crate) other_school: School,
    pub(crate) checklist: ChecklistTemplate,
}

pub(crate) fn fixture() -> Fixture {
    let repository = Arc::new(SqliteRepository::open_in_memory().expect("in-memory database"));
    let admin = repository
        .insert_user(new_user("root", Role::Admin))
        .expect("bootstrap admin")
        .actor();

    let directory = Directory::new(repository.clone());
    let user = |username: &str, role: Role| -> User {
        directory
            .create_user(new_user(username, role), &admin)
            .expect("create user")
    };
    let inspector = user("ines", Role::Inspector);
    let other_inspector = user("ivan", Role::Inspector);
    let manager = user("mara", Role::Manager);
    let kitchen = user("kim", Role::Kitchen);
    let other_kitchen = user("kai", Role::Kitchen);

    let school = directory
        .create_school(NewSchool::named("Lincoln Elementary"), &admin)
        .expect("create school");
    let other_school = directory
        .create_school(NewSchool::named("Harbor Middle"), &admin)
        .expect("create school");
    directory
        .add_staff(school.id, manager.id, StaffRelation::Manager, &admin)
        .expect("staff manager");
    let school = directory
        .add_staff(school.id, kitchen.id, StaffRelation::Kitchen, &admin)
        .expect("staff kitchen");
    let other_school = directory
        .add_staff(other_school.id, other_kitchen.id, StaffRelation::Kitchen, &admin)
        .expect("staff kitchen");

    let checklist = ChecklistCatalog::new(repository.clone())
        .create(
            NewChecklist::ordered("Kitchen hygiene", &["Fridge below 5C", "Hand wash station"]),
            &admin,
        )
        .expect("create checklist");

    Fixture {
        tracker: Arc::new(InspectionTracker::new(repository.clone())),
        repository,
        admin,
        inspector: inspector.actor(),
        other_inspector: other_inspector.actor(),
        manager: manager.actor(),
        kitchen: kitchen.actor(),
        other_kitchen: other_kitchen.actor(),
        school,
        other_school,
        checklist,
    }
}

fn new_user(username: &str, role: Role) -> NewUser {
    NewUser {
        username: username.to_string(),
        full_name: username.to_uppercase(),
        role,
    }
}

impl Fixture {
    pub(crate) fn new_inspection(&self, school: SchoolId) -> NewInspection {
        NewInspection {
            school_id: school,
            checklist_id: Some(self.checklist.id),
            inspector_id: Some(self.inspector.id),
            date: NaiveDate::from_ymd_opt(2024, 9, 2).expect("valid date"),
            notes: None,
        }
    }

    /// Creates an inspection at the main school and completes it with the second item
    /// failing, producing one open corrective action.
    pub(crate) fn failed_inspection(&self) -> (InspectionRecord, CorrectiveAction) {
        let record = self
            .tracker
            .create_inspection(self.new_inspection(self.school.id), &self.inspector)
            .expect("create inspection");
        let results = [
            ItemResult::passed(record.items[0].id),
            ItemResult::failed(record.items[1].id, "no soap"),
        ];
        let record = self
            .tracker
            .record_results(record.id(), &results, true, &self.inspector)
            .expect("complete inspection");
        let action = record.actions[0].clone();
        (record, action)
    }

    pub(crate) fn router(&self) -> Router {
        tracker_router(self.tracker.clone())
    }
}

pub(crate) fn request(
    method: Method,
    uri: &str,
    actor: Option<&Actor>,
    body: Option<Value>,
) -> Request<axum::body::Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(actor) = actor {
        builder = builder.header(ACTOR_HEADER, actor.id.to_string());
    }
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            axum::body::Body::from(serde_json::to_vec(&value).expect("serialize body"))
        }
        None => axum::body::Body::empty(),
    };
    builder.body(body).expect("request")
}

pub(crate) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Repository whose backend is down; every call fails.
pub(crate) struct OfflineRepository;

fn offline<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Unavailable("database offline".to_string()))
}

impl TrackerRepository for OfflineRepository {
    fn insert_user(&self, _user: NewUser) -> Result<User, RepositoryError> {
        offline()
    }

    fn user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        // Lets requests authenticate so the failure surfaces from the operation itself.
        Ok(Some(User {
            id,
            username: "offline".to_string(),
            full_name: "Offline".to_string(),
            role: Role::Admin,
            is_active: true,
        }))
    }

    fn delete_user(&self, _id: UserId) -> Result<bool, RepositoryError> {
        offline()
    }

    fn insert_school(&self, _school: NewSchool) -> Result<School, RepositoryError> {
        offline()
    }

    fn school(&self, _id: SchoolId) -> Result<Option<School>, RepositoryError> {
        offline()
    }

    fn add_staff(
        &self,
        _school: SchoolId,
        _user: UserId,
        _relation: StaffRelation,
    ) -> Result<(), RepositoryError> {
        offline()
    }

    fn remove_staff(
        &self,
        _school: SchoolId,
        _user: UserId,
        _relation: StaffRelation,
    ) -> Result<bool, RepositoryError> {
        offline()
    }

    fn delete_school(&self, _id: SchoolId) -> Result<bool, RepositoryError> {
        offline()
    }

    fn insert_checklist(
        &self,
        _checklist: NewChecklist,
    ) -> Result<ChecklistTemplate, RepositoryError> {
        offline()
    }

    fn checklist(&self, _id: ChecklistId) -> Result<Option<ChecklistTemplate>, RepositoryError> {
        offline()
    }

    fn delete_checklist(&self, _id: ChecklistId) -> Result<bool, RepositoryError> {
        offline()
    }

    fn delete_checklist_item(&self, _id: ChecklistItemId) -> Result<bool, RepositoryError> {
        offline()
    }

    fn insert_inspection(
        &self,
        _draft: InspectionDraft,
    ) -> Result<InspectionRecord, RepositoryError> {
        offline()
    }

    fn inspection(&self, _id: InspectionId) -> Result<Option<InspectionRecord>, RepositoryError> {
        offline()
    }

    fn save_inspection(
        &self,
        _record: &InspectionRecord,
        _created: &[NewCorrectiveAction],
    ) -> Result<InspectionRecord, RepositoryError> {
        offline()
    }

    fn delete_inspection(&self, _id: InspectionId) -> Result<bool, RepositoryError> {
        offline()
    }

    fn action_inspection(&self, _id: ActionId) -> Result<Option<InspectionId>, RepositoryError> {
        offline()
    }

    fn search_inspections(
        &self,
        _query: &InspectionQuery,
    ) -> Result<Vec<InspectionSummary>, RepositoryError> {
        offline()
    }

    fn search_actions(&self, _query: &ActionQuery) -> Result<Vec<ActionSummary>, RepositoryError> {
        offline()
    }
}
