use chrono::NaiveDate;
use food_safety::catalog::{ChecklistTemplate, NewChecklist};
use food_safety::config::StorageConfig;
use food_safety::directory::{Actor, NewSchool, NewUser, Role, School, StaffRelation};
use food_safety::error::AppError;
use food_safety::{ChecklistCatalog, Directory, SqliteRepository, TrackerRepository};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn open_repository(storage: &StorageConfig) -> Result<SqliteRepository, AppError> {
    let repository = match &storage.database_path {
        Some(path) => SqliteRepository::open(path)?,
        None => {
            info!("no database path configured; using in-memory storage");
            SqliteRepository::open_in_memory()?
        }
    };
    Ok(repository)
}

/// Directory and catalog rows created by [`seed_demo_data`].
pub(crate) struct DemoSeed {
    pub(crate) admin: Actor,
    pub(crate) manager: Actor,
    pub(crate) inspector: Actor,
    pub(crate) kitchen: Actor,
    pub(crate) school: School,
    pub(crate) checklist: ChecklistTemplate,
}

/// Populates an empty store with one staffed school and a kitchen checklist. The admin is
/// inserted straight through the repository since no actor exists yet to authorize it.
pub(crate) fn seed_demo_data(repository: Arc<SqliteRepository>) -> Result<DemoSeed, AppError> {
    let admin = repository
        .insert_user(NewUser {
            username: "admin".to_string(),
            full_name: "District Administrator".to_string(),
            role: Role::Admin,
        })?
        .actor();

    let directory = Directory::new(repository.clone());
    let user = |username: &str, full_name: &str, role: Role| -> Result<Actor, AppError> {
        let new = NewUser {
            username: username.to_string(),
            full_name: full_name.to_string(),
            role,
        };
        Ok(directory.create_user(new, &admin)?.actor())
    };
    let manager = user("mgarcia", "Maria Garcia", Role::Manager)?;
    let inspector = user("jchen", "Jordan Chen", Role::Inspector)?;
    let kitchen = user("tbrooks", "Taylor Brooks", Role::Kitchen)?;

    let school = directory.create_school(
        NewSchool {
            name: "Lincoln Elementary".to_string(),
            address: Some("12 Elm Street".to_string()),
            phone_number: None,
        },
        &admin,
    )?;
    directory.add_staff(school.id, manager.id, StaffRelation::Manager, &admin)?;
    directory.add_staff(school.id, inspector.id, StaffRelation::Inspector, &admin)?;
    let school = directory.add_staff(school.id, kitchen.id, StaffRelation::Kitchen, &admin)?;

    let checklist = ChecklistCatalog::new(repository).create(
        NewChecklist::ordered(
            "Daily kitchen hygiene",
            &[
                "Refrigerators at or below 5C",
                "Hand wash station stocked",
                "Food stored off the floor",
            ],
        ),
        &admin,
    )?;

    info!(
        admin_id = %admin.id,
        manager_id = %manager.id,
        inspector_id = %inspector.id,
        kitchen_id = %kitchen.id,
        school_id = %school.id,
        checklist_id = %checklist.id,
        "demo data seeded"
    );

    Ok(DemoSeed {
        admin,
        manager,
        inspector,
        kitchen,
        school,
        checklist,
    })
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
