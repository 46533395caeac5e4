//! School food-safety inspection tracking: checklists, inspections, and the corrective
//! actions raised by failed items.

pub mod access;
pub mod catalog;
pub mod config;
pub mod directory;
pub mod error;
pub mod ids;
pub mod inspections;
pub mod repository;
pub mod sqlite;
pub mod telemetry;

pub use catalog::ChecklistCatalog;
pub use directory::Directory;
pub use error::{AppError, LifecycleError, ValidationError};
pub use inspections::InspectionTracker;
pub use repository::{RepositoryError, TrackerRepository};
pub use sqlite::SqliteRepository;
