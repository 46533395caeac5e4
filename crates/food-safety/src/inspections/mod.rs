//! Inspections of schools against checklist templates and the corrective actions that
//! follow failed items.

pub mod actions;
pub mod domain;
pub mod lifecycle;
pub mod policy;
pub mod query;
pub mod router;
pub mod service;

#[cfg(test)]
pub(crate) mod tests;

pub use actions::{recompute_status, ReinspectionOutcome};
pub use domain::{
    ActionStatus, ActionSummary, CorrectiveAction, Inspection, InspectionItem, InspectionRecord,
    InspectionStatus, InspectionSummary, ItemResult, NewInspection, ReinspectionScope,
};
pub use query::{ActionFilter, InspectionFilter, Sort, SortDirection, SortKey};
pub use router::{tracker_router, ACTOR_HEADER};
pub use service::{InspectionTracker, InspectionView, Reinspection};
