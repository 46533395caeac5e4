//! Users, roles, and school staffing.

pub mod domain;
pub mod service;

pub use domain::{Actor, NewSchool, NewUser, Role, School, StaffRelation, User};
pub use service::Directory;
