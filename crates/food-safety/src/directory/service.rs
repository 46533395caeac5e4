use std::sync::Arc;

use tracing::info;

use super::domain::{Actor, NewSchool, NewUser, Role, School, StaffRelation, User};
use crate::access::{require_admin, Operation};
use crate::error::{LifecycleError, ValidationError};
use crate::ids::{SchoolId, UserId};
use crate::repository::TrackerRepository;

/// Admin-facing maintenance of users, schools, and school staffing.
pub struct Directory<R> {
    repository: Arc<R>,
}

impl<R> Directory<R>
where
    R: TrackerRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub fn create_user(&self, user: NewUser, actor: &Actor) -> Result<User, LifecycleError> {
        require_admin(actor, Operation::ManageDirectory)?;
        if user.username.trim().is_empty() {
            return Err(ValidationError::new("username", "must not be blank").into());
        }
        let stored = self.repository.insert_user(user)?;
        info!(user_id = %stored.id, role = stored.role.label(), "user created");
        Ok(stored)
    }

    pub fn create_school(
        &self,
        school: NewSchool,
        actor: &Actor,
    ) -> Result<School, LifecycleError> {
        require_admin(actor, Operation::ManageDirectory)?;
        if school.name.trim().is_empty() {
            return Err(ValidationError::new("name", "must not be blank").into());
        }
        let stored = self.repository.insert_school(school)?;
        info!(school_id = %stored.id, "school created");
        Ok(stored)
    }

    /// Adds `user` to one of the school's staffing collections. The role must match the
    /// relation so kitchen staff cannot be listed as managers.
    pub fn add_staff(
        &self,
        school_id: SchoolId,
        user_id: UserId,
        relation: StaffRelation,
        actor: &Actor,
    ) -> Result<School, LifecycleError> {
        require_admin(actor, Operation::ManageDirectory)?;
        self.school(school_id)?;
        let user = self
            .repository
            .user(user_id)?
            .ok_or_else(|| LifecycleError::not_found("user", user_id.0))?;
        let expected = match relation {
            StaffRelation::Manager => Role::Manager,
            StaffRelation::Kitchen => Role::Kitchen,
            StaffRelation::Inspector => Role::Inspector,
        };
        if user.role != expected {
            return Err(ValidationError::new(
                "user",
                format!(
                    "{} cannot be listed as {} staff",
                    user.role.label(),
                    relation.label()
                ),
            )
            .into());
        }

        self.repository.add_staff(school_id, user_id, relation)?;
        self.school(school_id)
    }

    pub fn remove_staff(
        &self,
        school_id: SchoolId,
        user_id: UserId,
        relation: StaffRelation,
        actor: &Actor,
    ) -> Result<School, LifecycleError> {
        require_admin(actor, Operation::ManageDirectory)?;
        self.repository.remove_staff(school_id, user_id, relation)?;
        self.school(school_id)
    }

    pub fn school(&self, school_id: SchoolId) -> Result<School, LifecycleError> {
        self.repository
            .school(school_id)?
            .ok_or_else(|| LifecycleError::not_found("school", school_id.0))
    }

    pub fn user(&self, user_id: UserId) -> Result<User, LifecycleError> {
        self.repository
            .user(user_id)?
            .ok_or_else(|| LifecycleError::not_found("user", user_id.0))
    }

    /// Deletes the school together with its inspections, items, and corrective actions.
    pub fn delete_school(&self, school_id: SchoolId, actor: &Actor) -> Result<(), LifecycleError> {
        require_admin(actor, Operation::ManageDirectory)?;
        if !self.repository.delete_school(school_id)? {
            return Err(LifecycleError::not_found("school", school_id.0));
        }
        info!(school_id = %school_id, "school deleted");
        Ok(())
    }

    /// Deletes a user. Inspections and corrective actions that referenced them keep
    /// existing with the reference cleared.
    pub fn delete_user(&self, user_id: UserId, actor: &Actor) -> Result<(), LifecycleError> {
        require_admin(actor, Operation::ManageDirectory)?;
        if actor.id == user_id {
            return Err(ValidationError::new("user", "admins cannot delete themselves").into());
        }
        if !self.repository.delete_user(user_id)? {
            return Err(LifecycleError::not_found("user", user_id.0));
        }
        info!(user_id = %user_id, "user deleted");
        Ok(())
    }
}
