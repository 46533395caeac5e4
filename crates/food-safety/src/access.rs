use std::fmt;

use crate::directory::{Actor, Role};
use crate::error::LifecycleError;

/// Operations gated by role or ownership checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ManageDirectory,
    ManageCatalog,
    CreateInspection,
    DeleteInspection,
    RecordResults,
    Reinspect,
    ViewInspection,
    AssignAction,
    StartAction,
    ResolveAction,
    RequestReinspection,
}

impl Operation {
    pub const fn label(self) -> &'static str {
        match self {
            Operation::ManageDirectory => "manage directory",
            Operation::ManageCatalog => "manage checklists",
            Operation::CreateInspection => "create inspection",
            Operation::DeleteInspection => "delete inspection",
            Operation::RecordResults => "record inspection results",
            Operation::Reinspect => "reinspect",
            Operation::ViewInspection => "view inspection",
            Operation::AssignAction => "assign corrective action",
            Operation::StartAction => "start corrective action",
            Operation::ResolveAction => "resolve corrective action",
            Operation::RequestReinspection => "request reinspection",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub(crate) fn ensure(allowed: bool, operation: Operation) -> Result<(), LifecycleError> {
    if allowed {
        Ok(())
    } else {
        Err(LifecycleError::Permission { operation })
    }
}

pub(crate) fn require_admin(actor: &Actor, operation: Operation) -> Result<(), LifecycleError> {
    let allowed = match actor.role {
        Role::Admin => true,
        Role::Manager | Role::Inspector | Role::Kitchen => false,
    };
    ensure(allowed, operation)
}
