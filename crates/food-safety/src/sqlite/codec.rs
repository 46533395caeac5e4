//! Column conversions for identifiers and label-backed enums.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

use crate::directory::{Role, StaffRelation};
use crate::ids::{
    ActionId, ChecklistId, ChecklistItemId, InspectionId, InspectionItemId, SchoolId, UserId,
};
use crate::inspections::domain::{ActionStatus, InspectionStatus};

macro_rules! integer_column {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ToSql for $ty {
                fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                    Ok(ToSqlOutput::from(self.0))
                }
            }

            impl FromSql for $ty {
                fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                    i64::column_result(value).map(Self)
                }
            }
        )*
    };
}

macro_rules! label_column {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ToSql for $ty {
                fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                    Ok(ToSqlOutput::from(self.label()))
                }
            }

            impl FromSql for $ty {
                fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                    value
                        .as_str()?
                        .parse::<$ty>()
                        .map_err(|err| FromSqlError::Other(Box::new(err)))
                }
            }
        )*
    };
}

integer_column!(
    UserId,
    SchoolId,
    ChecklistId,
    ChecklistItemId,
    InspectionId,
    InspectionItemId,
    ActionId,
);

label_column!(Role, StaffRelation, InspectionStatus, ActionStatus);
