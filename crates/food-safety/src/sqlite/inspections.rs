use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use tracing::debug;

use crate::directory::StaffRelation;
use crate::ids::{ActionId, InspectionId};
use crate::inspections::domain::{
    ActionStatus, ActionSummary, CorrectiveAction, Inspection, InspectionDraft, InspectionItem,
    InspectionRecord, InspectionStatus, InspectionSummary, NewCorrectiveAction,
};
use crate::inspections::query::{
    ActionQuery, ActionVisibility, InspectionQuery, InspectionVisibility, Sort, SortDirection,
    SortKey,
};
use crate::repository::RepositoryError;

/// Caller provides the transaction.
pub(super) fn insert(
    conn: &Connection,
    draft: InspectionDraft,
) -> Result<InspectionRecord, RepositoryError> {
    conn.execute(
        r#"
        INSERT INTO inspections (
          school_id, inspector_id, manager_id, checklist_id, date, status, notes,
          revision, created_at, updated_at
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8, ?8)
        "#,
        params![
            draft.school_id,
            draft.inspector_id,
            draft.manager_id,
            draft.checklist_id,
            draft.date,
            InspectionStatus::Pending,
            draft.notes,
            draft.created_at,
        ],
    )?;
    let id = InspectionId(conn.last_insert_rowid());

    let mut stmt = conn.prepare_cached(
        "INSERT INTO inspection_items (inspection_id, checklist_item_id) VALUES (?1, ?2)",
    )?;
    for checklist_item in &draft.items {
        stmt.execute(params![id, checklist_item])?;
    }
    debug!(inspection_id = %id, items = draft.items.len(), "inspection rows inserted");

    load_record(conn, id)?.ok_or(RepositoryError::NotFound)
}

fn read_inspection(row: &Row<'_>) -> rusqlite::Result<Inspection> {
    Ok(Inspection {
        id: row.get(0)?,
        school_id: row.get(1)?,
        inspector_id: row.get(2)?,
        manager_id: row.get(3)?,
        checklist_id: row.get(4)?,
        date: row.get(5)?,
        status: row.get(6)?,
        notes: row.get(7)?,
        revision: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

pub(super) fn load_record(
    conn: &Connection,
    id: InspectionId,
) -> Result<Option<InspectionRecord>, RepositoryError> {
    let inspection = conn
        .query_row(
            r#"
            SELECT id, school_id, inspector_id, manager_id, checklist_id, date, status, notes,
                   revision, created_at, updated_at
            FROM inspections
            WHERE id = ?1
            "#,
            params![id],
            read_inspection,
        )
        .optional()?;

    let Some(inspection) = inspection else {
        return Ok(None);
    };

    let mut items_stmt = conn.prepare_cached(
        r#"
        SELECT it.id, it.inspection_id, it.checklist_item_id, ci.text, ci.position,
               it.passed, it.notes
        FROM inspection_items it
        JOIN checklist_items ci ON ci.id = it.checklist_item_id
        WHERE it.inspection_id = ?1
        ORDER BY ci.position ASC, it.id ASC
        "#,
    )?;
    let items = items_stmt
        .query_map(params![id], |row| {
            Ok(InspectionItem {
                id: row.get(0)?,
                inspection_id: row.get(1)?,
                checklist_item_id: row.get(2)?,
                text: row.get(3)?,
                order: row.get(4)?,
                passed: row.get(5)?,
                notes: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut actions_stmt = conn.prepare_cached(
        r#"
        SELECT a.id, a.inspection_item_id, a.assigned_to, a.description, a.status,
               a.created_at, a.updated_at
        FROM corrective_actions a
        JOIN inspection_items it ON it.id = a.inspection_item_id
        WHERE it.inspection_id = ?1
        ORDER BY a.id ASC
        "#,
    )?;
    let actions = actions_stmt
        .query_map(params![id], |row| {
            Ok(CorrectiveAction {
                id: row.get(0)?,
                inspection_item_id: row.get(1)?,
                assigned_to: row.get(2)?,
                description: row.get(3)?,
                status: row.get(4)?,
                created_at: row.get(5)?,
                updated_at: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(InspectionRecord {
        inspection,
        items,
        actions,
    }))
}

/// Caller provides the transaction.
pub(super) fn save(
    conn: &Connection,
    record: &InspectionRecord,
    created: &[NewCorrectiveAction],
) -> Result<InspectionRecord, RepositoryError> {
    let inspection = &record.inspection;
    let stored: Option<i64> = conn
        .query_row(
            "SELECT revision FROM inspections WHERE id = ?1",
            params![inspection.id],
            |row| row.get(0),
        )
        .optional()?;

    let Some(actual) = stored else {
        return Err(RepositoryError::NotFound);
    };
    if actual != inspection.revision {
        return Err(RepositoryError::Conflict {
            expected: inspection.revision,
            actual,
        });
    }

    conn.execute(
        r#"
        UPDATE inspections
        SET inspector_id = ?2, manager_id = ?3, status = ?4, notes = ?5, revision = ?6,
            updated_at = ?7
        WHERE id = ?1
        "#,
        params![
            inspection.id,
            inspection.inspector_id,
            inspection.manager_id,
            inspection.status,
            inspection.notes,
            actual + 1,
            inspection.updated_at,
        ],
    )?;

    {
        let mut update_item = conn.prepare_cached(
            r#"
            UPDATE inspection_items
            SET passed = ?3, notes = ?4
            WHERE id = ?1 AND inspection_id = ?2
            "#,
        )?;
        for item in &record.items {
            update_item.execute(params![item.id, inspection.id, item.passed, item.notes])?;
        }

        let mut update_action = conn.prepare_cached(
            r#"
            UPDATE corrective_actions
            SET assigned_to = ?3, description = ?4, status = ?5, updated_at = ?6
            WHERE id = ?1
              AND inspection_item_id IN (
                SELECT id FROM inspection_items WHERE inspection_id = ?2
              )
            "#,
        )?;
        for action in &record.actions {
            update_action.execute(params![
                action.id,
                inspection.id,
                action.assigned_to,
                action.description,
                action.status,
                action.updated_at,
            ])?;
        }

        let mut insert_action = conn.prepare_cached(
            r#"
            INSERT INTO corrective_actions (
              inspection_item_id, assigned_to, description, status, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            "#,
        )?;
        for action in created {
            insert_action.execute(params![
                action.inspection_item_id,
                action.assigned_to,
                action.description,
                ActionStatus::Open,
                action.created_at,
            ])?;
        }
    }

    debug!(
        inspection_id = %inspection.id,
        revision = actual + 1,
        created_actions = created.len(),
        "inspection saved"
    );
    load_record(conn, inspection.id)?.ok_or(RepositoryError::NotFound)
}

pub(super) fn delete(conn: &Connection, id: InspectionId) -> Result<bool, RepositoryError> {
    let removed = conn.execute("DELETE FROM inspections WHERE id = ?1", params![id])?;
    Ok(removed > 0)
}

pub(super) fn action_inspection(
    conn: &Connection,
    id: ActionId,
) -> Result<Option<InspectionId>, RepositoryError> {
    let inspection = conn
        .query_row(
            r#"
            SELECT it.inspection_id
            FROM corrective_actions a
            JOIN inspection_items it ON it.id = a.inspection_item_id
            WHERE a.id = ?1
            "#,
            params![id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(inspection)
}

fn order_by(sort: Sort, status_column: &str) -> String {
    let column = match sort.key {
        SortKey::Date => "i.date",
        SortKey::Status => status_column,
        SortKey::SchoolName => "s.name",
    };
    let direction = match sort.direction {
        SortDirection::Ascending => "ASC",
        SortDirection::Descending => "DESC",
    };
    format!(" ORDER BY {column} {direction}, i.id {direction}")
}

fn staff_clause(
    column: &str,
    user: i64,
    relation: StaffRelation,
    values: &mut Vec<Value>,
) -> String {
    values.push(Value::Integer(user));
    values.push(Value::Text(relation.label().to_string()));
    format!("{column} IN (SELECT school_id FROM school_staff WHERE user_id = ? AND relation = ?)")
}

pub(super) fn search(
    conn: &Connection,
    query: &InspectionQuery,
) -> Result<Vec<InspectionSummary>, RepositoryError> {
    let mut sql = String::from(
        r#"
        SELECT i.id, i.school_id, s.name, i.inspector_id, i.manager_id, i.checklist_id,
               i.date, i.status
        FROM inspections i
        JOIN schools s ON s.id = i.school_id
        WHERE 1 = 1
        "#,
    );
    let mut values = Vec::new();

    match query.visibility {
        InspectionVisibility::All => {}
        InspectionVisibility::SchoolsManagedBy(user) => {
            let clause = staff_clause("i.school_id", user.0, StaffRelation::Manager, &mut values);
            sql.push_str(&format!(" AND {clause}"));
        }
        InspectionVisibility::AssignedInspector(user) => {
            sql.push_str(" AND i.inspector_id = ?");
            values.push(Value::Integer(user.0));
        }
        InspectionVisibility::SchoolsStaffedBy(user) => {
            let clause = staff_clause("i.school_id", user.0, StaffRelation::Kitchen, &mut values);
            sql.push_str(&format!(" AND {clause}"));
        }
    }

    let filter = &query.filter;
    if let Some(school) = filter.school_id {
        sql.push_str(" AND i.school_id = ?");
        values.push(Value::Integer(school.0));
    }
    if let Some(status) = filter.status {
        sql.push_str(" AND i.status = ?");
        values.push(Value::Text(status.label().to_string()));
    }
    if let Some(date) = filter.date {
        sql.push_str(" AND i.date = ?");
        values.push(Value::Text(date.format("%Y-%m-%d").to_string()));
    }
    sql.push_str(&order_by(query.sort, "i.status"));

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values.iter()), |row| {
        Ok(InspectionSummary {
            id: row.get(0)?,
            school_id: row.get(1)?,
            school_name: row.get(2)?,
            inspector_id: row.get(3)?,
            manager_id: row.get(4)?,
            checklist_id: row.get(5)?,
            date: row.get(6)?,
            status: row.get(7)?,
        })
    })?;
    let summaries = rows.collect::<Result<Vec<_>, _>>()?;
    Ok(summaries)
}

pub(super) fn search_actions(
    conn: &Connection,
    query: &ActionQuery,
) -> Result<Vec<ActionSummary>, RepositoryError> {
    let mut sql = String::from(
        r#"
        SELECT a.id, it.inspection_id, a.inspection_item_id, ci.text, i.school_id, s.name,
               i.date, a.assigned_to, a.description, a.status, a.updated_at
        FROM corrective_actions a
        JOIN inspection_items it ON it.id = a.inspection_item_id
        JOIN checklist_items ci ON ci.id = it.checklist_item_id
        JOIN inspections i ON i.id = it.inspection_id
        JOIN schools s ON s.id = i.school_id
        WHERE 1 = 1
        "#,
    );
    let mut values = Vec::new();

    match query.visibility {
        ActionVisibility::All => {}
        ActionVisibility::AssignedOrManagedBy(user) => {
            values.push(Value::Integer(user.0));
            let clause = staff_clause("i.school_id", user.0, StaffRelation::Manager, &mut values);
            sql.push_str(&format!(" AND (a.assigned_to = ? OR {clause})"));
        }
        ActionVisibility::InspectedBy(user) => {
            sql.push_str(" AND i.inspector_id = ?");
            values.push(Value::Integer(user.0));
        }
        ActionVisibility::AssignedOrStaffedBy(user) => {
            values.push(Value::Integer(user.0));
            let clause = staff_clause("i.school_id", user.0, StaffRelation::Kitchen, &mut values);
            sql.push_str(&format!(" AND (a.assigned_to = ? OR {clause})"));
        }
    }

    let filter = &query.filter;
    if let Some(school) = filter.school_id {
        sql.push_str(" AND i.school_id = ?");
        values.push(Value::Integer(school.0));
    }
    if let Some(status) = filter.status {
        sql.push_str(" AND a.status = ?");
        values.push(Value::Text(status.label().to_string()));
    }
    if let Some(date) = filter.date {
        sql.push_str(" AND i.date = ?");
        values.push(Value::Text(date.format("%Y-%m-%d").to_string()));
    }
    sql.push_str(&order_by(query.sort, "a.status"));

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values.iter()), |row| {
        Ok(ActionSummary {
            id: row.get(0)?,
            inspection_id: row.get(1)?,
            inspection_item_id: row.get(2)?,
            item_text: row.get(3)?,
            school_id: row.get(4)?,
            school_name: row.get(5)?,
            inspection_date: row.get(6)?,
            assigned_to: row.get(7)?,
            description: row.get(8)?,
            status: row.get(9)?,
            updated_at: row.get(10)?,
        })
    })?;
    let summaries = rows.collect::<Result<Vec<_>, _>>()?;
    Ok(summaries)
}
