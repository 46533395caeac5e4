use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use super::unique_violation;
use crate::catalog::{ChecklistItemDef, ChecklistTemplate, NewChecklist};
use crate::ids::{ChecklistId, ChecklistItemId};
use crate::repository::RepositoryError;

/// Caller provides the transaction.
pub(super) fn insert_checklist(
    conn: &Connection,
    checklist: NewChecklist,
) -> Result<ChecklistTemplate, RepositoryError> {
    conn.execute(
        "INSERT INTO checklists (name, description, created_at) VALUES (?1, ?2, ?3)",
        params![checklist.name, checklist.description, Utc::now()],
    )?;
    let id = ChecklistId(conn.last_insert_rowid());

    let mut stmt = conn.prepare_cached(
        "INSERT INTO checklist_items (checklist_id, text, position) VALUES (?1, ?2, ?3)",
    )?;
    for item in &checklist.items {
        stmt.execute(params![id, item.text, item.order])
            .map_err(|err| unique_violation(err, "order"))?;
    }

    load_checklist(conn, id)?.ok_or(RepositoryError::NotFound)
}

pub(super) fn load_checklist(
    conn: &Connection,
    id: ChecklistId,
) -> Result<Option<ChecklistTemplate>, RepositoryError> {
    let checklist = conn
        .query_row(
            "SELECT id, name, description, created_at FROM checklists WHERE id = ?1",
            params![id],
            |row| {
                Ok(ChecklistTemplate {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    created_at: row.get(3)?,
                    items: Vec::new(),
                })
            },
        )
        .optional()?;

    let Some(mut checklist) = checklist else {
        return Ok(None);
    };

    let mut stmt = conn.prepare_cached(
        r#"
        SELECT id, checklist_id, text, position
        FROM checklist_items
        WHERE checklist_id = ?1
        ORDER BY position ASC
        "#,
    )?;
    let rows = stmt.query_map(params![id], |row| {
        Ok(ChecklistItemDef {
            id: row.get(0)?,
            checklist_id: row.get(1)?,
            text: row.get(2)?,
            order: row.get(3)?,
        })
    })?;
    checklist.items = rows.collect::<Result<Vec<_>, _>>()?;

    Ok(Some(checklist))
}

pub(super) fn delete_checklist(conn: &Connection, id: ChecklistId) -> Result<bool, RepositoryError> {
    let removed = conn.execute("DELETE FROM checklists WHERE id = ?1", params![id])?;
    Ok(removed > 0)
}

pub(super) fn delete_checklist_item(
    conn: &Connection,
    id: ChecklistItemId,
) -> Result<bool, RepositoryError> {
    let removed = conn.execute("DELETE FROM checklist_items WHERE id = ?1", params![id])?;
    Ok(removed > 0)
}
