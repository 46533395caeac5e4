use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::unique_violation;
use crate::directory::{NewSchool, NewUser, School, StaffRelation, User};
use crate::ids::{SchoolId, UserId};
use crate::repository::RepositoryError;

pub(super) fn insert_user(conn: &Connection, user: NewUser) -> Result<User, RepositoryError> {
    conn.execute(
        "INSERT INTO users (username, full_name, role, is_active) VALUES (?1, ?2, ?3, 1)",
        params![user.username, user.full_name, user.role],
    )
    .map_err(|err| unique_violation(err, "username"))?;

    Ok(User {
        id: UserId(conn.last_insert_rowid()),
        username: user.username,
        full_name: user.full_name,
        role: user.role,
        is_active: true,
    })
}

fn read_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        full_name: row.get(2)?,
        role: row.get(3)?,
        is_active: row.get(4)?,
    })
}

pub(super) fn load_user(conn: &Connection, id: UserId) -> Result<Option<User>, RepositoryError> {
    let user = conn
        .query_row(
            "SELECT id, username, full_name, role, is_active FROM users WHERE id = ?1",
            params![id],
            read_user,
        )
        .optional()?;
    Ok(user)
}

pub(super) fn delete_user(conn: &Connection, id: UserId) -> Result<bool, RepositoryError> {
    let removed = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
    Ok(removed > 0)
}

pub(super) fn insert_school(conn: &Connection, school: NewSchool) -> Result<School, RepositoryError> {
    let created_at = Utc::now();
    conn.execute(
        r#"
        INSERT INTO schools (name, address, phone_number, is_active, created_at)
        VALUES (?1, ?2, ?3, 1, ?4)
        "#,
        params![school.name, school.address, school.phone_number, created_at],
    )?;

    Ok(School {
        id: SchoolId(conn.last_insert_rowid()),
        name: school.name,
        address: school.address,
        phone_number: school.phone_number,
        is_active: true,
        created_at,
        managers: Vec::new(),
        kitchen_staff: Vec::new(),
        inspectors: Vec::new(),
    })
}

pub(super) fn load_school(conn: &Connection, id: SchoolId) -> Result<Option<School>, RepositoryError> {
    let school = conn
        .query_row(
            r#"
            SELECT id, name, address, phone_number, is_active, created_at
            FROM schools
            WHERE id = ?1
            "#,
            params![id],
            |row| {
                Ok(School {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    address: row.get(2)?,
                    phone_number: row.get(3)?,
                    is_active: row.get(4)?,
                    created_at: row.get(5)?,
                    managers: Vec::new(),
                    kitchen_staff: Vec::new(),
                    inspectors: Vec::new(),
                })
            },
        )
        .optional()?;

    let Some(mut school) = school else {
        return Ok(None);
    };

    let mut stmt = conn.prepare_cached(
        r#"
        SELECT user_id, relation
        FROM school_staff
        WHERE school_id = ?1
        ORDER BY position ASC, rowid ASC
        "#,
    )?;
    let rows = stmt.query_map(params![id], |row| {
        Ok((row.get::<_, UserId>(0)?, row.get::<_, StaffRelation>(1)?))
    })?;
    for row in rows {
        let (user, relation) = row?;
        match relation {
            StaffRelation::Manager => school.managers.push(user),
            StaffRelation::Kitchen => school.kitchen_staff.push(user),
            StaffRelation::Inspector => school.inspectors.push(user),
        }
    }

    Ok(Some(school))
}

pub(super) fn add_staff(
    conn: &Connection,
    school: SchoolId,
    user: UserId,
    relation: StaffRelation,
) -> Result<(), RepositoryError> {
    conn.execute(
        r#"
        INSERT OR IGNORE INTO school_staff (school_id, user_id, relation, position)
        VALUES (
          ?1, ?2, ?3,
          (SELECT COALESCE(MAX(position), -1) + 1 FROM school_staff
           WHERE school_id = ?1 AND relation = ?3)
        )
        "#,
        params![school, user, relation],
    )?;
    Ok(())
}

pub(super) fn remove_staff(
    conn: &Connection,
    school: SchoolId,
    user: UserId,
    relation: StaffRelation,
) -> Result<bool, RepositoryError> {
    let removed = conn.execute(
        "DELETE FROM school_staff WHERE school_id = ?1 AND user_id = ?2 AND relation = ?3",
        params![school, user, relation],
    )?;
    Ok(removed > 0)
}

pub(super) fn delete_school(conn: &Connection, id: SchoolId) -> Result<bool, RepositoryError> {
    let removed = conn.execute("DELETE FROM schools WHERE id = ?1", params![id])?;
    Ok(removed > 0)
}
