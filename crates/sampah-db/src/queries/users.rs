use anyhow::Result;
use rusqlite::{Connection, Row};

use sampah_types::models::Role;
use sampah_types::time::now_timestamp;

use super::{OptionalExt, parse_col};
use crate::Database;
use crate::models::{NewUser, ProfileChange, UserRow};

const USER_COLUMNS: &str =
    "id, name, email, password, picture, school_name, role, created_at, updated_at";

impl Database {
    // -- Users --

    /// Fails with a constraint violation when the email is taken; see
    /// [`crate::is_unique_violation`].
    pub fn create_user(&self, user: &NewUser<'_>) -> Result<()> {
        let now = now_timestamp();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, name, email, password, school_name, role, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
                rusqlite::params![
                    user.id,
                    user.name,
                    user.email,
                    user.password_hash,
                    user.school_name,
                    user.role.as_str(),
                    now,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    /// Returns false when no user has this id.
    pub fn update_profile(&self, id: &str, change: &ProfileChange<'_>) -> Result<bool> {
        let now = now_timestamp();
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE users
                 SET name = COALESCE(?2, name),
                     school_name = COALESCE(?3, school_name),
                     picture = COALESCE(?4, picture),
                     updated_at = ?5
                 WHERE id = ?1",
                rusqlite::params![id, change.name, change.school_name, change.picture, now],
            )?;
            Ok(n > 0)
        })
    }

    pub fn list_admins(&self) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {USER_COLUMNS} FROM users WHERE role = ?1 ORDER BY created_at, rowid"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([Role::Admin.as_str()], map_user)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let row = stmt.query_row([value], map_user).optional()?;
    Ok(row)
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        picture: row.get(4)?,
        school_name: row.get(5)?,
        role: parse_col(row, 6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}
