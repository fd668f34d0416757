use anyhow::Result;
use rusqlite::Row;

use sampah_types::time::now_timestamp;

use super::parse_col;
use crate::Database;
use crate::models::{NewNotification, NotificationRow};

impl Database {
    // -- Notifications --

    pub fn insert_notification(&self, notification: &NewNotification<'_>) -> Result<()> {
        let now = now_timestamp();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO notifications (id, user_id, deposit_id, title, message, type, is_read, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7)",
                rusqlite::params![
                    notification.id,
                    notification.user_id,
                    notification.deposit_id,
                    notification.title,
                    notification.message,
                    notification.kind.as_str(),
                    now,
                ],
            )?;
            Ok(())
        })
    }

    /// Newest first.
    pub fn list_notifications(&self, user_id: &str) -> Result<Vec<NotificationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, deposit_id, title, message, type, is_read, created_at
                 FROM notifications
                 WHERE user_id = ?1
                 ORDER BY created_at DESC, rowid DESC",
            )?;
            let rows = stmt
                .query_map([user_id], map_notification)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn count_unread_notifications(&self, user_id: &str) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND is_read = 0",
                [user_id],
                |row| row.get(0),
            )?;
            Ok(count as u64)
        })
    }

    /// Returns false when the notification does not exist or belongs to
    /// someone else.
    pub fn mark_notification_read(&self, id: &str, user_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE notifications SET is_read = 1 WHERE id = ?1 AND user_id = ?2",
                [id, user_id],
            )?;
            Ok(n > 0)
        })
    }

    pub fn mark_all_notifications_read(&self, user_id: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE notifications SET is_read = 1 WHERE user_id = ?1 AND is_read = 0",
                [user_id],
            )?;
            Ok(n)
        })
    }
}

fn map_notification(row: &Row<'_>) -> rusqlite::Result<NotificationRow> {
    Ok(NotificationRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        deposit_id: row.get(2)?,
        title: row.get(3)?,
        message: row.get(4)?,
        kind: parse_col(row, 5)?,
        is_read: row.get(6)?,
        created_at: row.get(7)?,
    })
}
