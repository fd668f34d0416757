use anyhow::Result;
use rusqlite::Row;

use sampah_types::time::now_timestamp;

use super::OptionalExt;
use crate::Database;
use crate::models::{ChatMessageRow, ChatSummaryRow};

const MESSAGE_SELECT: &str = "SELECT m.id, m.sender_id, m.receiver_id, u.name, m.message, m.is_read, m.created_at
     FROM chat_messages m
     LEFT JOIN users u ON u.id = m.sender_id";

impl Database {
    // -- Chat --

    pub fn insert_chat_message(
        &self,
        id: &str,
        sender_id: &str,
        receiver_id: &str,
        message: &str,
    ) -> Result<()> {
        let now = now_timestamp();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO chat_messages (id, sender_id, receiver_id, message, is_read, created_at)
                 VALUES (?1, ?2, ?3, ?4, 0, ?5)",
                rusqlite::params![id, sender_id, receiver_id, message, now],
            )?;
            Ok(())
        })
    }

    pub fn get_chat_message(&self, id: &str) -> Result<Option<ChatMessageRow>> {
        self.with_conn(|conn| {
            let sql = format!("{MESSAGE_SELECT} WHERE m.id = ?1");
            let mut stmt = conn.prepare(&sql)?;
            let row = stmt.query_row([id], map_message).optional()?;
            Ok(row)
        })
    }

    /// All messages exchanged between `a` and `b`, oldest first. The sender
    /// name is joined in so callers never look users up per message.
    pub fn get_thread(&self, a: &str, b: &str) -> Result<Vec<ChatMessageRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{MESSAGE_SELECT}
                 WHERE (m.sender_id = ?1 AND m.receiver_id = ?2)
                    OR (m.sender_id = ?2 AND m.receiver_id = ?1)
                 ORDER BY m.created_at ASC, m.rowid ASC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([a, b], map_message)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Mark everything `other` sent to `reader` as read.
    pub fn mark_thread_read(&self, reader: &str, other: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE chat_messages SET is_read = 1
                 WHERE sender_id = ?1 AND receiver_id = ?2 AND is_read = 0",
                [other, reader],
            )?;
            Ok(n)
        })
    }

    pub fn count_unread_messages(&self, receiver_id: &str) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM chat_messages WHERE receiver_id = ?1 AND is_read = 0",
                [receiver_id],
                |row| row.get(0),
            )?;
            Ok(count as u64)
        })
    }

    /// One row per distinct counterpart of `user_id`: latest message and the
    /// number of unread messages they sent. Most recent conversation first.
    pub fn chat_summaries(&self, user_id: &str) -> Result<Vec<ChatSummaryRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT t.other_id, u.name, u.school_name, m.message, m.created_at,
                        (SELECT COUNT(*) FROM chat_messages c
                          WHERE c.sender_id = t.other_id AND c.receiver_id = ?1 AND c.is_read = 0)
                 FROM (
                     SELECT CASE WHEN sender_id = ?1 THEN receiver_id ELSE sender_id END AS other_id,
                            MAX(rowid) AS last_rowid
                     FROM chat_messages
                     WHERE sender_id = ?1 OR receiver_id = ?1
                     GROUP BY other_id
                 ) t
                 JOIN chat_messages m ON m.rowid = t.last_rowid
                 LEFT JOIN users u ON u.id = t.other_id
                 ORDER BY t.last_rowid DESC",
            )?;
            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(ChatSummaryRow {
                        counterpart_id: row.get(0)?,
                        counterpart_name: row.get(1)?,
                        counterpart_school: row.get(2)?,
                        last_message: row.get(3)?,
                        last_time: row.get(4)?,
                        unread_count: row.get::<_, i64>(5)? as u64,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Summary of the single conversation between `user_id` and `other_id`,
    /// or `None` if they have never exchanged a message.
    pub fn thread_summary(&self, user_id: &str, other_id: &str) -> Result<Option<ChatSummaryRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT m.message, m.created_at,
                        (SELECT COUNT(*) FROM chat_messages c
                          WHERE c.sender_id = ?2 AND c.receiver_id = ?1 AND c.is_read = 0)
                 FROM chat_messages m
                 WHERE (m.sender_id = ?1 AND m.receiver_id = ?2)
                    OR (m.sender_id = ?2 AND m.receiver_id = ?1)
                 ORDER BY m.created_at DESC, m.rowid DESC
                 LIMIT 1",
            )?;
            let row = stmt
                .query_row([user_id, other_id], |row| {
                    Ok(ChatSummaryRow {
                        counterpart_id: other_id.to_string(),
                        counterpart_name: None,
                        counterpart_school: None,
                        last_message: row.get(0)?,
                        last_time: row.get(1)?,
                        unread_count: row.get::<_, i64>(2)? as u64,
                    })
                })
                .optional()?;
            Ok(row)
        })
    }
}

fn map_message(row: &Row<'_>) -> rusqlite::Result<ChatMessageRow> {
    Ok(ChatMessageRow {
        id: row.get(0)?,
        sender_id: row.get(1)?,
        receiver_id: row.get(2)?,
        sender_name: row
            .get::<_, Option<String>>(3)?
            .unwrap_or_else(|| "unknown".to_string()),
        message: row.get(4)?,
        is_read: row.get(5)?,
        created_at: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::seed_user;
    use sampah_types::models::Role;

    #[test]
    fn thread_is_oldest_first_and_read_marking_is_directional() {
        let db = Database::open_in_memory().unwrap();
        let user = seed_user(&db, "u@school.id", Role::User);
        let admin = seed_user(&db, "a@school.id", Role::Admin);

        db.insert_chat_message("m1", &user, &admin, "halo").unwrap();
        db.insert_chat_message("m2", &admin, &user, "ya?").unwrap();
        db.insert_chat_message("m3", &user, &admin, "kapan dijemput?").unwrap();

        let thread = db.get_thread(&admin, &user).unwrap();
        let ids: Vec<_> = thread.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["m1", "m2", "m3"]);
        assert_eq!(thread[0].sender_name, "Tester");

        // admin reads: only messages addressed to admin flip
        assert_eq!(db.mark_thread_read(&admin, &user).unwrap(), 2);
        assert_eq!(db.count_unread_messages(&admin).unwrap(), 0);
        assert_eq!(db.count_unread_messages(&user).unwrap(), 1);
    }

    #[test]
    fn reading_one_thread_leaves_others_unread() {
        let db = Database::open_in_memory().unwrap();
        let admin = seed_user(&db, "a@school.id", Role::Admin);
        let u1 = seed_user(&db, "u1@school.id", Role::User);
        let u2 = seed_user(&db, "u2@school.id", Role::User);

        db.insert_chat_message("m1", &u1, &admin, "satu").unwrap();
        db.insert_chat_message("m2", &u2, &admin, "dua").unwrap();

        db.mark_thread_read(&admin, &u1).unwrap();
        let summary = db.thread_summary(&admin, &u2).unwrap().unwrap();
        assert_eq!(summary.unread_count, 1);
        assert_eq!(db.count_unread_messages(&admin).unwrap(), 1);
    }

    #[test]
    fn summaries_aggregate_per_counterpart() {
        let db = Database::open_in_memory().unwrap();
        let admin = seed_user(&db, "a@school.id", Role::Admin);
        let u1 = seed_user(&db, "u1@school.id", Role::User);
        let u2 = seed_user(&db, "u2@school.id", Role::User);

        db.insert_chat_message("m1", &u1, &admin, "pertama").unwrap();
        db.insert_chat_message("m2", &u1, &admin, "kedua").unwrap();
        db.insert_chat_message("m3", &u2, &admin, "dari u2").unwrap();
        db.insert_chat_message("m4", &admin, &u1, "balasan").unwrap();

        let summaries = db.chat_summaries(&admin).unwrap();
        assert_eq!(summaries.len(), 2);

        // u1 has the most recent message (m4)
        assert_eq!(summaries[0].counterpart_id, u1);
        assert_eq!(summaries[0].last_message, "balasan");
        assert_eq!(summaries[0].unread_count, 2);
        assert_eq!(summaries[0].counterpart_name.as_deref(), Some("Tester"));

        assert_eq!(summaries[1].counterpart_id, u2);
        assert_eq!(summaries[1].unread_count, 1);
    }

    #[test]
    fn no_summary_without_exchange() {
        let db = Database::open_in_memory().unwrap();
        let admin = seed_user(&db, "a@school.id", Role::Admin);
        let user = seed_user(&db, "u@school.id", Role::User);
        assert!(db.thread_summary(&user, &admin).unwrap().is_none());
        assert!(db.chat_summaries(&user).unwrap().is_empty());
    }
}
