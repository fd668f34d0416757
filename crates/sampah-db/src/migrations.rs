use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id           TEXT PRIMARY KEY,
                name         TEXT NOT NULL,
                email        TEXT NOT NULL UNIQUE,
                password     TEXT,
                picture      TEXT,
                school_name  TEXT,
                role         TEXT NOT NULL DEFAULT 'user',
                created_at   TEXT NOT NULL,
                updated_at   TEXT NOT NULL
            );

            CREATE INDEX idx_users_role ON users(role);

            CREATE TABLE waste_deposits (
                id             TEXT PRIMARY KEY,
                user_id        TEXT NOT NULL REFERENCES users(id),
                school_name    TEXT NOT NULL,
                contact_name   TEXT NOT NULL,
                contact_phone  TEXT NOT NULL,
                address        TEXT NOT NULL,
                pickup_date    TEXT NOT NULL,
                bin_count      INTEGER NOT NULL CHECK (bin_count > 0),
                waste_type     TEXT NOT NULL,
                photo_proof    TEXT,
                weight         REAL,
                status         TEXT NOT NULL DEFAULT 'pending'
                               CHECK (status IN ('pending', 'proses', 'completed', 'rejected')),
                picker_id      TEXT REFERENCES users(id),
                picker_name    TEXT,
                created_at     TEXT NOT NULL,
                updated_at     TEXT NOT NULL
            );

            CREATE INDEX idx_deposits_user ON waste_deposits(user_id, created_at);
            CREATE INDEX idx_deposits_created ON waste_deposits(created_at);

            CREATE TABLE notifications (
                id          TEXT PRIMARY KEY,
                user_id     TEXT NOT NULL REFERENCES users(id),
                deposit_id  TEXT REFERENCES waste_deposits(id),
                title       TEXT NOT NULL,
                message     TEXT NOT NULL,
                type        TEXT NOT NULL DEFAULT 'deposit_update',
                is_read     INTEGER NOT NULL DEFAULT 0,
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_notifications_user ON notifications(user_id, created_at);

            CREATE TABLE chat_messages (
                id           TEXT PRIMARY KEY,
                sender_id    TEXT NOT NULL REFERENCES users(id),
                receiver_id  TEXT NOT NULL REFERENCES users(id),
                message      TEXT NOT NULL,
                is_read      INTEGER NOT NULL DEFAULT 0,
                created_at   TEXT NOT NULL
            );

            CREATE INDEX idx_chat_pair ON chat_messages(sender_id, receiver_id, is_read);
            CREATE INDEX idx_chat_receiver ON chat_messages(receiver_id, is_read);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
