//! Database schema migrations for focusstreak.
//!
//! Migrations are versioned and applied automatically when opening the
//! database. The `schema_version` table tracks the current version.

use rusqlite::{Connection, Result as SqliteResult};

/// Apply all pending migrations.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Returns 0 if no version is set (initial database).
fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .unwrap_or(0)
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// v1: users, sessions, streak days, and the key-value store.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            id                   TEXT PRIMARY KEY,
            username             TEXT NOT NULL UNIQUE,
            daily_target_minutes INTEGER NOT NULL DEFAULT 25,
            freeze_balance       INTEGER NOT NULL DEFAULT 1,
            max_freeze_balance   INTEGER NOT NULL DEFAULT 3,
            min_target_minutes   INTEGER NOT NULL DEFAULT 20,
            max_target_minutes   INTEGER NOT NULL DEFAULT 90,
            daily_streak         INTEGER NOT NULL DEFAULT 0,
            last_processed_date  TEXT,
            last_target_reason   TEXT NOT NULL DEFAULT 'no_change'
        );

        CREATE TABLE IF NOT EXISTS sessions (
            session_id       TEXT NOT NULL,
            user_id          TEXT NOT NULL,
            title            TEXT NOT NULL DEFAULT '',
            status           TEXT NOT NULL,
            is_done          INTEGER NOT NULL DEFAULT 0,
            segment_index    INTEGER NOT NULL DEFAULT 0,
            segments         TEXT NOT NULL,
            total_duration   INTEGER NOT NULL,
            break_duration   INTEGER NOT NULL,
            max_breaks       INTEGER NOT NULL,
            duration         INTEGER NOT NULL DEFAULT 0,
            user_settings    TEXT,
            user_data        TEXT,
            session_feedback TEXT,
            history          TEXT,
            timestamp        TEXT NOT NULL,
            ended_at         TEXT,
            PRIMARY KEY (session_id, user_id)
        );

        CREATE TABLE IF NOT EXISTS streak_days (
            user_id              TEXT NOT NULL,
            date                 TEXT NOT NULL,
            focus_minutes        INTEGER NOT NULL DEFAULT 0,
            daily_target_minutes INTEGER NOT NULL,
            streak_rate          REAL NOT NULL,
            state                TEXT NOT NULL,
            used_freeze          INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (user_id, date)
        );

        CREATE TABLE IF NOT EXISTS kv (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );",
    )?;
    set_schema_version(conn, 1)
}

/// v2: indexes for the active-session lookup and monthly day queries.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_sessions_user_status ON sessions(user_id, status);
        CREATE INDEX IF NOT EXISTS idx_streak_days_user_date ON streak_days(user_id, date);",
    )?;
    set_schema_version(conn, 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrate_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), 2);
    }
}
