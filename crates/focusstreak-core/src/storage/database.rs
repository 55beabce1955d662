//! SQLite-based persistence.
//!
//! Provides storage for:
//! - Users and their streak subdocument
//! - Session documents (one active session per user, enforced by the
//!   session store)
//! - Per-day streak records, unique per `(user_id, date)`
//! - Key-value store for client-side local state blobs
//!
//! Upserts rely on the `(session_id, user_id)` / `(user_id, date)`
//! primary keys with `ON CONFLICT DO UPDATE`, so an upsert-or-update is
//! a single atomic statement.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{data_dir, migrations};
use crate::error::{DatabaseError, Result};
use crate::session::Segment;
use crate::streak::{DayState, StreakDay, TargetReason};

const DATE_FMT: &str = "%Y-%m-%d";

/// The `User.streak` subdocument. Mutated only by the streak and
/// adaptive-target engines; persists across sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStreak {
    pub daily_target_minutes: u32,
    pub freeze_balance: u32,
    pub max_freeze_balance: u32,
    pub min_target_minutes: u32,
    pub max_target_minutes: u32,
    pub daily_streak: u32,
    pub last_processed_date: Option<NaiveDate>,
    pub last_target_reason: TargetReason,
}

impl Default for UserStreak {
    fn default() -> Self {
        Self {
            daily_target_minutes: 25,
            freeze_balance: 1,
            max_freeze_balance: 3,
            min_target_minutes: 20,
            max_target_minutes: 90,
            daily_streak: 0,
            last_processed_date: None,
            last_target_reason: TargetReason::NoChange,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub streak: UserStreak,
}

/// Store-side session status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreStatus {
    Active,
    Completed,
}

impl StoreStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreStatus::Active => "active",
            StoreStatus::Completed => "completed",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(StoreStatus::Active),
            "completed" => Some(StoreStatus::Completed),
            _ => None,
        }
    }
}

/// The stored session document, returned to callers as the save
/// response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSession {
    pub session_id: String,
    pub user_id: String,
    pub title: String,
    pub status: StoreStatus,
    pub is_done: bool,
    pub segment_index: usize,
    pub segments: Vec<Segment>,
    pub total_duration: u64,
    pub break_duration: u64,
    pub max_breaks: u32,
    /// Sum of accumulated segment seconds, recomputed on every save.
    pub duration: u64,
    pub user_settings: Option<serde_json::Value>,
    pub user_data: Option<serde_json::Value>,
    pub session_feedback: Option<serde_json::Value>,
    pub history: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

/// SQLite database handle.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `~/.config/focusstreak/focusstreak.db`,
    /// creating file and schema as needed.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("focusstreak.db");
        Self::open_at(&path)
    }

    /// Open the database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (tests and ephemeral hosts).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(DatabaseError::from)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        migrations::migrate(&self.conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(())
    }

    // ── Users ────────────────────────────────────────────────────────

    /// Create a user with the default streak subdocument.
    pub fn create_user(&self, id: &str, username: &str) -> Result<User> {
        let streak = UserStreak::default();
        self.conn.execute(
            "INSERT INTO users (id, username) VALUES (?1, ?2)",
            params![id, username],
        )?;
        Ok(User {
            id: id.to_string(),
            username: username.to_string(),
            streak,
        })
    }

    pub fn get_user(&self, id: &str) -> Result<Option<User>> {
        let user = self
            .conn
            .query_row(
                "SELECT id, username, daily_target_minutes, freeze_balance,
                        max_freeze_balance, min_target_minutes, max_target_minutes,
                        daily_streak, last_processed_date, last_target_reason
                 FROM users WHERE id = ?1",
                params![id],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        streak: UserStreak {
                            daily_target_minutes: row.get(2)?,
                            freeze_balance: row.get(3)?,
                            max_freeze_balance: row.get(4)?,
                            min_target_minutes: row.get(5)?,
                            max_target_minutes: row.get(6)?,
                            daily_streak: row.get(7)?,
                            last_processed_date: row
                                .get::<_, Option<String>>(8)?
                                .map(|s| parse_date(8, &s))
                                .transpose()?,
                            last_target_reason: row
                                .get::<_, String>(9)
                                .map(|s| TargetReason::parse(&s).unwrap_or(TargetReason::NoChange))?,
                        },
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    pub fn update_user_streak(&self, id: &str, streak: &UserStreak) -> Result<()> {
        write_user_streak(&self.conn, id, streak)
    }

    // ── Streak days ──────────────────────────────────────────────────

    pub fn get_streak_day(&self, user_id: &str, date: NaiveDate) -> Result<Option<StreakDay>> {
        let day = self
            .conn
            .query_row(
                "SELECT user_id, date, focus_minutes, daily_target_minutes,
                        streak_rate, state, used_freeze
                 FROM streak_days WHERE user_id = ?1 AND date = ?2",
                params![user_id, date.format(DATE_FMT).to_string()],
                map_streak_day,
            )
            .optional()?;
        Ok(day)
    }

    /// Most recent day records, date descending.
    pub fn recent_streak_days(&self, user_id: &str, limit: usize) -> Result<Vec<StreakDay>> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, date, focus_minutes, daily_target_minutes,
                    streak_rate, state, used_freeze
             FROM streak_days WHERE user_id = ?1
             ORDER BY date DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![user_id, limit as i64], map_streak_day)?;
        let mut days = Vec::new();
        for row in rows {
            days.push(row?);
        }
        Ok(days)
    }

    /// Day records in `[start, end)`, date ascending.
    pub fn streak_days_between(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<StreakDay>> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, date, focus_minutes, daily_target_minutes,
                    streak_rate, state, used_freeze
             FROM streak_days WHERE user_id = ?1 AND date >= ?2 AND date < ?3
             ORDER BY date ASC",
        )?;
        let rows = stmt.query_map(
            params![
                user_id,
                start.format(DATE_FMT).to_string(),
                end.format(DATE_FMT).to_string()
            ],
            map_streak_day,
        )?;
        let mut days = Vec::new();
        for row in rows {
            days.push(row?);
        }
        Ok(days)
    }

    pub fn upsert_streak_day(&self, day: &StreakDay) -> Result<()> {
        upsert_streak_day(&self.conn, day)
    }

    // ── Sessions ─────────────────────────────────────────────────────

    pub fn get_session(&self, session_id: &str, user_id: &str) -> Result<Option<StoredSession>> {
        let session = self
            .conn
            .query_row(
                &format!("{SESSION_SELECT} WHERE session_id = ?1 AND user_id = ?2"),
                params![session_id, user_id],
                map_session,
            )
            .optional()?;
        Ok(session)
    }

    /// The user's single active session, if any.
    pub fn get_active_session(&self, user_id: &str) -> Result<Option<StoredSession>> {
        let session = self
            .conn
            .query_row(
                &format!(
                    "{SESSION_SELECT} WHERE user_id = ?1 AND status = 'active'
                     ORDER BY timestamp DESC LIMIT 1"
                ),
                params![user_id],
                map_session,
            )
            .optional()?;
        Ok(session)
    }

    /// Force-complete every *other* active session for the user.
    /// Returns the number of sessions closed.
    pub fn force_complete_other_active(
        &self,
        user_id: &str,
        keep_session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<usize> {
        let closed = self.conn.execute(
            "UPDATE sessions
             SET status = 'completed', ended_at = ?3
             WHERE user_id = ?1 AND status = 'active' AND session_id <> ?2",
            params![user_id, keep_session_id, now.to_rfc3339()],
        )?;
        Ok(closed)
    }

    /// Atomic upsert keyed by `(session_id, user_id)`.
    pub fn upsert_session(&self, session: &StoredSession) -> Result<()> {
        let segments = serde_json::to_string(&session.segments)?;
        self.conn.execute(
            "INSERT INTO sessions (
                session_id, user_id, title, status, is_done, segment_index,
                segments, total_duration, break_duration, max_breaks, duration,
                user_settings, user_data, session_feedback, history,
                timestamp, ended_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
             ON CONFLICT(session_id, user_id) DO UPDATE SET
                title = excluded.title,
                status = excluded.status,
                is_done = excluded.is_done,
                segment_index = excluded.segment_index,
                segments = excluded.segments,
                total_duration = excluded.total_duration,
                break_duration = excluded.break_duration,
                max_breaks = excluded.max_breaks,
                duration = excluded.duration,
                user_settings = excluded.user_settings,
                user_data = excluded.user_data,
                session_feedback = excluded.session_feedback,
                history = excluded.history,
                timestamp = excluded.timestamp,
                ended_at = excluded.ended_at",
            params![
                session.session_id,
                session.user_id,
                session.title,
                session.status.as_str(),
                session.is_done,
                session.segment_index as i64,
                segments,
                session.total_duration,
                session.break_duration,
                session.max_breaks,
                session.duration,
                json_opt(&session.user_settings)?,
                json_opt(&session.user_data)?,
                json_opt(&session.session_feedback)?,
                json_opt(&session.history)?,
                session.timestamp.to_rfc3339(),
                session.ended_at.map(|t| t.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    // ── Key-value store ──────────────────────────────────────────────

    pub fn kv_get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    pub fn kv_set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_delete(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

const SESSION_SELECT: &str = "SELECT session_id, user_id, title, status, is_done, segment_index,
        segments, total_duration, break_duration, max_breaks, duration,
        user_settings, user_data, session_feedback, history, timestamp, ended_at
 FROM sessions";

/// Write the streak subdocument. Takes a plain connection so the streak
/// engine can run it inside its transaction.
pub(crate) fn write_user_streak(
    conn: &Connection,
    id: &str,
    streak: &UserStreak,
) -> Result<()> {
    conn.execute(
        "UPDATE users SET
            daily_target_minutes = ?2,
            freeze_balance = ?3,
            max_freeze_balance = ?4,
            min_target_minutes = ?5,
            max_target_minutes = ?6,
            daily_streak = ?7,
            last_processed_date = ?8,
            last_target_reason = ?9
         WHERE id = ?1",
        params![
            id,
            streak.daily_target_minutes,
            streak.freeze_balance,
            streak.max_freeze_balance,
            streak.min_target_minutes,
            streak.max_target_minutes,
            streak.daily_streak,
            streak
                .last_processed_date
                .map(|d| d.format(DATE_FMT).to_string()),
            streak.last_target_reason.as_str(),
        ],
    )?;
    Ok(())
}

/// Atomic upsert keyed by `(user_id, date)`.
pub(crate) fn upsert_streak_day(conn: &Connection, day: &StreakDay) -> Result<()> {
    conn.execute(
        "INSERT INTO streak_days (
            user_id, date, focus_minutes, daily_target_minutes,
            streak_rate, state, used_freeze
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(user_id, date) DO UPDATE SET
            focus_minutes = excluded.focus_minutes,
            daily_target_minutes = excluded.daily_target_minutes,
            streak_rate = excluded.streak_rate,
            state = excluded.state,
            used_freeze = excluded.used_freeze",
        params![
            day.user_id,
            day.date.format(DATE_FMT).to_string(),
            day.focus_minutes,
            day.daily_target_minutes,
            day.streak_rate,
            day.state.as_str(),
            day.used_freeze,
        ],
    )?;
    Ok(())
}

fn map_streak_day(row: &rusqlite::Row<'_>) -> rusqlite::Result<StreakDay> {
    Ok(StreakDay {
        user_id: row.get(0)?,
        date: {
            let s: String = row.get(1)?;
            parse_date(1, &s)?
        },
        focus_minutes: row.get(2)?,
        daily_target_minutes: row.get(3)?,
        streak_rate: row.get(4)?,
        state: {
            let s: String = row.get(5)?;
            DayState::parse(&s).ok_or_else(|| invalid_text(5, &s))?
        },
        used_freeze: row.get(6)?,
    })
}

fn map_session(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredSession> {
    let segments: String = row.get(6)?;
    Ok(StoredSession {
        session_id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        status: {
            let s: String = row.get(3)?;
            StoreStatus::parse(&s).ok_or_else(|| invalid_text(3, &s))?
        },
        is_done: row.get(4)?,
        segment_index: row.get::<_, i64>(5)? as usize,
        segments: serde_json::from_str(&segments)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(
                6,
                rusqlite::types::Type::Text,
                Box::new(e),
            ))?,
        total_duration: row.get(7)?,
        break_duration: row.get(8)?,
        max_breaks: row.get(9)?,
        duration: row.get(10)?,
        user_settings: parse_json_opt(row, 11)?,
        user_data: parse_json_opt(row, 12)?,
        session_feedback: parse_json_opt(row, 13)?,
        history: parse_json_opt(row, 14)?,
        timestamp: {
            let s: String = row.get(15)?;
            parse_datetime(15, &s)?
        },
        ended_at: row
            .get::<_, Option<String>>(16)?
            .map(|s| parse_datetime(16, &s))
            .transpose()?,
    })
}

fn parse_date(idx: usize, s: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FMT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_datetime(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn parse_json_opt(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Option<serde_json::Value>> {
    row.get::<_, Option<String>>(idx)?
        .map(|s| {
            serde_json::from_str(&s).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    idx,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })
        })
        .transpose()
}

fn json_opt(value: &Option<serde_json::Value>) -> Result<Option<String>> {
    Ok(match value {
        Some(v) => Some(serde_json::to_string(v)?),
        None => None,
    })
}

fn invalid_text(idx: usize, s: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        format!("unrecognized value: {s}").into(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{SegmentKind, Segment};

    #[test]
    fn user_roundtrip_with_defaults() {
        let db = Database::open_memory().unwrap();
        db.create_user("u-1", "tester").unwrap();
        let user = db.get_user("u-1").unwrap().unwrap();
        assert_eq!(user.username, "tester");
        assert_eq!(user.streak, UserStreak::default());
        assert!(db.get_user("nobody").unwrap().is_none());
    }

    #[test]
    fn streak_day_upsert_replaces_same_day() {
        let db = Database::open_memory().unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let mut day = StreakDay {
            user_id: "u-1".into(),
            date,
            focus_minutes: 10,
            daily_target_minutes: 25,
            streak_rate: 0.4,
            state: DayState::Red,
            used_freeze: 0,
        };
        db.upsert_streak_day(&day).unwrap();
        day.focus_minutes = 30;
        day.streak_rate = 1.2;
        day.state = DayState::Green;
        db.upsert_streak_day(&day).unwrap();

        let stored = db.get_streak_day("u-1", date).unwrap().unwrap();
        assert_eq!(stored.focus_minutes, 30);
        assert_eq!(stored.state, DayState::Green);
        assert_eq!(db.recent_streak_days("u-1", 7).unwrap().len(), 1);
    }

    #[test]
    fn session_roundtrip_preserves_segments() {
        let db = Database::open_memory().unwrap();
        let now = Utc::now();
        let session = StoredSession {
            session_id: "s-1".into(),
            user_id: "u-1".into(),
            title: "morning".into(),
            status: StoreStatus::Active,
            is_done: false,
            segment_index: 1,
            segments: vec![
                Segment::new(SegmentKind::Focus, 500),
                Segment::new(SegmentKind::Break, 300),
            ],
            total_duration: 1500,
            break_duration: 300,
            max_breaks: 4,
            duration: 120,
            user_settings: Some(serde_json::json!({"autoStartBreaks": true})),
            user_data: None,
            session_feedback: None,
            history: None,
            timestamp: now,
            ended_at: None,
        };
        db.upsert_session(&session).unwrap();

        let stored = db.get_session("s-1", "u-1").unwrap().unwrap();
        assert_eq!(stored.segments.len(), 2);
        assert_eq!(stored.segment_index, 1);
        assert_eq!(
            stored.user_settings,
            Some(serde_json::json!({"autoStartBreaks": true}))
        );
        assert!(db.get_session("s-1", "someone-else").unwrap().is_none());
    }

    #[test]
    fn kv_roundtrip() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("todos").unwrap().is_none());
        db.kv_set("todos", "[\"read\"]").unwrap();
        db.kv_set("todos", "[\"read\",\"write\"]").unwrap();
        assert_eq!(db.kv_get("todos").unwrap().unwrap(), "[\"read\",\"write\"]");
        db.kv_delete("todos").unwrap();
        assert!(db.kv_get("todos").unwrap().is_none());
    }
}
