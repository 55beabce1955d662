//! Server-side session upsert contract.
//!
//! One active session per user is an invariant enforced here, not at
//! the client: saving under a new `(sessionId, userId)` pair first
//! force-completes every other active session for the user. Completion
//! triggers the streak roll-up and the adaptive-target retune.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::database::{Database, StoreStatus, StoredSession};
use crate::error::{CoreError, Result, ValidationError};
use crate::session::SessionSnapshot;
use crate::streak::StreakEngine;

/// The documented save request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavePayload {
    #[serde(default)]
    pub session_id: String,
    pub session: SessionSnapshot,
    #[serde(default)]
    pub user_settings: Option<serde_json::Value>,
    #[serde(default)]
    pub user_data: Option<serde_json::Value>,
    #[serde(default)]
    pub session_feedback: Option<serde_json::Value>,
    #[serde(default)]
    pub history: Option<serde_json::Value>,
}

impl SavePayload {
    /// Build from a client snapshot, taking the session id from it.
    pub fn from_snapshot(snapshot: &SessionSnapshot) -> Self {
        Self {
            session_id: snapshot.session_id.clone(),
            session: snapshot.clone(),
            user_settings: None,
            user_data: None,
            session_feedback: None,
            history: None,
        }
    }
}

/// The saved document plus whether it was newly created, for the
/// host's 201/200 mapping.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResult {
    pub session: StoredSession,
    pub created: bool,
}

impl SaveResult {
    pub fn status_code(&self) -> u16 {
        if self.created {
            201
        } else {
            200
        }
    }
}

/// Upsert-oriented store for session documents.
pub struct SessionStore<'a> {
    db: &'a Database,
}

impl<'a> SessionStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Upsert the session document keyed by `(sessionId, userId)`.
    ///
    /// Recomputes `duration` as the sum of segment `duration`s. When
    /// the save transitions the session to done, rolls the duration up
    /// into the streak engine and retunes the daily target; re-saving
    /// an already-completed session never credits minutes again.
    ///
    /// # Errors
    /// `Auth` without a user id, `Validation` without a session id,
    /// `NotFound`/`Database` from the roll-up and writes.
    pub fn save_session(
        &self,
        user_id: &str,
        payload: &SavePayload,
        now: DateTime<Utc>,
    ) -> Result<SaveResult> {
        if user_id.is_empty() {
            return Err(CoreError::Auth("user not authenticated".into()));
        }
        if payload.session_id.is_empty() {
            return Err(ValidationError::MissingField("sessionId").into());
        }

        let existing = self.db.get_session(&payload.session_id, user_id)?;
        if existing.is_none() {
            self.db
                .force_complete_other_active(user_id, &payload.session_id, now)?;
        }
        let was_done = existing.as_ref().is_some_and(|s| s.is_done);

        let session = &payload.session;
        let duration: u64 = session.segments.iter().map(|s| s.duration).sum();
        let is_done = session.is_done;

        let document = StoredSession {
            session_id: payload.session_id.clone(),
            user_id: user_id.to_string(),
            title: session.title.clone(),
            status: if is_done {
                StoreStatus::Completed
            } else {
                StoreStatus::Active
            },
            is_done,
            segment_index: session.segment_index,
            segments: session.segments.clone(),
            total_duration: session.total_duration,
            break_duration: session.break_duration,
            max_breaks: session.max_breaks,
            duration,
            user_settings: payload.user_settings.clone(),
            user_data: payload.user_data.clone(),
            session_feedback: payload.session_feedback.clone(),
            history: payload.history.clone(),
            timestamp: session.timestamp,
            ended_at: is_done.then_some(now),
        };
        self.db.upsert_session(&document)?;

        // Roll up only on the transition to done: a completed session may
        // be re-saved (explicit checkpoints, retries), and crediting its
        // minutes again would inflate the day.
        if is_done && !was_done {
            let engine = StreakEngine::new(self.db);
            engine.process_day(user_id, now.date_naive(), duration)?;
            engine.retune_target(user_id)?;
        }

        Ok(SaveResult {
            session: document,
            created: existing.is_none(),
        })
    }

    /// The user's single active session, or `None`.
    pub fn get_active_session(&self, user_id: &str) -> Result<Option<StoredSession>> {
        if user_id.is_empty() {
            return Err(CoreError::Auth("user not authenticated".into()));
        }
        self.db.get_active_session(user_id)
    }
}
