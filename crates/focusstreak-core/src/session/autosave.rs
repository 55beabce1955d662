//! Debounced + periodic autosave coordination.
//!
//! The coordinator owns a dirty flag and two deadlines: a short
//! debounce re-armed by every `mark_dirty`, and a fixed interval check.
//! It holds no threads or timers of its own -- the host drives it with
//! `poll(now)` (same caller-tick discipline as the time engine) and
//! performs the actual write itself:
//!
//! ```ignore
//! coordinator.mark_dirty(now);
//! if coordinator.poll(now) {
//!     let result = store.save_session(user, &payload, now);
//!     coordinator.complete(result.is_ok());
//! }
//! ```
//!
//! At most one save is in flight; newer dirty marks coalesce into the
//! next cycle instead of queueing further saves. Failures never
//! propagate to the host flow: they land in the observable
//! [`SaveStatus`] and the dirty flag stays set so the next deadline
//! retries. Backoff policy belongs to the transport, not here.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::SessionStatus;

const DEBOUNCE_SECS: i64 = 2;
const INTERVAL_SECS: i64 = 60;

/// Observable save state, surfaced to the host as advisory only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveStatus {
    Idle,
    Saving,
    Saved,
    Error,
}

/// Dirty-flag save scheduler with an in-flight guard.
#[derive(Debug)]
pub struct AutosaveCoordinator {
    enabled: bool,
    dirty: bool,
    in_flight: bool,
    status: SaveStatus,
    debounce: Duration,
    interval: Duration,
    /// Re-armed by the most recent `mark_dirty`.
    debounce_deadline: Option<DateTime<Utc>>,
    next_interval_check: DateTime<Utc>,
}

impl AutosaveCoordinator {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self::with_periods(
            now,
            Duration::seconds(DEBOUNCE_SECS),
            Duration::seconds(INTERVAL_SECS),
        )
    }

    /// Custom periods, used by tests.
    pub fn with_periods(now: DateTime<Utc>, debounce: Duration, interval: Duration) -> Self {
        Self {
            enabled: false,
            dirty: false,
            in_flight: false,
            status: SaveStatus::Idle,
            debounce,
            interval,
            debounce_deadline: None,
            next_interval_check: now + interval,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn status(&self) -> SaveStatus {
        self.status
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Track the session status: autosave only runs while the session
    /// is running, paused, or finished.
    pub fn update_enabled(&mut self, status: SessionStatus) {
        self.enabled = matches!(
            status,
            SessionStatus::Running | SessionStatus::Paused | SessionStatus::Finished
        );
    }

    /// Record a pending unsaved change and re-arm the debounce.
    /// Ignored while disabled.
    pub fn mark_dirty(&mut self, now: DateTime<Utc>) {
        if !self.enabled {
            return;
        }
        self.dirty = true;
        self.debounce_deadline = Some(now + self.debounce);
    }

    /// Returns `true` when a save must start now (debounce elapsed or
    /// interval due, dirty, nothing in flight) and marks it in flight.
    /// The host must resolve every `true` with [`complete`].
    ///
    /// [`complete`]: AutosaveCoordinator::complete
    pub fn poll(&mut self, now: DateTime<Utc>) -> bool {
        let interval_due = now >= self.next_interval_check;
        if interval_due {
            self.next_interval_check = now + self.interval;
        }
        if !self.enabled || self.in_flight || !self.dirty {
            return false;
        }
        let debounce_due = self.debounce_deadline.is_some_and(|d| now >= d);
        if debounce_due || interval_due {
            self.begin();
            return true;
        }
        false
    }

    /// Bypass the timers for explicit checkpoints (pause, finish,
    /// before navigating away). Still refuses while a save is in
    /// flight or the coordinator is disabled.
    pub fn force_save(&mut self) -> bool {
        if !self.enabled || self.in_flight {
            return false;
        }
        self.begin();
        true
    }

    /// Resolve the in-flight save. Failure re-sets the dirty flag so
    /// the next debounce/interval tick retries; a `mark_dirty` that
    /// arrived while the save was in flight survives either way.
    pub fn complete(&mut self, success: bool) {
        if !self.in_flight {
            return;
        }
        self.in_flight = false;
        if success {
            self.status = SaveStatus::Saved;
        } else {
            self.status = SaveStatus::Error;
            self.dirty = true;
        }
    }

    fn begin(&mut self) {
        self.in_flight = true;
        self.status = SaveStatus::Saving;
        // The payload snapshot is taken now; marks after this point
        // belong to the next cycle.
        self.dirty = false;
        self.debounce_deadline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coordinator(now: DateTime<Utc>) -> AutosaveCoordinator {
        let mut c =
            AutosaveCoordinator::with_periods(now, Duration::seconds(2), Duration::seconds(60));
        c.update_enabled(SessionStatus::Running);
        c
    }

    #[test]
    fn rapid_dirty_marks_coalesce_into_one_save() {
        let t0 = Utc::now();
        let mut c = coordinator(t0);

        // Five marks inside the debounce window.
        for ms in [0, 300, 600, 900, 1200] {
            let now = t0 + Duration::milliseconds(ms);
            c.mark_dirty(now);
            assert!(!c.poll(now));
        }

        // 2s after the *last* mark the single save fires.
        assert!(!c.poll(t0 + Duration::milliseconds(3100)));
        assert!(c.poll(t0 + Duration::milliseconds(3200)));
        c.complete(true);
        assert_eq!(c.status(), SaveStatus::Saved);
        assert!(!c.is_dirty());
        assert!(!c.poll(t0 + Duration::seconds(10)));
    }

    #[test]
    fn in_flight_save_blocks_a_second_one() {
        let t0 = Utc::now();
        let mut c = coordinator(t0);
        c.mark_dirty(t0);

        assert!(c.poll(t0 + Duration::seconds(3)));
        assert_eq!(c.status(), SaveStatus::Saving);

        // Nothing else may start until completion.
        c.mark_dirty(t0 + Duration::seconds(4));
        assert!(!c.poll(t0 + Duration::seconds(7)));
        assert!(!c.force_save());

        c.complete(true);
        assert!(c.poll(t0 + Duration::seconds(8)));
    }

    #[test]
    fn failure_keeps_dirty_and_interval_retries() {
        let t0 = Utc::now();
        let mut c = coordinator(t0);
        c.mark_dirty(t0);

        assert!(c.poll(t0 + Duration::seconds(2)));
        c.complete(false);
        assert_eq!(c.status(), SaveStatus::Error);
        assert!(c.is_dirty());

        // Debounce deadline was consumed; the 60s interval picks it up.
        assert!(!c.poll(t0 + Duration::seconds(30)));
        assert!(c.poll(t0 + Duration::seconds(61)));
        c.complete(true);
        assert_eq!(c.status(), SaveStatus::Saved);
    }

    #[test]
    fn disabled_coordinator_ignores_dirty_marks() {
        let t0 = Utc::now();
        let mut c = AutosaveCoordinator::new(t0);
        c.update_enabled(SessionStatus::Idle);

        c.mark_dirty(t0);
        assert!(!c.is_dirty());
        assert!(!c.poll(t0 + Duration::seconds(120)));
        assert!(!c.force_save());
    }

    #[test]
    fn force_save_bypasses_timers() {
        let t0 = Utc::now();
        let mut c = coordinator(t0);
        c.mark_dirty(t0);

        assert!(c.force_save());
        assert_eq!(c.status(), SaveStatus::Saving);
        c.complete(true);
        assert!(!c.is_dirty());
    }
}
