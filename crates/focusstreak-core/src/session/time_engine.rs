//! Timestamp-based remaining-time computation for the current segment.
//!
//! The engine never runs a countdown. Remaining time is always derived
//! from the segment's accumulated `duration` plus the wall-clock time
//! since `start_timestamp`, so tab suspension, device sleep, and
//! reloads are self-correcting on the next read. A UI tick merely
//! re-reads the value; it is not a source of truth.
//!
//! All operations take an explicit `now` so hosts and tests share one
//! code path; hosts pass `Utc::now()`.

use chrono::{DateTime, Utc};

use super::{Segment, SessionStatus};

/// Per-segment time tracking with a latched TIME_UP signal.
#[derive(Debug, Clone, Default)]
pub struct TimeEngine {
    /// Set once the zero crossing has been reported for the current
    /// segment; re-armed on segment advance, reset, or load.
    time_up_fired: bool,
}

impl TimeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remaining seconds for `segment`.
    ///
    /// `remaining = max(total - (duration + elapsed_since_start), 0)`
    /// where `elapsed_since_start` only counts while running.
    pub fn remaining(segment: &Segment, status: SessionStatus, now: DateTime<Utc>) -> u64 {
        let elapsed_since_start = match (status, segment.start_timestamp) {
            (SessionStatus::Running, Some(start)) => (now - start).num_seconds().max(0) as u64,
            _ => 0,
        };
        segment
            .total_duration
            .saturating_sub(segment.duration + elapsed_since_start)
    }

    /// Stamp the running start. Idempotent: a second `start` without an
    /// intervening `pause` must not double-count elapsed time.
    pub fn start(&mut self, segment: &mut Segment, now: DateTime<Utc>) {
        if segment.start_timestamp.is_none() {
            segment.start_timestamp = Some(now);
        }
    }

    /// Fold elapsed time into `duration` and clear the stamp. No-op when
    /// already paused.
    pub fn pause(&mut self, segment: &mut Segment, now: DateTime<Utc>) {
        if let Some(start) = segment.start_timestamp.take() {
            let elapsed = (now - start).num_seconds().max(0) as u64;
            segment.duration = (segment.duration + elapsed).min(segment.total_duration);
        }
    }

    /// Drive from the host's periodic tick. Returns `true` exactly once
    /// per segment, when remaining time reaches zero while running.
    pub fn tick(&mut self, segment: &Segment, status: SessionStatus, now: DateTime<Utc>) -> bool {
        if status != SessionStatus::Running || self.time_up_fired {
            return false;
        }
        if Self::remaining(segment, status, now) == 0 {
            self.time_up_fired = true;
            return true;
        }
        false
    }

    /// Re-arm the TIME_UP latch for a new or reset segment.
    pub fn rearm(&mut self) {
        self.time_up_fired = false;
    }
}
