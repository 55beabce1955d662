//! Session segment engine.
//!
//! A session partitions a focus period into alternating focus/break
//! segments. The submodules cover planning ([`planner`]), per-segment
//! elapsed tracking ([`time_engine`]), the status state machine
//! ([`machine`]), and save scheduling ([`autosave`]).
//!
//! Wire shapes use camelCase field names to match the documented JSON
//! session payload.

pub mod autosave;
pub mod machine;
pub mod planner;
pub mod time_engine;

pub use autosave::{AutosaveCoordinator, SaveStatus};
pub use machine::{transition, MachineState, SessionEvent, SessionMachine};
pub use planner::plan_segments;
pub use time_engine::TimeEngine;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Focus or break interval kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    Focus,
    Break,
}

/// One focus or break interval within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    #[serde(rename = "type")]
    pub kind: SegmentKind,
    /// Budgeted length of this segment in seconds.
    pub total_duration: u64,
    /// Elapsed seconds folded in across pauses. Never exceeds
    /// `total_duration`.
    #[serde(default)]
    pub duration: u64,
    /// Stamped while the segment is actively running, cleared on pause.
    #[serde(default)]
    pub start_timestamp: Option<DateTime<Utc>>,
    /// Set once when the segment's time is exhausted.
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Segment {
    pub fn new(kind: SegmentKind, total_duration: u64) -> Self {
        Self {
            kind,
            total_duration,
            duration: 0,
            start_timestamp: None,
            completed_at: None,
        }
    }
}

/// Session status owned by the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Running,
    Paused,
    SegmentTransition,
    Finished,
}

fn default_status() -> SessionStatus {
    SessionStatus::Idle
}

/// Full client-side session state, serializable as the wire `session`
/// object. `sessionId` and `status` are defaulted on deserialization so
/// the documented request shape (which omits them) still parses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub title: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub is_done: bool,
    #[serde(default = "default_status")]
    pub status: SessionStatus,
    #[serde(default)]
    pub segment_index: usize,
    pub segments: Vec<Segment>,
    /// Total focus seconds requested for the session (excludes breaks).
    pub total_duration: u64,
    pub break_duration: u64,
    pub max_breaks: u32,
}

impl SessionSnapshot {
    /// Create a fresh session with segments planned from the inputs.
    pub fn new(
        session_id: impl Into<String>,
        title: impl Into<String>,
        total_duration: u64,
        break_duration: u64,
        max_breaks: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            title: title.into(),
            timestamp: now,
            is_done: false,
            status: SessionStatus::Idle,
            segment_index: 0,
            segments: plan_segments(total_duration, break_duration, max_breaks),
            total_duration,
            break_duration,
            max_breaks,
        }
    }

    pub fn current_segment(&self) -> Option<&Segment> {
        self.segments.get(self.segment_index)
    }

    pub fn current_segment_mut(&mut self) -> Option<&mut Segment> {
        self.segments.get_mut(self.segment_index)
    }

    pub fn is_last_segment(&self) -> bool {
        self.segment_index + 1 >= self.segments.len()
    }

    /// Sum of accumulated elapsed seconds across all segments.
    pub fn elapsed_total(&self) -> u64 {
        self.segments.iter().map(|s| s.duration).sum()
    }
}
