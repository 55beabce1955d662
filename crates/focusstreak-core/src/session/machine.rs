//! Session status state machine.
//!
//! The transition function is pure: `(state, event) -> state` with no
//! side effects. [`SessionMachine`] is the thin imperative shell that
//! owns the snapshot and applies side effects (TimeEngine calls,
//! segment freezing, segment advance, replanning) based on the
//! previous/next state pair.
//!
//! ## State transitions
//!
//! ```text
//! idle -> running <-> paused
//! running -> segment_transition -> idle   (more segments remain)
//! running -> finished                     (last segment)
//! any -> idle(index 0)                    (RESET_SESSION)
//! any -> as given                         (LOAD)
//! ```
//!
//! `finished` has no outgoing transitions except RESET_SESSION/LOAD.

use chrono::{DateTime, Utc};

use super::planner::plan_segments;
use super::time_engine::TimeEngine;
use super::{SessionSnapshot, SessionStatus};

/// Events consumed by the machine.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Start,
    Pause,
    Resume,
    TimeUp,
    NextSegment,
    ResetSegment,
    ResetSession,
    /// Rehydrate from a persisted snapshot; state becomes whatever the
    /// snapshot specifies.
    Load(SessionSnapshot),
}

/// The slice of session state the pure transition function operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MachineState {
    pub status: SessionStatus,
    pub segment_index: usize,
    pub is_done: bool,
}

/// Pure transition function. `segment_count` distinguishes the
/// more-segments-remain and last-segment TIME_UP outcomes.
pub fn transition(state: MachineState, event: &SessionEvent, segment_count: usize) -> MachineState {
    use SessionEvent as E;
    use SessionStatus as S;

    match (state.status, event) {
        (S::Idle, E::Start) => MachineState {
            status: S::Running,
            ..state
        },
        (S::Paused, E::Start) | (S::Paused, E::Resume) => MachineState {
            status: S::Running,
            ..state
        },
        (S::Running, E::Pause) => MachineState {
            status: S::Paused,
            ..state
        },
        (S::Running, E::TimeUp) => {
            if state.segment_index + 1 >= segment_count {
                MachineState {
                    status: S::Finished,
                    is_done: true,
                    ..state
                }
            } else {
                MachineState {
                    status: S::SegmentTransition,
                    ..state
                }
            }
        }
        (S::SegmentTransition, E::NextSegment) => {
            let next = state.segment_index + 1;
            if next >= segment_count {
                MachineState {
                    status: S::Finished,
                    is_done: true,
                    ..state
                }
            } else {
                MachineState {
                    status: S::Idle,
                    segment_index: next,
                    is_done: false,
                }
            }
        }
        (S::Idle | S::Running | S::Paused | S::SegmentTransition, E::ResetSegment) => MachineState {
            status: S::Idle,
            ..state
        },
        (_, E::ResetSession) => MachineState {
            status: S::Idle,
            segment_index: 0,
            is_done: false,
        },
        (_, E::Load(snapshot)) => MachineState {
            status: snapshot.status,
            segment_index: snapshot.segment_index,
            is_done: snapshot.is_done,
        },
        _ => state,
    }
}

/// Imperative shell owning the session snapshot and the time engine.
#[derive(Debug)]
pub struct SessionMachine {
    snapshot: SessionSnapshot,
    engine: TimeEngine,
    /// When set, a NEXT_SEGMENT landing on a break segment is started
    /// automatically; focus segments always wait for an explicit START.
    auto_start_breaks: bool,
}

impl SessionMachine {
    pub fn new(snapshot: SessionSnapshot, auto_start_breaks: bool) -> Self {
        Self {
            snapshot,
            engine: TimeEngine::new(),
            auto_start_breaks,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn snapshot(&self) -> &SessionSnapshot {
        &self.snapshot
    }

    pub fn into_snapshot(self) -> SessionSnapshot {
        self.snapshot
    }

    pub fn status(&self) -> SessionStatus {
        self.snapshot.status
    }

    pub fn segment_index(&self) -> usize {
        self.snapshot.segment_index
    }

    pub fn is_done(&self) -> bool {
        self.snapshot.is_done
    }

    fn state(&self) -> MachineState {
        MachineState {
            status: self.snapshot.status,
            segment_index: self.snapshot.segment_index,
            is_done: self.snapshot.is_done,
        }
    }

    /// Remaining seconds for the current segment.
    pub fn remaining(&self, now: DateTime<Utc>) -> u64 {
        self.snapshot
            .current_segment()
            .map(|seg| TimeEngine::remaining(seg, self.snapshot.status, now))
            .unwrap_or(0)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Dispatch an event: run the pure transition, then apply side
    /// effects for the previous -> next status pair.
    pub fn dispatch(&mut self, event: SessionEvent, now: DateTime<Utc>) {
        if let SessionEvent::Load(snapshot) = event {
            self.snapshot = snapshot;
            self.engine.rearm();
            return;
        }

        let prev = self.state();
        let next = transition(prev, &event, self.snapshot.segments.len());

        if matches!(event, SessionEvent::ResetSession) {
            self.snapshot.segments = plan_segments(
                self.snapshot.total_duration,
                self.snapshot.break_duration,
                self.snapshot.max_breaks,
            );
            self.apply_state(next);
            self.engine.rearm();
            return;
        }

        if matches!(event, SessionEvent::ResetSegment) && next.status == SessionStatus::Idle {
            if let Some(seg) = self.snapshot.current_segment_mut() {
                seg.duration = 0;
                seg.start_timestamp = None;
                seg.completed_at = None;
            }
            self.apply_state(next);
            self.engine.rearm();
            return;
        }

        match (prev.status, next.status) {
            (SessionStatus::Idle, SessionStatus::Running)
            | (SessionStatus::Paused, SessionStatus::Running) => {
                if let Some(seg) = self.snapshot.current_segment_mut() {
                    self.engine.start(seg, now);
                }
            }
            (SessionStatus::Running, SessionStatus::Paused) => {
                if let Some(seg) = self.snapshot.current_segment_mut() {
                    self.engine.pause(seg, now);
                }
            }
            (SessionStatus::Running, SessionStatus::SegmentTransition)
            | (SessionStatus::Running, SessionStatus::Finished) => {
                // Freeze the exhausted segment.
                if let Some(seg) = self.snapshot.current_segment_mut() {
                    self.engine.pause(seg, now);
                    seg.completed_at = Some(now);
                }
            }
            (SessionStatus::SegmentTransition, SessionStatus::Idle) => {
                // Advancing: the incoming segment starts from a clean slate.
                if let Some(seg) = self.snapshot.segments.get_mut(next.segment_index) {
                    seg.duration = 0;
                    seg.start_timestamp = None;
                }
                self.engine.rearm();
            }
            _ => {}
        }

        self.apply_state(next);

        if matches!(event, SessionEvent::NextSegment)
            && self.auto_start_breaks
            && next.status == SessionStatus::Idle
            && self
                .snapshot
                .current_segment()
                .is_some_and(|seg| seg.kind == super::SegmentKind::Break)
        {
            self.dispatch(SessionEvent::Start, now);
        }
    }

    /// Host tick: re-reads remaining time and dispatches TIME_UP when
    /// the current segment's time is exhausted. Returns `true` when a
    /// transition happened.
    pub fn tick(&mut self, now: DateTime<Utc>) -> bool {
        let status = self.snapshot.status;
        let fired = match self.snapshot.current_segment() {
            Some(seg) => self.engine.tick(seg, status, now),
            None => false,
        };
        if fired {
            self.dispatch(SessionEvent::TimeUp, now);
        }
        fired
    }

    fn apply_state(&mut self, next: MachineState) {
        self.snapshot.status = next.status;
        self.snapshot.segment_index = next.segment_index;
        self.snapshot.is_done = next.is_done;
    }
}
