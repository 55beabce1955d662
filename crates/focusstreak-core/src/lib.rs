//! # Focusstreak Core Library
//!
//! This library provides the core business logic for Focusstreak, a
//! personal study-session tracker. It implements a CLI-first philosophy
//! where all operations are available via a standalone CLI binary; any
//! GUI or web layer is a thin shell over the same core library.
//!
//! ## Architecture
//!
//! - **Session Engine**: A wall-clock-based segment state machine. The
//!   caller drives it with a periodic `tick()`; remaining time is always
//!   recomputed from timestamps, never counted down, so reloads and
//!   device sleep are self-correcting.
//! - **Autosave**: Debounced + periodic dirty-flag flush of the session
//!   snapshot, with at most one save in flight.
//! - **Streak Engine**: Daily aggregation that classifies accumulated
//!   focus minutes into a green/yellow/red outcome, maintains the
//!   consecutive-day streak with a freeze-credit economy, and retunes
//!   the daily target adaptively.
//! - **Storage**: SQLite-based session/streak persistence and TOML-based
//!   configuration.
//!
//! ## Key Components
//!
//! - [`SessionMachine`]: Session status state machine
//! - [`TimeEngine`]: Timestamp-based remaining-time computation
//! - [`AutosaveCoordinator`]: Dirty-flag save scheduling
//! - [`SessionStore`]: Server-side session upsert contract
//! - [`StreakEngine`]: Daily streak classification and freeze economy
//! - [`Database`]: Session, user, and streak-day persistence

pub mod error;
pub mod session;
pub mod storage;
pub mod streak;

pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use session::{
    plan_segments, AutosaveCoordinator, SaveStatus, Segment, SegmentKind, SessionEvent,
    SessionMachine, SessionSnapshot, SessionStatus, TimeEngine,
};
pub use storage::{
    Config, Database, SavePayload, SaveResult, SessionStore, StoredSession, User, UserStreak,
};
pub use streak::{
    DayState, StreakDay, StreakEngine, StreakSummary, TargetAdjustment, TargetReason,
};
