//! Adaptive daily-target retuning over a trailing window.
//!
//! Inspects the 5 most recent recorded days (within a 7-day lookback
//! for freeze usage) and moves the daily target by one 5-minute step,
//! clamped to the user's `[min, max]` range.

use serde::{Deserialize, Serialize};

use super::{DayState, StreakDay, TargetReason};
use crate::storage::UserStreak;

/// Adjustment step in minutes.
pub const TARGET_STEP_MINUTES: u32 = 5;

const LOOKBACK_DAYS: usize = 7;
const SAMPLE_DAYS: usize = 5;

/// Outcome of a retune pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetAdjustment {
    pub daily_target_minutes: u32,
    pub reason: TargetReason,
}

/// Retune the daily target from recent day records.
///
/// `recent` must be ordered most-recent-first. Returns `None` when
/// fewer than 5 days are recorded (no-op); otherwise always returns an
/// adjustment so the reason can be persisted even when unchanged.
pub fn retune(streak: &UserStreak, recent: &[StreakDay]) -> Option<TargetAdjustment> {
    if recent.len() < SAMPLE_DAYS {
        return None;
    }
    let window = &recent[..recent.len().min(LOOKBACK_DAYS)];
    let sample = &window[..SAMPLE_DAYS];

    let avg_rate = sample.iter().map(|d| d.streak_rate).sum::<f64>() / SAMPLE_DAYS as f64;
    let red_days = sample.iter().filter(|d| d.state == DayState::Red).count();
    let freeze_used: u32 = window.iter().map(|d| u32::from(d.used_freeze)).sum();

    let current = streak.daily_target_minutes;
    if avg_rate >= 1.1 && freeze_used == 0 && current < streak.max_target_minutes {
        Some(TargetAdjustment {
            daily_target_minutes: (current + TARGET_STEP_MINUTES).min(streak.max_target_minutes),
            reason: TargetReason::IncreaseConsistency,
        })
    } else if (red_days >= 2 || freeze_used >= 2) && current > streak.min_target_minutes {
        Some(TargetAdjustment {
            daily_target_minutes: current
                .saturating_sub(TARGET_STEP_MINUTES)
                .max(streak.min_target_minutes),
            reason: TargetReason::DecreaseBurnout,
        })
    } else {
        Some(TargetAdjustment {
            daily_target_minutes: current,
            reason: TargetReason::NoChange,
        })
    }
}
