//! Daily streak and commitment engines.
//!
//! Converts accumulated focus minutes into a tri-state daily outcome,
//! maintains the consecutive-day streak with a freeze-credit economy
//! ([`engine`]), and retunes the daily target over a trailing window
//! ([`adaptive`]).

pub mod adaptive;
mod engine;

pub use adaptive::{retune, TargetAdjustment};
pub use engine::StreakEngine;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Green: target met. Yellow: close enough to protect the streak
/// without extending it. Red: streak at risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayState {
    Green,
    Yellow,
    Red,
}

impl DayState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DayState::Green => "green",
            DayState::Yellow => "yellow",
            DayState::Red => "red",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "green" => Some(DayState::Green),
            "yellow" => Some(DayState::Yellow),
            "red" => Some(DayState::Red),
            _ => None,
        }
    }
}

/// Why the daily target last moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetReason {
    IncreaseConsistency,
    DecreaseBurnout,
    NoChange,
}

impl TargetReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetReason::IncreaseConsistency => "increase_consistency",
            TargetReason::DecreaseBurnout => "decrease_burnout",
            TargetReason::NoChange => "no_change",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "increase_consistency" => Some(TargetReason::IncreaseConsistency),
            "decrease_burnout" => Some(TargetReason::DecreaseBurnout),
            "no_change" => Some(TargetReason::NoChange),
            _ => None,
        }
    }
}

/// One immutable-per-day outcome record, unique per `(userId, date)`.
/// Dates are UTC calendar days, truncated at the call boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakDay {
    pub user_id: String,
    pub date: NaiveDate,
    pub focus_minutes: u32,
    pub daily_target_minutes: u32,
    /// `focus_minutes / daily_target_minutes`.
    pub streak_rate: f64,
    pub state: DayState,
    pub used_freeze: u8,
}

/// `User.streak` fields merged with the current day's projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakSummary {
    pub daily_streak: u32,
    pub freeze_balance: u32,
    pub max_freeze_balance: u32,
    pub min_target_minutes: u32,
    pub max_target_minutes: u32,
    pub last_processed_date: Option<NaiveDate>,
    pub last_target_reason: TargetReason,
    // Today's projection.
    pub daily_target_minutes: u32,
    pub focus_minutes: u32,
    pub state: DayState,
    pub freeze_used: u8,
    pub streak_rate: f64,
}

/// Rate at or above which a day is green.
pub const GREEN_THRESHOLD: f64 = 1.0;
/// Rate at or above which a day is yellow.
pub const YELLOW_THRESHOLD: f64 = 0.7;

/// Classify a streak rate into the tri-state outcome.
pub fn classify(rate: f64) -> DayState {
    if rate >= GREEN_THRESHOLD {
        DayState::Green
    } else if rate >= YELLOW_THRESHOLD {
        DayState::Yellow
    } else {
        DayState::Red
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_thresholds() {
        assert_eq!(classify(1.0), DayState::Green);
        assert_eq!(classify(1.4), DayState::Green);
        assert_eq!(classify(0.7), DayState::Yellow);
        assert_eq!(classify(0.99), DayState::Yellow);
        assert_eq!(classify(0.69), DayState::Red);
        assert_eq!(classify(0.0), DayState::Red);
    }
}
