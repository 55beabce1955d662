//! Gap-aware daily streak processing.
//!
//! One call per contribution: classify the day, mutate the streak
//! counter / freeze balance from the day-over-day gap, and persist the
//! user fields and day record in a single transaction. A day already
//! recorded green is immutable -- later same-day calls return it
//! unchanged.

use chrono::NaiveDate;

use super::adaptive;
use super::{classify, DayState, StreakDay, StreakSummary};
use crate::error::{CoreError, Result, ValidationError};
use crate::storage::database::{upsert_streak_day, write_user_streak};
use crate::storage::Database;

/// Consecutive green days per earned freeze credit.
const FREEZE_EARN_CYCLE: u32 = 7;

/// Server-side streak engine over the persistent store.
pub struct StreakEngine<'a> {
    db: &'a Database,
}

impl<'a> StreakEngine<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Process a focus contribution for `date` (a UTC calendar day).
    ///
    /// `focus_seconds_delta` is floor-converted to minutes and added to
    /// any minutes already recorded for the day.
    ///
    /// # Errors
    /// `NotFound` if the user does not exist; `Database` on any
    /// persistence failure (nothing is committed partially).
    pub fn process_day(
        &self,
        user_id: &str,
        date: NaiveDate,
        focus_seconds_delta: u64,
    ) -> Result<StreakDay> {
        let mut user = self
            .db
            .get_user(user_id)?
            .ok_or_else(|| CoreError::NotFound(format!("user {user_id}")))?;

        let existing = self.db.get_streak_day(user_id, date)?;
        if let Some(day) = &existing {
            if day.state == DayState::Green {
                // A day that already met target cannot be downgraded.
                return Ok(day.clone());
            }
        }

        let minutes_delta = (focus_seconds_delta / 60) as u32;
        let prior_minutes = existing.as_ref().map(|d| d.focus_minutes).unwrap_or(0);
        let focus_minutes = prior_minutes + minutes_delta;

        let target = user.streak.daily_target_minutes.max(1);
        let rate = f64::from(focus_minutes) / f64::from(target);
        let state = classify(rate);
        // An earlier same-day call may already have spent a freeze;
        // that is never refunded.
        let mut used_freeze = existing.as_ref().map(|d| d.used_freeze).unwrap_or(0);

        let gap = user
            .streak
            .last_processed_date
            .map(|last| (date - last).num_days());

        match gap {
            None => {
                user.streak.daily_streak = if state == DayState::Green { 1 } else { 0 };
            }
            Some(1) => match state {
                DayState::Green => {
                    user.streak.daily_streak += 1;
                    if user.streak.daily_streak % FREEZE_EARN_CYCLE == 0
                        && user.streak.freeze_balance < user.streak.max_freeze_balance
                    {
                        user.streak.freeze_balance += 1;
                    }
                }
                DayState::Yellow => {
                    // Streak protected but not extended.
                }
                DayState::Red => {
                    if user.streak.freeze_balance > 0 {
                        user.streak.freeze_balance -= 1;
                        used_freeze = 1;
                    } else {
                        user.streak.daily_streak = 0;
                    }
                }
            },
            Some(g) if g > 1 => {
                // Missed day(s): the gap forfeits freeze protection.
                user.streak.daily_streak = if state == DayState::Green { 1 } else { 0 };
            }
            // Same-day re-processing (or an out-of-order older date):
            // minutes and state update, streak and freezes do not.
            Some(_) => {}
        }

        if gap.map_or(true, |g| g >= 0) {
            user.streak.last_processed_date = Some(date);
        }

        let day = StreakDay {
            user_id: user_id.to_string(),
            date,
            focus_minutes,
            daily_target_minutes: target,
            streak_rate: rate,
            state,
            used_freeze,
        };

        let tx = self.db.conn().unchecked_transaction()?;
        write_user_streak(&tx, user_id, &user.streak)?;
        upsert_streak_day(&tx, &day)?;
        tx.commit()?;

        Ok(day)
    }

    /// Retune the daily target from the trailing window of day records.
    /// No-op (and no write) while fewer than 5 days are recorded.
    pub fn retune_target(&self, user_id: &str) -> Result<Option<adaptive::TargetAdjustment>> {
        let mut user = self
            .db
            .get_user(user_id)?
            .ok_or_else(|| CoreError::NotFound(format!("user {user_id}")))?;

        let recent = self.db.recent_streak_days(user_id, 7)?;
        let Some(adjustment) = adaptive::retune(&user.streak, &recent) else {
            return Ok(None);
        };

        user.streak.daily_target_minutes = adjustment.daily_target_minutes;
        user.streak.last_target_reason = adjustment.reason;
        self.db.update_user_streak(user_id, &user.streak)?;
        Ok(Some(adjustment))
    }

    /// Merge `User.streak` with today's day projection. Read-only: an
    /// absent day is projected as a zero-minute red day without being
    /// persisted.
    pub fn summary(&self, user_id: &str, today: NaiveDate) -> Result<StreakSummary> {
        let user = self
            .db
            .get_user(user_id)?
            .ok_or_else(|| CoreError::NotFound(format!("user {user_id}")))?;

        let target = user.streak.daily_target_minutes.max(1);
        let day = self.db.get_streak_day(user_id, today)?.unwrap_or(StreakDay {
            user_id: user_id.to_string(),
            date: today,
            focus_minutes: 0,
            daily_target_minutes: target,
            streak_rate: 0.0,
            state: DayState::Red,
            used_freeze: 0,
        });

        Ok(StreakSummary {
            daily_streak: user.streak.daily_streak,
            freeze_balance: user.streak.freeze_balance,
            max_freeze_balance: user.streak.max_freeze_balance,
            min_target_minutes: user.streak.min_target_minutes,
            max_target_minutes: user.streak.max_target_minutes,
            last_processed_date: user.streak.last_processed_date,
            last_target_reason: user.streak.last_target_reason,
            daily_target_minutes: day.daily_target_minutes,
            focus_minutes: day.focus_minutes,
            state: day.state,
            freeze_used: day.used_freeze,
            streak_rate: day.streak_rate,
        })
    }

    /// Ordered day records for one calendar month.
    pub fn monthly(&self, user_id: &str, year: i32, month: u32) -> Result<Vec<StreakDay>> {
        let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
            ValidationError::InvalidValue {
                field: "month".into(),
                message: format!("{year}-{month} is not a calendar month"),
            }
        })?;
        let end = start
            .checked_add_months(chrono::Months::new(1))
            .ok_or_else(|| ValidationError::InvalidValue {
                field: "month".into(),
                message: "month out of range".into(),
            })?;
        self.db.streak_days_between(user_id, start, end)
    }
}
