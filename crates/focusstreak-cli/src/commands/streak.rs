use chrono::{Datelike, Utc};
use clap::Subcommand;
use focusstreak_core::storage::Database;
use focusstreak_core::streak::StreakEngine;

use super::{ensure_local_user, LOCAL_USER};

#[derive(Subcommand)]
pub enum StreakAction {
    /// Credit focus minutes to today and retune the target
    ProcessToday {
        /// Focused minutes to credit
        #[arg(long)]
        minutes: u64,
    },
    /// Print the current streak summary as JSON
    Summary,
    /// Print one month of streak days as JSON
    Monthly {
        /// Year (defaults to the current year)
        #[arg(long)]
        year: Option<i32>,
        /// Month 1-12 (defaults to the current month)
        #[arg(long)]
        month: Option<u32>,
    },
}

pub fn run(action: StreakAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    ensure_local_user(&db)?;
    let engine = StreakEngine::new(&db);
    let today = Utc::now().date_naive();

    match action {
        StreakAction::ProcessToday { minutes } => {
            let day = engine.process_day(LOCAL_USER, today, minutes * 60)?;
            let adjustment = engine.retune_target(LOCAL_USER)?;
            let view = serde_json::json!({
                "success": true,
                "day": day,
                "targetAdjustment": adjustment,
            });
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        StreakAction::Summary => {
            let summary = engine.summary(LOCAL_USER, today)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        StreakAction::Monthly { year, month } => {
            let year = year.unwrap_or_else(|| today.year());
            let month = month.unwrap_or_else(|| today.month());
            let days = engine.monthly(LOCAL_USER, year, month)?;
            println!("{}", serde_json::to_string_pretty(&days)?);
        }
    }
    Ok(())
}
