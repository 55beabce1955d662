use clap::Subcommand;
use focusstreak_core::storage::Config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration as JSON
    Show,
    /// Update session settings
    Set {
        /// Total focus minutes per session
        #[arg(long)]
        focus_minutes: Option<u64>,
        /// Break length in minutes
        #[arg(long)]
        break_minutes: Option<u64>,
        /// Maximum number of breaks per session
        #[arg(long)]
        max_breaks: Option<u32>,
        /// Start break segments automatically
        #[arg(long)]
        auto_start_breaks: Option<bool>,
    },
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Show => {
            let config = Config::load()?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigAction::Set {
            focus_minutes,
            break_minutes,
            max_breaks,
            auto_start_breaks,
        } => {
            let mut config = Config::load()?;
            if let Some(m) = focus_minutes {
                config.session.total_focus_duration = m * 60;
            }
            if let Some(m) = break_minutes {
                config.session.break_duration = m * 60;
            }
            if let Some(n) = max_breaks {
                config.session.max_breaks = n;
            }
            if let Some(b) = auto_start_breaks {
                config.session.auto_start_breaks = b;
            }
            config.save()?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }
    Ok(())
}
