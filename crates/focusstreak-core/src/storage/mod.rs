mod config;
pub mod database;
pub mod migrations;
pub mod session_store;

pub use config::{Config, SessionConfig};
pub use database::{Database, StoreStatus, StoredSession, User, UserStreak};
pub use session_store::{SavePayload, SaveResult, SessionStore};

use std::path::PathBuf;

/// Returns `~/.config/focusstreak[-dev]/` based on FOCUSSTREAK_ENV.
///
/// Set FOCUSSTREAK_ENV=dev to use a development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("FOCUSSTREAK_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("focusstreak-dev")
    } else {
        base_dir.join("focusstreak")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
