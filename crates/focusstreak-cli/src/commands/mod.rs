pub mod config;
pub mod session;
pub mod streak;

use focusstreak_core::storage::Database;

/// The CLI runs single-user; the default user is created on first use.
pub const LOCAL_USER: &str = "local";

pub fn ensure_local_user(db: &Database) -> Result<(), Box<dyn std::error::Error>> {
    if db.get_user(LOCAL_USER)?.is_none() {
        db.create_user(LOCAL_USER, "local")?;
    }
    Ok(())
}
