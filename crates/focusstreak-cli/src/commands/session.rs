use chrono::Utc;
use clap::Subcommand;
use focusstreak_core::session::{
    AutosaveCoordinator, SaveStatus, SessionEvent, SessionMachine, SessionSnapshot,
};
use focusstreak_core::storage::{Config, Database, SavePayload, SessionStore};

use super::{ensure_local_user, LOCAL_USER};

const SNAPSHOT_KEY: &str = "current_session";

#[derive(Subcommand)]
pub enum SessionAction {
    /// Start the session (or resume the current segment)
    Start {
        /// Session title
        #[arg(long)]
        title: Option<String>,
    },
    /// Pause the running segment
    Pause,
    /// Resume a paused segment
    Resume,
    /// Advance past a finished segment
    Next,
    /// Restart the current segment
    ResetSegment,
    /// Reset the whole session to segment 0
    Reset,
    /// Print current session state as JSON
    Status,
}

fn load_snapshot(db: &Database) -> Result<Option<SessionSnapshot>, Box<dyn std::error::Error>> {
    match db.kv_get(SNAPSHOT_KEY)? {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}

fn new_machine(config: &Config, title: Option<String>) -> SessionMachine {
    let snapshot = SessionSnapshot::new(
        uuid::Uuid::new_v4().to_string(),
        title.unwrap_or_else(|| "Focus session".to_string()),
        config.session.total_focus_duration,
        config.session.break_duration,
        config.session.max_breaks,
        Utc::now(),
    );
    SessionMachine::new(snapshot, config.session.auto_start_breaks)
}

/// Explicit checkpoint: every CLI command is a deliberate user action,
/// so it bypasses the autosave timers via `force_save`.
fn checkpoint(db: &Database, machine: &SessionMachine) -> SaveStatus {
    let now = Utc::now();
    let mut autosave = AutosaveCoordinator::new(now);
    autosave.update_enabled(machine.status());
    autosave.mark_dirty(now);
    if autosave.force_save() {
        let store = SessionStore::new(db);
        let payload = SavePayload::from_snapshot(machine.snapshot());
        let ok = store.save_session(LOCAL_USER, &payload, now).is_ok();
        autosave.complete(ok);
    }
    autosave.status()
}

pub fn run(action: SessionAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    ensure_local_user(&db)?;
    let config = Config::load()?;
    let now = Utc::now();

    let mut machine = match load_snapshot(&db)? {
        Some(snapshot) => SessionMachine::new(snapshot, config.session.auto_start_breaks),
        None => new_machine(&config, None),
    };

    // Reconcile the persisted timestamps with the wall clock before
    // handling the command: a segment that ran out while this process
    // was not running transitions now.
    machine.tick(now);

    match action {
        SessionAction::Start { title } => {
            if machine.is_done() {
                machine = new_machine(&config, title);
            }
            machine.dispatch(SessionEvent::Start, now);
        }
        SessionAction::Pause => machine.dispatch(SessionEvent::Pause, now),
        SessionAction::Resume => machine.dispatch(SessionEvent::Resume, now),
        SessionAction::Next => machine.dispatch(SessionEvent::NextSegment, now),
        SessionAction::ResetSegment => machine.dispatch(SessionEvent::ResetSegment, now),
        SessionAction::Reset => machine.dispatch(SessionEvent::ResetSession, now),
        SessionAction::Status => {}
    }

    let save_status = checkpoint(&db, &machine);
    db.kv_set(SNAPSHOT_KEY, &serde_json::to_string(machine.snapshot())?)?;

    let snapshot = machine.snapshot();
    let view = serde_json::json!({
        "sessionId": snapshot.session_id,
        "title": snapshot.title,
        "status": snapshot.status,
        "segmentIndex": snapshot.segment_index,
        "segmentType": snapshot.current_segment().map(|s| s.kind),
        "remainingSecs": machine.remaining(Utc::now()),
        "isDone": snapshot.is_done,
        "saveStatus": save_status,
    });
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}
