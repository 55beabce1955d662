//! Integration tests for the session store contract: upsert semantics,
//! the one-active-session invariant, and the completion roll-up.

use chrono::Utc;
use focusstreak_core::session::SessionSnapshot;
use focusstreak_core::storage::{Database, SavePayload, SessionStore, StoreStatus};
use focusstreak_core::streak::DayState;
use focusstreak_core::CoreError;

fn setup() -> Database {
    let db = Database::open_memory().unwrap();
    db.create_user("u-1", "tester").unwrap();
    db
}

fn payload(session_id: &str) -> SavePayload {
    let snapshot = SessionSnapshot::new(session_id, "deep work", 1500, 300, 4, Utc::now());
    SavePayload::from_snapshot(&snapshot)
}

#[test]
fn first_save_creates_later_saves_update() {
    let db = setup();
    let store = SessionStore::new(&db);
    let now = Utc::now();

    let first = store.save_session("u-1", &payload("s-1"), now).unwrap();
    assert!(first.created);
    assert_eq!(first.status_code(), 201);
    assert_eq!(first.session.status, StoreStatus::Active);

    let second = store.save_session("u-1", &payload("s-1"), now).unwrap();
    assert!(!second.created);
    assert_eq!(second.status_code(), 200);
}

#[test]
fn missing_ids_map_to_auth_and_validation_errors() {
    let db = setup();
    let store = SessionStore::new(&db);
    let now = Utc::now();

    let err = store.save_session("", &payload("s-1"), now).unwrap_err();
    assert_eq!(err.status_code(), 401);

    let err = store.save_session("u-1", &payload(""), now).unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
    assert_eq!(err.status_code(), 400);
}

#[test]
fn new_session_force_completes_other_active_sessions() {
    let db = setup();
    let store = SessionStore::new(&db);
    let now = Utc::now();

    store.save_session("u-1", &payload("s-1"), now).unwrap();
    store.save_session("u-1", &payload("s-2"), now).unwrap();

    let old = db.get_session("s-1", "u-1").unwrap().unwrap();
    assert_eq!(old.status, StoreStatus::Completed);
    assert!(old.ended_at.is_some());

    let active = store.get_active_session("u-1").unwrap().unwrap();
    assert_eq!(active.session_id, "s-2");
}

#[test]
fn updating_an_existing_session_leaves_it_active() {
    let db = setup();
    let store = SessionStore::new(&db);
    let now = Utc::now();

    store.save_session("u-1", &payload("s-1"), now).unwrap();
    // Re-saving the same id is an update, not a supersession.
    store.save_session("u-1", &payload("s-1"), now).unwrap();

    let session = db.get_session("s-1", "u-1").unwrap().unwrap();
    assert_eq!(session.status, StoreStatus::Active);
}

#[test]
fn duration_is_recomputed_from_segments() {
    let db = setup();
    let store = SessionStore::new(&db);
    let now = Utc::now();

    let mut p = payload("s-1");
    p.session.segments[0].duration = 500;
    p.session.segments[1].duration = 120;

    let result = store.save_session("u-1", &p, now).unwrap();
    assert_eq!(result.session.duration, 620);
}

#[test]
fn completion_rolls_minutes_into_the_streak_engine() {
    let db = setup();
    let store = SessionStore::new(&db);
    let now = Utc::now();

    let mut p = payload("s-1");
    for seg in &mut p.session.segments {
        seg.duration = seg.total_duration;
    }
    p.session.is_done = true;

    let result = store.save_session("u-1", &p, now).unwrap();
    assert_eq!(result.session.status, StoreStatus::Completed);
    assert!(result.session.ended_at.is_some());

    // 1500 + 600 accumulated seconds -> 35 minutes against a 25-minute
    // target: green, streak started.
    let day = db
        .get_streak_day("u-1", now.date_naive())
        .unwrap()
        .unwrap();
    assert_eq!(day.focus_minutes, 35);
    assert_eq!(day.state, DayState::Green);
    let user = db.get_user("u-1").unwrap().unwrap();
    assert_eq!(user.streak.daily_streak, 1);
}

#[test]
fn resaving_a_completed_session_credits_minutes_only_once() {
    let db = setup();
    let store = SessionStore::new(&db);
    let now = Utc::now();

    // A finished 10-minute session, checkpointed again after the fact
    // (as a host does when the machine stays in `finished`).
    let mut p = payload("s-1");
    p.session.segments.truncate(1);
    p.session.segments[0].duration = 600;
    p.session.is_done = true;

    store.save_session("u-1", &p, now).unwrap();
    store.save_session("u-1", &p, now).unwrap();

    let day = db
        .get_streak_day("u-1", now.date_naive())
        .unwrap()
        .unwrap();
    assert_eq!(day.focus_minutes, 10);
    // 10/25 stays red; the re-save must not inflate it toward green.
    assert_eq!(day.state, DayState::Red);
    let user = db.get_user("u-1").unwrap().unwrap();
    assert_eq!(user.streak.daily_streak, 0);
}

#[test]
fn incomplete_save_does_not_touch_the_streak() {
    let db = setup();
    let store = SessionStore::new(&db);
    let now = Utc::now();

    let mut p = payload("s-1");
    p.session.segments[0].duration = 400;
    store.save_session("u-1", &p, now).unwrap();

    assert!(db.get_streak_day("u-1", now.date_naive()).unwrap().is_none());
}

#[test]
fn completing_for_an_unknown_user_surfaces_not_found() {
    let db = Database::open_memory().unwrap();
    let store = SessionStore::new(&db);
    let mut p = payload("s-1");
    p.session.is_done = true;

    let err = store.save_session("ghost", &p, Utc::now()).unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
}

#[test]
fn get_active_session_is_empty_without_one() {
    let db = setup();
    let store = SessionStore::new(&db);
    assert!(store.get_active_session("u-1").unwrap().is_none());
}

#[test]
fn save_payload_parses_the_documented_wire_shape() {
    // The request `session` object omits sessionId and status.
    let body = r#"{
        "sessionId": "s-9",
        "session": {
            "title": "evening",
            "timestamp": "2025-06-01T18:00:00Z",
            "isDone": false,
            "segmentIndex": 0,
            "segments": [
                {"type": "focus", "totalDuration": 500, "duration": 0,
                 "startTimestamp": null, "completedAt": null}
            ],
            "totalDuration": 1500,
            "breakDuration": 300,
            "maxBreaks": 4
        },
        "userSettings": {"autoStartBreaks": true},
        "history": []
    }"#;
    let payload: SavePayload = serde_json::from_str(body).unwrap();
    assert_eq!(payload.session_id, "s-9");
    assert_eq!(payload.session.segments.len(), 1);
    assert!(!payload.session.is_done);

    let db = setup();
    let store = SessionStore::new(&db);
    let result = store.save_session("u-1", &payload, Utc::now()).unwrap();
    assert!(result.created);
}
