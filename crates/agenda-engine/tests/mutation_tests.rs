//! Tests for pointer-driven move/resize.

mod support;

use std::cell::Cell;

use agenda_engine::mutation::{move_or_resize, MoveOutcome, MoveRequest, DETACHED_FALLBACK_TITLE};
use agenda_engine::{AgendaError, AgendaEvent, AgendaSession, EngineConfig};
use support::{at, external, occurrence, range, series_instance, Call, RecordingStore};

fn session() -> AgendaSession {
    AgendaSession::new(range(at(2024, 1, 1, 0, 0), at(2024, 2, 1, 0, 0)))
}

#[tokio::test]
async fn moving_a_bare_event_updates_it() {
    let store = RecordingStore::new();
    let mut s = session();
    let reverted = Cell::new(false);
    let ev = AgendaEvent::Local(occurrence("one", at(2024, 1, 8, 10, 0), at(2024, 1, 8, 11, 0)));

    let outcome = move_or_resize(
        &mut s,
        &store,
        MoveRequest {
            event: &ev,
            start: at(2024, 1, 9, 14, 0),
            end: Some(at(2024, 1, 9, 15, 30)),
            all_day: false,
        },
        &EngineConfig::default(),
        || reverted.set(true),
    )
    .await
    .unwrap();

    assert_eq!(outcome, MoveOutcome::Updated { task_id: "one".to_string() });
    assert!(!reverted.get());
    let calls = store.calls();
    let [Call::Update(update)] = &calls[..] else {
        panic!("expected one update");
    };
    assert_eq!(update.start, at(2024, 1, 9, 14, 0));
    assert_eq!(update.end, at(2024, 1, 9, 15, 30));
    assert_eq!(update.title, None, "moving never renames");
}

#[tokio::test]
async fn moving_a_series_instance_detaches_it() {
    let store = RecordingStore::new();
    let mut s = session();
    let ev = AgendaEvent::Local(series_instance("weekly", at(2024, 1, 15, 10, 0), at(2024, 1, 15, 11, 0)));

    let outcome = move_or_resize(
        &mut s,
        &store,
        MoveRequest {
            event: &ev,
            start: at(2024, 1, 16, 10, 0),
            end: Some(at(2024, 1, 16, 11, 0)),
            all_day: false,
        },
        &EngineConfig::default(),
        || {},
    )
    .await
    .unwrap();

    assert_eq!(
        outcome,
        MoveOutcome::Detached {
            task_id: "weekly".to_string(),
            instance_date: "2024-01-15".to_string(),
        }
    );
    let calls = store.calls();
    assert!(matches!(&calls[0], Call::Skip { date_key, .. } if date_key == "2024-01-15"));
    assert!(matches!(&calls[1], Call::Create(e) if e.recurrence.is_none() && e.start == at(2024, 1, 16, 10, 0)));
}

#[tokio::test]
async fn untitled_detached_occurrence_gets_fallback_title() {
    let store = RecordingStore::new();
    let mut s = session();
    let mut instance = series_instance("weekly", at(2024, 1, 15, 10, 0), at(2024, 1, 15, 11, 0));
    instance.title = String::new();
    let ev = AgendaEvent::Local(instance);

    move_or_resize(
        &mut s,
        &store,
        MoveRequest {
            event: &ev,
            start: at(2024, 1, 15, 12, 0),
            end: Some(at(2024, 1, 15, 13, 0)),
            all_day: false,
        },
        &EngineConfig::default(),
        || {},
    )
    .await
    .unwrap();

    assert_eq!(store.created()[0].title, DETACHED_FALLBACK_TITLE);
}

#[tokio::test]
async fn missing_end_is_derived() {
    let store = RecordingStore::new();
    let mut s = session();
    let ev = AgendaEvent::Local(occurrence("one", at(2024, 1, 8, 10, 0), at(2024, 1, 8, 11, 0)));

    move_or_resize(
        &mut s,
        &store,
        MoveRequest {
            event: &ev,
            start: at(2024, 1, 9, 0, 0),
            end: None,
            all_day: true,
        },
        &EngineConfig::default(),
        || {},
    )
    .await
    .unwrap();
    move_or_resize(
        &mut s,
        &store,
        MoveRequest {
            event: &ev,
            start: at(2024, 1, 9, 9, 0),
            end: None,
            all_day: false,
        },
        &EngineConfig::default(),
        || {},
    )
    .await
    .unwrap();

    let ends: Vec<_> = store
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::Update(u) => Some((u.all_day, u.end)),
            _ => None,
        })
        .collect();
    assert_eq!(
        ends,
        vec![(true, at(2024, 1, 10, 0, 0)), (false, at(2024, 1, 9, 10, 0))]
    );
}

#[tokio::test]
async fn external_event_is_reverted_and_refused() {
    let store = RecordingStore::new();
    let mut s = session();
    let reverted = Cell::new(false);
    let ev = AgendaEvent::External(external("x", at(2024, 1, 8, 10, 0), at(2024, 1, 8, 11, 0)));

    let err = move_or_resize(
        &mut s,
        &store,
        MoveRequest {
            event: &ev,
            start: at(2024, 1, 9, 10, 0),
            end: None,
            all_day: false,
        },
        &EngineConfig::default(),
        || reverted.set(true),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AgendaError::ReadOnlyEvent(ref id) if id == "x"));
    assert!(reverted.get());
    assert!(store.calls().is_empty());
    assert!(s.error().is_some());
}

#[tokio::test]
async fn store_failure_reverts_and_surfaces() {
    let store = RecordingStore {
        fail_update: true,
        ..RecordingStore::default()
    };
    let mut s = session();
    let reverted = Cell::new(false);
    let ev = AgendaEvent::Local(occurrence("one", at(2024, 1, 8, 10, 0), at(2024, 1, 8, 11, 0)));

    let err = move_or_resize(
        &mut s,
        &store,
        MoveRequest {
            event: &ev,
            start: at(2024, 1, 9, 10, 0),
            end: Some(at(2024, 1, 9, 11, 0)),
            all_day: false,
        },
        &EngineConfig::default(),
        || reverted.set(true),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AgendaError::Persistence(_)));
    assert!(reverted.get(), "the calendar is put back where it was");
    assert!(!s.is_busy());
    assert_eq!(s.error(), Some("Persistence error: update rejected"));
}

#[tokio::test]
async fn failed_skip_leaves_series_untouched() {
    let store = RecordingStore {
        fail_skip: true,
        ..RecordingStore::default()
    };
    let mut s = session();
    let reverted = Cell::new(false);
    let ev = AgendaEvent::Local(series_instance("weekly", at(2024, 1, 15, 10, 0), at(2024, 1, 15, 11, 0)));

    let err = move_or_resize(
        &mut s,
        &store,
        MoveRequest {
            event: &ev,
            start: at(2024, 1, 15, 12, 0),
            end: None,
            all_day: false,
        },
        &EngineConfig::default(),
        || reverted.set(true),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AgendaError::Persistence(_)));
    assert!(reverted.get());
    assert!(store.calls().is_empty(), "no replacement after a failed skip");
}

#[tokio::test]
async fn default_end_past_the_calendar_is_reverted() {
    let store = RecordingStore::new();
    let mut s = session();
    let reverted = Cell::new(false);
    let ev = AgendaEvent::Local(occurrence("one", at(2024, 1, 8, 10, 0), at(2024, 1, 8, 11, 0)));

    let err = move_or_resize(
        &mut s,
        &store,
        MoveRequest {
            event: &ev,
            start: chrono::NaiveDateTime::MAX,
            end: None,
            all_day: false,
        },
        &EngineConfig::default(),
        || reverted.set(true),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AgendaError::DateOutOfRange(_)));
    assert!(reverted.get());
    assert!(!s.is_busy());
    assert!(store.calls().is_empty());
}
