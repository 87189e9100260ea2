//! Tests for conflict detection and scoring.

mod support;

use agenda_engine::conflict::{detect_conflicts, ConflictSource};
use agenda_engine::{AgendaEvent, Priority};
use support::{at, external, local, occurrence};

fn local_at(id: &str, sh: u32, sm: u32, eh: u32, em: u32) -> AgendaEvent {
    local(occurrence(id, at(2024, 3, 1, sh, sm), at(2024, 3, 1, eh, em)))
}

fn external_at(id: &str, sh: u32, sm: u32, eh: u32, em: u32) -> AgendaEvent {
    AgendaEvent::External(external(id, at(2024, 3, 1, sh, sm), at(2024, 3, 1, eh, em)))
}

#[test]
fn overlapping_events_conflict() {
    // A [10:00,11:00) and B [10:30,11:30) → 30-minute overlap
    let events = vec![local_at("a", 10, 0, 11, 0), local_at("b", 10, 30, 11, 30)];
    let report = detect_conflicts(&events);

    assert_eq!(report.pairs.len(), 1, "should detect exactly one conflict");
    assert_eq!(report.pairs[0].overlap_minutes, 30);
    assert!(report.annotations.iter().all(|a| a.has_conflict));
}

#[test]
fn adjacent_events_do_not_conflict() {
    // A [10:00,11:00) and C [11:00,12:00) → touching, not overlapping
    let events = vec![local_at("a", 10, 0, 11, 0), local_at("c", 11, 0, 12, 0)];
    let report = detect_conflicts(&events);

    assert!(report.pairs.is_empty(), "adjacent events are not conflicts");
    assert_eq!(report.conflicting_events(), 0);
}

#[test]
fn contained_event_overlaps_for_its_full_length() {
    let events = vec![local_at("outer", 9, 0, 12, 0), local_at("inner", 10, 0, 10, 45)];
    let report = detect_conflicts(&events);
    assert_eq!(report.pairs[0].overlap_minutes, 45);
}

#[test]
fn sweep_reaches_past_a_short_event() {
    // Long event overlaps both followers even though the first follower ends early.
    let events = vec![
        local_at("long", 9, 0, 13, 0),
        local_at("short", 9, 30, 10, 0),
        local_at("late", 12, 0, 12, 30),
    ];
    let report = detect_conflicts(&events);

    let pairs: Vec<(usize, usize)> = report.pairs.iter().map(|p| (p.index_a, p.index_b)).collect();
    assert_eq!(pairs, vec![(0, 1), (0, 2)]);
    assert_eq!(report.conflicting_events(), 3);
}

#[test]
fn empty_and_single_inputs() {
    assert!(detect_conflicts(&[]).annotations.is_empty());
    let report = detect_conflicts(&[local_at("solo", 9, 0, 10, 0)]);
    assert_eq!(report.annotations.len(), 1);
    assert!(!report.annotations[0].has_conflict);
    assert_eq!(report.annotations[0].source, None);
}

// ── Scoring ──────────────────────────────────────────────────────────────────

#[test]
fn same_source_pair_scores_weight_plus_one() {
    let mut high = occurrence("high", at(2024, 3, 1, 10, 0), at(2024, 3, 1, 11, 0));
    high.priority = Priority::High;
    let events = vec![local(high), local_at("plain", 10, 30, 11, 30)];

    let report = detect_conflicts(&events);
    assert_eq!(report.annotations[0].score, 3 + 1, "high weighs 3");
    assert_eq!(report.annotations[1].score, 1 + 1, "unset priority weighs 1");
}

#[test]
fn cross_source_pair_scores_weight_plus_two() {
    let mut medium = occurrence("m", at(2024, 3, 1, 10, 0), at(2024, 3, 1, 11, 0));
    medium.priority = Priority::Medium;
    let events = vec![local(medium), external_at("x", 10, 30, 11, 30)];

    let report = detect_conflicts(&events);
    assert!(report.pairs[0].cross_source);
    assert_eq!(report.annotations[0].score, 2 + 2);
    assert_eq!(report.annotations[1].score, 1 + 2);
}

#[test]
fn scores_accumulate_per_pair() {
    let events = vec![
        local_at("a", 9, 0, 12, 0),
        local_at("b", 9, 30, 10, 30),
        local_at("c", 10, 0, 11, 0),
    ];
    let report = detect_conflicts(&events);
    assert_eq!(report.pairs.len(), 3);
    assert!(report.annotations.iter().all(|a| a.score == 4), "two pairs of 2 each");
}

#[test]
fn display_score_is_capped() {
    let events: Vec<AgendaEvent> = (0..6).map(|i| local_at(&format!("e{i}"), 9, i, 10, 0)).collect();
    let report = detect_conflicts(&events);
    assert_eq!(report.annotations[0].score, 10);
    assert_eq!(report.annotations[0].display_score(9), 9);
    assert_eq!(report.annotations[0].display_score(20), 10);
}

// ── Provenance ───────────────────────────────────────────────────────────────

#[test]
fn provenance_follows_partner_sources() {
    let events = vec![
        local_at("l1", 9, 0, 10, 0),
        local_at("l2", 9, 15, 9, 45),
        external_at("x1", 9, 30, 11, 0),
        external_at("x2", 10, 30, 11, 30),
    ];
    let report = detect_conflicts(&events);
    let sources: Vec<Option<ConflictSource>> = report.annotations.iter().map(|a| a.source).collect();

    assert_eq!(
        sources,
        vec![
            Some(ConflictSource::Mix),      // l2 and x1
            Some(ConflictSource::Mix),      // l1 and x1
            Some(ConflictSource::Mix),      // l1, l2 and x2
            Some(ConflictSource::External), // x1 only
        ]
    );
}

#[test]
fn local_only_overlap_is_local() {
    let events = vec![local_at("a", 9, 0, 10, 0), local_at("b", 9, 30, 10, 30)];
    let report = detect_conflicts(&events);
    assert!(report
        .annotations
        .iter()
        .all(|a| a.source == Some(ConflictSource::Local)));
}

#[test]
fn external_partner_of_local_is_external() {
    let events = vec![local_at("a", 9, 0, 10, 0), external_at("x", 9, 30, 10, 30)];
    let report = detect_conflicts(&events);
    assert_eq!(report.annotations[0].source, Some(ConflictSource::External));
    assert_eq!(report.annotations[1].source, Some(ConflictSource::Local));
}
