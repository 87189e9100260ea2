//! Detect and score overlapping events in a chronologically sorted agenda.
//!
//! Uses a sorted sweep: for each event, later events are scanned only while they start
//! before it ends. Adjacent events (where one ends exactly when another starts) are NOT
//! conflicts.

use serde::{Deserialize, Serialize};

use crate::model::{AgendaEvent, EventSource};

/// Which sources an event's conflicting partners come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictSource {
    Local,
    External,
    Mix,
}

/// Per-event conflict summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConflictAnnotation {
    pub has_conflict: bool,
    pub source: Option<ConflictSource>,
    /// Uncapped weighted score.
    pub score: u32,
}

impl ConflictAnnotation {
    pub fn display_score(&self, cap: u32) -> u32 {
        self.score.min(cap)
    }

    fn record(&mut self, own: &AgendaEvent, partner: EventSource, cross_source: bool) {
        self.has_conflict = true;
        self.source = Some(match (self.source, partner) {
            (None, EventSource::Local) => ConflictSource::Local,
            (None, EventSource::External) => ConflictSource::External,
            (Some(ConflictSource::Local), EventSource::Local) => ConflictSource::Local,
            (Some(ConflictSource::External), EventSource::External) => ConflictSource::External,
            _ => ConflictSource::Mix,
        });
        self.score += own.priority().conflict_weight() + if cross_source { 2 } else { 1 };
    }
}

/// A detected overlap between two events, by index into the swept slice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub index_a: usize,
    pub index_b: usize,
    pub overlap_minutes: i64,
    pub cross_source: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictReport {
    /// One annotation per input event, index-aligned with the input.
    pub annotations: Vec<ConflictAnnotation>,
    pub pairs: Vec<Conflict>,
}

impl ConflictReport {
    /// Number of events involved in at least one conflict.
    pub fn conflicting_events(&self) -> usize {
        self.annotations.iter().filter(|a| a.has_conflict).count()
    }
}

/// Find every overlapping pair in `events`, which must be sorted by start.
///
/// Two events `a` (earlier) and `b` overlap iff `b.start < a.end`. Each pair adds
/// `priority weight + (2 if cross-source else 1)` to the score of both participants.
/// Worst case is quadratic, but only when most events overlap each other.
pub fn detect_conflicts(events: &[AgendaEvent]) -> ConflictReport {
    debug_assert!(
        events.windows(2).all(|w| w[0].start() <= w[1].start()),
        "detect_conflicts requires events sorted by start"
    );

    let mut annotations = vec![ConflictAnnotation::default(); events.len()];
    let mut pairs = Vec::new();

    for (i, left) in events.iter().enumerate() {
        for (offset, right) in events[i + 1..].iter().enumerate() {
            // Sorted order: nothing after this one can start before `left` ends.
            if right.start() >= left.end() {
                break;
            }
            let j = i + 1 + offset;
            let cross_source = left.source() != right.source();

            annotations[i].record(left, right.source(), cross_source);
            annotations[j].record(right, left.source(), cross_source);

            let overlap_end = left.end().min(right.end());
            pairs.push(Conflict {
                index_a: i,
                index_b: j,
                overlap_minutes: (overlap_end - right.start()).num_minutes(),
                cross_source,
            });
        }
    }

    ConflictReport { annotations, pairs }
}
