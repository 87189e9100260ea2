//! Union of local occurrences and external events, with conflicts recomputed across both
//! sources.
//!
//! Conflicts are detected on the merged list rather than per source, so a local task that
//! overlaps an external meeting surfaces as a cross-source (`external`/`mix`) conflict.

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::conflict::{detect_conflicts, ConflictAnnotation};
use crate::model::{AgendaEvent, ExternalEvent, Occurrence};

/// Title shown for external events the provider returned without one.
pub const EXTERNAL_FALLBACK_TITLE: &str = "External event";

/// Rendering density hint derived from the number of conflicting events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Density {
    #[default]
    Comfortable,
    Compact,
}

/// An agenda event with its conflict annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedEvent {
    pub event: AgendaEvent,
    pub conflict: ConflictAnnotation,
    /// Conflict score capped for display.
    pub conflict_score: u32,
}

impl AnnotatedEvent {
    pub fn id(&self) -> &str {
        self.event.id()
    }

    pub fn display_title(&self) -> &str {
        match &self.event {
            AgendaEvent::External(e) if e.title.trim().is_empty() => EXTERNAL_FALLBACK_TITLE,
            event => event.title(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergedAgenda {
    /// Events of both sources, sorted by start.
    pub events: Vec<AnnotatedEvent>,
    /// Exact number of events with at least one conflict.
    pub conflict_count: usize,
    pub density: Density,
}

impl MergedAgenda {
    pub fn get(&self, event_id: &str) -> Option<&AnnotatedEvent> {
        self.events.iter().find(|e| e.id() == event_id)
    }
}

/// Merge local occurrences with external events and annotate conflicts on the union.
///
/// The sort is stable and local events are placed first, so at equal start times a local
/// occurrence precedes an external event. External events with `end <= start` cannot be
/// placed on a timeline and are dropped.
pub fn merge_agenda(
    occurrences: &[Occurrence],
    externals: &[ExternalEvent],
    config: &EngineConfig,
) -> MergedAgenda {
    let mut events: Vec<AgendaEvent> =
        Vec::with_capacity(occurrences.len() + externals.len());
    events.extend(occurrences.iter().cloned().map(AgendaEvent::Local));
    events.extend(
        externals
            .iter()
            .filter(|e| {
                let valid = e.end > e.start;
                if !valid {
                    tracing::warn!(event_id = %e.id, "dropping external event with end <= start");
                }
                valid
            })
            .cloned()
            .map(AgendaEvent::External),
    );

    let merged = annotate(events, config);
    tracing::debug!(
        local = occurrences.len(),
        external = externals.len(),
        conflicts = merged.conflict_count,
        density = ?merged.density,
        "merged agenda"
    );
    merged
}

/// Annotate local occurrences only, without any external source.
pub fn annotate_local(occurrences: &[Occurrence], config: &EngineConfig) -> MergedAgenda {
    annotate(
        occurrences.iter().cloned().map(AgendaEvent::Local).collect(),
        config,
    )
}

fn annotate(mut events: Vec<AgendaEvent>, config: &EngineConfig) -> MergedAgenda {
    events.sort_by_key(|e| e.start());

    let report = detect_conflicts(&events);
    let conflict_count = report.conflicting_events();
    let density = if conflict_count >= config.compact_density_threshold {
        Density::Compact
    } else {
        Density::Comfortable
    };

    let events = events
        .into_iter()
        .zip(report.annotations)
        .map(|(event, conflict)| AnnotatedEvent {
            conflict_score: conflict.display_score(config.conflict_score_display_cap),
            event,
            conflict,
        })
        .collect();

    MergedAgenda {
        events,
        conflict_count,
        density,
    }
}
