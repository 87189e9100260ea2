//! Per-day availability for the planning view.
//!
//! For each day of the planning window (today or later), busy time inside the working day
//! is merged across both event sources and the remaining gaps long enough to plan
//! something in become availability slots.
//!
//! Also groups the agenda into per-day planning sections.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::datetime::{date_key, inclusive_last_day, midnight};
use crate::freebusy::{free_gaps, merge_busy_periods, AvailabilitySlot};
use crate::merger::AnnotatedEvent;
use crate::model::{AgendaEvent, DateRange, EventSource};

/// A merged busy block inside a working day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyBlock {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// Number of distinct sources (local, external) with an event in this block.
    pub source_count: usize,
}

impl BusyBlock {
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

/// Availability of a single day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayAvailability {
    pub date: NaiveDate,
    pub window_start: NaiveDateTime,
    pub window_end: NaiveDateTime,
    /// Merged busy blocks, sorted and non-overlapping.
    pub busy: Vec<BusyBlock>,
    /// Every free gap, whatever its length.
    pub gaps: Vec<AvailabilitySlot>,
    /// Gaps at least `min_slot` long, capped at `max_slots_per_day`, in chronological order.
    pub slots: Vec<AvailabilitySlot>,
}

/// Busy interval an event occupies inside `[window_start, window_end)` on `day`.
///
/// All-day events covering the day occupy the whole working window.
fn busy_interval(
    event: &AgendaEvent,
    day: NaiveDate,
    window_start: NaiveDateTime,
    window_end: NaiveDateTime,
) -> Option<(NaiveDateTime, NaiveDateTime)> {
    if event.all_day() {
        let day_start = midnight(day);
        let day_end = day_start + Duration::days(1);
        return (event.start() < day_end && event.end() > day_start)
            .then_some((window_start, window_end));
    }

    let start = event.start().max(window_start);
    let end = event.end().min(window_end);
    (end > start).then_some((start, end))
}

/// Compute the availability of one day from the events of both sources.
pub fn day_availability<'a>(
    events: impl IntoIterator<Item = &'a AgendaEvent>,
    day: NaiveDate,
    config: &EngineConfig,
) -> DayAvailability {
    let window_start = day.and_time(config.working_day_start);
    let window_end = day.and_time(config.working_day_end);

    let occupied: Vec<(NaiveDateTime, NaiveDateTime, EventSource)> = events
        .into_iter()
        .filter_map(|event| {
            busy_interval(event, day, window_start, window_end)
                .map(|(start, end)| (start, end, event.source()))
        })
        .collect();

    let merged = merge_busy_periods(
        occupied.iter().map(|&(start, end, _)| (start, end)),
        window_start,
        window_end,
    );

    let busy = merged
        .iter()
        .map(|&(start, end)| {
            let contributes = |source: EventSource| {
                occupied
                    .iter()
                    .any(|&(s, e, src)| src == source && s < end && e > start)
            };
            let source_count = [EventSource::Local, EventSource::External]
                .into_iter()
                .filter(|&source| contributes(source))
                .count();
            BusyBlock {
                start,
                end,
                source_count,
            }
        })
        .collect();

    let gaps = free_gaps(&merged, window_start, window_end);
    let min_slot = Duration::minutes(config.min_slot.minutes());
    let slots = gaps
        .iter()
        .filter(|gap| gap.end - gap.start >= min_slot)
        .take(config.max_slots_per_day)
        .cloned()
        .collect();

    DayAvailability {
        date: day,
        window_start,
        window_end,
        busy,
        gaps,
        slots,
    }
}

/// Availability of every day of `window` from `today` onwards, keyed by day.
pub fn compute_availability<'a>(
    events: impl IntoIterator<Item = &'a AgendaEvent>,
    window: DateRange,
    today: NaiveDate,
    config: &EngineConfig,
) -> BTreeMap<NaiveDate, DayAvailability> {
    let mut output = BTreeMap::new();
    if window.is_empty() {
        return output;
    }

    let events: Vec<&AgendaEvent> = events.into_iter().collect();
    let first_day = window.start.date().max(today);
    let last_day = inclusive_last_day(window.end);

    for day in first_day.iter_days().take_while(|d| *d <= last_day) {
        let day_start = midnight(day);
        let day_end = day_start + Duration::days(1);
        let day_events = events
            .iter()
            .copied()
            .filter(|e| e.start() < day_end && e.end() > day_start);
        output.insert(day, day_availability(day_events, day, config));
    }

    tracing::debug!(days = output.len(), "computed availability");
    output
}

/// Events of one day in the planning list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningSection {
    pub date_key: String,
    pub events: Vec<AnnotatedEvent>,
}

/// Group events by the date-key of their start, days ascending, events sorted by start.
///
/// With a planning window, only events overlapping it are kept; an event whose end is not
/// after its start counts as lasting one second.
pub fn planning_sections(
    events: &[AnnotatedEvent],
    window: Option<DateRange>,
) -> Vec<PlanningSection> {
    let mut grouped: BTreeMap<String, Vec<AnnotatedEvent>> = BTreeMap::new();

    for annotated in events {
        let start = annotated.event.start();
        let end = annotated.event.end().max(start + Duration::seconds(1));
        if let Some(window) = window.filter(|w| !w.is_empty()) {
            if !window.overlaps(start, end) {
                continue;
            }
        }
        grouped
            .entry(date_key(start))
            .or_default()
            .push(annotated.clone());
    }

    grouped
        .into_iter()
        .map(|(date_key, mut events)| {
            events.sort_by_key(|e| e.event.start());
            PlanningSection { date_key, events }
        })
        .collect()
}
