//! Interval primitives behind availability: merge busy periods, take the complement.
//!
//! Sorts intervals by start time, merges overlapping or adjacent busy periods, then
//! computes the gaps between merged periods within a given window.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A free time window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub duration_minutes: i64,
}

impl AvailabilitySlot {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            start,
            end,
            duration_minutes: (end - start).num_minutes(),
        }
    }
}

/// Merge overlapping or adjacent intervals, clipped to the given window.
///
/// Returns a sorted, non-overlapping list of (start, end) intervals. Intervals entirely
/// outside the window are discarded.
pub fn merge_busy_periods(
    intervals: impl IntoIterator<Item = (NaiveDateTime, NaiveDateTime)>,
    window_start: NaiveDateTime,
    window_end: NaiveDateTime,
) -> Vec<(NaiveDateTime, NaiveDateTime)> {
    let mut clipped: Vec<(NaiveDateTime, NaiveDateTime)> = intervals
        .into_iter()
        .filter(|&(start, end)| start < window_end && end > window_start)
        .map(|(start, end)| (start.max(window_start), end.min(window_end)))
        .filter(|&(start, end)| end > start)
        .collect();

    // Sort by start time (then by end time for stability).
    clipped.sort_unstable();

    let mut merged: Vec<(NaiveDateTime, NaiveDateTime)> = Vec::with_capacity(clipped.len());
    for (start, end) in clipped {
        if let Some(last) = merged.last_mut() {
            if start <= last.1 {
                // Overlapping or adjacent: extend the current interval.
                last.1 = last.1.max(end);
                continue;
            }
        }
        merged.push((start, end));
    }

    merged
}

/// Gaps of the window not covered by `merged` (as returned by [`merge_busy_periods`]).
///
/// Covers the leading gap, the gaps between busy periods and the trailing gap.
pub fn free_gaps(
    merged: &[(NaiveDateTime, NaiveDateTime)],
    window_start: NaiveDateTime,
    window_end: NaiveDateTime,
) -> Vec<AvailabilitySlot> {
    let mut gaps = Vec::new();
    let mut cursor = window_start;

    for &(busy_start, busy_end) in merged {
        if cursor < busy_start {
            gaps.push(AvailabilitySlot::new(cursor, busy_start));
        }
        cursor = cursor.max(busy_end);
    }

    if cursor < window_end {
        gaps.push(AvailabilitySlot::new(cursor, window_end));
    }

    gaps
}

/// Free slots of at least `min_minutes` within the window.
pub fn find_free_slots(
    intervals: impl IntoIterator<Item = (NaiveDateTime, NaiveDateTime)>,
    window_start: NaiveDateTime,
    window_end: NaiveDateTime,
    min_minutes: i64,
) -> Vec<AvailabilitySlot> {
    let merged = merge_busy_periods(intervals, window_start, window_end);
    free_gaps(&merged, window_start, window_end)
        .into_iter()
        .filter(|slot| slot.duration_minutes >= min_minutes)
        .collect()
}
