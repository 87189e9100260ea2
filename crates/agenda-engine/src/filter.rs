//! User-selected agenda filters, applied after conflicts have been computed.

use chrono::Timelike;
use serde::{Deserialize, Serialize};

use crate::merger::{AnnotatedEvent, MergedAgenda};
use crate::model::{AgendaEvent, Priority};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimeWindow {
    AllDay,
    /// Timed events starting before noon.
    Morning,
    /// Timed events starting between 12:00 and 18:00.
    Afternoon,
    /// Timed events starting at 18:00 or later.
    Evening,
}

impl TimeWindow {
    pub fn matches(self, event: &AgendaEvent) -> bool {
        let hour = event.start().hour();
        match self {
            TimeWindow::AllDay => event.all_day(),
            TimeWindow::Morning => !event.all_day() && hour < 12,
            TimeWindow::Afternoon => !event.all_day() && (12..18).contains(&hour),
            TimeWindow::Evening => !event.all_day() && hour >= 18,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgendaFilters {
    pub recurring_only: bool,
    pub conflicts_only: bool,
    pub priority: Option<Priority>,
    pub time_window: Option<TimeWindow>,
}

impl AgendaFilters {
    pub fn is_active(&self) -> bool {
        self.recurring_only
            || self.conflicts_only
            || self.priority.is_some()
            || self.time_window.is_some()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn matches(&self, annotated: &AnnotatedEvent) -> bool {
        let event = &annotated.event;
        if self.recurring_only
            && !event
                .as_local()
                .is_some_and(|o| o.recurrence.is_some())
        {
            return false;
        }
        if self.conflicts_only && !annotated.conflict.has_conflict {
            return false;
        }
        if let Some(priority) = self.priority {
            if event.as_local().map(|o| o.priority) != Some(priority) {
                return false;
            }
        }
        if let Some(window) = self.time_window {
            if !window.matches(event) {
                return false;
            }
        }
        true
    }

    /// Serialize for the caller's preference storage.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Restore persisted filters. An unreadable payload yields the defaults.
    pub fn restore(raw: &str) -> Self {
        serde_json::from_str(raw).unwrap_or_else(|err| {
            tracing::debug!(%err, "ignoring unreadable filter payload");
            Self::default()
        })
    }
}

/// Keep only the events matching `filters`.
///
/// `conflict_count` and `density` are left as computed on the unfiltered agenda: filters
/// change what is shown, not how contested the range is.
pub fn apply_filters(agenda: &MergedAgenda, filters: &AgendaFilters) -> MergedAgenda {
    MergedAgenda {
        events: agenda
            .events
            .iter()
            .filter(|e| filters.matches(e))
            .cloned()
            .collect(),
        conflict_count: agenda.conflict_count,
        density: agenda.density,
    }
}
