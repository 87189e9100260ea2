//! Agenda data model: task definitions, derived occurrences, external events and the
//! tagged union the rest of the engine works on.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Task priority. `None` is the absence of a priority, not a missing field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    #[default]
    None,
}

impl Priority {
    /// Weight of this priority in conflict scoring.
    pub fn conflict_weight(self) -> u32 {
        match self {
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low | Priority::None => 1,
        }
    }

    /// `None` when the priority is unset, for ports that persist an optional field.
    pub fn as_option(self) -> Option<Priority> {
        match self {
            Priority::None => None,
            other => Some(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

/// Fixed-interval recurrence attached to a task definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    pub freq: Frequency,
    #[serde(default = "default_interval")]
    pub interval: u32,
    #[serde(default)]
    pub until: Option<NaiveDateTime>,
    /// Date-keys (`YYYY-MM-DD`) of skipped instances.
    #[serde(default)]
    pub exceptions: BTreeSet<String>,
}

fn default_interval() -> u32 {
    1
}

impl RecurrenceRule {
    pub fn new(freq: Frequency) -> Self {
        Self {
            freq,
            interval: 1,
            until: None,
            exceptions: BTreeSet::new(),
        }
    }

    pub fn with_interval(mut self, interval: u32) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_until(mut self, until: NaiveDateTime) -> Self {
        self.until = Some(until);
        self
    }

    pub fn with_exception(mut self, date_key: impl Into<String>) -> Self {
        self.exceptions.insert(date_key.into());
        self
    }

    pub fn is_exception(&self, date_key: &str) -> bool {
        self.exceptions.contains(date_key)
    }
}

/// A task as stored by the surrounding task feature.
///
/// `start`/`end` are optional because legacy tasks only carry a due instant, which the
/// expander then uses as the start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDefinition {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub start: Option<NaiveDateTime>,
    #[serde(default)]
    pub end: Option<NaiveDateTime>,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default)]
    pub recurrence: Option<RecurrenceRule>,
    #[serde(default)]
    pub workspace_id: Option<String>,
    #[serde(default)]
    pub priority: Priority,
}

impl TaskDefinition {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            start: Some(start),
            end: Some(end),
            all_day: false,
            recurrence: None,
            workspace_id: None,
            priority: Priority::None,
        }
    }

    pub fn with_recurrence(mut self, rule: RecurrenceRule) -> Self {
        self.recurrence = Some(rule);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_workspace(mut self, workspace_id: impl Into<String>) -> Self {
        self.workspace_id = Some(workspace_id.into());
        self
    }

    pub fn all_day(mut self) -> Self {
        self.all_day = true;
        self
    }
}

/// Half-open wall-clock range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// `true` when `[start, end)` shares at least one instant with this range.
    pub fn overlaps(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        end > self.start && start < self.end
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// One concrete instance of a local task inside the visible range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Occurrence {
    /// `task_id` for a one-off task, `task_id__<ISO start>` for a series instance.
    pub event_id: String,
    pub task_id: String,
    pub title: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub all_day: bool,
    /// Date-key of the instance; set only for occurrences derived from a series.
    pub instance_date: Option<String>,
    pub recurrence: Option<RecurrenceRule>,
    pub workspace_id: Option<String>,
    pub priority: Priority,
}

impl Occurrence {
    /// A dated instance of a recurring series, as opposed to a bare event.
    pub fn is_series_instance(&self) -> bool {
        self.instance_date.is_some() && self.recurrence.is_some()
    }
}

/// Read-only event fetched from the external calendar provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalEvent {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    #[serde(default)]
    pub all_day: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSource {
    Local,
    External,
}

/// An event of either source, resolved once when the agenda is merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum AgendaEvent {
    Local(Occurrence),
    External(ExternalEvent),
}

impl AgendaEvent {
    pub fn id(&self) -> &str {
        match self {
            AgendaEvent::Local(o) => &o.event_id,
            AgendaEvent::External(e) => &e.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            AgendaEvent::Local(o) => &o.title,
            AgendaEvent::External(e) => &e.title,
        }
    }

    pub fn start(&self) -> NaiveDateTime {
        match self {
            AgendaEvent::Local(o) => o.start,
            AgendaEvent::External(e) => e.start,
        }
    }

    pub fn end(&self) -> NaiveDateTime {
        match self {
            AgendaEvent::Local(o) => o.end,
            AgendaEvent::External(e) => e.end,
        }
    }

    pub fn all_day(&self) -> bool {
        match self {
            AgendaEvent::Local(o) => o.all_day,
            AgendaEvent::External(e) => e.all_day,
        }
    }

    pub fn source(&self) -> EventSource {
        match self {
            AgendaEvent::Local(_) => EventSource::Local,
            AgendaEvent::External(_) => EventSource::External,
        }
    }

    /// External events carry no priority and weigh like `Priority::None`.
    pub fn priority(&self) -> Priority {
        match self {
            AgendaEvent::Local(o) => o.priority,
            AgendaEvent::External(_) => Priority::None,
        }
    }

    pub fn as_local(&self) -> Option<&Occurrence> {
        match self {
            AgendaEvent::Local(o) => Some(o),
            AgendaEvent::External(_) => None,
        }
    }

    pub fn day(&self) -> NaiveDate {
        self.start().date()
    }
}

impl From<Occurrence> for AgendaEvent {
    fn from(o: Occurrence) -> Self {
        AgendaEvent::Local(o)
    }
}

impl From<ExternalEvent> for AgendaEvent {
    fn from(e: ExternalEvent) -> Self {
        AgendaEvent::External(e)
    }
}
