//! Boundary traits implemented by the surrounding task feature and the calendar provider.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{AgendaError, PortError};
use crate::model::{DateRange, ExternalEvent, Priority, RecurrenceRule};

/// Fields of a definition to create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
    pub title: String,
    pub start: NaiveDateTime,
    /// Exclusive; for all-day events, midnight after the last day.
    pub end: NaiveDateTime,
    pub all_day: bool,
    pub workspace_id: Option<String>,
    pub priority: Option<Priority>,
    pub recurrence: Option<RecurrenceRule>,
}

/// Replacement fields for an existing definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventUpdate {
    pub task_id: String,
    /// `None` leaves the title unchanged.
    pub title: Option<String>,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub all_day: bool,
    pub workspace_id: Option<String>,
    pub priority: Option<Priority>,
    pub recurrence: Option<RecurrenceRule>,
}

/// Which step of an occurrence detach failed.
#[derive(Debug)]
pub enum DetachError {
    /// Nothing was changed.
    Skip(PortError),
    /// The instance was skipped but its replacement was not created.
    Create(PortError),
}

impl DetachError {
    pub fn into_agenda_error(self, task_id: &str, instance_date: &str) -> AgendaError {
        match self {
            DetachError::Skip(err) => AgendaError::Persistence(err),
            DetachError::Create(source) => AgendaError::DetachIncomplete {
                task_id: task_id.to_string(),
                instance_date: instance_date.to_string(),
                source,
            },
        }
    }
}

/// Persistence of task definitions.
#[async_trait]
pub trait AgendaStore: Send + Sync {
    async fn create_event(&self, event: NewEvent) -> Result<(), PortError>;

    async fn update_event(&self, update: EventUpdate) -> Result<(), PortError>;

    /// Append `date_key` to the exception set of `task_id`'s recurrence.
    async fn skip_occurrence(&self, task_id: &str, date_key: &str) -> Result<(), PortError>;

    /// Replace one instance of a series with a standalone definition.
    ///
    /// The provided implementation skips, then creates, with no rollback between the two.
    /// Stores able to do both in one transaction should override it.
    async fn detach_occurrence(
        &self,
        task_id: &str,
        date_key: &str,
        replacement: NewEvent,
    ) -> Result<(), DetachError> {
        self.skip_occurrence(task_id, date_key)
            .await
            .map_err(DetachError::Skip)?;
        self.create_event(replacement)
            .await
            .map_err(DetachError::Create)
    }
}

/// Read-only external calendar.
#[async_trait]
pub trait ExternalCalendar: Send + Sync {
    async fn fetch_events(&self, range: DateRange) -> Result<Vec<ExternalEvent>, PortError>;
}
