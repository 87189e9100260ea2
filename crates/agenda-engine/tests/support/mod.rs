//! Shared fixtures for the integration tests: wall-clock constructors and in-memory ports
//! that record every call.

#![allow(dead_code)]

use std::sync::Mutex;

use agenda_engine::error::PortError;
use agenda_engine::model::{DateRange, ExternalEvent, Occurrence, Priority};
use agenda_engine::ports::{AgendaStore, EventUpdate, ExternalCalendar, NewEvent};
use agenda_engine::{AgendaEvent, RecurrenceRule};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(h, min, 0).unwrap()
}

pub fn range(start: NaiveDateTime, end: NaiveDateTime) -> DateRange {
    DateRange::new(start, end)
}

pub fn occurrence(id: &str, start: NaiveDateTime, end: NaiveDateTime) -> Occurrence {
    Occurrence {
        event_id: id.to_string(),
        task_id: id.to_string(),
        title: format!("Task {id}"),
        start,
        end,
        all_day: false,
        instance_date: None,
        recurrence: None,
        workspace_id: None,
        priority: Priority::None,
    }
}

/// An instance of a weekly series, identified the way the expander identifies it.
pub fn series_instance(task_id: &str, start: NaiveDateTime, end: NaiveDateTime) -> Occurrence {
    Occurrence {
        event_id: format!("{task_id}__{}", start.format("%Y-%m-%dT%H:%M:%S")),
        task_id: task_id.to_string(),
        title: format!("Series {task_id}"),
        start,
        end,
        all_day: false,
        instance_date: Some(start.format("%Y-%m-%d").to_string()),
        recurrence: Some(RecurrenceRule::new(agenda_engine::Frequency::Weekly)),
        workspace_id: Some("ws-1".to_string()),
        priority: Priority::Medium,
    }
}

pub fn external(id: &str, start: NaiveDateTime, end: NaiveDateTime) -> ExternalEvent {
    ExternalEvent {
        id: id.to_string(),
        title: format!("Meeting {id}"),
        start,
        end,
        all_day: false,
    }
}

pub fn local(o: Occurrence) -> AgendaEvent {
    AgendaEvent::Local(o)
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Create(NewEvent),
    Update(EventUpdate),
    Skip { task_id: String, date_key: String },
}

/// In-memory store. Each operation can be made to fail; `fail_create_after` lets the first
/// `n` creates succeed before failing.
#[derive(Default)]
pub struct RecordingStore {
    pub calls: Mutex<Vec<Call>>,
    pub fail_create: bool,
    pub fail_update: bool,
    pub fail_skip: bool,
    pub fail_create_after: Option<usize>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn created(&self) -> Vec<NewEvent> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Create(e) => Some(e),
                _ => None,
            })
            .collect()
    }

    fn creates_so_far(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| matches!(c, Call::Create(_)))
            .count()
    }
}

#[async_trait]
impl AgendaStore for RecordingStore {
    async fn create_event(&self, event: NewEvent) -> Result<(), PortError> {
        if self.fail_create {
            return Err(PortError::new("create rejected"));
        }
        if let Some(limit) = self.fail_create_after {
            if self.creates_so_far() >= limit {
                return Err(PortError::new("quota exceeded"));
            }
        }
        self.calls.lock().unwrap().push(Call::Create(event));
        Ok(())
    }

    async fn update_event(&self, update: EventUpdate) -> Result<(), PortError> {
        if self.fail_update {
            return Err(PortError::new("update rejected"));
        }
        self.calls.lock().unwrap().push(Call::Update(update));
        Ok(())
    }

    async fn skip_occurrence(&self, task_id: &str, date_key: &str) -> Result<(), PortError> {
        if self.fail_skip {
            return Err(PortError::new("skip rejected"));
        }
        self.calls.lock().unwrap().push(Call::Skip {
            task_id: task_id.to_string(),
            date_key: date_key.to_string(),
        });
        Ok(())
    }
}

/// External calendar returning a fixed list, or failing.
pub struct FixedCalendar {
    pub events: Vec<ExternalEvent>,
    pub fail: bool,
}

#[async_trait]
impl ExternalCalendar for FixedCalendar {
    async fn fetch_events(&self, range: DateRange) -> Result<Vec<ExternalEvent>, PortError> {
        if self.fail {
            return Err(PortError::new("provider offline"));
        }
        Ok(self
            .events
            .iter()
            .filter(|e| range.overlaps(e.start, e.end))
            .cloned()
            .collect())
    }
}

/// Store whose calls never complete, for driving a session into the middle of a mutation.
pub struct StalledStore;

#[async_trait]
impl AgendaStore for StalledStore {
    async fn create_event(&self, _event: NewEvent) -> Result<(), PortError> {
        std::future::pending().await
    }

    async fn update_event(&self, _update: EventUpdate) -> Result<(), PortError> {
        std::future::pending().await
    }

    async fn skip_occurrence(&self, _task_id: &str, _date_key: &str) -> Result<(), PortError> {
        std::future::pending().await
    }
}
