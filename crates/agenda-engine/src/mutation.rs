//! Pointer-driven move/resize of an agenda event.
//!
//! A bare event is updated in place. A dated instance of a series is detached (skipped in
//! the series, recreated standalone at the new time) so the rest of the series does not
//! move. Whatever fails, the caller's revert callback restores the previous position.

use chrono::NaiveDateTime;

use crate::config::EngineConfig;
use crate::datetime::{add_minutes, format_iso, shift_days};
use crate::error::{AgendaError, Result};
use crate::model::AgendaEvent;
use crate::ports::{AgendaStore, EventUpdate, NewEvent};
use crate::session::AgendaSession;

/// Title given to a detached occurrence whose series has none.
pub const DETACHED_FALLBACK_TITLE: &str = "Occurrence";

/// The position an event was dropped or resized to.
#[derive(Debug, Clone, Copy)]
pub struct MoveRequest<'a> {
    pub event: &'a AgendaEvent,
    pub start: NaiveDateTime,
    /// `None` when the calendar reports no end (e.g. dropped into the all-day row).
    pub end: Option<NaiveDateTime>,
    pub all_day: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    Updated { task_id: String },
    Detached { task_id: String, instance_date: String },
}

/// Persist a move/resize, calling `revert` on any failure.
pub async fn move_or_resize<S, F>(
    session: &mut AgendaSession,
    store: &S,
    request: MoveRequest<'_>,
    config: &EngineConfig,
    revert: F,
) -> Result<MoveOutcome>
where
    S: AgendaStore + ?Sized,
    F: FnOnce(),
{
    let AgendaEvent::Local(occurrence) = request.event else {
        revert();
        return Err(session.surface(AgendaError::ReadOnlyEvent(request.event.id().to_string())));
    };

    let start = request.start;
    let end = match request.end {
        Some(end) => Some(end),
        None if request.all_day => shift_days(start, 1),
        None => add_minutes(start, config.default_event_minutes),
    };
    let Some(end) = end else {
        revert();
        return Err(session.surface(AgendaError::DateOutOfRange(format_iso(start))));
    };

    if let Err(err) = session.begin_mutation() {
        revert();
        return Err(err);
    }

    let result = match (&occurrence.instance_date, occurrence.is_series_instance()) {
        (Some(instance_date), true) => {
            let title = if occurrence.title.trim().is_empty() {
                DETACHED_FALLBACK_TITLE.to_string()
            } else {
                occurrence.title.clone()
            };
            let replacement = NewEvent {
                title,
                start,
                end,
                all_day: request.all_day,
                workspace_id: occurrence.workspace_id.clone(),
                priority: occurrence.priority.as_option(),
                recurrence: None,
            };
            store
                .detach_occurrence(&occurrence.task_id, instance_date, replacement)
                .await
                .map(|()| MoveOutcome::Detached {
                    task_id: occurrence.task_id.clone(),
                    instance_date: instance_date.clone(),
                })
                .map_err(|err| err.into_agenda_error(&occurrence.task_id, instance_date))
        }
        _ => {
            let update = EventUpdate {
                task_id: occurrence.task_id.clone(),
                title: None,
                start,
                end,
                all_day: request.all_day,
                workspace_id: occurrence.workspace_id.clone(),
                priority: occurrence.priority.as_option(),
                recurrence: occurrence.recurrence.clone(),
            };
            store
                .update_event(update)
                .await
                .map(|()| MoveOutcome::Updated {
                    task_id: occurrence.task_id.clone(),
                })
                .map_err(AgendaError::from)
        }
    };
    session.end_mutation();

    match result {
        Ok(outcome) => {
            tracing::info!(?outcome, "event moved");
            Ok(outcome)
        }
        Err(err) => {
            tracing::warn!(event_id = %occurrence.event_id, %err, "move/resize failed; reverting");
            revert();
            Err(session.surface(err))
        }
    }
}
