//! Planning-view multi-select and duplication of occurrences into standalone events.

use chrono::NaiveDate;

use crate::datetime::{days_between, shift_days};
use crate::error::{AgendaError, Result};
use crate::merger::MergedAgenda;
use crate::model::{AgendaEvent, Occurrence};
use crate::ports::{AgendaStore, NewEvent};
use crate::session::AgendaSession;

/// Title given to a duplicate of an untitled occurrence.
pub const DUPLICATE_FALLBACK_TITLE: &str = "Agenda item";

/// Selected local event ids, in selection order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: Vec<String>,
}

impl SelectionSet {
    /// Toggle `event` in or out of the selection. External events cannot be selected.
    ///
    /// Returns whether the event is selected afterwards.
    pub fn toggle(&mut self, event: &AgendaEvent) -> bool {
        let AgendaEvent::Local(occurrence) = event else {
            return false;
        };
        if let Some(pos) = self.ids.iter().position(|id| *id == occurrence.event_id) {
            self.ids.remove(pos);
            false
        } else {
            self.ids.push(occurrence.event_id.clone());
            true
        }
    }

    pub fn contains(&self, event_id: &str) -> bool {
        self.ids.iter().any(|id| id == event_id)
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Selected occurrences still present in `agenda`, sorted by start.
    pub fn resolve<'a>(&self, agenda: &'a MergedAgenda) -> Vec<&'a Occurrence> {
        let mut selected: Vec<&Occurrence> = self
            .ids
            .iter()
            .filter_map(|id| {
                let found = agenda.get(id).and_then(|e| e.event.as_local());
                if found.is_none() {
                    tracing::debug!(event_id = %id, "selected event no longer in agenda");
                }
                found
            })
            .collect();
        selected.sort_by_key(|o| o.start);
        selected
    }
}

/// Duplicate every selected occurrence `days` days later (or earlier, if negative).
///
/// Returns the number of events created.
pub async fn duplicate_by_days<S>(
    session: &mut AgendaSession,
    agenda: &MergedAgenda,
    store: &S,
    days: i64,
) -> Result<usize>
where
    S: AgendaStore + ?Sized,
{
    duplicate_with_shift(session, agenda, store, |_, _| days).await
}

/// Duplicate the selection so that its earliest occurrence lands on `target`.
///
/// The other occurrences keep their day offsets relative to the earliest one.
pub async fn duplicate_to_date<S>(
    session: &mut AgendaSession,
    agenda: &MergedAgenda,
    store: &S,
    target: NaiveDate,
) -> Result<usize>
where
    S: AgendaStore + ?Sized,
{
    duplicate_with_shift(session, agenda, store, |event_day, anchor_day| {
        days_between(anchor_day, target) + days_between(anchor_day, event_day)
    })
    .await
}

async fn duplicate_with_shift<S, F>(
    session: &mut AgendaSession,
    agenda: &MergedAgenda,
    store: &S,
    shift_for: F,
) -> Result<usize>
where
    S: AgendaStore + ?Sized,
    F: Fn(NaiveDate, NaiveDate) -> i64,
{
    let selected: Vec<Occurrence> = session
        .selection
        .resolve(agenda)
        .into_iter()
        .cloned()
        .collect();
    let Some(anchor_day) = selected.first().map(|o| o.start.date()) else {
        return Err(AgendaError::EmptySelection);
    };

    // Every copy is built before the first port call so an impossible shift creates nothing.
    let mut duplicates = Vec::with_capacity(selected.len());
    for occurrence in &selected {
        let shift = shift_for(occurrence.start.date(), anchor_day);
        let (Some(start), Some(end)) = (
            shift_days(occurrence.start, shift),
            shift_days(occurrence.end, shift),
        ) else {
            let err = AgendaError::DateOutOfRange(format!(
                "{} shifted by {} days",
                occurrence.event_id, shift
            ));
            return Err(session.surface(err));
        };
        let title = if occurrence.title.trim().is_empty() {
            DUPLICATE_FALLBACK_TITLE.to_string()
        } else {
            occurrence.title.clone()
        };
        duplicates.push(NewEvent {
            title,
            start,
            end,
            all_day: occurrence.all_day,
            workspace_id: occurrence.workspace_id.clone(),
            priority: occurrence.priority.as_option(),
            recurrence: None,
        });
    }

    session.begin_mutation()?;

    let mut created = 0;
    let mut failure = None;
    for duplicate in duplicates {
        if let Err(err) = store.create_event(duplicate).await {
            failure = Some(err);
            break;
        }
        created += 1;
    }
    session.end_mutation();

    match failure {
        None => {
            tracing::info!(created, "duplicated selection");
            session.selection.clear();
            Ok(created)
        }
        Some(err) => {
            tracing::warn!(created, total = selected.len(), %err, "duplication stopped");
            Err(session.surface(err.into()))
        }
    }
}
