//! Draft editing: open, validate and persist a create/edit/skip of one occurrence or of a
//! whole series.
//!
//! The draft lives in [`AgendaSession`] and moves through
//! `Closed -> Open -> Validating -> Persisting -> Closed`. Validation failures and port
//! failures both return it to `Open` with the error surfaced on the session, so the user
//! can fix the fields or retry.

use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::datetime::{
    add_minutes, date_key, day_key, exclusive_all_day_end, format_local_input, inclusive_last_day, parse_date_key,
    parse_draft_value,
};
use crate::error::{AgendaError, Result, ValidationError};
use crate::model::{AgendaEvent, Frequency, Priority, RecurrenceRule};
use crate::ports::{AgendaStore, EventUpdate, NewEvent};
use crate::session::AgendaSession;

/// Whether an edit applies to one occurrence or to the whole series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditScope {
    #[default]
    Series,
    Occurrence,
}

/// Calendar view the user selected a range in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CalendarView {
    Month,
    Week,
    Day,
    List,
}

impl CalendarView {
    /// Week and day views lay out an hour grid, where selections are always timed.
    pub fn is_time_grid(self) -> bool {
        matches!(self, CalendarView::Week | CalendarView::Day)
    }
}

/// A pointer selection on the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSelection {
    pub start: NaiveDateTime,
    /// Exclusive end as reported by the calendar.
    pub end: NaiveDateTime,
    pub all_day: bool,
}

/// Transient edit buffer.
///
/// Dates are held as the strings the editor shows: `YYYY-MM-DDTHH:MM` for timed drafts,
/// `YYYY-MM-DD` for all-day drafts, where `end_local` is the inclusive last day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub task_id: Option<String>,
    pub instance_date: Option<String>,
    pub title: String,
    pub start_local: String,
    pub end_local: String,
    pub all_day: bool,
    pub workspace_id: Option<String>,
    pub priority: Priority,
    pub recurrence_freq: Option<Frequency>,
    /// Last day of the series as `YYYY-MM-DD`, or empty for no end.
    pub recurrence_until: String,
    pub edit_scope: EditScope,
    /// Rule of the series the draft was opened from, kept so a series edit does not lose
    /// its interval or skipped dates.
    #[serde(default)]
    base_recurrence: Option<RecurrenceRule>,
}

impl Draft {
    fn blank(start_local: String, end_local: String, all_day: bool) -> Self {
        Self {
            task_id: None,
            instance_date: None,
            title: String::new(),
            start_local,
            end_local,
            all_day,
            workspace_id: None,
            priority: Priority::None,
            recurrence_freq: None,
            recurrence_until: String::new(),
            edit_scope: EditScope::Series,
            base_recurrence: None,
        }
    }

    pub fn is_new(&self) -> bool {
        self.task_id.is_none()
    }

    /// Opened on a dated instance of a recurring series.
    pub fn is_occurrence(&self) -> bool {
        self.task_id.is_some() && self.instance_date.is_some() && self.recurrence_freq.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DraftState {
    #[default]
    Closed,
    Open(Draft),
    Validating(Draft),
    Persisting(Draft),
}

impl DraftState {
    pub fn draft(&self) -> Option<&Draft> {
        match self {
            DraftState::Closed => None,
            DraftState::Open(d) | DraftState::Validating(d) | DraftState::Persisting(d) => Some(d),
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, DraftState::Open(_))
    }
}

/// What a successful save did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Created,
    Updated { task_id: String },
    /// One instance was split off its series as a standalone event.
    Detached { task_id: String, instance_date: String },
}

/// Port calls a validated draft resolves to.
#[derive(Debug, Clone, PartialEq)]
pub enum SavePlan {
    Create(NewEvent),
    Update(EventUpdate),
    Detach {
        task_id: String,
        instance_date: String,
        replacement: NewEvent,
    },
}

fn default_end(start: NaiveDateTime, config: &EngineConfig) -> Result<NaiveDateTime> {
    add_minutes(start, config.default_event_minutes)
        .ok_or_else(|| AgendaError::DateOutOfRange(format_local_input(start)))
}

fn ensure_not_persisting(session: &AgendaSession) -> Result<()> {
    match session.draft {
        DraftState::Validating(_) | DraftState::Persisting(_) => Err(AgendaError::Busy),
        _ => Ok(()),
    }
}

/// Seed a new draft from a calendar selection.
pub fn open_from_selection(
    session: &mut AgendaSession,
    selection: GridSelection,
    view: CalendarView,
    config: &EngineConfig,
) -> Result<()> {
    ensure_not_persisting(session)?;

    let all_day = !view.is_time_grid() && selection.all_day;
    let end = if selection.end > selection.start {
        selection.end
    } else {
        default_end(selection.start, config)?
    };

    let draft = if all_day {
        Draft::blank(
            date_key(selection.start),
            day_key(inclusive_last_day(end)),
            true,
        )
    } else {
        Draft::blank(format_local_input(selection.start), format_local_input(end), false)
    };

    session.draft = DraftState::Open(draft);
    session.clear_error();
    Ok(())
}

/// Seed a new timed draft starting now.
pub fn open_quick(session: &mut AgendaSession, now: NaiveDateTime, config: &EngineConfig) -> Result<()> {
    ensure_not_persisting(session)?;
    let end = default_end(now, config)?;
    session.draft = DraftState::Open(Draft::blank(
        format_local_input(now),
        format_local_input(end),
        false,
    ));
    session.clear_error();
    Ok(())
}

/// Open a draft on an existing event. Returns `false` for read-only external events.
///
/// A dated series instance defaults to editing only that occurrence.
pub fn open_from_event(session: &mut AgendaSession, event: &AgendaEvent) -> Result<bool> {
    ensure_not_persisting(session)?;

    let AgendaEvent::Local(occurrence) = event else {
        return Ok(false);
    };

    let (start_local, end_local) = if occurrence.all_day {
        (
            date_key(occurrence.start),
            day_key(inclusive_last_day(occurrence.end)),
        )
    } else {
        (
            format_local_input(occurrence.start),
            format_local_input(occurrence.end),
        )
    };

    let recurrence = occurrence.recurrence.as_ref();
    session.draft = DraftState::Open(Draft {
        task_id: Some(occurrence.task_id.clone()),
        instance_date: occurrence.instance_date.clone(),
        title: occurrence.title.clone(),
        start_local,
        end_local,
        all_day: occurrence.all_day,
        workspace_id: occurrence.workspace_id.clone(),
        priority: occurrence.priority,
        recurrence_freq: recurrence.map(|r| r.freq),
        recurrence_until: recurrence
            .and_then(|r| r.until)
            .map(date_key)
            .unwrap_or_default(),
        edit_scope: if occurrence.is_series_instance() {
            EditScope::Occurrence
        } else {
            EditScope::Series
        },
        base_recurrence: occurrence.recurrence.clone(),
    });
    session.clear_error();
    Ok(true)
}

/// Mutable access to the open draft's fields.
pub fn edit(session: &mut AgendaSession) -> Option<&mut Draft> {
    match &mut session.draft {
        DraftState::Open(draft) => Some(draft),
        _ => None,
    }
}

pub fn set_edit_scope(session: &mut AgendaSession, scope: EditScope) -> Result<()> {
    let draft = edit(session).ok_or(AgendaError::NoDraft)?;
    draft.edit_scope = scope;
    Ok(())
}

/// Discard the open draft.
pub fn cancel(session: &mut AgendaSession) -> Result<()> {
    ensure_not_persisting(session)?;
    session.draft = DraftState::Closed;
    session.clear_error();
    Ok(())
}

/// Validate a draft and resolve it to the port calls that persist it.
pub fn plan_save(draft: &Draft) -> std::result::Result<SavePlan, ValidationError> {
    let start = parse_draft_value(&draft.start_local, draft.all_day)?;
    let end = parse_draft_value(&draft.end_local, draft.all_day)?;
    let end = if draft.all_day {
        exclusive_all_day_end(end.date())
    } else {
        end
    };
    if end <= start {
        return Err(ValidationError::EndNotAfterStart);
    }

    let title = draft.title.trim();
    if title.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }

    let new_event = |recurrence: Option<RecurrenceRule>| NewEvent {
        title: title.to_string(),
        start,
        end,
        all_day: draft.all_day,
        workspace_id: draft.workspace_id.clone().filter(|w| !w.is_empty()),
        priority: draft.priority.as_option(),
        recurrence,
    };

    if let (Some(task_id), Some(instance_date), true) = (
        &draft.task_id,
        &draft.instance_date,
        draft.is_occurrence() && draft.edit_scope == EditScope::Occurrence,
    ) {
        return Ok(SavePlan::Detach {
            task_id: task_id.clone(),
            instance_date: instance_date.clone(),
            replacement: new_event(None),
        });
    }

    let recurrence = build_recurrence(draft)?;
    match &draft.task_id {
        Some(task_id) => {
            let event = new_event(recurrence);
            Ok(SavePlan::Update(EventUpdate {
                task_id: task_id.clone(),
                title: Some(event.title),
                start: event.start,
                end: event.end,
                all_day: event.all_day,
                workspace_id: event.workspace_id,
                priority: event.priority,
                recurrence: event.recurrence,
            }))
        }
        None => Ok(SavePlan::Create(new_event(recurrence))),
    }
}

/// Recurrence from the draft's frequency and last day.
///
/// New series start at interval 1 with no exceptions; a series edited with its frequency
/// unchanged keeps its interval and skipped dates.
fn build_recurrence(draft: &Draft) -> std::result::Result<Option<RecurrenceRule>, ValidationError> {
    let Some(freq) = draft.recurrence_freq else {
        return Ok(None);
    };

    let until_raw = draft.recurrence_until.trim();
    let until = if until_raw.is_empty() {
        None
    } else {
        let day = parse_date_key(until_raw)
            .ok_or_else(|| ValidationError::InvalidDateTime(until_raw.to_string()))?;
        NaiveTime::from_hms_opt(23, 59, 59).map(|t| day.and_time(t))
    };

    let mut rule = match &draft.base_recurrence {
        Some(base) if base.freq == freq => base.clone(),
        _ => RecurrenceRule::new(freq),
    };
    rule.until = until;
    Ok(Some(rule))
}

/// Validate and persist the open draft.
pub async fn save<S>(session: &mut AgendaSession, store: &S) -> Result<SaveOutcome>
where
    S: AgendaStore + ?Sized,
{
    let draft = match &session.draft {
        DraftState::Open(draft) => draft.clone(),
        DraftState::Closed => return Err(AgendaError::NoDraft),
        _ => return Err(AgendaError::Busy),
    };
    session.begin_mutation()?;

    session.draft = DraftState::Validating(draft.clone());
    let plan = match plan_save(&draft) {
        Ok(plan) => plan,
        Err(err) => {
            session.draft = DraftState::Open(draft);
            session.end_mutation();
            return Err(session.surface(err.into()));
        }
    };

    session.draft = DraftState::Persisting(draft.clone());
    let result = execute(plan, store).await;
    session.end_mutation();

    match result {
        Ok(outcome) => {
            tracing::info!(?outcome, "draft saved");
            session.draft = DraftState::Closed;
            Ok(outcome)
        }
        Err(err) => {
            tracing::warn!(%err, "draft save failed");
            session.draft = DraftState::Open(draft);
            Err(session.surface(err))
        }
    }
}

async fn execute<S>(plan: SavePlan, store: &S) -> Result<SaveOutcome>
where
    S: AgendaStore + ?Sized,
{
    match plan {
        SavePlan::Create(event) => {
            store.create_event(event).await?;
            Ok(SaveOutcome::Created)
        }
        SavePlan::Update(update) => {
            let task_id = update.task_id.clone();
            store.update_event(update).await?;
            Ok(SaveOutcome::Updated { task_id })
        }
        SavePlan::Detach {
            task_id,
            instance_date,
            replacement,
        } => {
            store
                .detach_occurrence(&task_id, &instance_date, replacement)
                .await
                .map_err(|err| err.into_agenda_error(&task_id, &instance_date))?;
            Ok(SaveOutcome::Detached {
                task_id,
                instance_date,
            })
        }
    }
}

/// Remove the draft's occurrence from its series, with no replacement.
pub async fn skip_occurrence<S>(session: &mut AgendaSession, store: &S) -> Result<()>
where
    S: AgendaStore + ?Sized,
{
    let draft = match &session.draft {
        DraftState::Open(draft) => draft.clone(),
        DraftState::Closed => return Err(AgendaError::NoDraft),
        _ => return Err(AgendaError::Busy),
    };
    let (Some(task_id), Some(instance_date), true) =
        (&draft.task_id, &draft.instance_date, draft.is_occurrence())
    else {
        let id = draft.task_id.clone().unwrap_or_default();
        return Err(session.surface(AgendaError::NotAnOccurrence(id)));
    };
    let (task_id, instance_date) = (task_id.clone(), instance_date.clone());

    session.begin_mutation()?;
    session.draft = DraftState::Persisting(draft.clone());
    let result = store.skip_occurrence(&task_id, &instance_date).await;
    session.end_mutation();

    match result {
        Ok(()) => {
            tracing::info!(%task_id, %instance_date, "occurrence skipped");
            session.draft = DraftState::Closed;
            Ok(())
        }
        Err(err) => {
            session.draft = DraftState::Open(draft);
            Err(session.surface(err.into()))
        }
    }
}
