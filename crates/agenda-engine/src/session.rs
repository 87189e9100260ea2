//! Caller-owned agenda session.
//!
//! Everything the agenda view mutates between renders (visible range, filters, the open
//! draft, the planning selection, the cached external events, the last surfaced error)
//! lives here. The session is passed by `&mut` to every mutation; the engine keeps no
//! state of its own.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::draft::DraftState;
use crate::error::{AgendaError, PortError, Result};
use crate::expander::{expand_definitions, Exclusion};
use crate::filter::{apply_filters, AgendaFilters};
use crate::merger::{annotate_local, merge_agenda, MergedAgenda};
use crate::model::{DateRange, ExternalEvent, TaskDefinition};
use crate::ports::ExternalCalendar;
use crate::selection::SelectionSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Calendar,
    Planning,
}

/// Everything derived from one recomputation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgendaView {
    /// Merged, annotated and filtered events.
    pub agenda: MergedAgenda,
    /// Conflicting events among local tasks alone.
    pub local_conflict_count: usize,
    pub excluded: Vec<Exclusion>,
}

/// Recompute the agenda from scratch.
///
/// Pure: identical definitions, external events, range, filters and config give an
/// identical view, so callers may memoize on that tuple.
pub fn build_agenda(
    definitions: &[TaskDefinition],
    externals: &[ExternalEvent],
    range: DateRange,
    filters: &AgendaFilters,
    config: &EngineConfig,
) -> AgendaView {
    let expansion = expand_definitions(definitions, range, config);
    let local = annotate_local(&expansion.occurrences, config);
    let merged = merge_agenda(&expansion.occurrences, externals, config);

    AgendaView {
        agenda: apply_filters(&merged, filters),
        local_conflict_count: local.conflict_count,
        excluded: expansion.excluded,
    }
}

/// Handle for one external fetch. Only the most recently issued ticket is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    pub range: DateRange,
}

#[derive(Debug)]
pub struct AgendaSession {
    range: DateRange,
    pub filters: AgendaFilters,
    display_mode: DisplayMode,
    pub(crate) draft: DraftState,
    pub(crate) selection: SelectionSet,
    busy: bool,
    error: Option<String>,
    external_events: Vec<ExternalEvent>,
    fetch_generation: u64,
}

impl AgendaSession {
    pub fn new(range: DateRange) -> Self {
        Self {
            range,
            filters: AgendaFilters::default(),
            display_mode: DisplayMode::default(),
            draft: DraftState::Closed,
            selection: SelectionSet::default(),
            busy: false,
            error: None,
            external_events: Vec::new(),
            fetch_generation: 0,
        }
    }

    /// A session centred on `now`, used before the view reports its visible range.
    pub fn around(now: NaiveDateTime, config: &EngineConfig) -> Self {
        let half = Duration::days(config.default_range_days);
        let start = now.checked_sub_signed(half).unwrap_or(NaiveDateTime::MIN);
        let end = now.checked_add_signed(half).unwrap_or(NaiveDateTime::MAX);
        Self::new(DateRange::new(start, end))
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    /// Change the visible range. Callers should follow up with an external fetch.
    pub fn set_range(&mut self, range: DateRange) {
        self.range = range;
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.display_mode
    }

    /// Switching back to the calendar drops the planning selection.
    pub fn set_display_mode(&mut self, mode: DisplayMode) {
        self.display_mode = mode;
        if mode == DisplayMode::Calendar {
            self.selection.clear();
        }
    }

    pub fn draft_state(&self) -> &DraftState {
        &self.draft
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionSet {
        &mut self.selection
    }

    /// `true` while a save, skip, move or duplication is awaiting a port.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Last user-visible error, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn external_events(&self) -> &[ExternalEvent] {
        &self.external_events
    }

    /// Recompute the agenda for the current range and filters.
    pub fn view(&self, definitions: &[TaskDefinition], config: &EngineConfig) -> AgendaView {
        build_agenda(
            definitions,
            &self.external_events,
            self.range,
            &self.filters,
            config,
        )
    }

    /// Start a fetch for the current range, superseding any fetch still in flight.
    pub fn begin_external_fetch(&mut self) -> FetchTicket {
        self.fetch_generation += 1;
        FetchTicket {
            generation: self.fetch_generation,
            range: self.range,
        }
    }

    /// Apply a fetch result. Returns `false` when the ticket was superseded.
    ///
    /// Provider failures degrade to an empty external list so local scheduling stays usable.
    pub fn complete_external_fetch(
        &mut self,
        ticket: FetchTicket,
        result: std::result::Result<Vec<ExternalEvent>, PortError>,
    ) -> bool {
        if ticket.generation != self.fetch_generation {
            tracing::debug!(
                ticket = ticket.generation,
                current = self.fetch_generation,
                "discarding superseded external fetch"
            );
            return false;
        }
        self.external_events = match result {
            Ok(events) => events,
            Err(err) => {
                tracing::warn!(%err, "external calendar unavailable; continuing without it");
                Vec::new()
            }
        };
        true
    }

    /// Fetch external events for the current range and apply them.
    pub async fn refresh_external<C>(&mut self, calendar: &C) -> bool
    where
        C: ExternalCalendar + ?Sized,
    {
        let ticket = self.begin_external_fetch();
        let result = calendar.fetch_events(ticket.range).await;
        self.complete_external_fetch(ticket, result)
    }

    /// Recover after the caller dropped an in-flight save, skip, move or duplication.
    ///
    /// Clears the busy flag and reopens a draft that was left mid-save, so the user can
    /// retry. Nothing is rolled back at the store.
    pub fn abandon_mutation(&mut self) {
        if !self.busy {
            return;
        }
        tracing::warn!("abandoning an unfinished mutation");
        self.busy = false;
        self.draft = match std::mem::take(&mut self.draft) {
            DraftState::Validating(draft) | DraftState::Persisting(draft) => DraftState::Open(draft),
            other => other,
        };
    }

    pub(crate) fn begin_mutation(&mut self) -> Result<()> {
        if self.busy {
            return Err(AgendaError::Busy);
        }
        self.busy = true;
        self.error = None;
        Ok(())
    }

    pub(crate) fn end_mutation(&mut self) {
        self.busy = false;
    }

    /// Record `err` as the user-visible error and hand it back.
    pub(crate) fn surface(&mut self, err: AgendaError) -> AgendaError {
        self.error = Some(err.to_string());
        err
    }
}
