//! # agenda-engine
//!
//! Scheduling core of a personal agenda: expands recurring task definitions into concrete
//! occurrences, merges them with read-only external calendar events, scores conflicts
//! across both sources and derives per-day availability for planning.
//!
//! The computational modules are pure functions of their inputs. State that lives between
//! renders (visible range, filters, the open draft, the planning selection) is held in a
//! caller-owned [`AgendaSession`], and persistence goes through the [`AgendaStore`] and
//! [`ExternalCalendar`] ports.
//!
//! ## Modules
//!
//! - [`expander`]: task definitions to occurrences inside a range
//! - [`conflict`]: sorted-sweep overlap detection and weighted scoring
//! - [`merger`]: local and external events merged, annotated and sorted
//! - [`filter`]: user filters applied after conflict scoring
//! - [`freebusy`] / [`availability`]: busy merge, free gaps and per-day slots
//! - [`session`], [`draft`], [`mutation`], [`selection`]: edits persisted through the ports
//! - [`config`], [`error`], [`datetime`], [`model`]: shared types

pub mod availability;
pub mod config;
pub mod conflict;
pub mod datetime;
pub mod draft;
pub mod error;
pub mod expander;
pub mod filter;
pub mod freebusy;
pub mod merger;
pub mod model;
pub mod mutation;
pub mod ports;
pub mod selection;
pub mod session;

pub use availability::{compute_availability, planning_sections, DayAvailability, PlanningSection};
pub use config::{EngineConfig, MinimumSlot};
pub use conflict::{detect_conflicts, ConflictAnnotation, ConflictSource};
pub use draft::{Draft, DraftState, EditScope, SaveOutcome};
pub use error::{AgendaError, PortError, ValidationError};
pub use expander::{expand_definitions, Expansion};
pub use filter::{apply_filters, AgendaFilters, TimeWindow};
pub use freebusy::{find_free_slots, AvailabilitySlot};
pub use merger::{merge_agenda, AnnotatedEvent, Density, MergedAgenda};
pub use model::{
    AgendaEvent, DateRange, EventSource, ExternalEvent, Frequency, Occurrence, Priority,
    RecurrenceRule, TaskDefinition,
};
pub use mutation::{move_or_resize, MoveOutcome, MoveRequest};
pub use ports::{AgendaStore, DetachError, EventUpdate, ExternalCalendar, NewEvent};
pub use selection::SelectionSet;
pub use session::{build_agenda, AgendaSession, AgendaView, DisplayMode};
