//! Error types for agenda-engine operations.

use thiserror::Error;

/// Local validation failures raised while saving a draft.
///
/// These never reach a port: the draft stays open and the message is shown inline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Title is required")]
    EmptyTitle,

    #[error("End must be after start")]
    EndNotAfterStart,

    #[error("Invalid date/time: {0:?}")]
    InvalidDateTime(String),
}

/// Failure reported by a persistence or provider port.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct PortError {
    pub message: String,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl PortError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

#[derive(Error, Debug)]
pub enum AgendaError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PortError),

    /// The skip step of an occurrence detach succeeded but the create step did not.
    /// The instance is gone from its series with no standalone replacement.
    #[error("Occurrence {instance_date} of task {task_id} was removed but its replacement could not be created: {source}")]
    DetachIncomplete {
        task_id: String,
        instance_date: String,
        #[source]
        source: PortError,
    },

    #[error("Another mutation is already in progress")]
    Busy,

    #[error("No draft is open")]
    NoDraft,

    #[error("Event {0} comes from the external calendar and is read-only")]
    ReadOnlyEvent(String),

    #[error("Event {0} is not an occurrence of a recurring series")]
    NotAnOccurrence(String),

    #[error("Nothing is selected")]
    EmptySelection,

    /// A shift or default length would move an event past the representable calendar.
    #[error("Date out of range: {0}")]
    DateOutOfRange(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, AgendaError>;
