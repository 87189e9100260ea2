//! Recurrence expansion: turns task definitions into concrete occurrences inside a
//! visible range.
//!
//! One-off tasks yield at most one occurrence. Recurring tasks are walked step by step from
//! their first instance, bounded by the configured iteration cap so that a series without
//! `until` can never loop unboundedly.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::datetime::{
    add_minutes, add_recurrence_steps, date_key, format_iso, midnight, shift_days,
};
use crate::model::{DateRange, Occurrence, RecurrenceRule, TaskDefinition};

/// Why a definition produced no occurrences at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    MissingTaskId,
    MissingDates,
    /// The task's default length runs past the representable calendar.
    OutOfRange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exclusion {
    pub task_id: Option<String>,
    pub reason: ExclusionReason,
}

/// Result of expanding a set of definitions over one range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Expansion {
    /// Occurrences overlapping the range, sorted by start.
    pub occurrences: Vec<Occurrence>,
    pub excluded: Vec<Exclusion>,
}

/// The concrete first window of a definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub all_day: bool,
}

/// Resolve the first `[start, end)` window of a definition.
///
/// - a task with only an end uses it as its start;
/// - an all-day task covers its start day, midnight to midnight;
/// - a timed task whose end is missing or not after its start lasts
///   `default_event_minutes`.
pub fn task_window(
    task: &TaskDefinition,
    config: &EngineConfig,
) -> Result<TaskWindow, ExclusionReason> {
    let start = match (task.start, task.end) {
        (Some(start), _) => start,
        (None, Some(end)) => {
            tracing::warn!(task_id = %task.id, "task has no start; using its end as start");
            end
        }
        (None, None) => return Err(ExclusionReason::MissingDates),
    };

    if task.all_day {
        let day_start = midnight(start.date());
        let day_end = shift_days(day_start, 1).ok_or(ExclusionReason::OutOfRange)?;
        return Ok(TaskWindow {
            start: day_start,
            end: day_end,
            all_day: true,
        });
    }

    let end = match task.end {
        Some(end) if end > start => end,
        _ => add_minutes(start, config.default_event_minutes)
            .ok_or(ExclusionReason::OutOfRange)?,
    };

    Ok(TaskWindow {
        start,
        end,
        all_day: false,
    })
}

/// Expand all definitions over `range`.
///
/// The output is a pure function of its inputs: the same definitions, range and config
/// always produce the same occurrences in the same order.
pub fn expand_definitions(
    tasks: &[TaskDefinition],
    range: DateRange,
    config: &EngineConfig,
) -> Expansion {
    let mut expansion = Expansion::default();

    for task in tasks {
        if task.id.trim().is_empty() {
            expansion.excluded.push(Exclusion {
                task_id: None,
                reason: ExclusionReason::MissingTaskId,
            });
            continue;
        }

        let window = match task_window(task, config) {
            Ok(window) => window,
            Err(reason) => {
                expansion.excluded.push(Exclusion {
                    task_id: Some(task.id.clone()),
                    reason,
                });
                continue;
            }
        };

        match &task.recurrence {
            None => {
                if range.overlaps(window.start, window.end) {
                    expansion.occurrences.push(single_occurrence(task, window));
                }
            }
            Some(rule) => {
                expand_series(task, rule, window, range, config, &mut expansion.occurrences);
            }
        }
    }

    expansion.occurrences.sort_by_key(|o| o.start);

    tracing::debug!(
        definitions = tasks.len(),
        occurrences = expansion.occurrences.len(),
        excluded = expansion.excluded.len(),
        "expanded definitions"
    );

    expansion
}

/// Expand one recurring definition, appending its visible instances to `out`.
///
/// Stops at the first cursor past `until` or past the end of the range, or after
/// `recurrence_iteration_cap` steps, whichever comes first.
pub fn expand_series(
    task: &TaskDefinition,
    rule: &RecurrenceRule,
    window: TaskWindow,
    range: DateRange,
    config: &EngineConfig,
    out: &mut Vec<Occurrence>,
) {
    let interval = if rule.interval == 0 {
        tracing::warn!(task_id = %task.id, "recurrence interval 0 clamped to 1");
        1
    } else {
        rule.interval
    };

    for step in 0..config.recurrence_iteration_cap {
        let Some(cursor_start) = add_recurrence_steps(window.start, rule.freq, interval, step)
        else {
            break;
        };
        // Month-end clamping moves only the start; the duration rides along.
        let Some(cursor_end) = cursor_start.checked_add_signed(window.end - window.start) else {
            break;
        };

        if rule.until.is_some_and(|until| cursor_start > until) {
            break;
        }
        if cursor_start > range.end {
            break;
        }

        let instance_date = date_key(cursor_start);
        if rule.is_exception(&instance_date) || !range.overlaps(cursor_start, cursor_end) {
            continue;
        }

        out.push(Occurrence {
            event_id: format!("{}__{}", task.id, format_iso(cursor_start)),
            task_id: task.id.clone(),
            title: task.title.clone(),
            start: cursor_start,
            end: cursor_end,
            all_day: window.all_day,
            instance_date: Some(instance_date),
            recurrence: Some(rule.clone()),
            workspace_id: task.workspace_id.clone(),
            priority: task.priority,
        });
    }
}

fn single_occurrence(task: &TaskDefinition, window: TaskWindow) -> Occurrence {
    Occurrence {
        event_id: task.id.clone(),
        task_id: task.id.clone(),
        title: task.title.clone(),
        start: window.start,
        end: window.end,
        all_day: window.all_day,
        instance_date: None,
        recurrence: None,
        workspace_id: task.workspace_id.clone(),
        priority: task.priority,
    }
}
