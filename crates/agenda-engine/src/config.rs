//! Engine tunables.
//!
//! Every field has a default, so a partial TOML/JSON document deserializes into a complete
//! configuration.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::{AgendaError, Result};

/// Longest default event length: one day.
pub const MAX_DEFAULT_EVENT_MINUTES: i64 = 24 * 60;

/// Widest default half-range: ten years.
pub const MAX_DEFAULT_RANGE_DAYS: i64 = 3660;

/// Minimum free-slot duration offered by the planning view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum MinimumSlot {
    M30,
    M45,
    #[default]
    M60,
    M90,
}

impl MinimumSlot {
    pub const ALL: [MinimumSlot; 4] = [
        MinimumSlot::M30,
        MinimumSlot::M45,
        MinimumSlot::M60,
        MinimumSlot::M90,
    ];

    pub fn minutes(self) -> i64 {
        match self {
            MinimumSlot::M30 => 30,
            MinimumSlot::M45 => 45,
            MinimumSlot::M60 => 60,
            MinimumSlot::M90 => 90,
        }
    }
}

impl TryFrom<u32> for MinimumSlot {
    type Error = String;

    fn try_from(minutes: u32) -> std::result::Result<Self, Self::Error> {
        match minutes {
            30 => Ok(MinimumSlot::M30),
            45 => Ok(MinimumSlot::M45),
            60 => Ok(MinimumSlot::M60),
            90 => Ok(MinimumSlot::M90),
            other => Err(format!(
                "minimum slot must be one of 30, 45, 60 or 90 minutes, got {other}"
            )),
        }
    }
}

impl From<MinimumSlot> for u32 {
    fn from(slot: MinimumSlot) -> Self {
        slot.minutes() as u32
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on recurrence steps per series and expansion.
    pub recurrence_iteration_cap: u32,
    /// Conflict scores above this value are displayed as the cap.
    pub conflict_score_display_cap: u32,
    /// Conflicting-event count at which the agenda switches to compact density.
    pub compact_density_threshold: usize,
    pub working_day_start: NaiveTime,
    pub working_day_end: NaiveTime,
    pub min_slot: MinimumSlot,
    pub max_slots_per_day: usize,
    /// Length given to timed tasks with no usable end.
    pub default_event_minutes: i64,
    /// Half-width of the range used before the view reports its visible range.
    pub default_range_days: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            recurrence_iteration_cap: 400,
            conflict_score_display_cap: 9,
            compact_density_threshold: 8,
            working_day_start: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN),
            working_day_end: NaiveTime::from_hms_opt(20, 0, 0).unwrap_or(NaiveTime::MIN),
            min_slot: MinimumSlot::default(),
            max_slots_per_day: 3,
            default_event_minutes: 60,
            default_range_days: 45,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.recurrence_iteration_cap == 0 {
            return Err(AgendaError::InvalidConfig(
                "recurrence_iteration_cap must be at least 1".to_string(),
            ));
        }
        if self.working_day_end <= self.working_day_start {
            return Err(AgendaError::InvalidConfig(format!(
                "working day {}-{} is empty",
                self.working_day_start, self.working_day_end
            )));
        }
        if self.max_slots_per_day == 0 {
            return Err(AgendaError::InvalidConfig(
                "max_slots_per_day must be at least 1".to_string(),
            ));
        }
        if !(1..=MAX_DEFAULT_EVENT_MINUTES).contains(&self.default_event_minutes) {
            return Err(AgendaError::InvalidConfig(format!(
                "default_event_minutes must be between 1 and {MAX_DEFAULT_EVENT_MINUTES}, got {}",
                self.default_event_minutes
            )));
        }
        if !(1..=MAX_DEFAULT_RANGE_DAYS).contains(&self.default_range_days) {
            return Err(AgendaError::InvalidConfig(format!(
                "default_range_days must be between 1 and {MAX_DEFAULT_RANGE_DAYS}, got {}",
                self.default_range_days
            )));
        }
        Ok(())
    }

    pub fn working_day_minutes(&self) -> i64 {
        (self.working_day_end - self.working_day_start).num_minutes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = EngineConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.working_day_minutes(), 12 * 60);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: EngineConfig =
            serde_json::from_str(r#"{"min_slot": 45, "working_day_start": "09:00:00"}"#).unwrap();
        assert_eq!(cfg.min_slot, MinimumSlot::M45);
        assert_eq!(cfg.working_day_start, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(cfg.recurrence_iteration_cap, 400);
    }

    #[test]
    fn unsupported_slot_length_rejected() {
        let err = serde_json::from_str::<EngineConfig>(r#"{"min_slot": 20}"#).unwrap_err();
        assert!(err.to_string().contains("30, 45, 60 or 90"));
    }

    #[test]
    fn inverted_working_day_rejected() {
        let cfg = EngineConfig {
            working_day_start: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            working_day_end: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            ..EngineConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(AgendaError::InvalidConfig(_))));
    }

    #[test]
    fn default_lengths_are_bounded() {
        for minutes in [0, -5, MAX_DEFAULT_EVENT_MINUTES + 1, i64::MAX] {
            let cfg = EngineConfig {
                default_event_minutes: minutes,
                ..EngineConfig::default()
            };
            assert!(matches!(cfg.validate(), Err(AgendaError::InvalidConfig(_))), "{minutes}");
        }
        for days in [0, MAX_DEFAULT_RANGE_DAYS + 1, i64::MAX] {
            let cfg = EngineConfig {
                default_range_days: days,
                ..EngineConfig::default()
            };
            assert!(matches!(cfg.validate(), Err(AgendaError::InvalidConfig(_))), "{days}");
        }
        let cfg = EngineConfig {
            default_event_minutes: MAX_DEFAULT_EVENT_MINUTES,
            default_range_days: MAX_DEFAULT_RANGE_DAYS,
            ..EngineConfig::default()
        };
        cfg.validate().unwrap();
    }
}
