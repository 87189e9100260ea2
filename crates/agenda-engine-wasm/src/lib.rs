//! WASM bindings for agenda-engine.
//!
//! Exposes expansion, the merged agenda, per-day availability and free-slot search to
//! JavaScript via `wasm-bindgen`. Complex values cross the boundary as JSON strings in
//! the engine's own serde shapes; datetimes are local wall-clock strings
//! (`YYYY-MM-DDTHH:MM:SS`, `YYYY-MM-DDTHH:MM` or a bare `YYYY-MM-DD` for midnight).
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p agenda-engine-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target web --out-dir web/src/wasm/ \
//!   target/wasm32-unknown-unknown/release/agenda_engine_wasm.wasm
//! ```

use agenda_engine::availability::compute_availability;
use agenda_engine::datetime::{midnight, parse_date_key, parse_local_datetime};
use agenda_engine::freebusy;
use agenda_engine::{
    build_agenda, expand_definitions, AgendaFilters, DateRange, EngineConfig, ExternalEvent,
    TaskDefinition,
};
use chrono::{NaiveDate, NaiveDateTime};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

/// Busy interval passed from JavaScript to `findFreeSlots`.
#[derive(Deserialize)]
struct IntervalInput {
    start: String,
    end: String,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_datetime(raw: &str) -> Result<NaiveDateTime, String> {
    parse_date_key(raw)
        .map(midnight)
        .or_else(|| parse_local_datetime(raw))
        .ok_or_else(|| format!("Invalid datetime '{}'", raw))
}

fn parse_range(start: &str, end: &str) -> Result<DateRange, String> {
    let range = DateRange::new(parse_datetime(start)?, parse_datetime(end)?);
    if range.is_empty() {
        return Err(format!("Range end '{}' must be after start '{}'", end, start));
    }
    Ok(range)
}

fn parse_json<T: DeserializeOwned>(json: &str, what: &str) -> Result<T, String> {
    serde_json::from_str(json).map_err(|e| format!("Invalid {} JSON: {}", what, e))
}

/// Engine config from optional JSON; missing keys take their defaults.
fn parse_config(json: Option<&str>) -> Result<EngineConfig, String> {
    let config = match json {
        Some(json) if !json.trim().is_empty() => parse_json(json, "config")?,
        _ => EngineConfig::default(),
    };
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn parse_filters(json: Option<&str>) -> AgendaFilters {
    json.map(AgendaFilters::restore).unwrap_or_default()
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("Serialization error: {}", e))
}

fn js_err(message: String) -> JsValue {
    JsValue::from_str(&message)
}

// ---------------------------------------------------------------------------
// Boundary-free implementations
// ---------------------------------------------------------------------------

fn expand_tasks_impl(
    tasks_json: &str,
    range_start: &str,
    range_end: &str,
    config_json: Option<&str>,
) -> Result<String, String> {
    let tasks: Vec<TaskDefinition> = parse_json(tasks_json, "tasks")?;
    let range = parse_range(range_start, range_end)?;
    let config = parse_config(config_json)?;
    to_json(&expand_definitions(&tasks, range, &config))
}

fn build_agenda_impl(
    tasks_json: &str,
    externals_json: &str,
    range_start: &str,
    range_end: &str,
    filters_json: Option<&str>,
    config_json: Option<&str>,
) -> Result<String, String> {
    let tasks: Vec<TaskDefinition> = parse_json(tasks_json, "tasks")?;
    let externals: Vec<ExternalEvent> = parse_json(externals_json, "external events")?;
    let range = parse_range(range_start, range_end)?;
    let config = parse_config(config_json)?;
    let filters = parse_filters(filters_json);
    to_json(&build_agenda(&tasks, &externals, range, &filters, &config))
}

fn compute_availability_impl(
    tasks_json: &str,
    externals_json: &str,
    window_start: &str,
    window_end: &str,
    today: &str,
    config_json: Option<&str>,
) -> Result<String, String> {
    let tasks: Vec<TaskDefinition> = parse_json(tasks_json, "tasks")?;
    let externals: Vec<ExternalEvent> = parse_json(externals_json, "external events")?;
    let window = parse_range(window_start, window_end)?;
    let today: NaiveDate =
        parse_date_key(today).ok_or_else(|| format!("Invalid date '{}'", today))?;
    let config = parse_config(config_json)?;

    let view = build_agenda(&tasks, &externals, window, &AgendaFilters::default(), &config);
    let days = compute_availability(
        view.agenda.events.iter().map(|e| &e.event),
        window,
        today,
        &config,
    );
    to_json(&days)
}

fn find_free_slots_impl(
    busy_json: &str,
    window_start: &str,
    window_end: &str,
    min_minutes: u32,
) -> Result<String, String> {
    let inputs: Vec<IntervalInput> = parse_json(busy_json, "busy intervals")?;
    let busy = inputs
        .iter()
        .map(|i| Ok((parse_datetime(&i.start)?, parse_datetime(&i.end)?)))
        .collect::<Result<Vec<_>, String>>()?;
    let window = parse_range(window_start, window_end)?;

    let slots = freebusy::find_free_slots(busy, window.start, window.end, i64::from(min_minutes));
    to_json(&slots)
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// Expand task definitions into occurrences over `[range_start, range_end)`.
///
/// Returns `{occurrences, excluded}` as JSON.
#[wasm_bindgen(js_name = "expandTasks")]
pub fn expand_tasks(
    tasks_json: &str,
    range_start: &str,
    range_end: &str,
    config_json: Option<String>,
) -> Result<String, JsValue> {
    expand_tasks_impl(tasks_json, range_start, range_end, config_json.as_deref()).map_err(js_err)
}

/// Merged, conflict-annotated and filtered agenda.
///
/// `filters_json` is the payload produced by the filter panel; an unreadable payload is
/// treated as no filters. Returns `{agenda, local_conflict_count, excluded}` as JSON.
#[wasm_bindgen(js_name = "buildAgenda")]
pub fn build_agenda_js(
    tasks_json: &str,
    externals_json: &str,
    range_start: &str,
    range_end: &str,
    filters_json: Option<String>,
    config_json: Option<String>,
) -> Result<String, JsValue> {
    build_agenda_impl(
        tasks_json,
        externals_json,
        range_start,
        range_end,
        filters_json.as_deref(),
        config_json.as_deref(),
    )
    .map_err(js_err)
}

/// Per-day availability from `today` on, keyed by `YYYY-MM-DD`.
#[wasm_bindgen(js_name = "computeAvailability")]
pub fn compute_availability_js(
    tasks_json: &str,
    externals_json: &str,
    window_start: &str,
    window_end: &str,
    today: &str,
    config_json: Option<String>,
) -> Result<String, JsValue> {
    compute_availability_impl(
        tasks_json,
        externals_json,
        window_start,
        window_end,
        today,
        config_json.as_deref(),
    )
    .map_err(js_err)
}

/// Free gaps of at least `min_minutes` in a window, given `[{start, end}]` busy intervals.
#[wasm_bindgen(js_name = "findFreeSlots")]
pub fn find_free_slots(
    busy_json: &str,
    window_start: &str,
    window_end: &str,
    min_minutes: u32,
) -> Result<String, JsValue> {
    find_free_slots_impl(busy_json, window_start, window_end, min_minutes).map_err(js_err)
}
