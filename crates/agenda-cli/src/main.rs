//! `agenda` CLI: expand task definitions, build the merged agenda and compute availability
//! from JSON files.
//!
//! ## Usage
//!
//! ```sh
//! # Expand definitions (stdin → stdout) over a half-open range
//! agenda expand --from 2024-01-01 --to 2024-02-01 < tasks.json
//!
//! # Merged agenda with an external calendar export and filters
//! agenda agenda -t tasks.json --external meetings.json --from 2024-01-01 --to 2024-01-08 \
//!     --conflicts-only --priority high
//!
//! # Same agenda grouped into per-day planning sections
//! agenda agenda -t tasks.json --from 2024-01-01 --to 2024-01-08 --sections
//!
//! # Free slots of at least 45 minutes from a given day on
//! agenda availability -t tasks.json --from 2024-01-01 --to 2024-01-08 --today 2024-01-03 --min 45
//!
//! # Engine tunables from a TOML file, debug logging on stderr
//! agenda --config agenda.toml --verbose expand -t tasks.json --from 2024-01-01 --to 2024-02-01
//! ```

use std::io::{self, Read};

use agenda_engine::availability::{compute_availability, planning_sections};
use agenda_engine::datetime::{midnight, parse_date_key, parse_local_datetime};
use agenda_engine::{
    build_agenda, expand_definitions, AgendaFilters, DateRange, EngineConfig, ExternalEvent,
    MinimumSlot, Priority, TaskDefinition, TimeWindow,
};
use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "agenda", version, about = "Agenda scheduling engine CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML file with engine settings (defaults apply to missing keys)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Log engine decisions at debug level on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Expand task definitions into occurrences
    Expand {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        range: RangeArgs,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Merge local occurrences with external events and score conflicts
    Agenda {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        range: RangeArgs,
        /// Only occurrences of recurring tasks
        #[arg(long)]
        recurring_only: bool,
        /// Only events involved in a conflict
        #[arg(long)]
        conflicts_only: bool,
        #[arg(long, value_enum)]
        priority: Option<PriorityArg>,
        #[arg(long, value_enum)]
        window: Option<WindowArg>,
        /// Group the events into per-day planning sections
        #[arg(long)]
        sections: bool,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Free slots per working day
    Availability {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        range: RangeArgs,
        /// First day to plan (YYYY-MM-DD, defaults to the local date)
        #[arg(long, value_parser = parse_day)]
        today: Option<NaiveDate>,
        /// Minimum slot length in minutes: 30, 45, 60 or 90
        #[arg(long)]
        min: Option<u32>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[derive(Args)]
struct InputArgs {
    /// JSON array of task definitions (reads from stdin if omitted)
    #[arg(short, long)]
    tasks: Option<String>,
    /// JSON array of external calendar events
    #[arg(long)]
    external: Option<String>,
}

#[derive(Args)]
struct RangeArgs {
    /// Range start (YYYY-MM-DD or YYYY-MM-DDTHH:MM[:SS])
    #[arg(long, value_parser = parse_bound)]
    from: NaiveDateTime,
    /// Range end, exclusive
    #[arg(long, value_parser = parse_bound)]
    to: NaiveDateTime,
}

impl RangeArgs {
    fn range(&self) -> Result<DateRange> {
        let range = DateRange::new(self.from, self.to);
        if range.is_empty() {
            anyhow::bail!("--to ({}) must be after --from ({})", self.to, self.from);
        }
        Ok(range)
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum PriorityArg {
    Low,
    Medium,
    High,
    None,
}

impl From<PriorityArg> for Priority {
    fn from(arg: PriorityArg) -> Self {
        match arg {
            PriorityArg::Low => Priority::Low,
            PriorityArg::Medium => Priority::Medium,
            PriorityArg::High => Priority::High,
            PriorityArg::None => Priority::None,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum WindowArg {
    AllDay,
    Morning,
    Afternoon,
    Evening,
}

impl From<WindowArg> for TimeWindow {
    fn from(arg: WindowArg) -> Self {
        match arg {
            WindowArg::AllDay => TimeWindow::AllDay,
            WindowArg::Morning => TimeWindow::Morning,
            WindowArg::Afternoon => TimeWindow::Afternoon,
            WindowArg::Evening => TimeWindow::Evening,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Expand {
            input,
            range,
            output,
        } => {
            let tasks = read_tasks(input.tasks.as_deref())?;
            let expansion = expand_definitions(&tasks, range.range()?, &config);
            write_json(output.as_deref(), &expansion)?;
        }
        Commands::Agenda {
            input,
            range,
            recurring_only,
            conflicts_only,
            priority,
            window,
            sections,
            output,
        } => {
            let tasks = read_tasks(input.tasks.as_deref())?;
            let externals = read_externals(input.external.as_deref())?;
            let range = range.range()?;
            let filters = AgendaFilters {
                recurring_only,
                conflicts_only,
                priority: priority.map(Priority::from),
                time_window: window.map(TimeWindow::from),
            };

            let view = build_agenda(&tasks, &externals, range, &filters, &config);
            if sections {
                write_json(
                    output.as_deref(),
                    &planning_sections(&view.agenda.events, Some(range)),
                )?;
            } else {
                write_json(output.as_deref(), &view)?;
            }
        }
        Commands::Availability {
            input,
            range,
            today,
            min,
            output,
        } => {
            if let Some(minutes) = min {
                config.min_slot = MinimumSlot::try_from(minutes).map_err(anyhow::Error::msg)?;
            }
            let tasks = read_tasks(input.tasks.as_deref())?;
            let externals = read_externals(input.external.as_deref())?;
            let range = range.range()?;
            let today = today.unwrap_or_else(|| chrono::Local::now().date_naive());

            let view = build_agenda(&tasks, &externals, range, &AgendaFilters::default(), &config);
            let days = compute_availability(
                view.agenda.events.iter().map(|e| &e.event),
                range,
                today,
                &config,
            );
            write_json(output.as_deref(), &days)?;
        }
    }

    Ok(())
}

/// Log to stderr so JSON on stdout stays clean. `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_config(path: Option<&str>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path))?;
    let config: EngineConfig =
        toml::from_str(&raw).with_context(|| format!("Failed to parse config file: {}", path))?;
    config.validate().context("Invalid engine configuration")?;
    tracing::debug!(?config, "loaded engine config");
    Ok(config)
}

fn parse_bound(raw: &str) -> std::result::Result<NaiveDateTime, String> {
    parse_date_key(raw)
        .map(midnight)
        .or_else(|| parse_local_datetime(raw))
        .ok_or_else(|| format!("expected YYYY-MM-DD or YYYY-MM-DDTHH:MM[:SS], got '{}'", raw))
}

fn parse_day(raw: &str) -> std::result::Result<NaiveDate, String> {
    parse_date_key(raw).ok_or_else(|| format!("expected YYYY-MM-DD, got '{}'", raw))
}

fn read_tasks(path: Option<&str>) -> Result<Vec<TaskDefinition>> {
    let raw = read_input(path)?;
    serde_json::from_str(&raw).context("Failed to parse task definitions")
}

fn read_externals(path: Option<&str>) -> Result<Vec<ExternalEvent>> {
    match path {
        Some(path) => {
            let raw = read_input(Some(path))?;
            serde_json::from_str(&raw).context("Failed to parse external events")
        }
        None => Ok(Vec::new()),
    }
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_json<T: Serialize>(path: Option<&str>, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match path {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            println!("{}", json);
        }
    }
    Ok(())
}
