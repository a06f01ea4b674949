use std::fmt::Display;

use anyhow::Result;
use chrono::{DateTime, FixedOffset, NaiveDate};
use chrono_english::parse_date_string;
use clap::{CommandFactory, Parser, ValueEnum};

use crate::{
    config::{Departments, TrackerConfig},
    storage::{json_store::JsonFileStore, StateStore},
    tracker::state::{Department, TrackerState},
    utils::{
        clock::{Clock, DefaultClock},
        percentage::{seconds_percentage, Percentage},
        time::{date_key, format_seconds},
    },
};

use super::Args;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

#[derive(Debug, Parser)]
pub struct ReportCommand {
    #[arg(
        long = "start",
        short,
        help = "First day of the report. Examples are \"yesterday\", \"monday\", \"15/03/2025\". Defaults to today"
    )]
    start_date: Option<String>,
    #[arg(
        long = "end",
        short,
        help = "Last day of the report, inclusive. Defaults to the start day"
    )]
    end_date: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
}

/// Time recorded for one day of a report.
#[derive(Debug, PartialEq, Eq)]
pub struct DayReport {
    pub date: NaiveDate,
    pub rows: Vec<(Department, u64)>,
    pub total: u64,
}

impl DayReport {
    pub fn share(&self, seconds: u64) -> Percentage {
        seconds_percentage(seconds, self.total)
    }
}

/// Command to process `report` command. Prints what was recorded between two days from the saved
/// state. Never writes state.
pub async fn process_report_command(
    ReportCommand {
        start_date,
        end_date,
        date_style,
    }: ReportCommand,
    storage: JsonFileStore,
    config: &TrackerConfig,
) -> Result<()> {
    let now = DefaultClock.time().with_timezone(&config.timezone).fixed_offset();
    let (start, end) = parse_range(start_date, end_date, date_style, now)?;

    let Some(state) = storage.load().await? else {
        println!("Nothing recorded yet");
        return Ok(());
    };

    for day in build_report(&state, &config.departments, start, end) {
        println!("{}", date_key(day.date));
        for (department, seconds) in &day.rows {
            println!(
                "  {:<16}{}\t{}",
                department.name(),
                format_seconds(*seconds),
                day.share(*seconds)
            );
        }
        println!("  {:<16}{}", "Total", format_seconds(day.total));
        println!();
    }
    Ok(())
}

/// Also provides sensible defaults for `report` command.
fn parse_range(
    start_date: Option<String>,
    end_date: Option<String>,
    date_style: DateStyle,
    now: DateTime<FixedOffset>,
) -> Result<(NaiveDate, NaiveDate)> {
    let dialect: chrono_english::Dialect = date_style.into();
    let parse = |value: Option<String>, name: &str| -> Result<Option<NaiveDate>> {
        match value.map(|s| parse_date_string(&s, now, dialect)) {
            Some(Ok(v)) => Ok(Some(v.date_naive())),
            Some(Err(e)) => Err(Args::command()
                .error(
                    clap::error::ErrorKind::ValueValidation,
                    format!("Failed to validate {name} date {e}"),
                )
                .into()),
            None => Ok(None),
        }
    };
    let start = parse(start_date, "start")?.unwrap_or_else(|| now.date_naive());
    let end = parse(end_date, "end")?.unwrap_or(start);
    if end < start {
        return Err(Args::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                format!("Report ends on {end} before it starts on {start}"),
            )
            .into());
    }
    Ok((start, end))
}

/// Collects recorded days between `start` and `end` inclusive. Configured departments come first
/// in their usual order, anything else recorded on a day follows by name. Days without any
/// recorded time are left out.
pub fn build_report(
    state: &TrackerState,
    departments: &Departments,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<DayReport> {
    state
        .timers
        .range(start..=end)
        .filter_map(|(date, day)| {
            let configured = departments
                .iter()
                .map(|v| (v.clone(), day.get(v).map(|r| r.time).unwrap_or(0)));
            let extra = day
                .iter()
                .filter(|(department, _)| !departments.contains(department))
                .map(|(department, record)| (department.clone(), record.time));
            let rows = configured
                .chain(extra)
                .filter(|(_, seconds)| *seconds > 0)
                .collect::<Vec<_>>();
            let total = rows.iter().map(|(_, seconds)| seconds).sum::<u64>();
            (total > 0).then_some(DayReport {
                date: *date,
                rows,
                total,
            })
        })
        .collect()
}
