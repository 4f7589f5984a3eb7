use chrono::{Datelike, NaiveDate};
use rusqlite::Connection;
use serde::Serialize;
use std::collections::BTreeMap;

/// Week-start convention for the month grid. The grid's leading and trailing
/// padding must use the same convention as the emitted days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeekStart {
    Monday,
    Sunday,
}

impl WeekStart {
    pub fn parse(raw: &str) -> Option<WeekStart> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "monday" => Some(WeekStart::Monday),
            "sunday" => Some(WeekStart::Sunday),
            _ => None,
        }
    }
}

impl Default for WeekStart {
    fn default() -> Self {
        WeekStart::Monday
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarError {
    pub code: String,
    pub message: String,
}

impl CalendarError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

/// One line of a day's agenda. Tasks are merged in without their row id: the
/// month view offers no task mutation, while events can be deleted from their
/// day cell and so must carry the identity to delete.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum AgendaEntry {
    #[serde(rename = "task")]
    Task {
        title: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        time: Option<String>,
    },
    #[serde(rename = "event")]
    Event {
        id: String,
        title: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        time: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthRef {
    pub year: i32,
    pub month: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthView {
    pub year: i32,
    pub month: u32,
    pub month_name: String,
    /// Full-week sequence of day cells; `None` marks a cell belonging to an
    /// adjacent month. Length is always a multiple of 7.
    pub grid: Vec<Option<u32>>,
    /// Day-of-month -> entries. Days with nothing scheduled are absent.
    pub agenda: BTreeMap<u32, Vec<AgendaEntry>>,
    pub prev: MonthRef,
    pub next: MonthRef,
}

#[derive(Debug, Clone)]
pub struct DueTask {
    pub title: String,
    pub date: NaiveDate,
    pub time: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DayEvent {
    pub id: String,
    pub title: String,
    pub date: NaiveDate,
    pub time: Option<String>,
}

pub struct CalendarContext<'a> {
    pub conn: &'a Connection,
    pub user_id: &'a str,
}

pub fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

pub fn prev_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

/// Half-open month window `[first of month, first of next month)`. Range
/// comparisons against it neither drop nor double-count boundary entries.
pub fn month_window(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), CalendarError> {
    if !(1..=12).contains(&month) {
        return Err(CalendarError::new(
            "invalid_month",
            format!("month must be 1..=12, got {}", month),
        ));
    }
    let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
        CalendarError::new("invalid_month", format!("no such month: {}-{}", year, month))
    })?;
    let (ny, nm) = next_month(year, month);
    let end = NaiveDate::from_ymd_opt(ny, nm, 1).ok_or_else(|| {
        CalendarError::new("invalid_month", format!("no such month: {}-{}", ny, nm))
    })?;
    Ok((start, end))
}

pub fn days_in_month(year: i32, month: u32) -> Result<u32, CalendarError> {
    let (start, end) = month_window(year, month)?;
    Ok((end - start).num_days() as u32)
}

/// Day-cell sequence for the month layout: `None` padding back to the start
/// of the first week, `Some(1..=last)`, `None` padding to close the final
/// week.
pub fn month_grid(
    year: i32,
    month: u32,
    week_start: WeekStart,
) -> Result<Vec<Option<u32>>, CalendarError> {
    let (start, _) = month_window(year, month)?;
    let days = days_in_month(year, month)?;

    let lead = match week_start {
        WeekStart::Monday => start.weekday().num_days_from_monday(),
        WeekStart::Sunday => start.weekday().num_days_from_sunday(),
    };

    let mut grid: Vec<Option<u32>> = Vec::with_capacity(42);
    for _ in 0..lead {
        grid.push(None);
    }
    for day in 1..=days {
        grid.push(Some(day));
    }
    while grid.len() % 7 != 0 {
        grid.push(None);
    }
    Ok(grid)
}

/// Merge the two fetched collections into per-day lists. Entries keep fetch
/// order within a day; tasks land before events because they are fetched
/// first. No ordering by time is applied.
pub fn merge_agenda(tasks: &[DueTask], events: &[DayEvent]) -> BTreeMap<u32, Vec<AgendaEntry>> {
    let mut agenda: BTreeMap<u32, Vec<AgendaEntry>> = BTreeMap::new();
    for task in tasks {
        agenda
            .entry(task.date.day())
            .or_default()
            .push(AgendaEntry::Task {
                title: task.title.clone(),
                time: task.time.clone(),
            });
    }
    for event in events {
        agenda
            .entry(event.date.day())
            .or_default()
            .push(AgendaEntry::Event {
                id: event.id.clone(),
                title: event.title.clone(),
                time: event.time.clone(),
            });
    }
    agenda
}

const MONTHS_EN: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const MONTHS_PT: [&str; 12] = [
    "Janeiro",
    "Fevereiro",
    "Março",
    "Abril",
    "Maio",
    "Junho",
    "Julho",
    "Agosto",
    "Setembro",
    "Outubro",
    "Novembro",
    "Dezembro",
];

const MONTHS_ES: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

pub fn month_name(lang: &str, month: u32) -> Result<&'static str, CalendarError> {
    if !(1..=12).contains(&month) {
        return Err(CalendarError::new(
            "invalid_month",
            format!("month must be 1..=12, got {}", month),
        ));
    }
    let table = match lang {
        "pt" => &MONTHS_PT,
        "es" => &MONTHS_ES,
        _ => &MONTHS_EN,
    };
    Ok(table[(month - 1) as usize])
}

/// Build the complete month view for one owner: grid, per-day agenda and
/// navigation pair. Read-only; the only failure it raises itself is the
/// month-range check, everything else is a storage error passed through.
pub fn build_month_view(
    ctx: &CalendarContext<'_>,
    year: i32,
    month: u32,
    week_start: WeekStart,
    lang: &str,
) -> Result<MonthView, CalendarError> {
    let (start, end) = month_window(year, month)?;
    let start_key = start.format("%Y-%m-%d").to_string();
    let end_key = end.format("%Y-%m-%d").to_string();

    let mut task_stmt = ctx
        .conn
        .prepare(
            "SELECT title, due_date, due_time FROM tasks
             WHERE user_id = ? AND due_date IS NOT NULL AND due_date >= ? AND due_date < ?
             ORDER BY rowid",
        )
        .map_err(|e| CalendarError::new("db_query_failed", e.to_string()))?;
    let tasks = task_stmt
        .query_map([ctx.user_id, start_key.as_str(), end_key.as_str()], |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, Option<String>>(2)?,
            ))
        })
        .and_then(|rows| rows.collect::<Result<Vec<_>, _>>())
        .map_err(|e| CalendarError::new("db_query_failed", e.to_string()))?;
    let tasks: Vec<DueTask> = tasks
        .into_iter()
        .filter_map(|(title, date, time)| {
            NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                .ok()
                .map(|date| DueTask { title, date, time })
        })
        .collect();

    let mut event_stmt = ctx
        .conn
        .prepare(
            "SELECT id, title, date, time FROM events
             WHERE user_id = ? AND date >= ? AND date < ?
             ORDER BY rowid",
        )
        .map_err(|e| CalendarError::new("db_query_failed", e.to_string()))?;
    let events = event_stmt
        .query_map([ctx.user_id, start_key.as_str(), end_key.as_str()], |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, Option<String>>(3)?,
            ))
        })
        .and_then(|rows| rows.collect::<Result<Vec<_>, _>>())
        .map_err(|e| CalendarError::new("db_query_failed", e.to_string()))?;
    let events: Vec<DayEvent> = events
        .into_iter()
        .filter_map(|(id, title, date, time)| {
            NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                .ok()
                .map(|date| DayEvent {
                    id,
                    title,
                    date,
                    time,
                })
        })
        .collect();

    let grid = month_grid(year, month, week_start)?;
    let agenda = merge_agenda(&tasks, &events);
    let (py, pm) = prev_month(year, month);
    let (ny, nm) = next_month(year, month);

    Ok(MonthView {
        year,
        month,
        month_name: month_name(lang, month)?.to_string(),
        grid,
        agenda,
        prev: MonthRef {
            year: py,
            month: pm,
        },
        next: MonthRef {
            year: ny,
            month: nm,
        },
    })
}
