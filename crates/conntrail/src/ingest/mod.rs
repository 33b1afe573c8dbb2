//! CSV ingestion: header handling, column resolution, row normalization.
//!
//! Two input shapes are supported:
//! - connection logs (`Date,Time,Action,Process,Protocol,LocalAddr,RemoteAddr`
//!   in any order, headers optional) → [`LogEvent`]s via [`parse_events`];
//! - task-shaped interval lists (`Name,start_timestamp,end_timestamp` or the
//!   legacy `task_name,start_date,…` layout) → [`Task`]s via [`parse_tasks`].
//!
//! Per-row problems (blank rows, unrecognized action cells) are skipped
//! with a diagnostic; only unusable structure is an error.

mod line;

use std::collections::HashMap;

use chrono::Timelike;

use crate::classify::{self, ColumnMap, ColumnRole};
use crate::error::{ConvertError, ConvertResult};
use crate::model::{Action, LogEvent, Task};
use crate::timeparse;

/// Parse connection-log CSV content into normalized events.
///
/// Header row is detected by name; with the four mandatory role names
/// present, header positions are used directly. Otherwise column roles
/// are inferred from cell contents (see [`classify`]).
pub fn parse_events(content: &str) -> ConvertResult<Vec<LogEvent>> {
    let content = line::strip_bom(content).trim();
    if content.is_empty() {
        return Err(ConvertError::EmptyInput);
    }

    let rows: Vec<Vec<String>> = content.lines().map(line::split_fields).collect();
    let first = &rows[0];

    // First row is a header iff any cell names a known role.
    let has_headers = first
        .iter()
        .any(|cell| ColumnRole::from_header(cell.trim()).is_some());

    let (headers, data_rows): (Option<Vec<String>>, &[Vec<String>]) = if has_headers {
        let headers: Vec<String> = first.iter().map(|h| h.trim().to_string()).collect();
        tracing::debug!(?headers, "detected header row");
        (Some(headers), &rows[1..])
    } else {
        tracing::debug!("no headers detected, will auto-detect columns");
        (None, &rows[..])
    };

    let standard = headers.as_ref().is_some_and(|h| {
        ColumnRole::MANDATORY
            .iter()
            .all(|role| h.iter().any(|name| name == role.as_str()))
    });

    let events = if standard {
        tracing::debug!("standard headers detected, using declared positions");
        let index_of = index_by_name(headers.as_deref().unwrap_or(&[]));
        collect_events(data_rows, |row, role| {
            index_of
                .get(role.as_str())
                .and_then(|&i| row.get(i))
                .cloned()
                .unwrap_or_default()
        })
    } else {
        let map = resolve_columns(data_rows, headers.as_deref())?;
        collect_events(data_rows, |row, role| {
            map.get(role)
                .and_then(|i| row.get(i))
                .cloned()
                .unwrap_or_default()
        })
    };

    tracing::debug!(events = events.len(), "parsed log events from CSV");
    Ok(events)
}

/// Resolve column roles for the non-standard-header path: enforce
/// matching header/data widths, run content inference, and as a last
/// resort map recognized header names directly.
fn resolve_columns(
    data_rows: &[Vec<String>],
    headers: Option<&[String]>,
) -> ConvertResult<ColumnMap> {
    if let Some(headers) = headers {
        for (i, row) in data_rows.iter().enumerate() {
            if !line::is_blank_row(row) && row.len() != headers.len() {
                return Err(ConvertError::Structure {
                    header_cols: headers.len(),
                    row: i + 1,
                    row_cols: row.len(),
                });
            }
        }
    }

    match classify::infer_columns(data_rows, headers) {
        Ok(map) => Ok(map),
        Err(err) => {
            let Some(headers) = headers else {
                return Err(err);
            };
            tracing::debug!(error = %err, "auto-detection failed, trying provided headers");
            let mut map = ColumnMap::new();
            for (idx, header) in headers.iter().enumerate() {
                if let Some(role) = ColumnRole::from_header(header.trim()) {
                    map.insert(role, idx);
                }
            }
            let missing = map.missing_mandatory();
            if !missing.is_empty() {
                return Err(ConvertError::MissingColumns {
                    missing,
                    headers: headers.to_vec(),
                });
            }
            Ok(map)
        }
    }
}

fn index_by_name(headers: &[String]) -> HashMap<String, usize> {
    let mut index_of = HashMap::new();
    for (i, name) in headers.iter().enumerate() {
        if !name.is_empty() {
            // a duplicated header name keeps its last position
            index_of.insert(name.clone(), i);
        }
    }
    index_of
}

fn collect_events<F>(data_rows: &[Vec<String>], cell: F) -> Vec<LogEvent>
where
    F: Fn(&Vec<String>, ColumnRole) -> String,
{
    let mut events = Vec::new();
    for row in data_rows {
        if line::is_blank_row(row) {
            continue;
        }
        let action_cell = cell(row, ColumnRole::Action);
        let Some(action) = Action::parse(&action_cell) else {
            tracing::debug!(action = %action_cell, "skipping row with unrecognized action value");
            continue;
        };
        events.push(LogEvent {
            date: cell(row, ColumnRole::Date),
            time: cell(row, ColumnRole::Time),
            action,
            process: cell(row, ColumnRole::Process),
            protocol: cell(row, ColumnRole::Protocol),
            local_addr: cell(row, ColumnRole::LocalAddr),
            remote_addr: cell(row, ColumnRole::RemoteAddr),
        });
    }
    events
}

/// Parse task-shaped CSV content. The first row is always the header.
///
/// Recognized columns: `Name`/`task_name`, `start_timestamp`/
/// `end_timestamp`, and the legacy `start_date`/`start_time`/`end_date`/
/// `end_time`/`duration`/`status` layout. Surplus cells beyond the
/// header are discarded.
pub fn parse_tasks(content: &str) -> ConvertResult<Vec<Task>> {
    let content = line::strip_bom(content).trim();
    if content.is_empty() {
        return Err(ConvertError::EmptyInput);
    }

    let mut lines = content.lines();
    let headers: Vec<String> = lines
        .next()
        .map(line::split_fields)
        .unwrap_or_default();
    let index_of = index_by_name(&headers);
    tracing::debug!(?headers, "task CSV headers");

    let mut tasks = Vec::new();
    for raw in lines {
        let row = line::split_fields(raw);
        if line::is_blank_row(&row) {
            continue;
        }
        let get = |name: &str| -> Option<String> {
            index_of
                .get(name)
                .map(|&i| row.get(i).cloned().unwrap_or_default())
        };

        let name = get("task_name")
            .or_else(|| get("Name"))
            .unwrap_or_default();

        let start = interval_endpoint(&get("start_timestamp"), &get("start_date"), &get("start_time"));
        let end = interval_endpoint(&get("end_timestamp"), &get("end_date"), &get("end_time"));

        tasks.push(Task {
            name,
            start,
            end,
            status: get("status").filter(|s| !s.trim().is_empty()),
            duration: get("duration").filter(|s| !s.trim().is_empty()),
        });
    }

    tracing::debug!(tasks = tasks.len(), "parsed tasks from CSV");
    Ok(tasks)
}

/// Resolve one interval endpoint: the timestamp column wins (truncated
/// to second precision, matching the boundary format), the legacy
/// date [+ time] pair is the fallback.
fn interval_endpoint(
    timestamp: &Option<String>,
    date: &Option<String>,
    time: &Option<String>,
) -> Option<chrono::NaiveDateTime> {
    if let Some(ts) = timestamp {
        if let Some(dt) = timeparse::parse_timestamp(ts) {
            return dt.with_nanosecond(0);
        }
    }
    let date = date.as_deref()?.trim();
    if date.is_empty() {
        return None;
    }
    let composed = match time.as_deref().map(str::trim) {
        Some(t) if !t.is_empty() => format!("{date} {t}"),
        _ => date.to_string(),
    };
    timeparse::parse_timestamp(&composed)
}
