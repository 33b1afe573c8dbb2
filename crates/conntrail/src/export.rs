//! Boundary emission: reconstructed intervals as plain tabular data.
//!
//! The core's output contract is a sequence of `(name, start, end)`
//! rows; this module renders that sequence as CSV or JSON. Anything
//! fancier (charts, diagrams) is a downstream consumer's business.

use serde::Serialize;

use crate::error::ConvertResult;
use crate::ingest;
use crate::model::Task;
use crate::track;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Serialize)]
struct ExportRow<'a> {
    #[serde(rename = "Name")]
    name: &'a str,
    start_timestamp: String,
    end_timestamp: String,
}

impl<'a> ExportRow<'a> {
    fn from_task(task: &'a Task) -> Self {
        Self {
            name: &task.name,
            start_timestamp: task
                .start
                .map(|dt| dt.format(TIMESTAMP_FORMAT).to_string())
                .unwrap_or_default(),
            end_timestamp: task
                .end
                .map(|dt| dt.format(TIMESTAMP_FORMAT).to_string())
                .unwrap_or_default(),
        }
    }
}

/// Render tasks as `Name,start_timestamp,end_timestamp` CSV. The name
/// field is always quoted (it contains spaces and punctuation by
/// construction); no trailing newline.
pub fn tasks_to_csv(tasks: &[Task]) -> String {
    let mut lines = vec!["Name,start_timestamp,end_timestamp".to_string()];
    for task in tasks {
        let row = ExportRow::from_task(task);
        lines.push(format!(
            "\"{}\",{},{}",
            row.name.replace('"', "\"\""),
            row.start_timestamp,
            row.end_timestamp
        ));
    }
    lines.join("\n")
}

/// Render tasks as a JSON array of `{Name, start_timestamp, end_timestamp}`.
pub fn tasks_to_json(tasks: &[Task]) -> serde_json::Result<String> {
    let rows: Vec<ExportRow> = tasks.iter().map(ExportRow::from_task).collect();
    serde_json::to_string_pretty(&rows)
}

/// One-shot: reconstruct a connection log and render the boundary CSV.
pub fn convert_log_to_csv(content: &str) -> ConvertResult<String> {
    let events = ingest::parse_events(content)?;
    let records = track::reconstruct(events);
    let tasks: Vec<Task> = records.iter().map(Task::from_record).collect();
    Ok(tasks_to_csv(&tasks))
}
