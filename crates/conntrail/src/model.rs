//! Core record types shared across the pipeline.

use chrono::NaiveDateTime;

/// Lifecycle action recorded for a socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Added,
    Removed,
}

impl Action {
    /// Parse a raw action cell. Surrounding whitespace is tolerated; the
    /// keywords themselves are case-sensitive.
    pub fn parse(value: &str) -> Option<Action> {
        match value.trim() {
            "Added" => Some(Action::Added),
            "Removed" => Some(Action::Removed),
            _ => None,
        }
    }
}

/// One normalized log row.
///
/// Cells are kept as raw strings; timestamp parsing happens at reduction
/// time so that a malformed cell degrades a single event, not the row set.
/// `date`, `process` and `protocol` may be empty.
#[derive(Debug, Clone)]
pub struct LogEvent {
    pub date: String,
    pub time: String,
    pub action: Action,
    pub process: String,
    pub protocol: String,
    pub local_addr: String,
    pub remote_addr: String,
}

impl LogEvent {
    /// Identity used to correlate lifecycle events:
    /// `local_ip:local_port,remote_ip:remote_port`.
    pub fn connection_key(&self) -> String {
        format!("{},{}", self.local_addr.trim(), self.remote_addr.trim())
    }
}

/// A reconstructed connection interval. Both timestamps are always
/// present: when only one side of the Added/Removed pair was observed,
/// the missing side is synthesized equal to the observed side.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionRecord {
    pub name: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// Named interval consumed by the merger and the export boundary.
///
/// Built from legacy task-shaped CSV rows or from [`ConnectionRecord`]s.
/// Intervals lacking a parseable start or end still flow through the
/// pipeline; they are just never merged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Task {
    pub name: String,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub status: Option<String>,
    pub duration: Option<String>,
}

impl Task {
    pub fn from_record(record: &ConnectionRecord) -> Task {
        Task {
            name: record.name.clone(),
            start: Some(record.start),
            end: Some(record.end),
            status: None,
            duration: None,
        }
    }

    /// Only intervals with both endpoints participate in merging.
    pub fn is_mergeable(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }
}
