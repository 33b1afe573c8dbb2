//! Connection reconstruction: pairs asynchronous Added/Removed lifecycle
//! events into closed connection intervals.
//!
//! A connection key (`local,remote` address pair) is not unique over a
//! capture: once a key has seen `Removed` events, a further `Added` means
//! the identifier is being reused by a new logical connection. That
//! boundary closes the open group inline; everything still open at end of
//! input is flushed afterwards, so inline closures always precede
//! end-of-stream closures in the output.

use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::model::{Action, ConnectionRecord, LogEvent};
use crate::timeparse::parse_event_timestamp;

/// Open event group for one connection key.
#[derive(Debug, Default)]
struct OpenGroup {
    added: Vec<LogEvent>,
    removed: Vec<LogEvent>,
}

/// Forward-scan state machine over lifecycle events.
///
/// `observe` consumes one event and may emit an inline closure on key
/// reuse; `finish` flushes the remaining open groups in key first-seen
/// order and returns every reconstructed record.
pub struct ConnectionTracker {
    groups: HashMap<String, OpenGroup>,
    order: Vec<String>,
    closed: Vec<ConnectionRecord>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self {
            groups: HashMap::new(),
            order: Vec::new(),
            closed: Vec::new(),
        }
    }

    pub fn observe(&mut self, event: LogEvent) {
        // events that cannot be keyed are unusable
        if event.local_addr.is_empty() || event.remote_addr.is_empty() {
            tracing::debug!(
                local = %event.local_addr,
                remote = %event.remote_addr,
                "skipping event with missing address fields"
            );
            return;
        }

        let key = event.connection_key();
        if !self.groups.contains_key(&key) {
            self.order.push(key.clone());
        }
        let group = self.groups.entry(key.clone()).or_default();

        match event.action {
            // Reuse boundary: the previous connection on this key has
            // fully cycled. Close it and start fresh with this event.
            Action::Added if !group.removed.is_empty() => {
                let finished = std::mem::take(group);
                if let Some(record) = reduce_group(&key, &finished) {
                    tracing::debug!(name = %record.name, "completed connection (reuse detected)");
                    self.closed.push(record);
                }
                group.added.push(event);
            }
            Action::Added => group.added.push(event),
            // No reuse check on Removed: trailing Removed events after a
            // reuse-triggered close accumulate into the new group.
            Action::Removed => group.removed.push(event),
        }
    }

    /// Flush all still-open groups, inline closures first.
    pub fn finish(mut self) -> Vec<ConnectionRecord> {
        tracing::debug!(open = self.order.len(), "processing remaining open connections");
        let mut records = std::mem::take(&mut self.closed);
        for key in &self.order {
            if let Some(group) = self.groups.get(key) {
                if let Some(record) = reduce_group(key, group) {
                    tracing::debug!(name = %record.name, "completed connection");
                    records.push(record);
                }
            }
        }
        records
    }
}

impl Default for ConnectionTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the whole event sequence through a tracker.
pub fn reconstruct(events: Vec<LogEvent>) -> Vec<ConnectionRecord> {
    tracing::debug!(events = events.len(), "matching connection lifecycle events");
    let mut tracker = ConnectionTracker::new();
    for event in events {
        tracker.observe(event);
    }
    let records = tracker.finish();
    tracing::debug!(connections = records.len(), "matched connections");
    records
}

/// Reduce one event group to a connection record.
///
/// Start is the earliest parseable Added timestamp; the display process
/// is the last non-"Unknown" process among Added events carrying a
/// parseable timestamp, scanned in event order, independent of which
/// event produced the earliest time. End is the latest
/// parseable Removed timestamp; Removed processes are consulted only if
/// the process is still "Unknown". Groups with no parseable timestamp at
/// all yield no record.
fn reduce_group(key: &str, group: &OpenGroup) -> Option<ConnectionRecord> {
    let mut start: Option<NaiveDateTime> = None;
    let mut end: Option<NaiveDateTime> = None;
    let mut process = String::from("Unknown");

    for event in &group.added {
        if let Some(dt) = parse_event_timestamp(&event.date, &event.time) {
            if start.map_or(true, |cur| dt < cur) {
                start = Some(dt);
            }
            let proc = event.process.trim();
            if !proc.is_empty() && proc != "Unknown" {
                process = proc.to_string();
            }
        }
    }

    for event in &group.removed {
        if let Some(dt) = parse_event_timestamp(&event.date, &event.time) {
            if end.map_or(true, |cur| dt > cur) {
                end = Some(dt);
            }
            if process == "Unknown" {
                let proc = event.process.trim();
                if !proc.is_empty() && proc != "Unknown" {
                    process = proc.to_string();
                }
            }
        }
    }

    // Ongoing at capture end: collapse to a point interval.
    if start.is_some() && end.is_none() {
        end = start;
    }

    // Pre-existing at capture start: the earliest Removed timestamp
    // stands in for the start.
    if end.is_some() && start.is_none() {
        for event in &group.removed {
            if let Some(dt) = parse_event_timestamp(&event.date, &event.time) {
                if start.map_or(true, |cur| dt < cur) {
                    start = Some(dt);
                }
            }
        }
        if start.is_none() {
            start = end;
        }
    }

    let (start, end) = match (start, end) {
        (Some(start), Some(end)) => (start, end),
        _ => return None,
    };

    let protocol = group
        .added
        .first()
        .map(|e| e.protocol.as_str())
        .or_else(|| group.removed.first().map(|e| e.protocol.as_str()))
        .unwrap_or("");
    let protocol = if protocol.trim().is_empty() { "TCP" } else { protocol };

    let mut parts = key.split(',');
    let local = parts.next().unwrap_or("");
    let remote = parts.next().unwrap_or("");

    Some(ConnectionRecord {
        name: format!("{process} ({protocol}): {local} -> {remote}"),
        start,
        end,
    })
}
