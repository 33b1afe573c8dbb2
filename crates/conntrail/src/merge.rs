//! Same-name interval merging for the export-side task list.
//!
//! Tasks sharing a name are merged when the gap between consecutive
//! intervals stays within a threshold. Only tasks with both endpoints
//! participate; the rest pass through unchanged after the merged ones,
//! and relative order across different names is preserved.

use std::collections::HashMap;

use chrono::{Duration, NaiveDateTime};

use crate::model::Task;

/// Merge same-named tasks whose gap (`next.start - current.end`) is at
/// most `threshold_secs`. The merged interval spans from the earliest
/// start to the latest end seen in the chain and keeps the remaining
/// fields of the task that opened the chain.
pub fn combine_tasks_by_name(tasks: Vec<Task>, threshold_secs: i64) -> Vec<Task> {
    if tasks.is_empty() {
        return tasks;
    }

    // Group by name, first-seen name order.
    let mut order: Vec<String> = Vec::new();
    let mut by_name: HashMap<String, Vec<Task>> = HashMap::new();
    for task in tasks {
        if !by_name.contains_key(&task.name) {
            order.push(task.name.clone());
        }
        by_name.entry(task.name.clone()).or_default().push(task);
    }

    let threshold = Duration::seconds(threshold_secs);
    let mut combined = Vec::new();

    for name in &order {
        let Some(group) = by_name.remove(name) else {
            continue;
        };
        // A lone task needs no combining.
        if group.len() == 1 {
            combined.extend(group);
            continue;
        }

        let mut mergeable: Vec<(NaiveDateTime, NaiveDateTime, Task)> = Vec::new();
        let mut passthrough: Vec<Task> = Vec::new();
        for task in group {
            match (task.start, task.end) {
                (Some(start), Some(end)) => mergeable.push((start, end, task)),
                _ => passthrough.push(task),
            }
        }
        mergeable.sort_by_key(|(start, _, _)| *start);

        let mut iter = mergeable.into_iter();
        if let Some((mut cur_start, mut cur_end, mut cur_task)) = iter.next() {
            for (next_start, next_end, next_task) in iter {
                if next_start - cur_end <= threshold {
                    tracing::debug!(
                        task = %name,
                        gap_secs = (next_start - cur_end).num_seconds(),
                        threshold_secs,
                        "combining adjacent intervals"
                    );
                    cur_end = cur_end.max(next_end);
                } else {
                    combined.push(finish_span(cur_task, cur_start, cur_end));
                    cur_start = next_start;
                    cur_end = next_end;
                    cur_task = next_task;
                }
            }
            combined.push(finish_span(cur_task, cur_start, cur_end));
        }

        combined.extend(passthrough);
    }

    combined
}

fn finish_span(mut task: Task, start: NaiveDateTime, end: NaiveDateTime) -> Task {
    task.start = Some(start);
    task.end = Some(end);
    task
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").expect("test timestamp")
    }

    fn task(name: &str, start: &str, end: &str) -> Task {
        Task {
            name: name.to_string(),
            start: Some(at(start)),
            end: Some(at(end)),
            status: None,
            duration: None,
        }
    }

    // ── Basic merging ───────────────────────────────────────────

    #[test]
    fn test_merge_within_threshold() {
        let tasks = vec![
            task("conn", "2024-01-01 10:00:00", "2024-01-01 10:00:30"),
            task("conn", "2024-01-01 10:01:00", "2024-01-01 10:02:00"),
        ];
        let merged = combine_tasks_by_name(tasks, 60);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].start, Some(at("2024-01-01 10:00:00")));
        assert_eq!(merged[0].end, Some(at("2024-01-01 10:02:00")));
    }

    #[test]
    fn test_gap_above_threshold_stays_separate() {
        let tasks = vec![
            task("conn", "2024-01-01 10:00:00", "2024-01-01 10:00:30"),
            task("conn", "2024-01-01 10:01:00", "2024-01-01 10:02:00"),
        ];
        // gap is 30s, threshold 0 keeps them apart
        let merged = combine_tasks_by_name(tasks, 0);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_gap_equal_to_threshold_merges() {
        let tasks = vec![
            task("conn", "2024-01-01 10:00:00", "2024-01-01 10:00:30"),
            task("conn", "2024-01-01 10:01:30", "2024-01-01 10:02:00"),
        ];
        let merged = combine_tasks_by_name(tasks, 60);
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn test_overlapping_intervals_merge() {
        let tasks = vec![
            task("conn", "2024-01-01 10:00:00", "2024-01-01 10:05:00"),
            task("conn", "2024-01-01 10:02:00", "2024-01-01 10:03:00"),
        ];
        let merged = combine_tasks_by_name(tasks, 0);
        assert_eq!(merged.len(), 1);
        // end never shrinks below the widest interval seen
        assert_eq!(merged[0].end, Some(at("2024-01-01 10:05:00")));
    }

    #[test]
    fn test_merge_sorts_by_start_before_scanning() {
        let tasks = vec![
            task("conn", "2024-01-01 10:01:00", "2024-01-01 10:02:00"),
            task("conn", "2024-01-01 10:00:00", "2024-01-01 10:00:30"),
        ];
        let merged = combine_tasks_by_name(tasks, 60);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].start, Some(at("2024-01-01 10:00:00")));
    }

    #[test]
    fn test_chain_of_three_merges_once() {
        let tasks = vec![
            task("conn", "2024-01-01 10:00:00", "2024-01-01 10:01:00"),
            task("conn", "2024-01-01 10:01:30", "2024-01-01 10:02:30"),
            task("conn", "2024-01-01 10:03:00", "2024-01-01 10:04:00"),
        ];
        let merged = combine_tasks_by_name(tasks, 60);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].start, Some(at("2024-01-01 10:00:00")));
        assert_eq!(merged[0].end, Some(at("2024-01-01 10:04:00")));
    }

    // ── Grouping and pass-through ───────────────────────────────

    #[test]
    fn test_different_names_never_merge() {
        let tasks = vec![
            task("a", "2024-01-01 10:00:00", "2024-01-01 10:00:30"),
            task("b", "2024-01-01 10:00:31", "2024-01-01 10:01:00"),
        ];
        let merged = combine_tasks_by_name(tasks, 3600);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].name, "a");
        assert_eq!(merged[1].name, "b");
    }

    #[test]
    fn test_first_seen_name_order_preserved() {
        let tasks = vec![
            task("b", "2024-01-01 10:00:00", "2024-01-01 10:00:30"),
            task("a", "2024-01-01 11:00:00", "2024-01-01 11:00:30"),
            task("b", "2024-01-01 10:00:40", "2024-01-01 10:01:00"),
        ];
        let merged = combine_tasks_by_name(tasks, 60);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].name, "b");
        assert_eq!(merged[1].name, "a");
    }

    #[test]
    fn test_single_task_passes_through_untouched() {
        let tasks = vec![Task {
            name: "solo".to_string(),
            start: None,
            end: None,
            status: Some("active".to_string()),
            duration: None,
        }];
        let merged = combine_tasks_by_name(tasks, 60);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].status.as_deref(), Some("active"));
    }

    #[test]
    fn test_unparseable_intervals_pass_through_after_merged() {
        let tasks = vec![
            Task {
                name: "conn".to_string(),
                start: None,
                end: None,
                status: None,
                duration: Some("3d".to_string()),
            },
            task("conn", "2024-01-01 10:00:00", "2024-01-01 10:00:30"),
            task("conn", "2024-01-01 10:01:00", "2024-01-01 10:02:00"),
        ];
        let merged = combine_tasks_by_name(tasks, 60);
        assert_eq!(merged.len(), 2);
        // merged interval first, pass-through second
        assert!(merged[0].is_mergeable());
        assert_eq!(merged[1].duration.as_deref(), Some("3d"));
    }

    #[test]
    fn test_chain_keeps_opening_tasks_fields() {
        let mut first = task("conn", "2024-01-01 10:00:00", "2024-01-01 10:00:30");
        first.status = Some("crit".to_string());
        let second = task("conn", "2024-01-01 10:01:00", "2024-01-01 10:02:00");
        let merged = combine_tasks_by_name(vec![first, second], 60);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].status.as_deref(), Some("crit"));
    }

    #[test]
    fn test_empty_input() {
        assert!(combine_tasks_by_name(Vec::new(), 60).is_empty());
    }
}
