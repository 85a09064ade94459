//! Run Reports
//!
//! Renders a run and its log as text and derives per-step timings from
//! the entry timestamps.

use std::collections::HashMap;

use chrono::Duration;

use super::entry::LogEntry;
use super::run::Run;
use crate::workflow::{StepId, Workflow};

/// Renders a run header followed by its log entries.
///
/// When the workflow is given, entries show the kind and position of their
/// step; steps deleted since the run are shown as `(removed)`.
pub fn render_run(run: &Run, entries: &[LogEntry], workflow: Option<&Workflow>) -> String {
    let mut output = String::new();
    if let Some(workflow) = workflow {
        output.push_str(&format!("\nWorkflow: {}", workflow.name));
    }
    output.push_str(&format!(
        "\nRun {} [{}] started {} ({})\n\n",
        run.id,
        run.status.label(),
        run.started_at.format("%Y-%m-%d %H:%M:%S"),
        run.formatted_duration()
    ));

    for entry in entries {
        output.push_str(&format_entry(entry, workflow));
        output.push('\n');
    }

    let durations = step_durations(entries);
    if !durations.is_empty() {
        let mut timed: Vec<_> = durations.into_iter().collect();
        timed.sort_by_key(|(id, _)| first_sequence(entries, *id));

        output.push_str("\nStep timings:\n");
        for (step_id, duration) in timed {
            output.push_str(&format!(
                "  {} ({} ms)\n",
                truncate(&step_label(Some(step_id), workflow), 24),
                duration.num_milliseconds()
            ));
        }
    }
    output
}

/// Formats one entry as `HH:MM:SS.mmm LEVEL [step] message`.
pub fn format_entry(entry: &LogEntry, workflow: Option<&Workflow>) -> String {
    format!(
        "{} {:5} {:<20} {}",
        entry.timestamp.format("%H:%M:%S%.3f"),
        entry.level.label(),
        step_label(entry.step_id, workflow),
        entry.message
    )
}

fn step_label(step_id: Option<StepId>, workflow: Option<&Workflow>) -> String {
    match (step_id, workflow) {
        (None, _) => "[workflow]".to_string(),
        (Some(id), Some(workflow)) => match workflow.get_step(id) {
            Some(step) => format!("[{} #{}]", step.kind, step.position),
            None => "(removed)".to_string(),
        },
        (Some(id), None) => format!("[step {}]", short_id(id)),
    }
}

fn short_id(id: StepId) -> String {
    id.simple().to_string()[..8].to_string()
}

fn first_sequence(entries: &[LogEntry], step_id: StepId) -> u64 {
    entries
        .iter()
        .filter(|e| e.step_id == Some(step_id))
        .map(|e| e.sequence)
        .min()
        .unwrap_or(u64::MAX)
}

/// Time between the first and last entry of each step.
pub fn step_durations(entries: &[LogEntry]) -> HashMap<StepId, Duration> {
    let mut bounds: HashMap<StepId, (chrono::DateTime<chrono::Utc>, chrono::DateTime<chrono::Utc>)> =
        HashMap::new();

    for entry in entries {
        let Some(step_id) = entry.step_id else {
            continue;
        };
        bounds
            .entry(step_id)
            .and_modify(|(first, last)| {
                if entry.timestamp < *first {
                    *first = entry.timestamp;
                }
                if entry.timestamp > *last {
                    *last = entry.timestamp;
                }
            })
            .or_insert((entry.timestamp, entry.timestamp));
    }

    bounds
        .into_iter()
        .map(|(id, (first, last))| (id, last - first))
        .collect()
}

/// Pads or truncates a string to a fixed width.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        format!("{:width$}", s, width = max_len)
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}
