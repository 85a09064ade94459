//! Log Entries
//!
//! Append-only events recorded during a run. An entry is tied to its run and
//! optionally to a step; entries without a step are workflow-level events.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::run::RunId;
use crate::workflow::{Step, StepId, Workflow};

/// Severity of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Upper-case label for display.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single event in a run's log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: Uuid,
    pub run_id: RunId,
    /// Step the event belongs to; `None` for workflow-level events
    #[serde(default)]
    pub step_id: Option<StepId>,
    pub level: LogLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// Insertion order within the run, breaks timestamp ties
    pub sequence: u64,
}

impl LogEntry {
    pub fn new(
        run_id: RunId,
        step: Option<&Step>,
        level: LogLevel,
        message: impl Into<String>,
        sequence: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            run_id,
            step_id: step.map(|s| s.id),
            level,
            message: message.into(),
            timestamp: Utc::now(),
            sequence,
        }
    }

    pub fn is_workflow_level(&self) -> bool {
        self.step_id.is_none()
    }

    /// Looks up the referenced step in the workflow as it is now.
    ///
    /// Returns `None` for workflow-level entries and for steps that have
    /// been deleted since the run.
    pub fn resolve_step<'w>(&self, workflow: &'w Workflow) -> Option<&'w Step> {
        self.step_id.and_then(|id| workflow.get_step(id))
    }

    /// Replay order: timestamp first, insertion order on ties.
    pub fn replay_order(a: &LogEntry, b: &LogEntry) -> Ordering {
        a.timestamp
            .cmp(&b.timestamp)
            .then(a.sequence.cmp(&b.sequence))
    }
}

/// Sorts entries into replay order.
pub fn sort_entries(entries: &mut [LogEntry]) {
    entries.sort_by(LogEntry::replay_order);
}
