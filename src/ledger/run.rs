//! Run Records
//!
//! A run is one execution attempt of a workflow. Its status only moves
//! forward: `pending -> running -> {succeeded, failed}`, and a terminal
//! status is never left again.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::workflow::WorkflowId;

/// Identity of a run.
pub type RunId = Uuid;

/// Status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Created, not started yet
    Pending,
    /// Steps are executing
    Running,
    /// Every step succeeded
    Succeeded,
    /// A step failed or the run was aborted
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }

    /// Human-readable status.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Running => "Running",
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Returns true if a run may move from `self` to `next`.
    pub fn can_transition_to(&self, next: RunStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running)
                | (Self::Pending, Self::Failed)
                | (Self::Running, Self::Succeeded)
                | (Self::Running, Self::Failed)
        )
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised on an attempt to move a run backwards or out of a terminal status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("run {run} cannot move from {from} to {to}")]
pub struct RunError {
    pub run: RunId,
    pub from: RunStatus,
    pub to: RunStatus,
}

/// Record of one execution attempt of a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub id: RunId,
    pub workflow_id: WorkflowId,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Run {
    /// Creates a pending run for a workflow.
    pub fn new(workflow_id: WorkflowId) -> Self {
        Self {
            id: Uuid::new_v4(),
            workflow_id,
            status: RunStatus::Pending,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Moves a pending run to running and stamps the start time.
    pub fn mark_started(&mut self) -> Result<(), RunError> {
        self.transition(RunStatus::Running)?;
        self.started_at = Utc::now();
        Ok(())
    }

    /// Moves a running run to succeeded and stamps the completion time.
    pub fn mark_succeeded(&mut self) -> Result<(), RunError> {
        self.transition(RunStatus::Succeeded)?;
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Moves a pending or running run to failed and stamps the completion time.
    pub fn mark_failed(&mut self) -> Result<(), RunError> {
        self.transition(RunStatus::Failed)?;
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    fn transition(&mut self, next: RunStatus) -> Result<(), RunError> {
        if !self.status.can_transition_to(next) {
            return Err(RunError {
                run: self.id,
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Time from start to completion; `None` while the run is incomplete.
    pub fn duration(&self) -> Option<Duration> {
        self.completed_at.map(|done| done - self.started_at)
    }

    /// Duration as `42s` or `1m 5s`, or `In progress`.
    pub fn formatted_duration(&self) -> String {
        let Some(duration) = self.duration() else {
            return "In progress".to_string();
        };

        let seconds = duration.num_seconds().max(0);
        if seconds < 60 {
            format!("{}s", seconds)
        } else {
            format!("{}m {}s", seconds / 60, seconds % 60)
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn is_in_progress(&self) -> bool {
        !self.is_complete()
    }
}
