//! Run Storage
//!
//! The [`RunStore`] trait is the persistence seam of the runner: synchronous
//! calls that create and update runs and append log entries. Each call is an
//! atomic single-record update; no multi-record transactions are assumed.

use std::collections::HashMap;
use std::sync::RwLock;

use thiserror::Error;

use super::entry::{sort_entries, LogEntry};
use super::run::{Run, RunId};
use crate::workflow::WorkflowId;

/// Errors raised by run stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("run {0} not found")]
    RunNotFound(RunId),

    #[error("run {0} already exists")]
    DuplicateRun(RunId),

    #[error("store lock poisoned")]
    Poisoned,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Persistence collaborator for runs and their log entries.
pub trait RunStore: Send + Sync {
    /// Stores a new run.
    fn create_run(&self, run: &Run) -> Result<(), StoreError>;

    /// Replaces the stored state of an existing run.
    fn update_run(&self, run: &Run) -> Result<(), StoreError>;

    /// Appends one entry to the log of an existing run.
    fn append_log(&self, entry: &LogEntry) -> Result<(), StoreError>;

    /// Fetches a run by id.
    fn run(&self, id: RunId) -> Result<Option<Run>, StoreError>;

    /// Runs of a workflow, most recent first.
    fn runs_for_workflow(&self, workflow_id: WorkflowId) -> Result<Vec<Run>, StoreError>;

    /// Log of a run in replay order.
    fn logs(&self, run_id: RunId) -> Result<Vec<LogEntry>, StoreError>;

    /// Removes every run of a workflow and their logs. Returns the number of runs removed.
    fn delete_workflow_runs(&self, workflow_id: WorkflowId) -> Result<usize, StoreError>;

    /// Most recent run of a workflow.
    fn latest_run(&self, workflow_id: WorkflowId) -> Result<Option<Run>, StoreError> {
        Ok(self.runs_for_workflow(workflow_id)?.into_iter().next())
    }
}

/// Sorts runs most recent first.
pub(crate) fn sort_latest_first(runs: &mut [Run]) {
    runs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
}

/// Thread-safe in-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    runs: RwLock<HashMap<RunId, Run>>,
    logs: RwLock<HashMap<RunId, Vec<LogEntry>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored runs.
    pub fn run_count(&self) -> usize {
        self.runs.read().map(|runs| runs.len()).unwrap_or(0)
    }
}

impl RunStore for MemoryStore {
    fn create_run(&self, run: &Run) -> Result<(), StoreError> {
        let mut runs = self.runs.write().map_err(|_| StoreError::Poisoned)?;
        if runs.contains_key(&run.id) {
            return Err(StoreError::DuplicateRun(run.id));
        }
        runs.insert(run.id, run.clone());
        Ok(())
    }

    fn update_run(&self, run: &Run) -> Result<(), StoreError> {
        let mut runs = self.runs.write().map_err(|_| StoreError::Poisoned)?;
        let stored = runs.get_mut(&run.id).ok_or(StoreError::RunNotFound(run.id))?;
        *stored = run.clone();
        Ok(())
    }

    fn append_log(&self, entry: &LogEntry) -> Result<(), StoreError> {
        let runs = self.runs.read().map_err(|_| StoreError::Poisoned)?;
        if !runs.contains_key(&entry.run_id) {
            return Err(StoreError::RunNotFound(entry.run_id));
        }

        let mut logs = self.logs.write().map_err(|_| StoreError::Poisoned)?;
        logs.entry(entry.run_id).or_default().push(entry.clone());
        Ok(())
    }

    fn run(&self, id: RunId) -> Result<Option<Run>, StoreError> {
        let runs = self.runs.read().map_err(|_| StoreError::Poisoned)?;
        Ok(runs.get(&id).cloned())
    }

    fn runs_for_workflow(&self, workflow_id: WorkflowId) -> Result<Vec<Run>, StoreError> {
        let runs = self.runs.read().map_err(|_| StoreError::Poisoned)?;
        let mut matching: Vec<Run> = runs
            .values()
            .filter(|r| r.workflow_id == workflow_id)
            .cloned()
            .collect();
        sort_latest_first(&mut matching);
        Ok(matching)
    }

    fn logs(&self, run_id: RunId) -> Result<Vec<LogEntry>, StoreError> {
        let logs = self.logs.read().map_err(|_| StoreError::Poisoned)?;
        let mut entries = logs.get(&run_id).cloned().unwrap_or_default();
        sort_entries(&mut entries);
        Ok(entries)
    }

    fn delete_workflow_runs(&self, workflow_id: WorkflowId) -> Result<usize, StoreError> {
        let mut runs = self.runs.write().map_err(|_| StoreError::Poisoned)?;
        let mut logs = self.logs.write().map_err(|_| StoreError::Poisoned)?;

        let doomed: Vec<RunId> = runs
            .values()
            .filter(|r| r.workflow_id == workflow_id)
            .map(|r| r.id)
            .collect();

        for id in &doomed {
            runs.remove(id);
            logs.remove(id);
        }
        Ok(doomed.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::LogLevel;
    use chrono::Duration;
    use uuid::Uuid;

    #[test]
    fn test_create_and_fetch_run() {
        let store = MemoryStore::new();
        let run = Run::new(Uuid::new_v4());

        store.create_run(&run).unwrap();
        assert_eq!(store.run(run.id).unwrap(), Some(run.clone()));
        assert!(matches!(
            store.create_run(&run),
            Err(StoreError::DuplicateRun(_))
        ));
        assert_eq!(store.run_count(), 1);
    }

    #[test]
    fn test_update_unknown_run() {
        let store = MemoryStore::new();
        let run = Run::new(Uuid::new_v4());

        assert!(matches!(
            store.update_run(&run),
            Err(StoreError::RunNotFound(id)) if id == run.id
        ));
    }

    #[test]
    fn test_append_requires_existing_run() {
        let store = MemoryStore::new();
        let entry = LogEntry::new(Uuid::new_v4(), None, LogLevel::Info, "orphan", 0);

        assert!(matches!(
            store.append_log(&entry),
            Err(StoreError::RunNotFound(_))
        ));
    }

    #[test]
    fn test_logs_are_returned_in_replay_order() {
        let store = MemoryStore::new();
        let run = Run::new(Uuid::new_v4());
        store.create_run(&run).unwrap();

        let late = LogEntry::new(run.id, None, LogLevel::Info, "late", 0);
        let mut early = LogEntry::new(run.id, None, LogLevel::Info, "early", 1);
        early.timestamp = late.timestamp - Duration::seconds(1);

        store.append_log(&late).unwrap();
        store.append_log(&early).unwrap();

        let messages: Vec<String> = store
            .logs(run.id)
            .unwrap()
            .into_iter()
            .map(|e| e.message)
            .collect();
        assert_eq!(messages, vec!["early", "late"]);
    }

    #[test]
    fn test_runs_for_workflow_latest_first() {
        let store = MemoryStore::new();
        let workflow_id = Uuid::new_v4();

        let mut older = Run::new(workflow_id);
        older.started_at = older.started_at - Duration::minutes(5);
        let newer = Run::new(workflow_id);
        let unrelated = Run::new(Uuid::new_v4());

        store.create_run(&older).unwrap();
        store.create_run(&newer).unwrap();
        store.create_run(&unrelated).unwrap();

        let runs = store.runs_for_workflow(workflow_id).unwrap();
        assert_eq!(
            runs.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![newer.id, older.id]
        );
        assert_eq!(store.latest_run(workflow_id).unwrap().map(|r| r.id), Some(newer.id));
    }

    #[test]
    fn test_delete_workflow_runs_cascades_to_logs() {
        let store = MemoryStore::new();
        let workflow_id = Uuid::new_v4();
        let run = Run::new(workflow_id);
        let other = Run::new(Uuid::new_v4());
        store.create_run(&run).unwrap();
        store.create_run(&other).unwrap();
        store
            .append_log(&LogEntry::new(run.id, None, LogLevel::Info, "x", 0))
            .unwrap();

        assert_eq!(store.delete_workflow_runs(workflow_id).unwrap(), 1);
        assert!(store.run(run.id).unwrap().is_none());
        assert!(store.logs(run.id).unwrap().is_empty());
        assert!(store.run(other.id).unwrap().is_some());
    }
}
