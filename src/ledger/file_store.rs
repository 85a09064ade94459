//! File-Backed Run Store
//!
//! Persists every run together with its log as one JSON document under
//! `{root}/runs/{run_id}.json`, so run history survives across invocations
//! of the CLI.
//!
//! Writes go through a temp file and a rename, keeping each update atomic
//! for readers of the same file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::entry::{sort_entries, LogEntry};
use super::run::{Run, RunId};
use super::store::{sort_latest_first, RunStore, StoreError};
use crate::workflow::WorkflowId;

/// Default directory for persisted runs.
pub const DEFAULT_STATE_DIR: &str = ".steprunner";

/// On-disk document for one run.
#[derive(Serialize, Deserialize, Clone, Debug)]
struct RunRecord {
    run: Run,
    #[serde(default)]
    logs: Vec<LogEntry>,
}

/// Run store that keeps one JSON file per run.
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    // Serializes read-modify-write cycles on record files
    guard: Mutex<()>,
}

impl FileStore {
    /// Opens a store rooted at `root`, creating the directory layout if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(root.join("runs"))?;
        debug!("Opened run store at {}", root.display());
        Ok(Self {
            root,
            guard: Mutex::new(()),
        })
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn runs_dir(&self) -> PathBuf {
        self.root.join("runs")
    }

    fn record_path(&self, id: RunId) -> PathBuf {
        self.runs_dir().join(format!("{}.json", id))
    }

    fn read_record(&self, id: RunId) -> Result<Option<RunRecord>, StoreError> {
        match fs::read_to_string(self.record_path(id)) {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_record(&self, record: &RunRecord) -> Result<(), StoreError> {
        let path = self.record_path(record.run.id);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(record)?;
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn all_records(&self) -> Result<Vec<RunRecord>, StoreError> {
        let mut records = Vec::new();
        for entry in fs::read_dir(self.runs_dir())? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let content = fs::read_to_string(&path)?;
            records.push(serde_json::from_str(&content)?);
        }
        Ok(records)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>, StoreError> {
        self.guard.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl RunStore for FileStore {
    fn create_run(&self, run: &Run) -> Result<(), StoreError> {
        let _guard = self.lock()?;
        if self.record_path(run.id).exists() {
            return Err(StoreError::DuplicateRun(run.id));
        }
        self.write_record(&RunRecord {
            run: run.clone(),
            logs: Vec::new(),
        })
    }

    fn update_run(&self, run: &Run) -> Result<(), StoreError> {
        let _guard = self.lock()?;
        let mut record = self
            .read_record(run.id)?
            .ok_or(StoreError::RunNotFound(run.id))?;
        record.run = run.clone();
        self.write_record(&record)
    }

    fn append_log(&self, entry: &LogEntry) -> Result<(), StoreError> {
        let _guard = self.lock()?;
        let mut record = self
            .read_record(entry.run_id)?
            .ok_or(StoreError::RunNotFound(entry.run_id))?;
        record.logs.push(entry.clone());
        self.write_record(&record)
    }

    fn run(&self, id: RunId) -> Result<Option<Run>, StoreError> {
        let _guard = self.lock()?;
        Ok(self.read_record(id)?.map(|r| r.run))
    }

    fn runs_for_workflow(&self, workflow_id: WorkflowId) -> Result<Vec<Run>, StoreError> {
        let _guard = self.lock()?;
        let mut runs: Vec<Run> = self
            .all_records()?
            .into_iter()
            .map(|r| r.run)
            .filter(|r| r.workflow_id == workflow_id)
            .collect();
        sort_latest_first(&mut runs);
        Ok(runs)
    }

    fn logs(&self, run_id: RunId) -> Result<Vec<LogEntry>, StoreError> {
        let _guard = self.lock()?;
        let mut entries = self
            .read_record(run_id)?
            .map(|r| r.logs)
            .unwrap_or_default();
        sort_entries(&mut entries);
        Ok(entries)
    }

    fn delete_workflow_runs(&self, workflow_id: WorkflowId) -> Result<usize, StoreError> {
        let _guard = self.lock()?;
        let mut removed = 0;
        for record in self.all_records()? {
            if record.run.workflow_id == workflow_id {
                fs::remove_file(self.record_path(record.run.id))?;
                removed += 1;
            }
        }
        if removed > 0 {
            info!("Deleted {} run(s) of workflow {}", removed, workflow_id);
        }
        Ok(removed)
    }
}
