//! Run Ledger
//!
//! Write handle bound to one run. Executors and the runner record events
//! through it; every entry is persisted immediately and mirrored to the
//! process log.

use std::cell::Cell;

use log::{error, info, warn};

use super::entry::{LogEntry, LogLevel};
use super::run::RunId;
use super::store::{RunStore, StoreError};
use crate::workflow::Step;

/// Append-only log of a single run.
pub struct RunLedger<'a> {
    run_id: RunId,
    store: &'a dyn RunStore,
    sequence: Cell<u64>,
}

impl<'a> RunLedger<'a> {
    pub fn new(run_id: RunId, store: &'a dyn RunStore) -> Self {
        Self {
            run_id,
            store,
            sequence: Cell::new(0),
        }
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Appends an entry and returns it.
    pub fn record(
        &self,
        step: Option<&Step>,
        level: LogLevel,
        message: impl Into<String>,
    ) -> Result<LogEntry, StoreError> {
        let sequence = self.sequence.get();
        let entry = LogEntry::new(self.run_id, step, level, message, sequence);
        self.store.append_log(&entry)?;
        self.sequence.set(sequence + 1);

        match level {
            LogLevel::Info => info!("[run {}] {}", self.run_id, entry.message),
            LogLevel::Warn => warn!("[run {}] {}", self.run_id, entry.message),
            LogLevel::Error => error!("[run {}] {}", self.run_id, entry.message),
        }
        Ok(entry)
    }

    pub fn info(&self, step: Option<&Step>, message: impl Into<String>) -> Result<(), StoreError> {
        self.record(step, LogLevel::Info, message).map(|_| ())
    }

    pub fn warn(&self, step: Option<&Step>, message: impl Into<String>) -> Result<(), StoreError> {
        self.record(step, LogLevel::Warn, message).map(|_| ())
    }

    pub fn error(&self, step: Option<&Step>, message: impl Into<String>) -> Result<(), StoreError> {
        self.record(step, LogLevel::Error, message).map(|_| ())
    }
}
