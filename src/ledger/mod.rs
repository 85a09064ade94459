//! Run Ledger Module
//!
//! Records what happened during workflow runs.
//!
//! # Structure
//!
//! - [`run`]: Run records and the status state machine
//! - [`entry`]: Log entries and their replay order
//! - [`store`]: The [`RunStore`] persistence trait and an in-memory store
//! - [`file_store`]: JSON file persistence
//! - [`recorder`]: The per-run [`RunLedger`] write handle
//! - [`report`]: Text rendering and per-step timings

pub mod entry;
pub mod file_store;
pub mod recorder;
pub mod report;
pub mod run;
pub mod store;

pub use entry::{LogEntry, LogLevel};
pub use file_store::{FileStore, DEFAULT_STATE_DIR};
pub use recorder::RunLedger;
pub use report::{format_entry, render_run, step_durations};
pub use run::{Run, RunError, RunId, RunStatus};
pub use store::{MemoryStore, RunStore, StoreError};
