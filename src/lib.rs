//! StepRunner - Sequential Workflow Runner
//!
//! Runs workflows made of ordered steps (timed delays, HTTP health checks,
//! or executors registered by the embedding application) one after another,
//! stopping at the first failure. Every run keeps a leveled, timestamped
//! log that can be replayed after the fact.
//!
//! # Architecture
//!
//! The library is organized into three modules:
//!
//! - [`workflow`]: Workflow and step definitions, ordering, validation, YAML files
//! - [`execution`]: Step executors, the executor registry and the runner
//! - [`ledger`]: Runs, log entries, run stores and reports
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use steprunner::execution::{ExecutorRegistry, WorkflowRunner};
//! use steprunner::ledger::{FileStore, RunStore};
//! use steprunner::load_workflow;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Load a workflow from YAML
//!     let workflow = load_workflow("health-check.yaml")?;
//!
//!     // Persist runs under .steprunner/
//!     let store = Arc::new(FileStore::open(".steprunner")?);
//!     let runner = WorkflowRunner::new(ExecutorRegistry::new(), store.clone());
//!
//!     // Execute the workflow
//!     let run = runner.execute(&workflow)?;
//!     for entry in store.logs(run.id)? {
//!         println!("{} {}", entry.level.label(), entry.message);
//!     }
//!     Ok(())
//! }
//! ```

pub mod execution;
pub mod ledger;
pub mod workflow;

// Re-export commonly used types
pub use execution::{ExecutorRegistry, RunnerConfig, StepExecutor, WorkflowRunner};
pub use ledger::{LogEntry, LogLevel, Run, RunStatus, RunStore};
pub use workflow::model::{Step, StepKind, Workflow};
pub use workflow::parser::load_workflow;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "StepRunner";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_version() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }

    #[test]
    fn test_app_name() {
        assert_eq!(APP_NAME, "StepRunner");
    }

    #[test]
    fn test_module_exports_step() {
        let step = Step::delay(1.0);
        assert_eq!(step.kind, StepKind::Delay);
        assert_eq!(step.position, 0);
    }

    #[test]
    fn test_module_exports_workflow() {
        let workflow = Workflow::new("empty");
        assert!(workflow.is_empty());
    }

    #[test]
    fn test_version_format() {
        let parts: Vec<&str> = VERSION.split('.').collect();
        assert!(parts.len() >= 2, "Version should have at least major.minor");
        for part in parts {
            assert!(part.parse::<u32>().is_ok(), "Version components should be numeric");
        }
    }
}
