//! Workflow Runner
//!
//! Executes the steps of a workflow one at a time in position order,
//! stopping at the first failure. Each execution is recorded as a [`Run`]
//! with a log trail in the runner's [`RunStore`].
//!
//! # Lifecycle
//!
//! 1. A pending run is created and stored, then moved to running
//! 2. Steps are resolved against the registry and executed in order
//! 3. The run ends as succeeded, or failed at the first unknown kind,
//!    failing step or unexpected error
//!
//! Once the run record exists, errors never escape [`WorkflowRunner::execute`];
//! they end up in the run's log and status.

use std::sync::Arc;

use log::{error, info};
use thiserror::Error;

use super::executor::ExecutorError;
use super::registry::ExecutorRegistry;
use crate::ledger::{Run, RunError, RunLedger, RunStatus, RunStore, StoreError};
use crate::workflow::Workflow;

/// Failures that abort a run from inside.
#[derive(Debug, Error)]
enum RunnerError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Executor(#[from] ExecutorError),

    #[error(transparent)]
    Transition(#[from] RunError),
}

/// Sequential workflow runner.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use steprunner::execution::{ExecutorRegistry, WorkflowRunner};
/// use steprunner::ledger::MemoryStore;
/// use steprunner::workflow::{Step, Workflow};
///
/// let workflow = Workflow::from_steps(
///     "Health Check",
///     vec![Step::delay(0.5), Step::http_check("https://example.com")],
/// );
///
/// let runner = WorkflowRunner::new(ExecutorRegistry::new(), Arc::new(MemoryStore::new()));
/// let run = runner.execute(&workflow)?;
/// println!("{} in {}", run.status.label(), run.formatted_duration());
/// # Ok::<(), steprunner::ledger::StoreError>(())
/// ```
pub struct WorkflowRunner {
    registry: ExecutorRegistry,
    store: Arc<dyn RunStore>,
}

impl WorkflowRunner {
    pub fn new(registry: ExecutorRegistry, store: Arc<dyn RunStore>) -> Self {
        Self { registry, store }
    }

    pub fn registry(&self) -> &ExecutorRegistry {
        &self.registry
    }

    /// Mutable access for registering or substituting executors.
    pub fn registry_mut(&mut self) -> &mut ExecutorRegistry {
        &mut self.registry
    }

    pub fn store(&self) -> &Arc<dyn RunStore> {
        &self.store
    }

    /// Executes the workflow and returns the finished run.
    ///
    /// The steps are read through a shared borrow for the whole run, so the
    /// step list cannot change while it executes.
    ///
    /// # Errors
    ///
    /// Only when the run record itself cannot be stored. Every later
    /// problem is recorded in the run's log and ends it as failed.
    pub fn execute(&self, workflow: &Workflow) -> Result<Run, StoreError> {
        let mut run = Run::new(workflow.id);
        self.store.create_run(&run)?;
        info!(
            "Created run {} for workflow '{}' ({})",
            run.id, workflow.name, workflow.id
        );

        let ledger = RunLedger::new(run.id, self.store.as_ref());

        let outcome = match self.drive(workflow, &mut run, &ledger) {
            Ok(status) => status,
            Err(e) => {
                if let Err(log_err) = ledger.error(
                    None,
                    format!("Workflow execution failed with exception: {}", e),
                ) {
                    error!("Failed to record failure of run {}: {}", run.id, log_err);
                }
                RunStatus::Failed
            }
        };

        self.finish(&mut run, outcome);
        Ok(run)
    }

    /// Moves the run to running and executes the steps.
    ///
    /// Returns the terminal status the run should end in.
    fn drive(
        &self,
        workflow: &Workflow,
        run: &mut Run,
        ledger: &RunLedger<'_>,
    ) -> Result<RunStatus, RunnerError> {
        run.mark_started()?;
        self.store.update_run(run)?;

        let steps = workflow.steps();
        if steps.is_empty() {
            ledger.warn(None, "Workflow has no steps to execute")?;
            return Ok(RunStatus::Succeeded);
        }

        ledger.info(
            None,
            format!("Starting workflow execution with {} step(s)", steps.len()),
        )?;

        for step in steps {
            let Some(executor) = self.registry.resolve(&step.kind) else {
                ledger.error(
                    Some(step),
                    format!(
                        "Unknown step type '{}'. No executor available.",
                        step.kind
                    ),
                )?;
                return Ok(RunStatus::Failed);
            };

            ledger.info(
                Some(step),
                format!("Executing step: {} (order: {})", step.kind, step.position),
            )?;

            if !executor.execute(step, ledger)? {
                ledger.error(Some(step), "Step execution failed. Stopping workflow.")?;
                return Ok(RunStatus::Failed);
            }
        }

        ledger.info(None, "Workflow completed successfully")?;
        Ok(RunStatus::Succeeded)
    }

    /// Applies the terminal status and persists it.
    fn finish(&self, run: &mut Run, status: RunStatus) {
        let transition = match status {
            RunStatus::Succeeded => run.mark_succeeded(),
            _ => run.mark_failed(),
        };
        if let Err(e) = transition {
            error!("Could not finish run {}: {}", run.id, e);
            return;
        }

        if let Err(e) = self.store.update_run(run) {
            error!("Failed to store final state of run {}: {}", run.id, e);
        }

        info!(
            "Run {} finished: {} ({})",
            run.id,
            run.status.label(),
            run.formatted_duration()
        );
    }
}
