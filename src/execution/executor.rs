//! Step Executor Capability
//!
//! An executor performs the work of one step kind. Executors report expected
//! failures as `Ok(false)` after logging why; `Err` is reserved for problems
//! the runner must handle itself, such as a failed ledger write.

use thiserror::Error;

use crate::ledger::{RunLedger, StoreError};
use crate::workflow::{Step, StepKind};

/// Unexpected failures escaping an executor.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("failed to record log entry: {0}")]
    Ledger(#[from] StoreError),

    #[error("{0}")]
    Failed(String),
}

/// Performs the work of one step kind.
///
/// # Example
///
/// ```rust
/// use steprunner::execution::{ExecutorError, StepExecutor};
/// use steprunner::ledger::RunLedger;
/// use steprunner::workflow::{Step, StepKind};
///
/// struct Noop;
///
/// impl StepExecutor for Noop {
///     fn kind(&self) -> StepKind {
///         StepKind::from("noop")
///     }
///
///     fn execute(&self, step: &Step, ledger: &RunLedger<'_>) -> Result<bool, ExecutorError> {
///         ledger.info(Some(step), "Nothing to do")?;
///         Ok(true)
///     }
/// }
/// ```
pub trait StepExecutor: Send + Sync {
    /// Kind this executor is registered under.
    fn kind(&self) -> StepKind;

    /// Returns true if this executor handles `kind`.
    fn supports(&self, kind: &StepKind) -> bool {
        self.kind() == *kind
    }

    /// Runs the step, logging through `ledger`.
    ///
    /// Returns `Ok(true)` on success and `Ok(false)` on step failure.
    fn execute(&self, step: &Step, ledger: &RunLedger<'_>) -> Result<bool, ExecutorError>;
}
