//! Workflow Execution Module
//!
//! Runs workflow steps in order and records the outcome.
//!
//! # Architecture
//!
//! - [`runner`]: The sequential runner and its run lifecycle
//! - [`registry`]: Step kind to executor lookup
//! - [`executor`]: The [`StepExecutor`] capability
//! - [`delay`], [`http_check`]: Built-in executors
//! - [`config`]: Limits shared by the built-in executors

pub mod config;
pub mod delay;
pub mod executor;
pub mod http_check;
pub mod registry;
pub mod runner;

pub use config::RunnerConfig;
pub use delay::DelayExecutor;
pub use executor::{ExecutorError, StepExecutor};
pub use http_check::HttpCheckExecutor;
pub use registry::{ExecutorRegistry, RegistryError};
pub use runner::WorkflowRunner;
