//! Workflow Definition Module
//!
//! Provides data structures and utilities for defining, ordering,
//! loading, and validating workflows.
//!
//! # Structure
//!
//! - [`model`]: Core data structures (Workflow, Step, StepKind)
//! - [`config`]: Reading the configuration keys of built-in step kinds
//! - [`ordering`]: Position management (insert, move, delete, normalize)
//! - [`parser`]: YAML loading and saving
//! - [`validator`]: Creation-time validation rules

pub mod config;
pub mod model;
pub mod ordering;
pub mod parser;
pub mod validator;

pub use config::StepConfig;
pub use model::{Step, StepId, StepKind, Workflow, WorkflowError, WorkflowId};
pub use parser::{load_workflow, parse_workflow, save_workflow};
pub use validator::{validate_workflow, ValidationError};
