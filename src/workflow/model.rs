//! Workflow Data Model
//!
//! Core data structures representing a workflow and its ordered steps.
//!
//! # Example YAML Format
//!
//! ```yaml
//! name: Health Check Workflow
//! description: Wait a moment, then check the service
//! steps:
//!   - kind: delay
//!     config:
//!       seconds: 1
//!
//!   - kind: http_check
//!     config:
//!       url: https://example.com/health
//! ```

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

use super::config::{StepConfig, SECONDS_KEY, URL_KEY};

/// Identity of a workflow.
pub type WorkflowId = Uuid;

/// Identity of a step.
pub type StepId = Uuid;

/// The kind of a step, which selects the executor that runs it.
///
/// The built-in kinds are closed; `Custom` carries the name of a kind
/// provided by an executor registered at run time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StepKind {
    /// Pause for a configured number of seconds
    Delay,
    /// Issue a GET request and judge the status code
    HttpCheck,
    /// A kind handled by an extension executor
    Custom(String),
}

impl StepKind {
    /// Built-in kinds, in display order.
    pub const BUILTIN: [StepKind; 2] = [StepKind::Delay, StepKind::HttpCheck];

    /// Machine name used in files and logs.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Delay => "delay",
            Self::HttpCheck => "http_check",
            Self::Custom(name) => name,
        }
    }

    /// Human-readable name.
    pub fn label(&self) -> &str {
        match self {
            Self::Delay => "Delay",
            Self::HttpCheck => "HTTP Check",
            Self::Custom(name) => name,
        }
    }

    pub fn is_builtin(&self) -> bool {
        !matches!(self, Self::Custom(_))
    }
}

impl From<String> for StepKind {
    fn from(name: String) -> Self {
        match name.trim() {
            "delay" => Self::Delay,
            "http_check" => Self::HttpCheck,
            other => Self::Custom(other.to_string()),
        }
    }
}

impl From<&str> for StepKind {
    fn from(name: &str) -> Self {
        Self::from(name.to_string())
    }
}

impl From<StepKind> for String {
    fn from(kind: StepKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents a single step in a workflow.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Step {
    /// Unique identifier for this step
    #[serde(default = "Uuid::new_v4")]
    pub id: StepId,

    /// Workflow that owns this step (implied by nesting in files)
    #[serde(skip)]
    pub workflow_id: WorkflowId,

    /// Kind of step, selects the executor
    pub kind: StepKind,

    /// Kind-specific configuration
    #[serde(default)]
    pub config: StepConfig,

    /// 1-based position within the workflow; 0 until the step is placed
    #[serde(default)]
    pub position: u32,
}

impl Step {
    /// Creates an unplaced step of the given kind with an empty configuration.
    ///
    /// # Example
    ///
    /// ```
    /// use serde_json::json;
    /// use steprunner::workflow::{Step, StepKind};
    ///
    /// let step = Step::new("webhook").with_config("target", json!("ops"));
    /// assert_eq!(step.kind, StepKind::Custom("webhook".to_string()));
    /// ```
    pub fn new(kind: impl Into<StepKind>) -> Self {
        Self {
            id: Uuid::new_v4(),
            workflow_id: Uuid::nil(),
            kind: kind.into(),
            config: StepConfig::new(),
            position: 0,
        }
    }

    /// Creates a `delay` step.
    pub fn delay(seconds: f64) -> Self {
        Self::new(StepKind::Delay).with_config(SECONDS_KEY, json!(seconds))
    }

    /// Creates an `http_check` step.
    pub fn http_check(url: impl Into<String>) -> Self {
        Self::new(StepKind::HttpCheck).with_config(URL_KEY, Value::String(url.into()))
    }

    /// Sets one configuration key.
    pub fn with_config(mut self, key: impl Into<String>, value: Value) -> Self {
        self.config.insert(key.into(), value);
        self
    }

    /// Replaces the whole configuration.
    pub fn with_config_map(mut self, config: StepConfig) -> Self {
        self.config = config;
        self
    }
}

/// Errors raised by workflow mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("step {0} not found in workflow")]
    StepNotFound(StepId),

    #[error("no step at position {0}")]
    NoStepAtPosition(u32),

    #[error("step {0} already belongs to this workflow")]
    DuplicateStep(StepId),

    #[error("invalid position {0}: positions start at 1")]
    InvalidPosition(u32),
}

/// Represents a complete workflow with its ordered steps.
///
/// Steps are kept sorted by position, and positions always form the dense
/// sequence `1..=len`. All mutations that touch positions live in
/// [`super::ordering`]. Deserialized workflows are normalized the same way,
/// and duplicate step ids are rejected.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(try_from = "WorkflowDefinition")]
pub struct Workflow {
    /// Unique identifier; nil for definitions that have not been assigned one yet
    pub id: WorkflowId,

    /// Display name
    pub name: String,

    /// Optional free-text description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub(crate) steps: Vec<Step>,
}

/// Workflow as written in files, before positions are normalized.
#[derive(Deserialize)]
struct WorkflowDefinition {
    #[serde(default)]
    id: WorkflowId,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    steps: Vec<Step>,
}

impl TryFrom<WorkflowDefinition> for Workflow {
    type Error = WorkflowError;

    fn try_from(definition: WorkflowDefinition) -> Result<Self, Self::Error> {
        let mut seen = HashSet::new();
        if let Some(dupe) = definition.steps.iter().find(|s| !seen.insert(s.id)) {
            return Err(WorkflowError::DuplicateStep(dupe.id));
        }

        let mut workflow = Workflow {
            id: definition.id,
            name: definition.name,
            description: definition.description,
            steps: definition.steps,
        };
        workflow.normalize_positions();
        Ok(workflow)
    }
}

impl Workflow {
    /// Creates a new empty workflow.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into().trim().to_string(),
            description: None,
            steps: Vec::new(),
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Creates a workflow from steps given in execution order.
    pub fn from_steps(name: impl Into<String>, steps: Vec<Step>) -> Self {
        let mut workflow = Self::new(name);
        for (index, mut step) in steps.into_iter().enumerate() {
            step.position = index as u32 + 1;
            step.workflow_id = workflow.id;
            workflow.steps.push(step);
        }
        workflow
    }

    /// Assigns a fresh identity if this workflow has none.
    ///
    /// Returns true when an identity was assigned.
    pub fn ensure_id(&mut self) -> bool {
        if !self.id.is_nil() {
            return false;
        }
        self.id = Uuid::new_v4();
        self.attach_steps();
        true
    }

    /// Points every step at this workflow.
    pub(crate) fn attach_steps(&mut self) {
        let id = self.id;
        for step in &mut self.steps {
            step.workflow_id = id;
        }
    }

    /// Updates the name and description.
    pub fn update_details(&mut self, name: impl Into<String>, description: Option<String>) {
        self.name = name.into().trim().to_string();
        self.description = description;
    }

    /// Steps in ascending position order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Gets a step by ID.
    pub fn get_step(&self, id: StepId) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Gets the step at a 1-based position.
    pub fn step_at(&self, position: u32) -> Option<&Step> {
        self.steps.iter().find(|s| s.position == position)
    }

    /// Replaces the kind and configuration of a step, keeping its position.
    pub fn update_step(
        &mut self,
        id: StepId,
        kind: StepKind,
        config: StepConfig,
    ) -> Result<(), WorkflowError> {
        let step = self
            .steps
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(WorkflowError::StepNotFound(id))?;

        step.kind = kind;
        step.config = config;
        Ok(())
    }

    /// Returns the number of steps in the workflow.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true if the workflow has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
