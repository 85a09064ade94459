//! Workflow Parser
//!
//! Loads and saves workflow definitions as YAML files. Deserializing a
//! [`Workflow`] normalizes step positions, so a definition may list steps
//! without positions (list order is used), out of order, or with sparse ones.

use std::error::Error;
use std::fs;
use std::path::Path;

use log::{debug, info};

use super::model::Workflow;

/// Parses a workflow definition from YAML text.
///
/// Positions are renumbered to `1..=len`. The workflow id stays nil when the
/// definition does not carry one; see [`Workflow::ensure_id`].
pub fn parse_workflow(yaml_content: &str) -> Result<Workflow, Box<dyn Error>> {
    let workflow: Workflow = serde_yaml::from_str(yaml_content).map_err(|e| {
        format!(
            "Failed to parse workflow YAML: {}. Check the file format.",
            e
        )
    })?;

    info!(
        "Parsed workflow '{}' with {} steps",
        workflow.name,
        workflow.len()
    );
    Ok(workflow)
}

/// Loads a workflow from a YAML file.
///
/// # Example
///
/// ```rust,no_run
/// use steprunner::workflow::load_workflow;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let workflow = load_workflow("health-check.yaml")?;
///     println!("Loaded {} steps", workflow.len());
///     Ok(())
/// }
/// ```
pub fn load_workflow(path: impl AsRef<Path>) -> Result<Workflow, Box<dyn Error>> {
    let path = path.as_ref();
    info!("Loading workflow from: {}", path.display());

    let yaml_content = fs::read_to_string(path).map_err(|e| {
        format!(
            "Failed to read workflow file '{}': {}. Check that the file exists and is readable.",
            path.display(),
            e
        )
    })?;

    debug!("YAML content loaded ({} bytes)", yaml_content.len());
    parse_workflow(&yaml_content)
}

/// Saves a workflow to a YAML file.
pub fn save_workflow(workflow: &Workflow, path: impl AsRef<Path>) -> Result<(), Box<dyn Error>> {
    let path = path.as_ref();
    let yaml_content = serde_yaml::to_string(workflow)?;
    fs::write(path, yaml_content)?;
    info!("Workflow saved to: {}", path.display());
    Ok(())
}
