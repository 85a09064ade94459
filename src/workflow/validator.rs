//! Workflow Validation
//!
//! Checks applied when workflows and steps are created or edited:
//! - Workflow name and description limits
//! - Step kind must be a built-in kind
//! - Required configuration keys per kind and their accepted ranges
//! - Insert positions start at 1
//!
//! The runner does not call into this module. Executors repeat the checks
//! they depend on at run time and report failures through the run log.

use log::{debug, info};
use thiserror::Error;

use super::config::{
    config_value, numeric_value, parse_http_url, StepConfig, UrlError, SECONDS_KEY, URL_KEY,
};
use super::model::{StepKind, Workflow};

/// Maximum length of a workflow name.
pub const MAX_NAME_LEN: usize = 255;

/// Maximum length of a workflow description.
pub const MAX_DESCRIPTION_LEN: usize = 1000;

/// Largest delay accepted when a step is created. Longer delays are still
/// capped at run time.
pub const MAX_CONFIGURED_DELAY_SECONDS: f64 = 10.0;

/// Maximum length of an HTTP check URL.
pub const MAX_URL_LEN: usize = 500;

/// Validation error types for user-friendly error messages.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Workflow name is required")]
    EmptyName,

    #[error("Workflow name must not exceed {max} characters")]
    NameTooLong { max: usize },

    #[error("Workflow description must not exceed {max} characters")]
    DescriptionTooLong { max: usize },

    #[error("Unknown step type '{0}'")]
    UnknownKind(String),

    #[error("Step type '{kind}' requires config.{key}")]
    MissingConfig { kind: String, key: &'static str },

    #[error("config.{key} must be numeric")]
    NotNumeric { key: &'static str },

    #[error("config.{key} must be between {min} and {max}, got {value}")]
    OutOfRange {
        key: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },

    #[error("config.url: {0}")]
    Url(#[from] UrlError),

    #[error("config.url must not exceed {max} characters")]
    UrlTooLong { max: usize },

    #[error("Step position must be at least 1, got {0}")]
    InvalidPosition(u32),
}

/// Validates workflow name and description.
pub fn validate_details(name: &str, description: Option<&str>) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if name.trim().is_empty() {
        errors.push(ValidationError::EmptyName);
    } else if name.chars().count() > MAX_NAME_LEN {
        errors.push(ValidationError::NameTooLong { max: MAX_NAME_LEN });
    }

    if description.is_some_and(|d| d.chars().count() > MAX_DESCRIPTION_LEN) {
        errors.push(ValidationError::DescriptionTooLong {
            max: MAX_DESCRIPTION_LEN,
        });
    }

    errors
}

/// Validates a step's kind and configuration.
pub fn validate_step(kind: &StepKind, config: &StepConfig) -> Vec<ValidationError> {
    match kind {
        StepKind::Delay => validate_delay(config),
        StepKind::HttpCheck => validate_http_check(config),
        StepKind::Custom(name) => vec![ValidationError::UnknownKind(name.clone())],
    }
}

/// Validates an explicit insert position.
pub fn validate_position(position: Option<u32>) -> Vec<ValidationError> {
    match position {
        Some(0) => vec![ValidationError::InvalidPosition(0)],
        _ => Vec::new(),
    }
}

fn validate_delay(config: &StepConfig) -> Vec<ValidationError> {
    let Some(value) = config_value(config, SECONDS_KEY) else {
        return vec![ValidationError::MissingConfig {
            kind: StepKind::Delay.to_string(),
            key: SECONDS_KEY,
        }];
    };

    let Some(seconds) = numeric_value(value) else {
        return vec![ValidationError::NotNumeric { key: SECONDS_KEY }];
    };

    if !(0.0..=MAX_CONFIGURED_DELAY_SECONDS).contains(&seconds) {
        return vec![ValidationError::OutOfRange {
            key: SECONDS_KEY,
            min: 0.0,
            max: MAX_CONFIGURED_DELAY_SECONDS,
            value: seconds,
        }];
    }

    Vec::new()
}

fn validate_http_check(config: &StepConfig) -> Vec<ValidationError> {
    let Some(value) = config_value(config, URL_KEY) else {
        return vec![ValidationError::MissingConfig {
            kind: StepKind::HttpCheck.to_string(),
            key: URL_KEY,
        }];
    };

    let mut errors = Vec::new();

    if value.as_str().is_some_and(|url| url.chars().count() > MAX_URL_LEN) {
        errors.push(ValidationError::UrlTooLong { max: MAX_URL_LEN });
    }

    if let Err(e) = parse_http_url(value) {
        errors.push(e.into());
    }

    errors
}

/// Validates the workflow details and every step.
///
/// All problems are collected rather than stopping at the first one.
pub fn validate_workflow(workflow: &Workflow) -> Result<(), Vec<ValidationError>> {
    info!("Validating workflow '{}' with {} steps", workflow.name, workflow.len());

    let mut all_errors = validate_details(&workflow.name, workflow.description.as_deref());

    for step in workflow.steps() {
        let errors = validate_step(&step.kind, &step.config);
        if !errors.is_empty() {
            debug!(
                "Step {} ({}) has {} problem(s)",
                step.position,
                step.kind,
                errors.len()
            );
        }
        all_errors.extend(errors);
    }

    if all_errors.is_empty() {
        Ok(())
    } else {
        Err(all_errors)
    }
}
