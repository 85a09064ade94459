//! Delay Executor
//!
//! Pauses the run for the configured number of seconds, capped to a ceiling.

use std::thread;
use std::time::Duration;

use log::debug;

use super::config::{RunnerConfig, DEFAULT_MAX_DELAY_SECONDS};
use super::executor::{ExecutorError, StepExecutor};
use crate::ledger::RunLedger;
use crate::workflow::config::{config_value, json_type_name, numeric_value, SECONDS_KEY};
use crate::workflow::{Step, StepKind};

/// Executor for `delay` steps.
#[derive(Debug, Clone)]
pub struct DelayExecutor {
    max_seconds: f64,
}

impl DelayExecutor {
    pub fn new(max_seconds: f64) -> Self {
        Self { max_seconds }
    }

    pub fn from_config(config: &RunnerConfig) -> Self {
        Self::new(config.max_delay_seconds)
    }

    pub fn max_seconds(&self) -> f64 {
        self.max_seconds
    }
}

impl Default for DelayExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DELAY_SECONDS)
    }
}

impl StepExecutor for DelayExecutor {
    fn kind(&self) -> StepKind {
        StepKind::Delay
    }

    fn execute(&self, step: &Step, ledger: &RunLedger<'_>) -> Result<bool, ExecutorError> {
        let Some(value) = config_value(&step.config, SECONDS_KEY) else {
            ledger.error(
                Some(step),
                "Delay step missing required 'seconds' parameter in config",
            )?;
            return Ok(false);
        };

        let Some(mut seconds) = numeric_value(value) else {
            ledger.error(
                Some(step),
                format!(
                    "Delay 'seconds' must be numeric, got: {}",
                    json_type_name(value)
                ),
            )?;
            return Ok(false);
        };

        if seconds < 0.0 {
            ledger.error(
                Some(step),
                format!("Delay 'seconds' cannot be negative: {}", seconds),
            )?;
            return Ok(false);
        }

        if seconds > self.max_seconds {
            ledger.warn(
                Some(step),
                format!(
                    "Requested delay of {}s exceeds maximum. Capped to {}s",
                    seconds, self.max_seconds
                ),
            )?;
            seconds = self.max_seconds;
        }

        ledger.info(Some(step), format!("Starting delay for {} second(s)", seconds))?;

        let duration = match Duration::try_from_secs_f64(seconds) {
            Ok(duration) => duration,
            Err(e) => {
                ledger.error(Some(step), format!("Delay execution failed: {}", e))?;
                return Ok(false);
            }
        };

        debug!("Sleeping for {:?}", duration);
        thread::sleep(duration);

        ledger.info(
            Some(step),
            format!("Delay completed successfully ({}s)", seconds),
        )?;
        Ok(true)
    }
}
