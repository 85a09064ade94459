//! Executor Registry
//!
//! Maps each step kind to the one executor that runs it. The built-in
//! executors are created lazily from the registry's [`RunnerConfig`] the
//! first time the registry is used.
//!
//! # Example
//!
//! ```rust
//! use steprunner::execution::ExecutorRegistry;
//! use steprunner::workflow::StepKind;
//!
//! let registry = ExecutorRegistry::new();
//! assert!(registry.resolve(&StepKind::Delay).is_some());
//! assert!(registry.resolve(&StepKind::from("webhook")).is_none());
//! ```

use std::collections::HashMap;
use std::fmt;

use log::debug;
use once_cell::sync::OnceCell;
use thiserror::Error;

use super::config::RunnerConfig;
use super::delay::DelayExecutor;
use super::executor::StepExecutor;
use super::http_check::HttpCheckExecutor;
use crate::workflow::StepKind;

type ExecutorMap = HashMap<StepKind, Box<dyn StepExecutor>>;

/// Errors raised when changing the registered executors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("an executor for step kind '{0}' is already registered")]
    DuplicateKind(StepKind),
}

/// One-executor-per-kind lookup table.
pub struct ExecutorRegistry {
    config: RunnerConfig,
    executors: OnceCell<ExecutorMap>,
}

impl ExecutorRegistry {
    /// Creates a registry with the built-in executors and default limits.
    pub fn new() -> Self {
        Self::with_config(RunnerConfig::default())
    }

    /// Creates a registry whose built-in executors use `config`.
    pub fn with_config(config: RunnerConfig) -> Self {
        Self {
            config,
            executors: OnceCell::new(),
        }
    }

    /// Creates a registry without any executors.
    pub fn empty() -> Self {
        Self {
            config: RunnerConfig::default(),
            executors: OnceCell::with_value(HashMap::new()),
        }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    fn executors(&self) -> &ExecutorMap {
        self.executors
            .get_or_init(|| default_executors(&self.config))
    }

    /// Runs `f` against the executor map, initializing the defaults first if needed.
    fn update<R>(&mut self, f: impl FnOnce(&mut ExecutorMap) -> R) -> R {
        let mut executors = self
            .executors
            .take()
            .unwrap_or_else(|| default_executors(&self.config));
        let result = f(&mut executors);
        self.executors = OnceCell::with_value(executors);
        result
    }

    /// Returns the executor for `kind`, if any.
    pub fn resolve(&self, kind: &StepKind) -> Option<&dyn StepExecutor> {
        self.executors()
            .get(kind)
            .filter(|executor| executor.supports(kind))
            .map(|executor| executor.as_ref())
    }

    /// Adds an executor for a kind that has none yet.
    pub fn register(&mut self, executor: Box<dyn StepExecutor>) -> Result<(), RegistryError> {
        let kind = executor.kind();
        self.update(|executors| {
            if executors.contains_key(&kind) {
                return Err(RegistryError::DuplicateKind(kind));
            }
            debug!("Registered executor for step kind '{}'", kind);
            executors.insert(kind, executor);
            Ok(())
        })
    }

    /// Installs an executor, returning the one it displaced.
    pub fn replace(&mut self, executor: Box<dyn StepExecutor>) -> Option<Box<dyn StepExecutor>> {
        let kind = executor.kind();
        debug!("Replacing executor for step kind '{}'", kind);
        self.update(|executors| executors.insert(kind, executor))
    }

    /// Removes the executor for `kind`.
    pub fn unregister(&mut self, kind: &StepKind) -> Option<Box<dyn StepExecutor>> {
        self.update(|executors| executors.remove(kind))
    }

    /// Removes every executor, built-ins included.
    pub fn clear(&mut self) {
        self.executors = OnceCell::with_value(HashMap::new());
    }

    /// Drops all changes; the built-in executors are recreated on next use.
    pub fn reset(&mut self) {
        self.executors = OnceCell::new();
    }

    /// Registered kinds, sorted by name.
    pub fn kinds(&self) -> Vec<StepKind> {
        let mut kinds: Vec<StepKind> = self.executors().keys().cloned().collect();
        kinds.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        kinds
    }

    pub fn contains(&self, kind: &StepKind) -> bool {
        self.executors().contains_key(kind)
    }

    pub fn len(&self) -> usize {
        self.executors().len()
    }

    pub fn is_empty(&self) -> bool {
        self.executors().is_empty()
    }
}

impl Default for ExecutorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ExecutorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kinds: Option<Vec<&str>> = self
            .executors
            .get()
            .map(|executors| executors.keys().map(|k| k.as_str()).collect());
        f.debug_struct("ExecutorRegistry")
            .field("config", &self.config)
            .field("kinds", &kinds)
            .finish()
    }
}

fn default_executors(config: &RunnerConfig) -> ExecutorMap {
    debug!("Initializing built-in step executors");
    let builtins: [Box<dyn StepExecutor>; 2] = [
        Box::new(DelayExecutor::from_config(config)),
        Box::new(HttpCheckExecutor::from_config(config)),
    ];
    builtins
        .into_iter()
        .map(|executor| (executor.kind(), executor))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::ExecutorError;
    use crate::ledger::RunLedger;
    use crate::workflow::Step;

    struct Fixed {
        kind: StepKind,
        outcome: bool,
    }

    impl StepExecutor for Fixed {
        fn kind(&self) -> StepKind {
            self.kind.clone()
        }

        fn execute(&self, _step: &Step, _ledger: &RunLedger<'_>) -> Result<bool, ExecutorError> {
            Ok(self.outcome)
        }
    }

    fn fixed(kind: impl Into<StepKind>, outcome: bool) -> Box<dyn StepExecutor> {
        Box::new(Fixed {
            kind: kind.into(),
            outcome,
        })
    }

    #[test]
    fn test_lazy_defaults() {
        let registry = ExecutorRegistry::new();
        assert!(registry.executors.get().is_none());

        assert!(registry.resolve(&StepKind::Delay).is_some());
        assert!(registry.resolve(&StepKind::HttpCheck).is_some());
        assert!(registry.executors.get().is_some());
        assert_eq!(registry.kinds(), vec![StepKind::Delay, StepKind::HttpCheck]);
    }

    #[test]
    fn test_unknown_kind() {
        let registry = ExecutorRegistry::new();
        assert!(registry.resolve(&StepKind::from("webhook")).is_none());
    }

    #[test]
    fn test_register_extension() {
        let mut registry = ExecutorRegistry::new();
        registry.register(fixed("webhook", true)).unwrap();

        assert_eq!(registry.len(), 3);
        assert!(registry.contains(&StepKind::from("webhook")));
        assert!(registry.contains(&StepKind::Delay));
    }

    #[test]
    fn test_register_duplicate_kind_is_rejected() {
        let mut registry = ExecutorRegistry::new();
        let err = registry.register(fixed(StepKind::Delay, true)).unwrap_err();

        assert_eq!(err, RegistryError::DuplicateKind(StepKind::Delay));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_replace_substitutes_executor() {
        let mut registry = ExecutorRegistry::new();
        let previous = registry.replace(fixed(StepKind::HttpCheck, false));

        assert!(previous.is_some());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_clear_and_reset() {
        let mut registry = ExecutorRegistry::new();
        registry.register(fixed("webhook", true)).unwrap();

        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.resolve(&StepKind::Delay).is_none());

        registry.reset();
        assert_eq!(registry.len(), 2);
        assert!(!registry.contains(&StepKind::from("webhook")));
    }

    #[test]
    fn test_empty_registry() {
        let mut registry = ExecutorRegistry::empty();
        assert!(registry.is_empty());

        registry.register(fixed(StepKind::Delay, true)).unwrap();
        assert_eq!(registry.kinds(), vec![StepKind::Delay]);
    }

    #[test]
    fn test_unregister() {
        let mut registry = ExecutorRegistry::new();
        assert!(registry.unregister(&StepKind::Delay).is_some());
        assert!(registry.unregister(&StepKind::Delay).is_none());
        assert_eq!(registry.kinds(), vec![StepKind::HttpCheck]);
    }

    #[test]
    fn test_debug_lists_kinds() {
        let registry = ExecutorRegistry::empty();
        let text = format!("{:?}", registry);
        assert!(text.contains("ExecutorRegistry"));
    }
}
