//! Runner Configuration
//!
//! Limits and transport settings applied by the built-in executors.

use std::time::Duration;

/// Default ceiling for a single delay step, in seconds.
pub const DEFAULT_MAX_DELAY_SECONDS: f64 = 2.0;

/// Default timeout for HTTP checks.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(2);

/// Settings shared by the executors of a registry.
///
/// TLS certificate verification is off unless enabled with
/// [`RunnerConfig::verify_tls`]; checks against hosts with self-signed
/// certificates succeed by default.
#[derive(Debug, Clone, PartialEq)]
pub struct RunnerConfig {
    /// Longer delays are capped to this value with a warning
    pub max_delay_seconds: f64,
    /// Timeout for the whole HTTP request
    pub http_timeout: Duration,
    /// Verify TLS certificates of HTTP check targets
    pub verify_tls: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_delay_seconds: DEFAULT_MAX_DELAY_SECONDS,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            verify_tls: false,
        }
    }
}

impl RunnerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the delay ceiling. Negative or non-finite values are ignored.
    pub fn max_delay_seconds(mut self, seconds: f64) -> Self {
        if seconds.is_finite() && seconds >= 0.0 {
            self.max_delay_seconds = seconds;
        }
        self
    }

    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    pub fn verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RunnerConfig::default();
        assert_eq!(config.max_delay_seconds, 2.0);
        assert_eq!(config.http_timeout, Duration::from_secs(2));
        assert!(!config.verify_tls);
    }

    #[test]
    fn test_builder() {
        let config = RunnerConfig::new()
            .max_delay_seconds(0.5)
            .http_timeout(Duration::from_millis(300))
            .verify_tls(true);

        assert_eq!(config.max_delay_seconds, 0.5);
        assert_eq!(config.http_timeout, Duration::from_millis(300));
        assert!(config.verify_tls);
    }

    #[test]
    fn test_rejects_invalid_ceiling() {
        let config = RunnerConfig::new()
            .max_delay_seconds(-1.0)
            .max_delay_seconds(f64::NAN);
        assert_eq!(config.max_delay_seconds, DEFAULT_MAX_DELAY_SECONDS);
    }
}
