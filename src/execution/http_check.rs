//! HTTP Check Executor
//!
//! Issues a GET request to the configured URL and classifies the response.
//! Only 2xx counts as success; 4xx is logged as a warning, 5xx as an error.
//!
//! TLS certificates are not verified unless the [`RunnerConfig`] enables it.

use std::time::{Duration, Instant};

use log::debug;
use reqwest::blocking::Client;
use reqwest::Url;

use super::config::{RunnerConfig, DEFAULT_HTTP_TIMEOUT};
use super::executor::{ExecutorError, StepExecutor};
use crate::ledger::RunLedger;
use crate::workflow::config::{config_value, parse_http_url, URL_KEY};
use crate::workflow::{Step, StepKind};

/// Executor for `http_check` steps.
#[derive(Debug, Clone)]
pub struct HttpCheckExecutor {
    timeout: Duration,
    verify_tls: bool,
}

impl HttpCheckExecutor {
    pub fn new(timeout: Duration, verify_tls: bool) -> Self {
        Self {
            timeout,
            verify_tls,
        }
    }

    pub fn from_config(config: &RunnerConfig) -> Self {
        Self::new(config.http_timeout, config.verify_tls)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn client(&self) -> Result<Client, reqwest::Error> {
        Client::builder()
            .timeout(self.timeout)
            .danger_accept_invalid_certs(!self.verify_tls)
            .build()
    }

    fn check(&self, step: &Step, url: Url, ledger: &RunLedger<'_>) -> Result<bool, ExecutorError> {
        let client = match self.client() {
            Ok(client) => client,
            Err(e) => {
                ledger.error(
                    Some(step),
                    format!("Unexpected error during HTTP check: {}", e),
                )?;
                return Ok(false);
            }
        };

        let start = Instant::now();
        let response = client.get(url).send();
        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

        let response = match response {
            Ok(response) => response,
            Err(e) if e.is_connect() || e.is_timeout() => {
                ledger.error(Some(step), format!("Connection failed: {}", e))?;
                return Ok(false);
            }
            Err(e) => {
                ledger.error(Some(step), format!("Request failed: {}", e))?;
                return Ok(false);
            }
        };

        let status = response.status();
        let code = status.as_u16();
        debug!("HTTP check returned {} after {:.2}ms", code, duration_ms);

        if status.is_success() {
            ledger.info(
                Some(step),
                format!(
                    "HTTP request succeeded - Status: {}, Duration: {:.2}ms",
                    code, duration_ms
                ),
            )?;
            return Ok(true);
        }

        if status.is_client_error() {
            ledger.warn(
                Some(step),
                format!(
                    "HTTP client error - Status: {}, Duration: {:.2}ms",
                    code, duration_ms
                ),
            )?;
        } else if status.is_server_error() {
            ledger.error(
                Some(step),
                format!(
                    "HTTP server error - Status: {}, Duration: {:.2}ms",
                    code, duration_ms
                ),
            )?;
        } else {
            ledger.warn(
                Some(step),
                format!(
                    "HTTP request returned non-success status: {}, Duration: {:.2}ms",
                    code, duration_ms
                ),
            )?;
        }
        Ok(false)
    }
}

impl Default for HttpCheckExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_HTTP_TIMEOUT, false)
    }
}

impl StepExecutor for HttpCheckExecutor {
    fn kind(&self) -> StepKind {
        StepKind::HttpCheck
    }

    fn execute(&self, step: &Step, ledger: &RunLedger<'_>) -> Result<bool, ExecutorError> {
        let Some(value) = config_value(&step.config, URL_KEY) else {
            ledger.error(
                Some(step),
                "HTTP check step missing required 'url' parameter in config",
            )?;
            return Ok(false);
        };

        let url = match parse_http_url(value) {
            Ok(url) => url,
            Err(e) => {
                ledger.error(Some(step), e.to_string())?;
                return Ok(false);
            }
        };

        let target = value.as_str().map_or_else(|| url.to_string(), str::to_string);
        ledger.info(Some(step), format!("Starting HTTP GET request to: {}", target))?;
        self.check(step, url, ledger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{LogEntry, LogLevel, MemoryStore, Run, RunStore};
    use httpmock::prelude::*;
    use serde_json::json;
    use uuid::Uuid;

    fn run_step(executor: &HttpCheckExecutor, step: &Step) -> (bool, Vec<LogEntry>) {
        let store = MemoryStore::new();
        let run = Run::new(Uuid::new_v4());
        store.create_run(&run).unwrap();

        let ledger = RunLedger::new(run.id, &store);
        let ok = executor.execute(step, &ledger).unwrap();
        (ok, store.logs(run.id).unwrap())
    }

    fn check_status(status: u16) -> (bool, Vec<LogEntry>) {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/status");
            then.status(status);
        });

        let result = run_step(
            &HttpCheckExecutor::default(),
            &Step::http_check(server.url("/status")),
        );
        mock.assert();
        result
    }

    #[test]
    fn test_success_status() {
        let (ok, logs) = check_status(200);

        assert!(ok);
        assert_eq!(logs.len(), 2);
        assert!(logs[0].message.starts_with("Starting HTTP GET request to: http://"));
        assert_eq!(logs[1].level, LogLevel::Info);
        assert!(logs[1]
            .message
            .starts_with("HTTP request succeeded - Status: 200, Duration: "));
        assert!(logs[1].message.ends_with("ms"));
    }

    #[test]
    fn test_start_message_uses_configured_url() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/");
            then.status(204);
        });

        let configured = server.base_url();
        let (ok, logs) = run_step(
            &HttpCheckExecutor::default(),
            &Step::http_check(configured.clone()),
        );

        assert!(ok);
        assert!(!configured.ends_with('/'));
        assert_eq!(
            logs[0].message,
            format!("Starting HTTP GET request to: {}", configured)
        );
    }

    #[test]
    fn test_client_error_is_warning() {
        let (ok, logs) = check_status(404);

        assert!(!ok);
        assert_eq!(logs[1].level, LogLevel::Warn);
        assert!(logs[1].message.starts_with("HTTP client error - Status: 404"));
    }

    #[test]
    fn test_server_error_is_error() {
        let (ok, logs) = check_status(503);

        assert!(!ok);
        assert_eq!(logs[1].level, LogLevel::Error);
        assert!(logs[1].message.starts_with("HTTP server error - Status: 503"));
    }

    #[test]
    fn test_other_status_is_warning() {
        let (ok, logs) = check_status(304);

        assert!(!ok);
        assert_eq!(logs[1].level, LogLevel::Warn);
        assert!(logs[1]
            .message
            .starts_with("HTTP request returned non-success status: 304"));
    }

    #[test]
    fn test_connection_refused() {
        let (ok, logs) = run_step(
            &HttpCheckExecutor::default(),
            &Step::http_check("http://127.0.0.1:1/"),
        );

        assert!(!ok);
        let last = logs.last().unwrap();
        assert_eq!(last.level, LogLevel::Error);
        assert!(last.message.starts_with("Connection failed:"));
    }

    #[test]
    fn test_timeout_counts_as_connection_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/slow");
            then.status(200).delay(Duration::from_millis(500));
        });

        let executor = HttpCheckExecutor::new(Duration::from_millis(50), false);
        let (ok, logs) = run_step(&executor, &Step::http_check(server.url("/slow")));

        assert!(!ok);
        assert!(logs.last().unwrap().message.starts_with("Connection failed:"));
    }

    #[test]
    fn test_missing_url() {
        let (ok, logs) = run_step(&HttpCheckExecutor::default(), &Step::new(StepKind::HttpCheck));

        assert!(!ok);
        assert_eq!(logs.len(), 1);
        assert_eq!(
            logs[0].message,
            "HTTP check step missing required 'url' parameter in config"
        );
    }

    #[test]
    fn test_malformed_url() {
        let (ok, logs) = run_step(
            &HttpCheckExecutor::default(),
            &Step::http_check("not a url"),
        );
        assert!(!ok);
        assert_eq!(logs[0].message, "Invalid URL format: not a url");

        let step = Step::new(StepKind::HttpCheck).with_config(URL_KEY, json!(42));
        let (ok, logs) = run_step(&HttpCheckExecutor::default(), &step);
        assert!(!ok);
        assert_eq!(logs[0].level, LogLevel::Error);
    }

    #[test]
    fn test_unsupported_scheme() {
        let (ok, logs) = run_step(
            &HttpCheckExecutor::default(),
            &Step::http_check("ftp://example.com/file"),
        );

        assert!(!ok);
        assert_eq!(
            logs[0].message,
            "URL must use http or https protocol: ftp://example.com/file"
        );
    }

    #[test]
    fn test_from_config() {
        let config = RunnerConfig::new().http_timeout(Duration::from_secs(5));
        let executor = HttpCheckExecutor::from_config(&config);

        assert_eq!(executor.timeout(), Duration::from_secs(5));
        assert_eq!(executor.kind(), StepKind::HttpCheck);
    }
}
