//! Step Configuration Helpers
//!
//! A step's configuration is an open JSON object. The helpers here read the
//! keys the built-in step kinds understand, and are shared by the executors
//! (which check again at run time) and the validator (which checks when
//! a step is created).

use reqwest::Url;
use serde_json::{Map, Value};
use thiserror::Error;

/// Kind-specific configuration record of a step.
pub type StepConfig = Map<String, Value>;

/// Config key read by `delay` steps.
pub const SECONDS_KEY: &str = "seconds";

/// Config key read by `http_check` steps.
pub const URL_KEY: &str = "url";

/// Returns the value stored under `key`, treating an explicit `null` as absent.
pub fn config_value<'a>(config: &'a StepConfig, key: &str) -> Option<&'a Value> {
    config.get(key).filter(|value| !value.is_null())
}

/// Interprets a config value as a finite number.
///
/// JSON numbers qualify, and so do strings holding a number (`"1.5"`),
/// since values typed into a form arrive as strings.
pub fn numeric_value(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;

    number.is_finite().then_some(number)
}

/// Name of the JSON type of a value, for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Reasons a configured URL is unusable for an HTTP check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("Invalid URL format: {0}")]
    Malformed(String),

    #[error("URL must use http or https protocol: {0}")]
    UnsupportedScheme(String),
}

/// Parses a config value into an absolute http(s) URL with a host.
pub fn parse_http_url(value: &Value) -> Result<Url, UrlError> {
    let raw = match value {
        Value::String(s) => s.as_str(),
        other => return Err(UrlError::Malformed(other.to_string())),
    };

    let url = match Url::parse(raw) {
        Ok(url) if url.host_str().is_some_and(|host| !host.is_empty()) => url,
        _ => return Err(UrlError::Malformed(raw.to_string())),
    };

    if !matches!(url.scheme(), "http" | "https") {
        return Err(UrlError::UnsupportedScheme(raw.to_string()));
    }

    Ok(url)
}
