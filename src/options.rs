use std::str::FromStr;

use crate::{Backoff, Error, Result};

/// Configures retry behavior.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ClientOptions {
    /// Retry transport errors only when they are timeouts. Other errors end
    /// the call immediately. Retryable status codes are retried either way.
    pub timeout_only: bool,
    /// Bounds of the jittered delay between attempts.
    pub backoff: Backoff,
}

impl ClientOptions {
    /// Reads options from environment variables:
    /// - `RESILIENT_HTTP_TIMEOUT_ONLY`: `true`/`false`/`1`/`0`
    /// - `RESILIENT_HTTP_BACKOFF_BASE_MS`
    /// - `RESILIENT_HTTP_BACKOFF_MAX_MS`
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let timeout_only = match lookup("RESILIENT_HTTP_TIMEOUT_ONLY") {
            Some(value) => parse_flag("RESILIENT_HTTP_TIMEOUT_ONLY", &value)?,
            None => defaults.timeout_only,
        };
        let base_ms = env_value("RESILIENT_HTTP_BACKOFF_BASE_MS", &lookup)?
            .unwrap_or(defaults.backoff.base_ms());
        let max_ms = env_value("RESILIENT_HTTP_BACKOFF_MAX_MS", &lookup)?
            .unwrap_or(defaults.backoff.max_ms());

        Ok(Self {
            timeout_only,
            backoff: Backoff::new(base_ms, max_ms),
        })
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::Config(format!("{name}: expected a boolean, got '{other}'"))),
    }
}

/// Looks up `name` and parses it. Unset or blank values yield `None`.
pub(crate) fn env_value<T, F>(name: &str, lookup: F) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(name) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse()
        .map(Some)
        .map_err(|err| Error::Config(format!("{name}: invalid value '{trimmed}': {err}")))
}
