use std::{future::Future, time::Duration};

use crate::{options::env_value, Error, Request, Response, Result};

/// Default per-attempt timeout of [`ReqwestTransport`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// A single-shot request sender.
///
/// Implementations take the body out of `request` (see
/// [`Request::take_body`]), send it, and fully drain and release the
/// response before returning, whether or not an error occurred. On error
/// there is no response.
pub trait Transport: Send + Sync {
    fn send(&self, request: &mut Request) -> impl Future<Output = Result<Response>> + Send;
}

/// [`Transport`] backed by `reqwest`, with a per-attempt timeout.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    http: reqwest::Client,
    timeout: Duration,
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Self {
        Self::with_client(reqwest::Client::new(), timeout)
    }

    /// Uses an existing `reqwest::Client`, e.g. one with custom TLS or proxy
    /// settings. `timeout` applies to each attempt unless the request
    /// overrides it.
    pub fn with_client(http: reqwest::Client, timeout: Duration) -> Self {
        Self { http, timeout }
    }

    /// Reads the per-attempt timeout from `RESILIENT_HTTP_TIMEOUT_MS`,
    /// falling back to 5 seconds when unset.
    pub fn from_env() -> Result<Self> {
        let timeout = env_value::<u64, _>("RESILIENT_HTTP_TIMEOUT_MS", |name| {
            std::env::var(name).ok()
        })?
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_TIMEOUT);
        Ok(Self::new(timeout))
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Transport for ReqwestTransport {
    async fn send(&self, request: &mut Request) -> Result<Response> {
        let timeout = request.timeout().unwrap_or(self.timeout);
        let mut builder = self
            .http
            .request(request.method().clone(), request.url().clone())
            .headers(request.headers().clone())
            .timeout(timeout);
        if let Some(body) = request.take_body() {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        // Reading to the end releases the connection; the response is
        // dropped on both paths.
        let body = response
            .bytes()
            .await
            .map_err(|source| Error::Body { status, source })?;
        Ok(Response::new(status, body.to_vec()))
    }
}
