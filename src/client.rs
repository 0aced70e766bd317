use std::{fmt, sync::Arc, time::Duration};

use rand::{rngs::StdRng, Rng, SeedableRng};
use tokio::time::sleep;

use crate::{
    classify::should_retry, Backoff, ClientOptions, Outcome, ReqwestTransport, Request, Result,
    Response, Transport,
};

/// Sends requests through a [`Transport`], retrying transient failures
/// with jittered backoff.
///
/// Holds only immutable configuration; clones share the transport and
/// one instance can serve any number of concurrent calls.
pub struct RetryClient<T = ReqwestTransport> {
    transport: Arc<T>,
    options: ClientOptions,
}

impl<T> Clone for RetryClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            options: self.options.clone(),
        }
    }
}

impl<T> fmt::Debug for RetryClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryClient")
            .field("transport", &std::any::type_name::<T>())
            .field("options", &self.options)
            .finish()
    }
}

impl RetryClient {
    /// Creates a client that retries on all errors, uses a 5 second
    /// per-attempt timeout and backs off between 100 and 5000 ms.
    pub fn new() -> Self {
        Self::with_transport(ReqwestTransport::default())
    }

    /// Creates a client with the transport timeout and retry options read
    /// from `RESILIENT_HTTP_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let transport = ReqwestTransport::from_env()?;
        Ok(Self::with_transport(transport).with_options(ClientOptions::from_env()?))
    }
}

impl Default for RetryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> RetryClient<T> {
    /// Creates a client over a custom send primitive with default options.
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
            options: ClientOptions::default(),
        }
    }

    /// Replaces all retry options.
    pub fn with_options(mut self, opts: ClientOptions) -> Self {
        self.options = opts;
        self
    }

    /// Retries transport errors only when they are timeouts.
    pub fn timeout_only(mut self) -> Self {
        self.options.timeout_only = true;
        self
    }

    /// Replaces the bounds of the delay between attempts.
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.options.backoff = backoff;
        self
    }

    /// Options this client was built with.
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// The underlying send primitive.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Sends `request` at most `max_tries` times.
    ///
    /// Retries happen when the transport fails (any error, or only
    /// timeouts in timeout-only mode) or when the status is 408 or 5xx.
    /// The last attempt's response or error is returned together with the
    /// number of sends issued. `max_tries == 0` is treated as 1.
    ///
    /// Requests with a body must be replayable (see
    /// [`Request::with_replay`]) to be resent with the same content. A
    /// replayable body is put back before returning, so the same request can
    /// be sent again.
    pub async fn send(&self, request: &mut Request, max_tries: usize) -> Outcome {
        let mut rng = StdRng::from_entropy();
        self.send_with_rng(request, max_tries, &mut rng).await
    }

    /// Same as [`RetryClient::send`], drawing backoff jitter from `rng`.
    pub async fn send_with_rng<R>(
        &self,
        request: &mut Request,
        max_tries: usize,
        rng: &mut R,
    ) -> Outcome
    where
        R: Rng + Send + ?Sized,
    {
        let max_tries = if max_tries == 0 {
            #[cfg(feature = "tracing")]
            tracing::warn!("max_tries is 0, sending {} once", request.url());
            1
        } else {
            max_tries
        };
        let has_body = request.body().is_some();
        let mut wait_ms = 0u64;
        let mut attempt = 1usize;

        loop {
            if attempt > 1 {
                wait_ms = self.options.backoff.next_with(rng, wait_ms);

                #[cfg(feature = "tracing")]
                tracing::debug!("sending attempt {attempt} after {wait_ms} ms");

                sleep(Duration::from_millis(wait_ms)).await;

                if has_body && !request.replay_body() {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        "resending {} {} without its body: no replay registered",
                        request.method(),
                        request.url()
                    );
                }
            }

            let result = self.transport.send(request).await;
            if attempt >= max_tries || !self.should_retry(&result) {
                // Hand the request back with its body in place.
                if has_body {
                    request.replay_body();
                }
                return Outcome {
                    attempts: attempt,
                    result,
                };
            }

            #[cfg(feature = "tracing")]
            log_retry(request, attempt, max_tries, &result);

            attempt += 1;
        }
    }

    fn should_retry(&self, result: &Result<Response>) -> bool {
        match result {
            Ok(response) => should_retry(response.status.as_u16()),
            Err(err) => !self.options.timeout_only || err.is_timeout(),
        }
    }
}

#[cfg(feature = "tracing")]
fn log_retry(request: &Request, attempt: usize, max_tries: usize, result: &Result<Response>) {
    match result {
        Ok(response) => tracing::debug!(
            "attempt {attempt}/{max_tries} to {} got status {}, retrying",
            request.url(),
            response.status
        ),
        Err(err) => tracing::debug!(
            "attempt {attempt}/{max_tries} to {} failed: {err}, retrying",
            request.url()
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use reqwest::StatusCode;

    use super::RetryClient;
    use crate::{Backoff, ClientOptions, Error, Request, Response, Result, Transport};

    struct Fixed(fn() -> Result<Response>);

    impl Transport for Fixed {
        async fn send(&self, _request: &mut Request) -> Result<Response> {
            (self.0)()
        }
    }

    fn client(f: fn() -> Result<Response>) -> RetryClient<Fixed> {
        RetryClient::with_transport(Fixed(f)).with_backoff(Backoff::new(1, 2))
    }

    #[test]
    fn builder_methods_set_options() {
        let client = RetryClient::with_transport(Fixed(|| Err(Error::other("x"))))
            .timeout_only()
            .with_backoff(Backoff::new(100, 200));
        assert_eq!(
            client.options(),
            &ClientOptions {
                timeout_only: true,
                backoff: Backoff::new(100, 200),
            }
        );
    }

    #[test]
    fn default_client_uses_five_second_timeout() {
        let client = RetryClient::new();
        assert_eq!(client.transport().timeout(), Duration::from_secs(5));
        assert_eq!(client.options(), &ClientOptions::default());
    }

    #[test]
    fn debug_names_transport_type() {
        let debug = format!("{:?}", RetryClient::new());
        assert!(debug.contains("ReqwestTransport"));
    }

    #[tokio::test]
    async fn zero_max_tries_sends_once() {
        let client = client(|| Ok(Response::new(StatusCode::SERVICE_UNAVAILABLE, "")));
        let mut request = Request::get("http://localhost/").unwrap();
        let outcome = client.send(&mut request, 0).await;
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let client = client(|| Ok(Response::new(StatusCode::NOT_FOUND, "missing")));
        let mut request = Request::get("http://localhost/").unwrap();
        let outcome = client.send(&mut request, 4).await;
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.body(), Some(&b"missing"[..]));
    }

    #[tokio::test]
    async fn request_timeout_status_is_retried_in_timeout_only_mode() {
        let client = client(|| Ok(Response::new(StatusCode::REQUEST_TIMEOUT, ""))).timeout_only();
        let mut request = Request::get("http://localhost/").unwrap();
        let outcome = client.send(&mut request, 3).await;
        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.status(), Some(StatusCode::REQUEST_TIMEOUT));
    }
}
