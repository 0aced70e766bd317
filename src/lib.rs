//! `resilient-http` retries outbound HTTP requests.
//!
//! [`RetryClient::send`] wraps a send primitive ([`Transport`], by default
//! `reqwest` with a 5 second timeout) and:
//! - retries `408` and `5xx` responses and transport errors, or only
//!   timeouts in timeout-only mode
//! - waits between attempts with decorrelated-jitter [`Backoff`]
//! - replays request bodies from a fresh copy on every retry
//!
//! ```no_run
//! use resilient_http::{Request, RetryClient};
//!
//! # async fn run() -> resilient_http::Result<()> {
//! let client = RetryClient::new().timeout_only();
//! let mut request = Request::get("https://example.com/health")?;
//! let outcome = client.send(&mut request, 3).await;
//! println!("{} attempts", outcome.attempts);
//! let response = outcome.into_result()?;
//! println!("{}: {}", response.status, response.text());
//! # Ok(())
//! # }
//! ```

mod backoff;
mod classify;
mod client;
mod error;
mod options;
mod request;
mod response;
mod transport;

pub use backoff::Backoff;
pub use classify::{is_timeout_error, should_retry};
pub use client::RetryClient;
pub use error::Error;
pub use options::ClientOptions;
pub use request::Request;
pub use response::{Outcome, Response};
pub use transport::{ReqwestTransport, Transport, DEFAULT_TIMEOUT};

pub use reqwest::{Body, Method, StatusCode};

pub type Result<T> = std::result::Result<T, Error>;
