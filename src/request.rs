use std::{fmt, sync::Arc, time::Duration};

use reqwest::{
    header::{self, HeaderMap, HeaderName, HeaderValue},
    Body, Method, Url,
};
use serde::Serialize;

use crate::{Error, Result};

type Replay = Arc<dyn Fn() -> Body + Send + Sync>;

/// Outbound request handed to [`RetryClient::send`](crate::RetryClient::send).
///
/// The body is consumed by each send. To resend it on retry, the request
/// carries an optional replay capability producing a fresh, independent
/// copy of the original content. In-memory constructors register one
/// automatically; streamed bodies need [`Request::with_replay`].
pub struct Request {
    method: Method,
    url: Url,
    headers: HeaderMap,
    timeout: Option<Duration>,
    body: Option<Body>,
    replay: Option<Replay>,
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(name, value)| {
                let value = if name == header::AUTHORIZATION {
                    "<redacted>"
                } else {
                    value.to_str().unwrap_or("<binary>")
                };
                (name.as_str(), value)
            })
            .collect();
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("headers", &headers)
            .field("timeout", &self.timeout)
            .field("has_body", &self.body.is_some())
            .field("replayable", &self.replay.is_some())
            .finish()
    }
}

impl Request {
    /// Creates a bodyless request.
    pub fn new(method: Method, url: impl AsRef<str>) -> Result<Self> {
        let url = Url::parse(url.as_ref())
            .map_err(|err| Error::InvalidRequest(format!("invalid url '{}': {err}", url.as_ref())))?;
        Ok(Self {
            method,
            url,
            headers: HeaderMap::new(),
            timeout: None,
            body: None,
            replay: None,
        })
    }

    /// Creates a bodyless `GET` request.
    pub fn get(url: impl AsRef<str>) -> Result<Self> {
        Self::new(Method::GET, url)
    }

    /// Creates a `POST` request; attach a body with one of the `with_body_*`
    /// methods.
    pub fn post(url: impl AsRef<str>) -> Result<Self> {
        Self::new(Method::POST, url)
    }

    /// Creates a request with a JSON-encoded body and
    /// `Content-Type: application/json; charset=utf-8`.
    pub fn json<T: Serialize + ?Sized>(
        method: Method,
        url: impl AsRef<str>,
        value: &T,
    ) -> Result<Self> {
        let data = serde_json::to_vec(value)
            .map_err(|err| Error::InvalidRequest(format!("json encoding failed: {err}")))?;
        Ok(Self::new(method, url)?
            .with_header(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json; charset=utf-8"),
            )
            .with_body_bytes(data))
    }

    /// Sets an in-memory body and registers it for replay.
    pub fn with_body_bytes(mut self, data: impl Into<Vec<u8>>) -> Self {
        let data: Vec<u8> = data.into();
        let data: Arc<[u8]> = data.into();
        self.body = Some(Body::from(data.to_vec()));
        self.replay = Some(Arc::new(move || Body::from(data.to_vec())));
        self
    }

    /// Sets a one-shot body. Without [`Request::with_replay`] it is only
    /// sent on the first attempt.
    pub fn with_body_stream(mut self, body: impl Into<Body>) -> Self {
        self.body = Some(body.into());
        self.replay = None;
        self
    }

    /// Registers a function returning a fresh copy of the body, used
    /// before every attempt after the first.
    pub fn with_replay<F>(mut self, fresh_body: F) -> Self
    where
        F: Fn() -> Body + Send + Sync + 'static,
    {
        self.replay = Some(Arc::new(fresh_body));
        self
    }

    /// Sets a header, replacing any previous value.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Overrides the transport's timeout for each attempt of this request.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Target URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Headers sent with every attempt.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable access to the headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Per-attempt timeout override, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Body to be sent by the next attempt, absent once a transport took it.
    pub fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    /// Takes the body out for sending. Transports call this once per attempt.
    pub fn take_body(&mut self) -> Option<Body> {
        self.body.take()
    }

    /// Whether a fresh body can be produced for retries.
    pub fn is_replayable(&self) -> bool {
        self.replay.is_some()
    }

    /// Installs a fresh body from the replay capability. Returns false when
    /// none is registered.
    pub(crate) fn replay_body(&mut self) -> bool {
        match &self.replay {
            Some(fresh_body) => {
                self.body = Some(fresh_body());
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use reqwest::{header, Body, Method};
    use serde::Serialize;

    use super::Request;
    use crate::Error;

    #[derive(Serialize)]
    struct Content {
        data: String,
    }

    #[test]
    fn json_sets_content_type_and_body() {
        let request = Request::json(
            Method::POST,
            "http://localhost/",
            &Content {
                data: "hello".to_owned(),
            },
        )
        .expect("request must build");

        assert_eq!(
            request.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json; charset=utf-8"
        );
        let body = request.body().and_then(Body::as_bytes).unwrap();
        let decoded: serde_json::Value = serde_json::from_slice(body).unwrap();
        assert_eq!(decoded["data"], "hello");
        assert!(request.is_replayable());
    }

    #[test]
    fn replay_restores_consumed_bytes_body() {
        let mut request = Request::post("http://localhost/")
            .unwrap()
            .with_body_bytes("foo-bar");

        assert!(request.take_body().is_some());
        assert!(request.body().is_none());
        assert!(request.replay_body());
        assert_eq!(request.body().and_then(Body::as_bytes), Some(&b"foo-bar"[..]));
    }

    #[test]
    fn stream_body_is_not_replayable_until_registered() {
        let mut request = Request::post("http://localhost/")
            .unwrap()
            .with_body_stream("once");
        assert!(!request.is_replayable());
        request.take_body();
        assert!(!request.replay_body());
        assert!(request.body().is_none());

        let mut request = request.with_replay(|| Body::from("again"));
        assert!(request.replay_body());
        assert_eq!(request.body().and_then(Body::as_bytes), Some(&b"again"[..]));
    }

    #[test]
    fn invalid_url_is_rejected() {
        let err = Request::get("not a url").expect_err("must fail");
        assert!(matches!(err, Error::InvalidRequest(_)));
    }

    #[test]
    fn debug_redacts_authorization_value() {
        let request = Request::get("http://localhost/")
            .unwrap()
            .with_header(
                header::AUTHORIZATION,
                header::HeaderValue::from_static("Bearer secret-token"),
            );
        let debug = format!("{request:?}");
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("secret-token"));
    }
}
