use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::{Error, Result};

/// A fully drained response: status code and raw body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Body as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|err| {
            Error::Decode(format!(
                "invalid response JSON: {err}; body: {}",
                self.text()
            ))
        })
    }
}

/// Result of [`RetryClient::send`](crate::RetryClient::send): the last
/// attempt's result and how many sends were issued.
///
/// Exhausted retries are not a distinct error; compare `attempts` with the
/// `max_tries` passed in to tell them apart from a single failure.
#[derive(Debug)]
pub struct Outcome {
    pub attempts: usize,
    pub result: Result<Response>,
}

impl Outcome {
    /// Status of the final attempt, absent when it failed with an error.
    pub fn status(&self) -> Option<StatusCode> {
        self.result.as_ref().ok().map(|response| response.status)
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.result.as_ref().ok().map(|response| response.body.as_slice())
    }

    pub fn error(&self) -> Option<&Error> {
        self.result.as_ref().err()
    }

    pub fn into_result(self) -> Result<Response> {
        self.result
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use serde::Deserialize;

    use super::{Outcome, Response};
    use crate::Error;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Reply {
        ok: bool,
    }

    #[test]
    fn json_decodes_body() {
        let response = Response::new(StatusCode::OK, br#"{"ok":true}"#.to_vec());
        assert_eq!(response.json::<Reply>().unwrap(), Reply { ok: true });
    }

    #[test]
    fn json_error_includes_body() {
        let response = Response::new(StatusCode::OK, "nope");
        let err = response.json::<Reply>().expect_err("must fail");
        assert!(err.to_string().contains("body: nope"));
    }

    #[test]
    fn outcome_accessors() {
        let ok = Outcome {
            attempts: 2,
            result: Ok(Response::new(StatusCode::ACCEPTED, "done")),
        };
        assert_eq!(ok.status(), Some(StatusCode::ACCEPTED));
        assert_eq!(ok.body(), Some(&b"done"[..]));
        assert!(ok.error().is_none());

        let failed = Outcome {
            attempts: 3,
            result: Err(Error::other("refused")),
        };
        assert_eq!(failed.status(), None);
        assert_eq!(failed.body(), None);
        assert!(failed.error().is_some());
        assert!(failed.into_result().is_err());
    }
}
