use std::{error::Error as StdError, io};

use crate::Error;

/// Reports whether a request should be repeated unchanged at a later time.
///
/// True for `408 Request Timeout` and every `5xx`. Codes like 501, 505 and
/// 511 are rarely transient but are still retried.
pub fn should_retry(status: u16) -> bool {
    status == 408 || (500..=599).contains(&status)
}

/// Reports whether `err` signals an exceeded deadline.
///
/// Walks the source chain and looks for a typed timeout indicator:
/// [`reqwest::Error::is_timeout`], [`io::ErrorKind::TimedOut`],
/// [`tokio::time::error::Elapsed`] or [`Error::Timeout`]. Anything else,
/// including connection and name resolution failures, is not a timeout.
pub fn is_timeout_error(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(err) = current {
        if let Some(err) = err.downcast_ref::<reqwest::Error>() {
            if err.is_timeout() {
                return true;
            }
        } else if let Some(err) = err.downcast_ref::<io::Error>() {
            if err.kind() == io::ErrorKind::TimedOut {
                return true;
            }
            // io::Error::source skips the wrapped error itself.
            if let Some(inner) = err.get_ref() {
                current = Some(inner as &(dyn StdError + 'static));
                continue;
            }
        } else if err.is::<tokio::time::error::Elapsed>() {
            return true;
        } else if let Some(Error::Timeout(_)) = err.downcast_ref::<Error>() {
            return true;
        }
        current = err.source();
    }
    false
}
