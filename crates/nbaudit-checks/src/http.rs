//! Minimal blocking HTTP seam used by the network-backed checks.

use std::time::Duration;

/// Sent with every request; the GitHub API rejects anonymous agents.
const USER_AGENT: &str = concat!("netbox-plugin-audit/", env!("CARGO_PKG_VERSION"));

/// Why a request produced no body.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// The server answered with a non-success status.
    #[error("HTTP {status}")]
    Status {
        /// Status code.
        status: u16,
    },

    /// The request exceeded its timeout.
    #[error("Request timeout fetching {url}")]
    Timeout {
        /// Requested URL.
        url: String,
    },

    /// The host could not be reached.
    #[error("Failed to connect to {url}")]
    Connect {
        /// Requested URL.
        url: String,
    },

    /// Any other transport or client failure.
    #[error("{0}")]
    Other(String),
}

impl HttpError {
    /// Status code, if the server answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status } => Some(*status),
            _ => None,
        }
    }
}

/// HTTP client abstraction for dependency injection.
pub trait HttpClient: Send + Sync {
    /// Performs a GET request asking for JSON and returns the response body.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success status.
    fn get_json(&self, url: &str) -> Result<String, HttpError>;
}

/// Production client backed by `reqwest`'s blocking API.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    timeout: Duration,
}

impl ReqwestClient {
    /// Creates a client whose requests time out after `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl HttpClient for ReqwestClient {
    fn get_json(&self, url: &str) -> Result<String, HttpError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| HttpError::Other(format!("Failed to create HTTP client: {e}")))?;

        let response = client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    HttpError::Timeout { url: url.to_owned() }
                } else if e.is_connect() {
                    HttpError::Connect { url: url.to_owned() }
                } else {
                    HttpError::Other(format!("Failed to fetch {url}: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(HttpError::Status {
                status: status.as_u16(),
            });
        }

        response
            .text()
            .map_err(|e| HttpError::Other(format!("Failed to read response from {url}: {e}")))
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::{HttpClient, HttpError};

    /// Serves canned bodies by URL; unknown URLs answer 404.
    #[derive(Debug, Default)]
    pub(crate) struct FakeHttp {
        routes: HashMap<String, Result<String, u16>>,
        calls: AtomicUsize,
    }

    impl FakeHttp {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn route(mut self, url: &str, body: &str) -> Self {
            self.routes.insert(url.to_owned(), Ok(body.to_owned()));
            self
        }

        pub(crate) fn status(mut self, url: &str, status: u16) -> Self {
            self.routes.insert(url.to_owned(), Err(status));
            self
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl HttpClient for FakeHttp {
        fn get_json(&self, url: &str) -> Result<String, HttpError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.routes.get(url) {
                Some(Ok(body)) => Ok(body.clone()),
                Some(Err(status)) => Err(HttpError::Status { status: *status }),
                None => Err(HttpError::Status { status: 404 }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_exposed() {
        assert_eq!(HttpError::Status { status: 404 }.status(), Some(404));
        assert_eq!(HttpError::Other("x".into()).status(), None);
        assert_eq!(HttpError::Status { status: 503 }.to_string(), "HTTP 503");
    }

    #[test]
    fn fake_counts_calls() {
        let fake = fake::FakeHttp::new().route("https://a", "{}");
        assert_eq!(fake.get_json("https://a").unwrap(), "{}");
        assert_eq!(fake.get_json("https://b").unwrap_err().status(), Some(404));
        assert_eq!(fake.calls(), 2);
    }
}
