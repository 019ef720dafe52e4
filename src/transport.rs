//! HTTP transport for OAI-PMH requests, plus the bounded retry loop for
//! "retry later" server signaling.
//!
//! The transport layer only knows about bytes and HTTP status codes.
//! Protocol-level `<error>` elements are handled after a document has
//! been obtained, in [`crate::response`].

use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use thiserror::Error;

use crate::config::{HTTP_TIMEOUT_SECS, USER_AGENT};
use crate::error::{HarvestError, Result};
use crate::types::Verb;

/// Failure modes of a single transport round trip.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Server is temporarily unavailable and asked us to come back,
    /// optionally after a specific number of seconds (Retry-After).
    #[error("server unavailable, retry later (advisory wait: {wait_secs:?} s)")]
    RetryLater { wait_secs: Option<u64> },

    /// Any other HTTP failure. Never retried.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// One verb request against a repository, returning the raw response
/// body.
pub trait Transport {
    /// Send the verb with its request parameters and return the
    /// response bytes.
    fn send(
        &self,
        verb: Verb,
        params: &[(String, String)],
    ) -> std::result::Result<Vec<u8>, TransportError>;
}

/// Transport speaking HTTP POST with form-encoded parameters, as the
/// protocol prescribes for request arguments.
pub struct HttpTransport {
    client: Client,
    base_url: String,
    credentials: Option<(String, String)>,
}

impl HttpTransport {
    /// Create a transport for the repository at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            credentials: None,
        })
    }

    /// Attach basic-auth credentials to every request.
    #[must_use]
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    /// Base URL this transport talks to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Transport for HttpTransport {
    fn send(
        &self,
        verb: Verb,
        params: &[(String, String)],
    ) -> std::result::Result<Vec<u8>, TransportError> {
        let mut form: Vec<(&str, &str)> = vec![("verb", verb.as_str())];
        for (key, value) in params {
            form.push((key.as_str(), value.as_str()));
        }

        let mut request = self.client.post(&self.base_url).form(&form);
        if let Some((username, password)) = &self.credentials {
            request = request.basic_auth(username, Some(password));
        }

        tracing::debug!(%verb, url = %self.base_url, "sending request");
        let response = request.send()?;

        if response.status() == StatusCode::SERVICE_UNAVAILABLE {
            let wait_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            return Err(TransportError::RetryLater { wait_secs });
        }

        let response = response.error_for_status()?;
        let bytes = response.bytes()?;
        Ok(bytes.to_vec())
    }
}

/// Run a transport call with bounded retry on "retry later" signals.
///
/// Each transient failure sleeps the server's advisory wait when given,
/// else `default_wait`, then retries; after `max_attempts` attempts the
/// loop gives up with [`HarvestError::RetriesExhausted`]. Any other
/// transport failure propagates immediately.
pub fn request_with_retry<F>(call: F, max_attempts: u32, default_wait: Duration) -> Result<Vec<u8>>
where
    F: FnMut() -> std::result::Result<Vec<u8>, TransportError>,
{
    retry_with_sleeper(call, max_attempts, default_wait, thread::sleep)
}

/// Retry loop with an injected sleeper so tests can observe waits
/// without sleeping.
fn retry_with_sleeper<F, S>(
    mut call: F,
    max_attempts: u32,
    default_wait: Duration,
    mut sleep: S,
) -> Result<Vec<u8>>
where
    F: FnMut() -> std::result::Result<Vec<u8>, TransportError>,
    S: FnMut(Duration),
{
    for attempt in 1..=max_attempts {
        match call() {
            Ok(bytes) => return Ok(bytes),
            Err(TransportError::RetryLater { wait_secs }) => {
                if attempt == max_attempts {
                    break;
                }
                let wait = wait_secs.map_or(default_wait, Duration::from_secs);
                tracing::warn!(
                    attempt,
                    max_attempts,
                    wait_secs = wait.as_secs(),
                    "server asked to retry later"
                );
                sleep(wait);
            }
            Err(TransportError::Http(e)) => return Err(HarvestError::Http(e)),
        }
    }

    Err(HarvestError::RetriesExhausted {
        attempts: max_attempts,
    })
}
