//! Page retrieval with rate-limit aware retry.
//!
//! The stats host answers `429 Too Many Requests` when it is being hit too
//! often. That is the only condition we retry: after a fixed backoff the
//! request is re-issued, with no cap on the number of attempts. Any other
//! non-success status, or a transport failure, is terminal for the URL.

use std::time::Duration;

use log::{debug, warn};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use thiserror::Error;

use crate::config::Config;
use crate::http_client::http_client;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("http {status} for {url}")]
    Status { url: String, status: u16 },
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
}

/// One outbound GET. Implementations never retry on their own.
pub trait Transport {
    fn get(&self, url: &str) -> Result<HttpResponse, FetchError>;
}

/// Blocking wait between rate-limited attempts.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

pub struct ReqwestTransport {
    client: &'static Client,
}

impl ReqwestTransport {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let client = http_client(config.request_timeout, &config.user_agent)?;
        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        let transport_err = |err: reqwest::Error| FetchError::Transport {
            url: url.to_string(),
            message: err.to_string(),
        };
        let resp = self.client.get(url).send().map_err(transport_err)?;
        let status = resp.status();
        // Error bodies are never inspected, so skip reading them.
        let body = if status.is_success() {
            resp.text().map_err(transport_err)?
        } else {
            String::new()
        };
        Ok(HttpResponse {
            status: status.as_u16(),
            body,
        })
    }
}

#[derive(Debug)]
enum FetchState {
    Requesting,
    Backoff,
    Succeeded(String),
    FailedTerminal(FetchError),
}

pub struct Fetcher<T, S> {
    transport: T,
    sleeper: S,
    backoff: Duration,
}

impl Fetcher<ReqwestTransport, ThreadSleeper> {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(
            ReqwestTransport::from_config(config)?,
            ThreadSleeper,
            config.rate_limit_backoff,
        ))
    }
}

impl<T: Transport, S: Sleeper> Fetcher<T, S> {
    pub fn new(transport: T, sleeper: S, backoff: Duration) -> Self {
        Self {
            transport,
            sleeper,
            backoff,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }

    /// Returns the page body, retrying indefinitely while rate limited.
    pub fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let mut state = FetchState::Requesting;
        let mut attempts = 0u64;
        loop {
            state = match state {
                FetchState::Requesting => {
                    attempts += 1;
                    debug!("GET {url} (attempt {attempts})");
                    match self.transport.get(url) {
                        Ok(resp) if resp.status == StatusCode::TOO_MANY_REQUESTS.as_u16() => {
                            FetchState::Backoff
                        }
                        Ok(resp) if (200..300).contains(&resp.status) => {
                            FetchState::Succeeded(resp.body)
                        }
                        Ok(resp) => FetchState::FailedTerminal(FetchError::Status {
                            url: url.to_string(),
                            status: resp.status,
                        }),
                        Err(err) => FetchState::FailedTerminal(err),
                    }
                }
                FetchState::Backoff => {
                    warn!(
                        "rate limited on {url}; waiting {}s before retrying",
                        self.backoff.as_secs()
                    );
                    self.sleeper.sleep(self.backoff);
                    FetchState::Requesting
                }
                FetchState::Succeeded(body) => return Ok(body),
                FetchState::FailedTerminal(err) => {
                    warn!("giving up on {url} after {attempts} attempt(s): {err}");
                    return Err(err);
                }
            };
        }
    }
}


#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::testing::{RecordingSleeper, ScriptedTransport};
    use super::{FetchError, Fetcher};

    fn fetcher(
        script: Vec<Result<super::HttpResponse, FetchError>>,
    ) -> Fetcher<ScriptedTransport, RecordingSleeper> {
        Fetcher::new(
            ScriptedTransport::new(script),
            RecordingSleeper::default(),
            Duration::from_secs(60),
        )
    }

    #[test]
    fn retries_rate_limit_until_success() {
        let f = fetcher(vec![
            ScriptedTransport::status(429),
            ScriptedTransport::status(429),
            ScriptedTransport::ok("<html>page</html>"),
        ]);
        let body = f.fetch("https://example.test/match").expect("eventual success");
        assert_eq!(body, "<html>page</html>");
        assert_eq!(f.transport().attempts.get(), 3);
        assert_eq!(
            *f.sleeper().waits.borrow(),
            vec![Duration::from_secs(60), Duration::from_secs(60)]
        );
    }

    #[test]
    fn other_statuses_are_terminal_without_waiting() {
        let f = fetcher(vec![
            ScriptedTransport::status(404),
            ScriptedTransport::ok("never reached"),
        ]);
        let err = f.fetch("https://example.test/missing").unwrap_err();
        assert_eq!(
            err,
            FetchError::Status {
                url: "https://example.test/missing".to_string(),
                status: 404
            }
        );
        assert_eq!(f.transport().attempts.get(), 1);
        assert!(f.sleeper().waits.borrow().is_empty());
    }

    #[test]
    fn transport_failure_after_backoff_is_terminal() {
        let f = fetcher(vec![
            ScriptedTransport::status(429),
            Err(FetchError::Transport {
                url: "u".to_string(),
                message: "connection reset".to_string(),
            }),
        ]);
        assert!(matches!(f.fetch("u"), Err(FetchError::Transport { .. })));
        assert_eq!(f.transport().attempts.get(), 2);
        assert_eq!(f.sleeper().waits.borrow().len(), 1);
    }
}
