use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::{debug, warn};

use crate::error::TaxonError;

pub const RETRY_DELAY: Duration = Duration::from_secs(1);
// Entrez allows three requests per second without an API key.
pub const POLITE_DELAY: Duration = Duration::from_millis(500);

pub trait HttpTransport: Send + Sync {
    fn get(&self, url: &str, params: &[(&str, &str)]) -> Result<String, TaxonError>;
}

#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, TaxonError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("kira-taxon/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| TaxonError::InvalidConfig(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|err| TaxonError::EntrezHttp(err.to_string()))?;
        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    fn get(&self, url: &str, params: &[(&str, &str)]) -> Result<String, TaxonError> {
        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .map_err(|err| TaxonError::EntrezHttp(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "Entrez request failed".to_string());
            return Err(TaxonError::EntrezStatus { status, message });
        }
        response
            .text()
            .map_err(|err| TaxonError::EntrezHttp(err.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; zero means a single try.
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub polite_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            retry_delay: RETRY_DELAY,
            polite_delay: POLITE_DELAY,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_MAX_ATTEMPTS)
    }
}

/// Sends GET requests through a transport, retrying transport failures and
/// pausing after every success so callers cannot outrun the Entrez rate limit.
pub struct Requester<T: HttpTransport> {
    transport: T,
    policy: RetryPolicy,
}

impl<T: HttpTransport> Requester<T> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn get(&self, url: &str, params: &[(&str, &str)]) -> Result<String, TaxonError> {
        let mut attempt = 0u32;
        loop {
            debug!(url, attempt, "sending Entrez request");
            match self.transport.get(url, params) {
                Ok(body) => {
                    thread::sleep(self.policy.polite_delay);
                    return Ok(body);
                }
                Err(err) if err.is_transport() && attempt < self.policy.max_attempts => {
                    warn!(
                        url,
                        attempt,
                        error = %err,
                        "connection issue, retrying in {:?}",
                        self.policy.retry_delay
                    );
                    thread::sleep(self.policy.retry_delay);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
