//! HTTP transport.
//!
//! [`Transport`] is the seam between the client and the wire: it takes an
//! endpoint path plus query parameters and returns the decoded JSON body.
//! Interpreting `result` / `error` payloads is left to the client.

use crate::config::ClientConfig;
use crate::{Error, Result};
use reqwest::Url;
use reqwest::blocking::Client;
use serde_json::Value;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// Performs GET requests against the controller.
pub trait Transport {
    /// GET `path` with `params` and decode the body as JSON.
    fn get(&self, path: &str, params: &[(&str, &str)]) -> Result<Value>;
}

/// Blocking reqwest transport with connection retries.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    connect_retries: u32,
    retry_backoff: Duration,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.http.connect_timeout())
            .timeout(config.http.response_timeout())
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
            connect_retries: config.http.connect_retries,
            retry_backoff: config.http.retry_backoff(),
        })
    }

    fn url(&self, path: &str, params: &[(&str, &str)]) -> Result<Url> {
        let raw = format!("{}{path}", self.base_url);
        let parsed = if params.is_empty() {
            Url::parse(&raw)
        } else {
            Url::parse_with_params(&raw, params)
        };
        parsed.map_err(|e| Error::Config(format!("invalid url {raw}: {e}")))
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.retry_backoff.saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl Transport for HttpTransport {
    fn get(&self, path: &str, params: &[(&str, &str)]) -> Result<Value> {
        let url = self.url(path, params)?;
        let mut attempt = 0;

        let response = loop {
            match self.client.get(url.clone()).send() {
                Ok(response) => break response,
                Err(e) if e.is_connect() && attempt < self.connect_retries => {
                    let delay = self.backoff(attempt);
                    warn!(%url, attempt = attempt + 1, ?delay, "connection failed, retrying");
                    thread::sleep(delay);
                    attempt += 1;
                }
                Err(e) => return Err(Error::Network(e.to_string())),
            }
        };

        let status = response.status();
        debug!(%url, %status, "controller responded");

        // The controller reports failures in the JSON body, whatever the status.
        response
            .json::<Value>()
            .map_err(|e| Error::InvalidResponse(format!("{status}: {e}")))
    }
}
