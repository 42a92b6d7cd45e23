use super::auth_url::params_to_query_string;
use super::Transport;
use crate::error::TransportError;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Blocking HTTPS transport backed by reqwest.
///
/// No timeout is set unless [`HttpTransport::with_timeout`] is used.
/// An empty body (Spotify answers `204 No Content` on the player endpoints
/// when nothing is loaded) and a timed-out request are both reported as
/// [`TransportError::NoData`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    fn finish(
        &self,
        sent: Result<reqwest::blocking::Response, reqwest::Error>,
    ) -> Result<Value, TransportError> {
        let resp = sent.map_err(classify)?;
        let status = resp.status();
        let url = resp.url().clone();
        let body = resp.text().map_err(classify)?;
        debug!("{} -> {} ({} bytes)", url, status, body.len());
        if body.trim().is_empty() {
            return Err(TransportError::NoData(format!(
                "{} returned {} with an empty body",
                url, status
            )));
        }
        Ok(serde_json::from_str(&body)?)
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn classify(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::NoData(e.to_string())
    } else {
        TransportError::Http(e)
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<Value, TransportError> {
        let mut req = self.client.get(url);
        for (name, value) in headers {
            req = req.header(*name, *value);
        }
        self.finish(req.send())
    }

    fn post_form(&self, url: &str, fields: &[(&str, &str)]) -> Result<Value, TransportError> {
        let req = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(params_to_query_string(fields));
        self.finish(req.send())
    }
}
