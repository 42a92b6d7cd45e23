use std::fmt;
use thiserror::Error;

/// Errors surfaced by the token and API clients.
#[derive(Error, Debug)]
pub enum Error {
    #[error("missing configuration value {0}")]
    ConfigMissing(&'static str),

    #[error(transparent)]
    AuthExchange(#[from] AuthExchangeError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("unexpected response from {endpoint}: missing `{field}`")]
    UnexpectedResponse {
        endpoint: &'static str,
        field: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// The token endpoint rejected an authorization-code or refresh-token exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthExchangeError {
    /// Vendor error code, e.g. `invalid_grant`.
    pub error: String,
    pub description: Option<String>,
    /// Set for `invalid_grant` so the operator can fetch a fresh code.
    pub auth_url: Option<String>,
}

impl AuthExchangeError {
    pub fn is_invalid_grant(&self) -> bool {
        self.error == "invalid_grant"
    }
}

impl fmt::Display for AuthExchangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "token endpoint rejected the request: {}", self.error)?;
        if let Some(desc) = &self.description {
            write!(f, " ({})", desc)?;
        }
        if let Some(url) = &self.auth_url {
            write!(
                f,
                "\nPlease generate a new code and save it as CIRCUITSPOTIFY_CODE:\n{}",
                url
            )?;
        }
        Ok(())
    }
}

impl std::error::Error for AuthExchangeError {}

/// Failures reported by a [`crate::api::Transport`].
#[derive(Error, Debug)]
pub enum TransportError {
    /// The peer closed the connection or sent nothing back. Spotify does this
    /// for the player endpoints when no track is loaded.
    #[error("no data currently available: {0}")]
    NoData(String),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("response body is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("transport failure: {0}")]
    Other(String),
}

impl TransportError {
    pub fn is_no_data(&self) -> bool {
        matches!(self, TransportError::NoData(_))
    }
}

/// Failures reading or writing the persisted token record.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Nvm(#[from] NvmError),

    #[error("stored {field} is not valid UTF-8: {source}")]
    Decode {
        field: &'static str,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

#[derive(Error, Debug)]
pub enum NvmError {
    #[error("nvm access out of bounds: offset {offset} + {len} exceeds {size} bytes")]
    OutOfBounds {
        offset: usize,
        len: usize,
        size: usize,
    },

    #[error("nvm io error: {0}")]
    Io(#[from] std::io::Error),
}
