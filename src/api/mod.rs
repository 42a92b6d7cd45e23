pub mod auth_url;
pub mod http;
pub mod mock;
pub mod spotify;
pub mod token;

use crate::error::TransportError;
use serde_json::Value;

pub const DEFAULT_AUTH_BASE: &str = "https://accounts.spotify.com";
pub const DEFAULT_API_BASE: &str = "https://api.spotify.com/v1";

/// Transport trait: the two blocking calls the clients need.
/// Implementations: http::HttpTransport and mock::MockTransport.
///
/// Both calls return the decoded JSON body whatever the HTTP status, since
/// Spotify reports token and API errors inside the body.
pub trait Transport {
    /// GET `url` with extra request headers.
    fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<Value, TransportError>;

    /// POST `fields` as an `application/x-www-form-urlencoded` body. Values
    /// are joined as-is and must already be encoded where needed.
    fn post_form(&self, url: &str, fields: &[(&str, &str)]) -> Result<Value, TransportError>;
}

/// App credentials from the Spotify developer dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    /// Already percent-encoded; sent as-is.
    pub redirect_url: String,
    /// One-time authorization code; `None` until the operator supplies it.
    pub code: Option<String>,
}

/// Service base URLs. Overridable so tests can point at a local server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub auth_base: String,
    pub api_base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            auth_base: DEFAULT_AUTH_BASE.into(),
            api_base: DEFAULT_API_BASE.into(),
        }
    }
}

impl Endpoints {
    pub fn authorize_url(&self) -> String {
        format!("{}/authorize", self.auth_base.trim_end_matches('/'))
    }

    pub fn token_url(&self) -> String {
        format!("{}/api/token", self.auth_base.trim_end_matches('/'))
    }

    pub fn currently_playing_url(&self) -> String {
        format!(
            "{}/me/player/currently-playing",
            self.api_base.trim_end_matches('/')
        )
    }
}
