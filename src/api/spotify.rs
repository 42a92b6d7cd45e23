use super::token::TokenClient;
use super::Transport;
use crate::error::{Error, Result};
use crate::models::NowPlaying;
use crate::nvm::Nvm;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

/// Message Spotify puts in the error body once a bearer token has expired.
pub const TOKEN_EXPIRED_MESSAGE: &str = "The access token expired";

pub const NOTHING_PLAYING_HINT: &str =
    "This is likely caused by not having a song playing or even paused";

/// Operator instructions printed when no authorization code is configured.
pub fn authorization_instructions(auth_url: &str) -> String {
    format!(
        "CIRCUITSPOTIFY_CODE not found. Please authorize this app by visiting: {}\n\
         which will redirect you to a new page with url ending in \"?code=long_string\"\n\
         Save this long_string in its entirety as CIRCUITSPOTIFY_CODE",
        auth_url
    )
}

/// Authenticated access to the Web API.
///
/// Every request reads the access token fresh from the store. An expired
/// token is refreshed and the request resent once; the second response is
/// returned as-is.
pub struct ApiClient<T, N> {
    tokens: TokenClient<T, N>,
}

impl<T: Transport, N: Nvm> ApiClient<T, N> {
    /// Wrap a token client. Without a configured authorization code the
    /// authorization URL and instructions are printed; later token calls will
    /// fail until the operator supplies a code.
    pub fn new(tokens: TokenClient<T, N>) -> Self {
        if tokens.credentials().code.is_none() {
            warn!("no authorization code configured");
            println!("{}", authorization_instructions(tokens.auth_url()));
        } else {
            debug!("authorization code found in configuration");
        }
        Self { tokens }
    }

    pub fn tokens(&self) -> &TokenClient<T, N> {
        &self.tokens
    }

    pub fn tokens_mut(&mut self) -> &mut TokenClient<T, N> {
        &mut self.tokens
    }

    pub fn into_tokens(self) -> TokenClient<T, N> {
        self.tokens
    }

    /// `("Authorization", "Bearer <access token>")` from the stored record.
    pub fn authorization_header(&self) -> Result<(&'static str, String)> {
        let access = self.tokens.store().read_access()?;
        Ok(("Authorization", format!("Bearer {}", access)))
    }

    /// Raw JSON of `GET /me/player/currently-playing`.
    ///
    /// The "no data" transport condition (nothing loaded in the player) is
    /// returned as `{"error": {"message", "details"}}` instead of an error.
    pub fn get_currently_playing(&mut self) -> Result<Value> {
        let url = self.tokens.endpoints().currently_playing_url();
        match self.get_with_refresh(&url) {
            Err(Error::Transport(e)) if e.is_no_data() => {
                info!("currently-playing returned no data: {}", e);
                Ok(json!({
                    "error": {
                        "message": e.to_string(),
                        "details": NOTHING_PLAYING_HINT,
                    }
                }))
            }
            other => other,
        }
    }

    /// [`ApiClient::get_currently_playing`] decoded into a [`NowPlaying`].
    pub fn now_playing(&mut self) -> Result<NowPlaying> {
        let data = self.get_currently_playing()?;
        NowPlaying::from_value(data).map_err(|e| Error::Transport(e.into()))
    }

    fn get_with_refresh(&mut self, url: &str) -> Result<Value> {
        let data = self.send_get(url)?;
        if !is_token_expired(&data) {
            return Ok(data);
        }
        info!("access token expired; refreshing and retrying once");
        self.tokens.refresh()?;
        self.send_get(url)
    }

    fn send_get(&self, url: &str) -> Result<Value> {
        let (name, value) = self.authorization_header()?;
        debug!("GET {}", url);
        Ok(self.tokens.transport().get(url, &[(name, value.as_str())])?)
    }
}

fn is_token_expired(data: &Value) -> bool {
    data["error"]["message"].as_str() == Some(TOKEN_EXPIRED_MESSAGE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_is_detected_only_for_exact_message() {
        assert!(is_token_expired(&json!({"error": {"status": 401, "message": TOKEN_EXPIRED_MESSAGE}})));
        assert!(!is_token_expired(&json!({"error": {"message": "Invalid access token"}})));
        assert!(!is_token_expired(&json!({"error": "invalid_grant"})));
        assert!(!is_token_expired(&json!({"is_playing": true})));
    }
}
