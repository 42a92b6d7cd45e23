use super::auth_url::AuthUrlBuilder;
use super::{Credentials, Endpoints, Transport};
use crate::error::{AuthExchangeError, Error, Result};
use crate::nvm::Nvm;
use crate::scope::Scope;
use crate::store::TokenStore;
use serde_json::Value;
use tracing::{debug, info};

/// Talks to the accounts service's `/api/token` endpoint and keeps the
/// resulting tokens in a [`TokenStore`].
///
/// This is the manual authorization-code flow:
/// 1. Print [`TokenClient::auth_url`] for the operator.
/// 2. The operator approves the app and copies the `code` query parameter
///    from the redirect into the configuration.
/// 3. [`TokenClient::exchange`] trades the code for an access + refresh pair.
/// 4. [`TokenClient::refresh`] renews the access token when it expires.
pub struct TokenClient<T, N> {
    transport: T,
    store: TokenStore<N>,
    credentials: Credentials,
    endpoints: Endpoints,
    auth_url: String,
}

impl<T: Transport, N: Nvm> TokenClient<T, N> {
    pub fn new(
        transport: T,
        store: TokenStore<N>,
        credentials: Credentials,
        endpoints: Endpoints,
        scopes: &[Scope],
    ) -> Self {
        let auth_url = AuthUrlBuilder::new(credentials.client_id.clone())
            .authorize_url(endpoints.authorize_url())
            .scopes(scopes.iter().copied())
            .build();
        Self {
            transport,
            store,
            credentials,
            endpoints,
            auth_url,
        }
    }

    pub fn auth_url(&self) -> &str {
        &self.auth_url
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn store(&self) -> &TokenStore<N> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut TokenStore<N> {
        &mut self.store
    }

    /// Exchange a one-time authorization code and persist both tokens.
    pub fn exchange(&mut self, code: &str) -> Result<()> {
        let url = self.endpoints.token_url();
        let fields = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.credentials.redirect_url.as_str()),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
        ];
        debug!("exchanging authorization code at {}", url);
        let data = self.transport.post_form(&url, &fields)?;
        self.check_rejection(&data)?;

        let access = required_str(&data, "access_token")?;
        let refresh = required_str(&data, "refresh_token")?;
        self.store.write(access, refresh)?;
        info!("authorization code exchanged; tokens saved");
        Ok(())
    }

    /// Exchange the code from configuration.
    pub fn exchange_configured_code(&mut self) -> Result<()> {
        let code = self
            .credentials
            .code
            .clone()
            .ok_or(Error::ConfigMissing("CIRCUITSPOTIFY_CODE"))?;
        self.exchange(&code)
    }

    /// Request a new access token with the stored refresh token.
    ///
    /// The record is always rewritten in full; when the response carries no
    /// new refresh token the stored one is written back unchanged.
    pub fn refresh(&mut self) -> Result<String> {
        let url = self.endpoints.token_url();
        let stored_refresh = self.store.read_refresh()?;
        let fields = [
            ("grant_type", "refresh_token"),
            ("refresh_token", stored_refresh.as_str()),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
        ];
        debug!("refreshing access token at {}", url);
        let data = self.transport.post_form(&url, &fields)?;
        self.check_rejection(&data)?;

        let access = required_str(&data, "access_token")?.to_string();
        let refresh = match data.get("refresh_token").and_then(Value::as_str) {
            Some(rotated) => {
                debug!("token endpoint rotated the refresh token");
                rotated.to_string()
            }
            None => stored_refresh,
        };
        self.store.write(&access, &refresh)?;
        info!("access token refreshed");
        Ok(access)
    }

    fn check_rejection(&self, data: &Value) -> Result<()> {
        let Some(err) = data.get("error") else {
            return Ok(());
        };
        let error = match err {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let description = data
            .get("error_description")
            .and_then(Value::as_str)
            .map(str::to_string);
        let auth_url = (error == "invalid_grant").then(|| self.auth_url.clone());
        Err(AuthExchangeError {
            error,
            description,
            auth_url,
        }
        .into())
    }
}

fn required_str<'a>(data: &'a Value, field: &'static str) -> Result<&'a str> {
    data.get(field)
        .and_then(Value::as_str)
        .ok_or(Error::UnexpectedResponse {
            endpoint: "/api/token",
            field,
        })
}
