use crate::api::auth_url::AuthUrlBuilder;
use crate::api::{Credentials, Endpoints, DEFAULT_API_BASE, DEFAULT_AUTH_BASE};
use crate::error::Error;
use crate::scope::{parse_scope_list, Scope};
use anyhow::{anyhow, Context};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CLIENT_ID: &str = "CIRCUITSPOTIFY_CLIENT_ID";
pub const CLIENT_SECRET: &str = "CIRCUITSPOTIFY_CLIENT_SECRET";
pub const CODE: &str = "CIRCUITSPOTIFY_CODE";
pub const REDIRECT_URL: &str = "CIRCUITSPOTIFY_REDIRECT_URL";

/// Values read from a flat `settings.toml`. Keys that are not ours (Wi-Fi
/// settings and the like) are ignored.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Settings {
    #[serde(rename = "CIRCUITSPOTIFY_CLIENT_ID", default)]
    pub client_id: Option<String>,
    #[serde(rename = "CIRCUITSPOTIFY_CLIENT_SECRET", default)]
    pub client_secret: Option<String>,
    #[serde(rename = "CIRCUITSPOTIFY_CODE", default)]
    pub code: Option<String>,
    /// Must already be percent-encoded, e.g. `https%3A%2F%2Fopen.spotify.com%2F`.
    #[serde(rename = "CIRCUITSPOTIFY_REDIRECT_URL", default)]
    pub redirect_url: Option<String>,

    #[serde(rename = "CIRCUITSPOTIFY_SCOPES", default = "default_scopes")]
    pub scopes: String,
    #[serde(rename = "CIRCUITSPOTIFY_AUTH_BASE", default = "default_auth_base")]
    pub auth_base: String,
    #[serde(rename = "CIRCUITSPOTIFY_API_BASE", default = "default_api_base")]
    pub api_base: String,

    // storage
    #[serde(rename = "CIRCUITSPOTIFY_NVM_PATH", default = "default_nvm_path")]
    pub nvm_path: PathBuf,
    #[serde(rename = "CIRCUITSPOTIFY_NVM_SIZE", default = "default_nvm_size")]
    pub nvm_size: usize,

    #[serde(rename = "CIRCUITSPOTIFY_LOG_DIR", default)]
    pub log_dir: Option<PathBuf>,
    #[serde(rename = "CIRCUITSPOTIFY_TIMEOUT_SECS", default)]
    pub timeout_secs: Option<u64>,
}

fn default_scopes() -> String { "user-read-currently-playing user-read-playback-state".into() }
fn default_auth_base() -> String { DEFAULT_AUTH_BASE.into() }
fn default_api_base() -> String { DEFAULT_API_BASE.into() }
fn default_nvm_path() -> PathBuf { "nvm.bin".into() }
fn default_nvm_size() -> usize { 8192 }

impl Default for Settings {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            code: None,
            redirect_url: None,
            scopes: default_scopes(),
            auth_base: default_auth_base(),
            api_base: default_api_base(),
            nvm_path: default_nvm_path(),
            nvm_size: default_nvm_size(),
            log_dir: None,
            timeout_secs: None,
        }
    }
}

impl Settings {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Self::from_toml(&s)
    }

    pub fn from_toml(s: &str) -> anyhow::Result<Self> {
        let settings: Settings = toml::from_str(s)?;
        Ok(settings)
    }

    /// Read `path` if given and present, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut settings = match path {
            Some(p) if p.exists() => Self::from_path(p)
                .with_context(|| format!("loading settings from {}", p.display()))?,
            _ => Self::default(),
        };
        settings.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    /// Override fields from a key lookup (normally the process environment).
    /// Empty values are treated as unset.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(v) = get(CLIENT_ID) { self.client_id = Some(v); }
        if let Some(v) = get(CLIENT_SECRET) { self.client_secret = Some(v); }
        if let Some(v) = get(CODE) { self.code = Some(v); }
        if let Some(v) = get(REDIRECT_URL) { self.redirect_url = Some(v); }
        if let Some(v) = get("CIRCUITSPOTIFY_SCOPES") { self.scopes = v; }
        if let Some(v) = get("CIRCUITSPOTIFY_AUTH_BASE") { self.auth_base = v; }
        if let Some(v) = get("CIRCUITSPOTIFY_API_BASE") { self.api_base = v; }
        if let Some(v) = get("CIRCUITSPOTIFY_NVM_PATH") { self.nvm_path = v.into(); }
        if let Some(v) = get("CIRCUITSPOTIFY_NVM_SIZE") {
            self.nvm_size = v
                .parse()
                .with_context(|| format!("CIRCUITSPOTIFY_NVM_SIZE is not a number: {}", v))?;
        }
        if let Some(v) = get("CIRCUITSPOTIFY_LOG_DIR") { self.log_dir = Some(v.into()); }
        if let Some(v) = get("CIRCUITSPOTIFY_TIMEOUT_SECS") {
            self.timeout_secs = Some(
                v.parse()
                    .with_context(|| format!("CIRCUITSPOTIFY_TIMEOUT_SECS is not a number: {}", v))?,
            );
        }
        Ok(())
    }

    /// App credentials. The authorization code is optional here; it is only
    /// required by the code exchange.
    pub fn credentials(&self) -> Result<Credentials, Error> {
        fn required(v: &Option<String>, key: &'static str) -> Result<String, Error> {
            v.clone()
                .filter(|s| !s.is_empty())
                .ok_or(Error::ConfigMissing(key))
        }
        Ok(Credentials {
            client_id: required(&self.client_id, CLIENT_ID)?,
            client_secret: required(&self.client_secret, CLIENT_SECRET)?,
            redirect_url: required(&self.redirect_url, REDIRECT_URL)?,
            code: self.code.clone().filter(|s| !s.is_empty()),
        })
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints {
            auth_base: self.auth_base.clone(),
            api_base: self.api_base.clone(),
        }
    }

    /// Authorize URL for the operator. Needs only the client id and scopes,
    /// so it works before the secret or redirect URL are filled in.
    pub fn auth_url(&self) -> anyhow::Result<String> {
        let client_id = self
            .client_id
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(Error::ConfigMissing(CLIENT_ID))?;
        Ok(AuthUrlBuilder::new(client_id)
            .authorize_url(self.endpoints().authorize_url())
            .scopes(self.scope_list()?)
            .build())
    }

    pub fn scope_list(&self) -> anyhow::Result<Vec<Scope>> {
        Ok(parse_scope_list(&self.scopes)?)
    }

    /// Check everything a token exchange depends on.
    pub fn validate(&self) -> anyhow::Result<()> {
        let creds = self.credentials()?;
        let decoded = urlencoding::decode(&creds.redirect_url)
            .with_context(|| format!("{} is not valid percent-encoding", REDIRECT_URL))?;
        url::Url::parse(&decoded)
            .with_context(|| format!("{} does not decode to a URL: {}", REDIRECT_URL, decoded))?;
        if decoded == creds.redirect_url && creds.redirect_url.contains("://") {
            return Err(anyhow!(
                "{} must be percent-encoded (e.g. https%3A%2F%2Fopen.spotify.com%2F)",
                REDIRECT_URL
            ));
        }
        url::Url::parse(&self.auth_base).context("CIRCUITSPOTIFY_AUTH_BASE is not a URL")?;
        url::Url::parse(&self.api_base).context("CIRCUITSPOTIFY_API_BASE is not a URL")?;
        let scopes = self.scope_list()?;
        if scopes.is_empty() {
            return Err(anyhow!("CIRCUITSPOTIFY_SCOPES is empty"));
        }
        if self.nvm_size < crate::store::RECORD_LEN {
            return Err(anyhow!(
                "CIRCUITSPOTIFY_NVM_SIZE {} is smaller than the {} byte token record",
                self.nvm_size,
                crate::store::RECORD_LEN
            ));
        }
        Ok(())
    }
}
