//! Spotify authorization-code client for devices that keep their tokens in
//! a small fixed-size non-volatile region.
pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod nvm;
pub mod scope;
pub mod store;

pub use api::auth_url::AuthUrlBuilder;
pub use api::spotify::ApiClient;
pub use api::token::TokenClient;
pub use api::{Credentials, Endpoints, Transport};
pub use error::{Error, Result};
pub use scope::Scope;
pub use store::{TokenRecord, TokenStore};
